pub mod commands;

pub use commands::{Cli, Commands, DraftAction, ReclaimAction};
