pub mod program;
pub mod repository;
pub mod draft;
pub mod wizard;
pub mod reclaim;
pub mod notify;
pub mod config;
pub mod error;
pub mod utils;

pub use error::{Result, GrantError};
pub use config::Config;
