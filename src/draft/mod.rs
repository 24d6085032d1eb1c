pub mod model;
pub mod store;
pub mod db;

pub use model::{Block, Description, FeeType, ImageFile, ProgramDraft, TierInput, TierInputs};
pub use store::{DraftStore, MemoryDraftStore};
pub use db::SqliteDraftStore;
