pub mod client;
pub mod memory;

pub use client::{fetch_all, MilestoneRepository, ProgramRepository};
pub use memory::MemoryRepository;
