pub mod eligibility;
pub mod executor;

pub use eligibility::{EligibilityChecker, ReclaimKey, ReclaimKind, ReclaimTarget, ReclaimableItem};
pub use executor::{ReclaimExecutor, ReclaimResult};
