pub mod mode;
pub mod validation;
pub mod tiers;
pub mod payload;
pub mod edit;
pub mod controller;

pub use mode::{Field, FieldAccess, LockedFields, Mutability, ProgramMode, Tab};
pub use validation::{ValidationEngine, ValidationErrors};
pub use tiers::{FeePayload, TierFeeCalculator, DEFAULT_FEE_BASIS_POINTS};
pub use payload::{FullProgram, ProgramPayload, PublishedUpdate};
pub use edit::DraftEdit;
pub use controller::{WizardController, WizardStep};
