pub mod types;
pub mod filter;

pub use types::{
    Application, ApplicationStatus, FundingCondition, Milestone, Program, ProgramStatus,
    ProgramType, Tier, TierSetting, Visibility,
};
pub use filter::{ProgramFilter, ProgramPage, ProgramQuery};
