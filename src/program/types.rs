use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Lifecycle status of a program as reported by the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramStatus {
    Pending,
    Published,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl ProgramStatus {
    pub fn is_published(&self) -> bool {
        matches!(self, ProgramStatus::Published)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Restricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundingCondition {
    #[default]
    Open,
    Tier,
}

/// Program category used when listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramType {
    Regular,
    Funding,
}

/// The four named funding ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Platinum];
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Bronze => write!(f, "Bronze"),
            Tier::Silver => write!(f, "Silver"),
            Tier::Gold => write!(f, "Gold"),
            Tier::Platinum => write!(f, "Platinum"),
        }
    }
}

/// Tier entry as stored remotely (only enabled tiers are ever sent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSetting {
    pub enabled: bool,
    pub max_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub can_reclaim: bool,
    #[serde(default)]
    pub reclaimed: bool,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub applicant_id: String,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

/// Remote, authoritative program record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub name: String,
    pub status: ProgramStatus,
    pub creator_id: String,
    #[serde(default)]
    pub program_type: Option<ProgramType>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub price: Decimal,
    pub currency: String,
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub tier_settings: BTreeMap<Tier, TierSetting>,
    #[serde(default)]
    pub reclaimed: bool,

    // Draft-shaped fields, present once persisted
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub validators: Vec<String>,
    #[serde(default)]
    pub validator_addresses: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub invited_builders: Vec<String>,
    #[serde(default)]
    pub application_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub application_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub funding_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub funding_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub funding_condition: FundingCondition,
    #[serde(default)]
    pub fee_percentage: Option<u32>,
    #[serde(default)]
    pub custom_fee_percentage: Option<u32>,
}

impl Program {
    pub fn is_published(&self) -> bool {
        self.status.is_published()
    }

    pub fn has_accepted_application(&self) -> bool {
        self.applications
            .iter()
            .any(|app| app.status == ApplicationStatus::Accepted)
    }

    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.deadline.map(|deadline| deadline < now).unwrap_or(false)
    }

    pub fn find_milestone_mut(&mut self, milestone_id: &str) -> Option<&mut Milestone> {
        self.applications
            .iter_mut()
            .flat_map(|app| app.milestones.iter_mut())
            .find(|milestone| milestone.id == milestone_id)
    }
}
