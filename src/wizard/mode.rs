use std::collections::BTreeMap;
use crate::program::{Program, ProgramStatus, Tier, Visibility};

/// Wizard tabs in navigation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tab {
    Overview,
    Details,
    Condition,
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tab::Overview => write!(f, "Overview"),
            Tab::Details => write!(f, "Details"),
            Tab::Condition => write!(f, "Condition"),
        }
    }
}

const UNPUBLISHED_TABS: &[Tab] = &[Tab::Overview, Tab::Details, Tab::Condition];
const PUBLISHED_TABS: &[Tab] = &[Tab::Overview, Tab::Details];

/// Every editable draft field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Keywords,
    Summary,
    Description,
    Image,
    Price,
    Currency,
    Deadline,
    Validators,
    Links,
    Network,
    Visibility,
    InvitedBuilders,
    ApplicationStart,
    ApplicationEnd,
    FundingStart,
    FundingEnd,
    FundingCondition,
    Tiers,
    TierMaxAmount(Tier),
    FeeType,
    CustomFee,
}

impl Field {
    /// Fields that remain editable after publication
    const ALWAYS_EDITABLE: [Field; 4] = [Field::Name, Field::Keywords, Field::Summary, Field::Description];

    const LOCKABLE: [Field; 17] = [
        Field::Image,
        Field::Price,
        Field::Currency,
        Field::Deadline,
        Field::Validators,
        Field::Links,
        Field::Network,
        Field::Visibility,
        Field::InvitedBuilders,
        Field::ApplicationStart,
        Field::ApplicationEnd,
        Field::FundingStart,
        Field::FundingEnd,
        Field::FundingCondition,
        Field::Tiers,
        Field::FeeType,
        Field::CustomFee,
    ];

    /// Per-tier fields share the mutability of the tier table
    fn access_key(self) -> Field {
        match self {
            Field::TierMaxAmount(_) => Field::Tiers,
            other => other,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Name => write!(f, "name"),
            Field::Keywords => write!(f, "keywords"),
            Field::Summary => write!(f, "summary"),
            Field::Description => write!(f, "description"),
            Field::Image => write!(f, "image"),
            Field::Price => write!(f, "price"),
            Field::Currency => write!(f, "currency"),
            Field::Deadline => write!(f, "deadline"),
            Field::Validators => write!(f, "validators"),
            Field::Links => write!(f, "links"),
            Field::Network => write!(f, "network"),
            Field::Visibility => write!(f, "visibility"),
            Field::InvitedBuilders => write!(f, "invited builders"),
            Field::ApplicationStart => write!(f, "application start date"),
            Field::ApplicationEnd => write!(f, "application end date"),
            Field::FundingStart => write!(f, "funding start date"),
            Field::FundingEnd => write!(f, "funding end date"),
            Field::FundingCondition => write!(f, "funding condition"),
            Field::Tiers => write!(f, "tiers"),
            Field::TierMaxAmount(tier) => write!(f, "{} max amount", tier),
            Field::FeeType => write!(f, "fee type"),
            Field::CustomFee => write!(f, "custom fee"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Editable,
    ReadOnly,
}

/// Field-mutability map derived once from the program mode
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAccess {
    fields: BTreeMap<Field, Mutability>,
}

impl FieldAccess {
    fn build(locked: Mutability) -> Self {
        let mut fields = BTreeMap::new();
        for field in Field::ALWAYS_EDITABLE {
            fields.insert(field, Mutability::Editable);
        }
        for field in Field::LOCKABLE {
            fields.insert(field, locked);
        }
        Self { fields }
    }

    pub fn get(&self, field: Field) -> Mutability {
        self.fields
            .get(&field.access_key())
            .copied()
            .unwrap_or(Mutability::ReadOnly)
    }

    pub fn is_editable(&self, field: Field) -> bool {
        self.get(field) == Mutability::Editable
    }

    pub fn read_only_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields
            .iter()
            .filter(|(_, mutability)| **mutability == Mutability::ReadOnly)
            .map(|(field, _)| *field)
    }
}

/// Remote values a published program carries through an update unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct LockedFields {
    pub currency: String,
    pub network: String,
    pub visibility: Visibility,
    pub status: ProgramStatus,
}

/// What the wizard is editing
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramMode {
    /// Fresh program, not yet persisted
    New,
    /// Persisted program that has not been published
    Unpublished { program_id: String },
    /// Published program: reduced set of editable fields, no Condition tab
    Published {
        program_id: String,
        locked: LockedFields,
    },
}

impl ProgramMode {
    pub fn from_program(program: &Program) -> Self {
        if program.is_published() {
            ProgramMode::Published {
                program_id: program.id.clone(),
                locked: LockedFields {
                    currency: program.currency.clone(),
                    network: program.network.clone(),
                    visibility: program.visibility,
                    status: program.status,
                },
            }
        } else {
            ProgramMode::Unpublished {
                program_id: program.id.clone(),
            }
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, ProgramMode::Published { .. })
    }

    pub fn program_id(&self) -> Option<&str> {
        match self {
            ProgramMode::New => None,
            ProgramMode::Unpublished { program_id } | ProgramMode::Published { program_id, .. } => {
                Some(program_id)
            }
        }
    }

    pub fn tabs(&self) -> &'static [Tab] {
        if self.is_published() {
            PUBLISHED_TABS
        } else {
            UNPUBLISHED_TABS
        }
    }

    pub fn field_access(&self) -> FieldAccess {
        if self.is_published() {
            FieldAccess::build(Mutability::ReadOnly)
        } else {
            FieldAccess::build(Mutability::Editable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published() -> ProgramMode {
        ProgramMode::Published {
            program_id: "p1".into(),
            locked: LockedFields {
                currency: "USDC".into(),
                network: "base".into(),
                visibility: Visibility::Public,
                status: ProgramStatus::Published,
            },
        }
    }

    #[test]
    fn test_published_drops_condition_tab() {
        assert_eq!(published().tabs(), &[Tab::Overview, Tab::Details]);
        assert_eq!(ProgramMode::New.tabs(), &[Tab::Overview, Tab::Details, Tab::Condition]);
    }

    #[test]
    fn test_published_access_keeps_text_fields_only() {
        let access = published().field_access();
        for field in [Field::Name, Field::Keywords, Field::Summary, Field::Description] {
            assert!(access.is_editable(field), "{} should be editable", field);
        }
        for field in [
            Field::Price,
            Field::Image,
            Field::ApplicationStart,
            Field::Validators,
            Field::CustomFee,
            Field::TierMaxAmount(Tier::Gold),
        ] {
            assert!(!access.is_editable(field), "{} should be locked", field);
        }
    }

    #[test]
    fn test_unpublished_access_is_fully_editable() {
        let access = ProgramMode::New.field_access();
        assert_eq!(access.read_only_fields().count(), 0);
        assert!(access.is_editable(Field::TierMaxAmount(Tier::Bronze)));
    }
}
