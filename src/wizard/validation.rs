use std::collections::BTreeMap;
use std::str::FromStr;
use rust_decimal::Decimal;
use crate::{
    draft::{FeeType, ProgramDraft},
    program::FundingCondition,
    wizard::mode::{Field, Tab},
};

/// Inline validation messages keyed by field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, message) in other.errors {
            self.errors.entry(field).or_insert(message);
        }
    }

    pub fn remove(&mut self, field: Field) {
        self.errors.remove(&field);
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn message(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.errors.keys().copied()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<String> = self.errors.keys().map(|field| field.to_string()).collect();
        write!(f, "{}", fields.join(", "))
    }
}

/// Parse a user-entered amount; `None` when it is not a decimal number
pub fn parse_amount(input: &str) -> Option<Decimal> {
    Decimal::from_str(input.trim()).ok()
}

/// True for amounts strictly greater than zero ("0", "0.0", "0.00" are rejected)
pub fn is_positive_amount(input: &str) -> bool {
    parse_amount(input)
        .map(|amount| amount > Decimal::ZERO)
        .unwrap_or(false)
}

/// Custom fee percentage: (0, 100] with at most two decimals
pub fn is_valid_custom_fee(fee: Decimal) -> bool {
    fee > Decimal::ZERO && fee <= Decimal::ONE_HUNDRED && fee.normalize().scale() <= 2
}

/// Per-tab validation predicates
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn validate_tab(tab: Tab, draft: &ProgramDraft, is_published: bool) -> ValidationErrors {
        match tab {
            Tab::Overview => Self::validate_overview(draft, is_published),
            Tab::Details => Self::validate_details(draft),
            Tab::Condition => Self::validate_condition(draft),
        }
    }

    /// Run every tab in `tabs`, merging the results
    pub fn validate_all(tabs: &[Tab], draft: &ProgramDraft, is_published: bool) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for tab in tabs {
            errors.merge(Self::validate_tab(*tab, draft, is_published));
        }
        errors
    }

    pub fn validate_overview(draft: &ProgramDraft, is_published: bool) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if draft.name.trim().is_empty() {
            errors.add(Field::Name, "Program name is required");
        }
        if !draft.keywords.iter().any(|keyword| !keyword.trim().is_empty()) {
            errors.add(Field::Keywords, "Add at least one keyword");
        }

        if is_published {
            return errors;
        }

        if !draft.has_image() {
            errors.add(Field::Image, "Program image is required");
        }
        if draft.application_start_date.is_none() {
            errors.add(Field::ApplicationStart, "Application start date is required");
        }
        if draft.application_end_date.is_none() {
            errors.add(Field::ApplicationEnd, "Application due date is required");
        }
        if draft.funding_start_date.is_none() {
            errors.add(Field::FundingStart, "Funding start date is required");
        }
        if draft.funding_end_date.is_none() {
            errors.add(Field::FundingEnd, "Funding due date is required");
        }
        if draft.validators.is_empty() {
            errors.add(Field::Validators, "Select at least one validator");
        }

        errors
    }

    pub fn validate_details(draft: &ProgramDraft) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if draft.summary.trim().is_empty() {
            errors.add(Field::Summary, "Summary is required");
        }
        if draft.description.is_empty() {
            errors.add(Field::Description, "Description is required");
        }

        errors
    }

    /// Only reachable while the program is unpublished
    pub fn validate_condition(draft: &ProgramDraft) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if !is_positive_amount(&draft.price) {
            errors.add(Field::Price, "Price must be greater than 0");
        }

        if draft.fee_type == FeeType::Custom {
            match draft.custom_fee_percentage {
                Some(fee) if is_valid_custom_fee(fee) => {}
                _ => errors.add(
                    Field::CustomFee,
                    "Custom fee must be greater than 0 and at most 100, with up to two decimals",
                ),
            }
        }

        if draft.funding_condition == FundingCondition::Tier {
            let mut any_enabled = false;
            for (tier, input) in draft.tier_settings.enabled() {
                any_enabled = true;
                let valid = input
                    .max_amount
                    .map(|amount| amount > Decimal::ZERO)
                    .unwrap_or(false);
                if !valid {
                    errors.add(
                        Field::TierMaxAmount(tier),
                        format!("{} tier max amount must be greater than 0", tier),
                    );
                }
            }
            if !any_enabled {
                errors.add(Field::Tiers, "Enable at least one tier");
            }
        }

        errors
    }
}
