use std::collections::BTreeMap;
use serde::Serialize;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use crate::{
    draft::ProgramDraft,
    program::{FundingCondition, ProgramStatus, Tier, TierSetting, Visibility},
    wizard::{
        mode::{Field, LockedFields},
        tiers::{FeePayload, TierFeeCalculator},
        validation::{parse_amount, ValidationErrors},
    },
};

/// Reduced update sent for a published program
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedUpdate {
    pub name: String,
    pub description: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub currency: String,
    pub network: String,
    pub visibility: Visibility,
    pub status: ProgramStatus,
}

/// Full create/update body for an unpublished program
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullProgram {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub summary: String,
    pub currency: String,
    pub deadline: Option<DateTime<Utc>>,
    pub keywords: Vec<String>,
    pub validators: Vec<String>,
    pub validator_addresses: Vec<String>,
    pub links: Vec<String>,
    pub network: String,
    pub visibility: Visibility,
    pub invited_builders: Vec<String>,
    pub image: Option<String>,
    pub application_start_date: Option<DateTime<Utc>>,
    pub application_end_date: Option<DateTime<Utc>>,
    pub funding_start_date: Option<DateTime<Utc>>,
    pub funding_end_date: Option<DateTime<Utc>>,
    pub funding_condition: FundingCondition,
    pub tier_settings: BTreeMap<Tier, TierSetting>,
    #[serde(flatten)]
    pub fee: FeePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProgramPayload {
    Published(PublishedUpdate),
    Full(FullProgram),
}

impl ProgramPayload {
    pub fn published(draft: &ProgramDraft, locked: &LockedFields) -> Self {
        ProgramPayload::Published(PublishedUpdate {
            name: draft.name.trim().to_string(),
            description: draft.description.to_markdown(),
            summary: draft.summary.trim().to_string(),
            keywords: clean_list(&draft.keywords),
            currency: locked.currency.clone(),
            network: locked.network.clone(),
            visibility: locked.visibility,
            status: locked.status,
        })
    }

    pub fn full(draft: &ProgramDraft) -> Result<Self, ValidationErrors> {
        let price = parse_amount(&draft.price).ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add(Field::Price, "Price must be a number");
            errors
        })?;
        let fee = TierFeeCalculator::fee(draft.fee_type, draft.custom_fee_percentage)?;

        let tier_settings = match draft.funding_condition {
            FundingCondition::Tier => TierFeeCalculator::serialize_tiers(&draft.tier_settings),
            FundingCondition::Open => BTreeMap::new(),
        };

        Ok(ProgramPayload::Full(FullProgram {
            name: draft.name.trim().to_string(),
            price,
            description: draft.description.to_markdown(),
            summary: draft.summary.trim().to_string(),
            currency: draft.currency.clone(),
            deadline: draft.deadline,
            keywords: clean_list(&draft.keywords),
            validators: draft.validators.clone(),
            validator_addresses: draft.validator_addresses.clone(),
            links: clean_list(&draft.links),
            network: draft.network.clone(),
            visibility: draft.visibility,
            invited_builders: draft.invited_builders.clone(),
            image: draft.existing_image.clone(),
            application_start_date: draft.application_start_date,
            application_end_date: draft.application_end_date,
            funding_start_date: draft.funding_start_date,
            funding_end_date: draft.funding_end_date,
            funding_condition: draft.funding_condition,
            tier_settings,
            fee,
        }))
    }

    pub fn name(&self) -> &str {
        match self {
            ProgramPayload::Published(update) => &update.name,
            ProgramPayload::Full(full) => &full.name,
        }
    }
}

fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{Description, FeeType};
    use rust_decimal_macros::dec;

    fn draft() -> ProgramDraft {
        ProgramDraft {
            name: " Tooling ".into(),
            price: "5000.00".into(),
            description: Description::paragraph("Build tools"),
            summary: "Tools".into(),
            currency: "USDC".into(),
            keywords: vec!["dx".into(), " ".into()],
            network: "base".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_fee_excludes_custom_field() {
        let payload = ProgramPayload::full(&draft()).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["feePercentage"], 300);
        assert!(json.get("customFeePercentage").is_none());
        assert_eq!(json["name"], "Tooling");
        assert_eq!(json["price"], "5000.00");
        assert_eq!(json["keywords"], serde_json::json!(["dx"]));
    }

    #[test]
    fn test_custom_fee_excludes_default_field() {
        let mut draft = draft();
        draft.fee_type = FeeType::Custom;
        draft.custom_fee_percentage = Some(dec!(4.75));
        let json = serde_json::to_value(ProgramPayload::full(&draft).unwrap()).unwrap();
        assert_eq!(json["customFeePercentage"], 475);
        assert!(json.get("feePercentage").is_none());
    }

    #[test]
    fn test_open_condition_sends_no_tiers() {
        let mut draft = draft();
        draft.tier_settings.gold.enabled = true;
        draft.tier_settings.gold.max_amount = Some(dec!(10));
        let json = serde_json::to_value(ProgramPayload::full(&draft).unwrap()).unwrap();
        assert_eq!(json["tierSettings"], serde_json::json!({}));

        draft.funding_condition = FundingCondition::Tier;
        let json = serde_json::to_value(ProgramPayload::full(&draft).unwrap()).unwrap();
        assert_eq!(
            json["tierSettings"],
            serde_json::json!({"gold": {"enabled": true, "maxAmount": "10"}})
        );
    }

    #[test]
    fn test_published_update_passes_through_locked_values() {
        let mut draft = draft();
        draft.currency = "EDITED".into();
        let locked = LockedFields {
            currency: "ETH".into(),
            network: "mainnet".into(),
            visibility: Visibility::Private,
            status: ProgramStatus::Published,
        };

        let json = serde_json::to_value(ProgramPayload::published(&draft, &locked)).unwrap();
        assert_eq!(json["currency"], "ETH");
        assert_eq!(json["network"], "mainnet");
        assert_eq!(json["visibility"], "private");
        assert_eq!(json["status"], "published");
        assert!(json.get("price").is_none());
        assert!(json.get("feePercentage").is_none());
        assert!(json.get("tierSettings").is_none());
    }
}
