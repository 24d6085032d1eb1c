use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use crate::{
    draft::{Description, FeeType, ImageFile, ProgramDraft},
    program::{FundingCondition, Tier, Visibility},
    wizard::mode::Field,
};

/// A single user edit to the draft
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    Name(String),
    Summary(String),
    Description(Description),
    Keywords(Vec<String>),
    Image(Option<ImageFile>),
    Price(String),
    Currency(String),
    Deadline(Option<DateTime<Utc>>),
    Validators {
        names: Vec<String>,
        addresses: Vec<String>,
    },
    Links(Vec<String>),
    Network(String),
    Visibility(Visibility),
    InvitedBuilders(Vec<String>),
    ApplicationStart(Option<DateTime<Utc>>),
    ApplicationEnd(Option<DateTime<Utc>>),
    FundingStart(Option<DateTime<Utc>>),
    FundingEnd(Option<DateTime<Utc>>),
    FundingCondition(FundingCondition),
    TierEnabled(Tier, bool),
    TierMaxAmount(Tier, Option<Decimal>),
    FeeType(FeeType),
    CustomFee(Option<Decimal>),
}

impl DraftEdit {
    pub fn field(&self) -> Field {
        match self {
            DraftEdit::Name(_) => Field::Name,
            DraftEdit::Summary(_) => Field::Summary,
            DraftEdit::Description(_) => Field::Description,
            DraftEdit::Keywords(_) => Field::Keywords,
            DraftEdit::Image(_) => Field::Image,
            DraftEdit::Price(_) => Field::Price,
            DraftEdit::Currency(_) => Field::Currency,
            DraftEdit::Deadline(_) => Field::Deadline,
            DraftEdit::Validators { .. } => Field::Validators,
            DraftEdit::Links(_) => Field::Links,
            DraftEdit::Network(_) => Field::Network,
            DraftEdit::Visibility(_) => Field::Visibility,
            DraftEdit::InvitedBuilders(_) => Field::InvitedBuilders,
            DraftEdit::ApplicationStart(_) => Field::ApplicationStart,
            DraftEdit::ApplicationEnd(_) => Field::ApplicationEnd,
            DraftEdit::FundingStart(_) => Field::FundingStart,
            DraftEdit::FundingEnd(_) => Field::FundingEnd,
            DraftEdit::FundingCondition(_) => Field::FundingCondition,
            DraftEdit::TierEnabled(..) => Field::Tiers,
            DraftEdit::TierMaxAmount(tier, _) => Field::TierMaxAmount(*tier),
            DraftEdit::FeeType(_) => Field::FeeType,
            DraftEdit::CustomFee(_) => Field::CustomFee,
        }
    }

    /// Apply to the draft. Start-date edits pull their due date forward when needed.
    pub fn apply(self, draft: &mut ProgramDraft) {
        match self {
            DraftEdit::Name(name) => draft.name = name,
            DraftEdit::Summary(summary) => draft.summary = summary,
            DraftEdit::Description(description) => draft.description = description,
            DraftEdit::Keywords(keywords) => draft.keywords = keywords,
            DraftEdit::Image(image) => draft.image = image,
            DraftEdit::Price(price) => draft.price = price,
            DraftEdit::Currency(currency) => draft.currency = currency,
            DraftEdit::Deadline(deadline) => draft.deadline = deadline,
            DraftEdit::Validators { names, addresses } => {
                draft.validators = names;
                draft.validator_addresses = addresses;
            }
            DraftEdit::Links(links) => draft.links = links,
            DraftEdit::Network(network) => draft.network = network,
            DraftEdit::Visibility(visibility) => draft.visibility = visibility,
            DraftEdit::InvitedBuilders(builders) => draft.invited_builders = builders,
            DraftEdit::ApplicationStart(start) => draft.set_application_start(start),
            DraftEdit::ApplicationEnd(end) => draft.set_application_end(end),
            DraftEdit::FundingStart(start) => draft.set_funding_start(start),
            DraftEdit::FundingEnd(end) => draft.set_funding_end(end),
            DraftEdit::FundingCondition(condition) => draft.funding_condition = condition,
            DraftEdit::TierEnabled(tier, enabled) => draft.tier_settings.get_mut(tier).enabled = enabled,
            DraftEdit::TierMaxAmount(tier, amount) => {
                draft.tier_settings.get_mut(tier).max_amount = amount
            }
            DraftEdit::FeeType(fee_type) => draft.fee_type = fee_type,
            DraftEdit::CustomFee(fee) => draft.custom_fee_percentage = fee,
        }
    }
}
