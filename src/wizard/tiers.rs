use std::collections::BTreeMap;
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::Serialize;
use crate::{
    draft::{FeeType, TierInputs},
    program::{Tier, TierSetting},
    wizard::{mode::Field, validation::{is_valid_custom_fee, ValidationErrors}},
};

/// Platform fee applied when no custom fee is chosen (3%)
pub const DEFAULT_FEE_BASIS_POINTS: u32 = 300;

/// Fee portion of a submission. Flattened into the payload so that exactly
/// one of `feePercentage` / `customFeePercentage` is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeePayload {
    #[serde(rename = "feePercentage")]
    Default(u32),
    #[serde(rename = "customFeePercentage")]
    Custom(u32),
}

impl FeePayload {
    pub fn basis_points(&self) -> u32 {
        match self {
            FeePayload::Default(bps) | FeePayload::Custom(bps) => *bps,
        }
    }
}

pub struct TierFeeCalculator;

impl TierFeeCalculator {
    /// Enabled tiers only; disabled tiers are omitted rather than sent as disabled
    pub fn serialize_tiers(tiers: &TierInputs) -> BTreeMap<Tier, TierSetting> {
        tiers
            .enabled()
            .map(|(tier, input)| {
                (
                    tier,
                    TierSetting {
                        enabled: true,
                        max_amount: input.max_amount.unwrap_or_default(),
                    },
                )
            })
            .collect()
    }

    /// Convert a percentage (e.g. 2.55) to integer basis points (255), rounding half away from zero
    pub fn to_basis_points(percent: Decimal) -> Option<u32> {
        (percent * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
    }

    pub fn fee(fee_type: FeeType, custom_fee: Option<Decimal>) -> Result<FeePayload, ValidationErrors> {
        match fee_type {
            FeeType::Default => Ok(FeePayload::Default(DEFAULT_FEE_BASIS_POINTS)),
            FeeType::Custom => custom_fee
                .filter(|fee| is_valid_custom_fee(*fee))
                .and_then(Self::to_basis_points)
                .map(FeePayload::Custom)
                .ok_or_else(|| {
                    let mut errors = ValidationErrors::new();
                    errors.add(Field::CustomFee, "Custom fee must be between 0 and 100");
                    errors
                }),
        }
    }
}
