use std::sync::Mutex;
use crate::{
    draft::model::ProgramDraft,
    error::{GrantError, Result},
};

/// Local persistence port for the single in-progress draft
#[cfg_attr(test, mockall::automock)]
pub trait DraftStore: Send + Sync {
    fn get(&self) -> Result<Option<ProgramDraft>>;

    /// Persist a snapshot; the selected image file is never stored
    fn set(&self, draft: &ProgramDraft) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// Draft store holding the JSON snapshot in memory
#[derive(Default)]
pub struct MemoryDraftStore {
    snapshot: Mutex<Option<String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self) -> Result<Option<ProgramDraft>> {
        let snapshot = self
            .snapshot
            .lock()
            .map_err(|_| GrantError::Storage("draft store lock poisoned".to_string()))?;

        match snapshot.as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn set(&self, draft: &ProgramDraft) -> Result<()> {
        let json = serde_json::to_string(&draft.snapshot())?;
        *self
            .snapshot
            .lock()
            .map_err(|_| GrantError::Storage("draft store lock poisoned".to_string()))? = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .snapshot
            .lock()
            .map_err(|_| GrantError::Storage("draft store lock poisoned".to_string()))? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::model::{Description, FeeType, ImageFile};
    use crate::program::{FundingCondition, Visibility};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn full_draft() -> ProgramDraft {
        let mut draft = ProgramDraft {
            name: "Compiler Grants".into(),
            price: "2500.00".into(),
            description: Description::paragraph("Funding for compiler work"),
            summary: "Compilers".into(),
            currency: "USDC".into(),
            deadline: Some(Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap()),
            keywords: vec!["rust".into(), "compilers".into()],
            validators: vec!["victor".into()],
            validator_addresses: vec!["0xabc".into()],
            links: vec!["https://example.org".into()],
            network: "base".into(),
            visibility: Visibility::Restricted,
            invited_builders: vec!["bob".into()],
            funding_condition: FundingCondition::Tier,
            fee_type: FeeType::Custom,
            custom_fee_percentage: Some(dec!(2.5)),
            existing_image: Some("https://cdn/logo.png".into()),
            ..Default::default()
        };
        draft.set_application_start(Some(Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap()));
        draft.set_application_end(Some(Utc.with_ymd_and_hms(2026, 11, 15, 0, 0, 0).unwrap()));
        draft.tier_settings.gold.enabled = true;
        draft.tier_settings.gold.max_amount = Some(dec!(1000.125));
        draft
    }

    #[test]
    fn test_round_trip_preserves_everything_but_image() {
        let store = MemoryDraftStore::new();
        let mut draft = full_draft();
        draft.image = Some(ImageFile {
            file_name: "logo.png".into(),
            bytes: vec![0xff; 4],
        });

        store.set(&draft).unwrap();
        let restored = store.get().unwrap().unwrap();

        assert!(restored.image.is_none());
        assert_eq!(restored, draft.snapshot());
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let store = MemoryDraftStore::new();
        store.set(&full_draft()).unwrap();
        let first = store.get().unwrap().unwrap();
        store.set(&first).unwrap();
        let second = store.get().unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_clear_removes_snapshot() {
        let store = MemoryDraftStore::new();
        store.set(&full_draft()).unwrap();
        store.clear().unwrap();
        assert!(store.get().unwrap().is_none());
    }
}
