use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use crate::{
    error::{GrantError, Result},
    notify::{Notifier, Severity},
    program::{ProgramFilter, ProgramQuery, ProgramType},
    reclaim::eligibility::{EligibilityChecker, ReclaimKey, ReclaimTarget, ReclaimableItem},
    repository::{fetch_all, MilestoneRepository, ProgramRepository},
};

/// Result of a reclaim operation
#[derive(Debug, Clone)]
pub struct ReclaimResult {
    pub key: ReclaimKey,
    pub amount_reclaimed: Decimal,
    pub currency: String,
    /// Recomputed list after refetch; `None` when the refetch failed
    pub items: Option<Vec<ReclaimableItem>>,
}

/// Reclaims in flight, keyed by item. Different items may run concurrently;
/// the same item cannot be started twice.
#[derive(Default)]
struct InFlight {
    started: Mutex<HashMap<ReclaimKey, DateTime<Utc>>>,
}

struct InFlightGuard<'a> {
    owner: &'a InFlight,
    key: ReclaimKey,
}

impl InFlight {
    fn acquire(&self, key: ReclaimKey) -> Result<InFlightGuard<'_>> {
        let mut started = self
            .started
            .lock()
            .map_err(|_| GrantError::InvalidState("in-flight map lock poisoned".to_string()))?;
        if started.contains_key(&key) {
            return Err(GrantError::ReclaimInFlight(key.to_string()));
        }
        started.insert(key.clone(), Utc::now());
        Ok(InFlightGuard { owner: self, key })
    }

    fn contains(&self, key: &ReclaimKey) -> bool {
        self.started
            .lock()
            .map(|started| started.contains_key(key))
            .unwrap_or(false)
    }

    fn keys(&self) -> Vec<ReclaimKey> {
        self.started
            .lock()
            .map(|started| started.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut started) = self.owner.started.lock() {
            started.remove(&self.key);
        }
    }
}

pub struct ReclaimExecutor {
    programs: Arc<dyn ProgramRepository>,
    milestones: Arc<dyn MilestoneRepository>,
    notifier: Arc<dyn Notifier>,
    user_id: String,
    page_size: usize,
    program_type: Option<ProgramType>,
    in_flight: InFlight,
}

impl ReclaimExecutor {
    pub fn new(
        programs: Arc<dyn ProgramRepository>,
        milestones: Arc<dyn MilestoneRepository>,
        notifier: Arc<dyn Notifier>,
        user_id: &str,
        page_size: usize,
    ) -> Self {
        Self {
            programs,
            milestones,
            notifier,
            user_id: user_id.to_string(),
            page_size,
            program_type: None,
            in_flight: InFlight::default(),
        }
    }

    /// Restrict both fetches to one program type
    pub fn with_program_type(mut self, program_type: Option<ProgramType>) -> Self {
        self.program_type = program_type;
        self
    }

    /// Query for one role, narrowed to the configured program type
    pub fn query(&self, filter: ProgramFilter) -> ProgramQuery {
        let query = ProgramQuery::new(filter, self.page_size);
        match self.program_type {
            Some(program_type) => query.with_type(program_type),
            None => query,
        }
    }

    /// Fetch sponsor and builder datasets and recompute the reclaimable list
    pub async fn refresh(&self) -> Result<Vec<ReclaimableItem>> {
        self.refresh_at(Utc::now()).await
    }

    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Result<Vec<ReclaimableItem>> {
        let sponsor_query = self.query(ProgramFilter::Creator(self.user_id.clone()));
        let builder_query = self.query(ProgramFilter::Builder(self.user_id.clone()));

        let (sponsor, builder) = futures::try_join!(
            fetch_all(self.programs.as_ref(), sponsor_query),
            fetch_all(self.programs.as_ref(), builder_query),
        )?;

        info!(
            "Loaded {} sponsor and {} builder programs for {}",
            sponsor.len(),
            builder.len(),
            self.user_id
        );
        Ok(EligibilityChecker::evaluate(&sponsor, &builder, &self.user_id, now))
    }

    pub fn is_in_flight(&self, key: &ReclaimKey) -> bool {
        self.in_flight.contains(key)
    }

    pub fn in_flight(&self) -> Vec<ReclaimKey> {
        self.in_flight.keys()
    }

    /// Reclaim unused funds of a sponsor program
    pub async fn reclaim_program(&self, program_id: &str) -> Result<ReclaimResult> {
        let key = ReclaimKey::program(program_id);
        let guard = self.in_flight.acquire(key.clone())?;
        info!("Reclaiming unused funds of program {}", program_id);

        let outcome = self
            .programs
            .reclaim_program(program_id)
            .await
            .map(|program| (program.price, program.currency));
        drop(guard);

        self.finish(key, outcome).await
    }

    /// Reclaim an unpaid milestone
    pub async fn reclaim_milestone(&self, milestone_id: &str) -> Result<ReclaimResult> {
        self.reclaim_milestone_in(milestone_id, None).await
    }

    /// Dispatch on the item's kind
    pub async fn reclaim(&self, item: &ReclaimableItem) -> Result<ReclaimResult> {
        match &item.target {
            ReclaimTarget::UnusedProgram { program_id } => self.reclaim_program(program_id).await,
            ReclaimTarget::UnpaidMilestone { milestone_id, .. } => {
                self.reclaim_milestone_in(milestone_id, Some(&item.currency)).await
            }
        }
    }

    /// Milestones without their own currency use the program's
    async fn reclaim_milestone_in(
        &self,
        milestone_id: &str,
        program_currency: Option<&str>,
    ) -> Result<ReclaimResult> {
        let key = ReclaimKey::milestone(milestone_id);
        let guard = self.in_flight.acquire(key.clone())?;
        info!("Reclaiming milestone {}", milestone_id);

        let outcome = self
            .milestones
            .reclaim_milestone(milestone_id)
            .await
            .map(|milestone| {
                let currency = milestone
                    .currency
                    .filter(|c| !c.is_empty())
                    .or_else(|| program_currency.map(str::to_string))
                    .unwrap_or_default();
                (milestone.price, currency)
            });
        drop(guard);

        self.finish(key, outcome).await
    }

    async fn finish(
        &self,
        key: ReclaimKey,
        outcome: Result<(Decimal, String)>,
    ) -> Result<ReclaimResult> {
        let (amount, currency) = match outcome {
            Ok(value) => value,
            Err(e) => {
                warn!("Reclaim of {} failed: {}", key, e);
                self.notifier.notify(&e.user_message(), Severity::Error);
                return Err(e);
            }
        };

        info!("✓ Reclaimed {} {} ({})", amount, currency, key);
        let message = if currency.is_empty() {
            format!("Reclaimed {}", amount)
        } else {
            format!("Reclaimed {} {}", amount, currency)
        };
        self.notifier.notify(&message, Severity::Success);

        let items = match self.refresh().await {
            Ok(items) => Some(items),
            Err(e) => {
                warn!("Refetch after reclaim of {} failed: {}", key, e);
                self.notifier
                    .notify("Reclaim succeeded but the list could not be refreshed", Severity::Warning);
                None
            }
        };

        Ok(ReclaimResult {
            key,
            amount_reclaimed: amount,
            currency,
            items,
        })
    }
}
