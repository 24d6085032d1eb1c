use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use async_trait::async_trait;
use tracing::{debug, info};
use crate::{
    draft::ImageFile,
    error::{GrantError, Result},
    program::{Milestone, Program, ProgramPage, ProgramQuery, ProgramStatus},
    repository::client::{MilestoneRepository, ProgramRepository},
    wizard::payload::ProgramPayload,
};

/// Repository over an in-memory program list, optionally backed by a JSON file
pub struct MemoryRepository {
    programs: Mutex<Vec<Program>>,
    session_user: String,
    images: Mutex<Vec<(String, ImageFile)>>,
    fail_next: Mutex<Option<String>>,
}

impl MemoryRepository {
    pub fn new(programs: Vec<Program>, session_user: &str) -> Self {
        Self {
            programs: Mutex::new(programs),
            session_user: session_user.to_string(),
            images: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
        }
    }

    /// Load programs from a JSON array file; a missing file yields an empty repository
    pub fn load(path: &Path, session_user: &str) -> Result<Self> {
        let programs = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        } else {
            info!("Fixture {} not found, starting empty", path.display());
            Vec::new()
        };
        Ok(Self::new(programs, session_user))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&*self.programs()?)?;
        std::fs::write(path, json)?;
        debug!("Saved fixture to {}", path.display());
        Ok(())
    }

    /// Make the next remote call fail with `message`
    pub fn fail_next(&self, message: &str) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(message.to_string());
        }
    }

    /// Image stored under a reference returned by `upload_image`
    pub fn image(&self, reference: &str) -> Result<Option<ImageFile>> {
        let images = self
            .images
            .lock()
            .map_err(|_| GrantError::Remote("repository lock poisoned".to_string()))?;
        Ok(images
            .iter()
            .find(|(stored, _)| stored == reference)
            .map(|(_, file)| file.clone()))
    }

    pub fn snapshot(&self) -> Result<Vec<Program>> {
        Ok(self.programs()?.clone())
    }

    fn programs(&self) -> Result<MutexGuard<'_, Vec<Program>>> {
        self.programs
            .lock()
            .map_err(|_| GrantError::Remote("repository lock poisoned".to_string()))
    }

    /// Every call yields once, as a network round trip would, then honours injected failures
    async fn round_trip(&self) -> Result<()> {
        tokio::task::yield_now().await;
        let injected = self
            .fail_next
            .lock()
            .map_err(|_| GrantError::Remote("repository lock poisoned".to_string()))?
            .take();
        match injected {
            Some(message) => Err(GrantError::Remote(message)),
            None => Ok(()),
        }
    }
}

fn apply_payload(program: &mut Program, payload: &ProgramPayload) {
    match payload {
        ProgramPayload::Published(update) => {
            program.name = update.name.clone();
            program.description = update.description.clone();
            program.summary = update.summary.clone();
            program.keywords = update.keywords.clone();
        }
        ProgramPayload::Full(full) => {
            program.name = full.name.clone();
            program.price = full.price;
            program.description = full.description.clone();
            program.summary = full.summary.clone();
            program.currency = full.currency.clone();
            program.deadline = full.deadline;
            program.keywords = full.keywords.clone();
            program.validators = full.validators.clone();
            program.validator_addresses = full.validator_addresses.clone();
            program.links = full.links.clone();
            program.network = full.network.clone();
            program.visibility = full.visibility;
            program.invited_builders = full.invited_builders.clone();
            program.image = full.image.clone();
            program.application_start_date = full.application_start_date;
            program.application_end_date = full.application_end_date;
            program.funding_start_date = full.funding_start_date;
            program.funding_end_date = full.funding_end_date;
            program.funding_condition = full.funding_condition;
            program.tier_settings = full.tier_settings.clone();
            match full.fee {
                crate::wizard::tiers::FeePayload::Default(bps) => {
                    program.fee_percentage = Some(bps);
                    program.custom_fee_percentage = None;
                }
                crate::wizard::tiers::FeePayload::Custom(bps) => {
                    program.fee_percentage = None;
                    program.custom_fee_percentage = Some(bps);
                }
            }
        }
    }
}

#[async_trait]
impl ProgramRepository for MemoryRepository {
    async fn get(&self, id: &str) -> Result<Program> {
        self.round_trip().await?;
        self.programs()?
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| GrantError::NotFound(format!("program {}", id)))
    }

    async fn list(&self, query: &ProgramQuery) -> Result<ProgramPage> {
        self.round_trip().await?;
        let programs = self.programs()?;
        let matching: Vec<&Program> = programs.iter().filter(|p| query.matches(p)).collect();

        let start = query.page * query.page_size;
        let items: Vec<Program> = matching
            .iter()
            .skip(start)
            .take(query.page_size)
            .map(|p| (*p).clone())
            .collect();
        let has_more = start + items.len() < matching.len();

        Ok(ProgramPage { items, has_more })
    }

    async fn upload_image(&self, image: &ImageFile) -> Result<String> {
        self.round_trip().await?;
        if image.bytes.is_empty() {
            return Err(GrantError::Remote(format!("{} is empty", image.file_name)));
        }

        let mut images = self
            .images
            .lock()
            .map_err(|_| GrantError::Remote("repository lock poisoned".to_string()))?;
        let reference = format!("memory://images/{}/{}", images.len() + 1, image.file_name);
        images.push((reference.clone(), image.clone()));

        debug!("Stored image {} ({} bytes)", reference, image.bytes.len());
        Ok(reference)
    }

    async fn create(&self, payload: &ProgramPayload) -> Result<Program> {
        self.round_trip().await?;
        let ProgramPayload::Full(full) = payload else {
            return Err(GrantError::Remote(
                "A new program requires the full configuration".to_string(),
            ));
        };

        let mut programs = self.programs()?;
        let mut program = Program {
            id: format!("program-{}", programs.len() + 1),
            name: full.name.clone(),
            status: ProgramStatus::Pending,
            creator_id: self.session_user.clone(),
            program_type: None,
            deadline: None,
            price: full.price,
            currency: full.currency.clone(),
            network: String::new(),
            applications: Vec::new(),
            tier_settings: Default::default(),
            reclaimed: false,
            summary: String::new(),
            description: String::new(),
            image: None,
            keywords: Vec::new(),
            validators: Vec::new(),
            validator_addresses: Vec::new(),
            links: Vec::new(),
            visibility: Default::default(),
            invited_builders: Vec::new(),
            application_start_date: None,
            application_end_date: None,
            funding_start_date: None,
            funding_end_date: None,
            funding_condition: Default::default(),
            fee_percentage: None,
            custom_fee_percentage: None,
        };
        apply_payload(&mut program, payload);
        programs.push(program.clone());

        info!("Created program {} ({})", program.id, program.name);
        Ok(program)
    }

    async fn update(&self, id: &str, payload: &ProgramPayload) -> Result<Program> {
        self.round_trip().await?;
        let mut programs = self.programs()?;
        let program = programs
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| GrantError::NotFound(format!("program {}", id)))?;

        if program.is_published() && matches!(payload, ProgramPayload::Full(_)) {
            return Err(GrantError::Remote(
                "Published programs only accept name, description, summary and keywords".to_string(),
            ));
        }

        apply_payload(program, payload);
        info!("Updated program {}", id);
        Ok(program.clone())
    }

    async fn reclaim_program(&self, id: &str) -> Result<Program> {
        self.round_trip().await?;
        let mut programs = self.programs()?;
        let program = programs
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| GrantError::NotFound(format!("program {}", id)))?;

        if program.reclaimed {
            return Err(GrantError::Remote("Program funds were already reclaimed".to_string()));
        }
        if program.has_accepted_application() {
            return Err(GrantError::Remote(
                "Program has accepted applications and cannot be reclaimed".to_string(),
            ));
        }

        program.reclaimed = true;
        Ok(program.clone())
    }
}

#[async_trait]
impl MilestoneRepository for MemoryRepository {
    async fn reclaim_milestone(&self, id: &str) -> Result<Milestone> {
        self.round_trip().await?;
        let mut programs = self.programs()?;
        let milestone = programs
            .iter_mut()
            .find_map(|p| p.find_milestone_mut(id))
            .ok_or_else(|| GrantError::NotFound(format!("milestone {}", id)))?;

        if milestone.reclaimed {
            return Err(GrantError::Remote("Milestone was already reclaimed".to_string()));
        }
        if !milestone.can_reclaim {
            return Err(GrantError::Remote("Milestone is not reclaimable".to_string()));
        }

        milestone.reclaimed = true;
        milestone.can_reclaim = false;
        Ok(milestone.clone())
    }
}
