use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::{
    draft::{DraftStore, ProgramDraft},
    error::{GrantError, Result},
    notify::{Notifier, Severity},
    program::Program,
    repository::ProgramRepository,
    wizard::{
        edit::DraftEdit,
        mode::{Field, FieldAccess, ProgramMode, Tab},
        payload::ProgramPayload,
        validation::{ValidationEngine, ValidationErrors},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum WizardStep {
    Editing(Tab),
    Submitted { program_id: String },
}

/// Multi-tab program editor: Overview -> Details -> Condition -> Submitted.
///
/// Condition only exists while the program is unpublished. Forward moves are
/// gated by the tab's validation; backward moves are always allowed.
pub struct WizardController {
    programs: Arc<dyn ProgramRepository>,
    drafts: Arc<dyn DraftStore>,
    notifier: Arc<dyn Notifier>,
    target: Option<String>,
    mode: ProgramMode,
    access: FieldAccess,
    draft: ProgramDraft,
    /// Draft as loaded from the remote program; `reset` returns to it in edit mode
    origin: Option<ProgramDraft>,
    step: WizardStep,
    errors: ValidationErrors,
    autosave: bool,
}

impl WizardController {
    /// Wizard for a brand-new program
    pub fn create(
        programs: Arc<dyn ProgramRepository>,
        drafts: Arc<dyn DraftStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let mode = ProgramMode::New;
        Self {
            programs,
            drafts,
            notifier,
            target: None,
            access: mode.field_access(),
            mode,
            draft: ProgramDraft::default(),
            origin: None,
            step: WizardStep::Editing(Tab::Overview),
            errors: ValidationErrors::new(),
            autosave: false,
        }
    }

    /// Wizard editing an existing program
    pub fn edit(
        program_id: &str,
        programs: Arc<dyn ProgramRepository>,
        drafts: Arc<dyn DraftStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            target: Some(program_id.to_string()),
            ..Self::create(programs, drafts, notifier)
        }
    }

    /// Persist the draft after every edit (create mode only)
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn mode(&self) -> &ProgramMode {
        &self.mode
    }

    pub fn draft(&self) -> &ProgramDraft {
        &self.draft
    }

    pub fn step(&self) -> &WizardStep {
        &self.step
    }

    pub fn current_tab(&self) -> Option<Tab> {
        match self.step {
            WizardStep::Editing(tab) => Some(tab),
            WizardStep::Submitted { .. } => None,
        }
    }

    pub fn tabs(&self) -> &'static [Tab] {
        self.mode.tabs()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn is_editable(&self, field: Field) -> bool {
        self.access.is_editable(field)
    }

    /// Load the initial draft. In edit mode the remote program always wins and any
    /// local draft is ignored; in create mode a stored draft is restored if present.
    pub async fn hydrate(&mut self) -> Result<()> {
        match self.target.clone() {
            Some(program_id) => {
                let program = self.programs.get(&program_id).await.map_err(|e| {
                    self.notifier.notify(&e.user_message(), Severity::Error);
                    e
                })?;
                self.load_program(&program);
                debug!("Hydrated wizard from remote program {}", program_id);
            }
            None => {
                self.set_mode(ProgramMode::New);
                match self.drafts.get() {
                    Ok(Some(draft)) => {
                        info!("Restored local draft '{}'", draft.name);
                        self.draft = draft;
                    }
                    Ok(None) => {
                        self.draft = ProgramDraft::default();
                    }
                    Err(e) => {
                        warn!("Could not read local draft: {}", e);
                        self.notifier
                            .notify("Saved draft could not be loaded", Severity::Warning);
                        self.draft = ProgramDraft::default();
                    }
                }
            }
        }

        self.step = WizardStep::Editing(Tab::Overview);
        self.errors.clear();
        Ok(())
    }

    fn load_program(&mut self, program: &Program) {
        self.set_mode(ProgramMode::from_program(program));
        self.draft = ProgramDraft::from(program);
        self.origin = Some(self.draft.clone());
    }

    fn set_mode(&mut self, mode: ProgramMode) {
        self.access = mode.field_access();
        self.mode = mode;
    }

    /// Apply one edit; locked fields are rejected once the program is published
    pub fn apply(&mut self, edit: DraftEdit) -> Result<()> {
        let field = edit.field();
        if !self.access.is_editable(field) {
            return Err(GrantError::ReadOnly(field));
        }

        edit.apply(&mut self.draft);
        self.errors.remove(field);

        if self.autosave && self.mode == ProgramMode::New {
            if let Err(e) = self.save_draft() {
                warn!("Autosave failed: {}", e);
                self.notifier
                    .notify("Draft could not be saved locally", Severity::Warning);
            }
        }
        Ok(())
    }

    /// Validate the current tab and move to the next one. On failure the tab
    /// stays put and the inline errors are recorded.
    pub fn advance(&mut self) -> Result<Tab> {
        let tab = self.editing_tab()?;
        let errors = ValidationEngine::validate_tab(tab, &self.draft, self.mode.is_published());

        if !errors.is_empty() {
            debug!("{} tab blocked: {}", tab, errors);
            self.errors = errors.clone();
            return Err(GrantError::Validation(errors));
        }

        self.errors.clear();
        let next = self.next_tab(tab).unwrap_or(tab);
        self.step = WizardStep::Editing(next);
        Ok(next)
    }

    /// Step back one tab; a no-op on the first tab
    pub fn back(&mut self) -> Result<Tab> {
        let tab = self.editing_tab()?;
        let tabs = self.tabs();
        let previous = tabs
            .iter()
            .position(|t| *t == tab)
            .and_then(|i| i.checked_sub(1))
            .map(|i| tabs[i])
            .unwrap_or(tab);
        self.step = WizardStep::Editing(previous);
        Ok(previous)
    }

    /// Jump to a tab. Backward is free; forward passes through each intermediate
    /// tab's validation and stops at the first failure.
    pub fn select(&mut self, target: Tab) -> Result<Tab> {
        let current = self.editing_tab()?;
        if !self.tabs().contains(&target) {
            return Err(GrantError::InvalidState(format!(
                "{} tab is not available for this program",
                target
            )));
        }

        if target <= current {
            self.step = WizardStep::Editing(target);
            return Ok(target);
        }

        while self.editing_tab()? < target {
            self.advance()?;
        }
        Ok(target)
    }

    /// Validate every tab and submit in one remote call. Missing fields raise a
    /// single aggregate notification and nothing is sent. On remote failure the
    /// draft is kept so the user can retry.
    pub async fn submit(&mut self) -> Result<Program> {
        self.editing_tab()?;

        let errors = ValidationEngine::validate_all(self.tabs(), &self.draft, self.mode.is_published());
        if !errors.is_empty() {
            self.notifier.notify(
                &format!("Please complete the required fields: {}", errors),
                Severity::Error,
            );
            self.errors = errors.clone();
            return Err(GrantError::Validation(errors));
        }

        if !self.mode.is_published() {
            self.upload_selected_image().await?;
        }

        let payload = match &self.mode {
            ProgramMode::Published { locked, .. } => ProgramPayload::published(&self.draft, locked),
            ProgramMode::New | ProgramMode::Unpublished { .. } => {
                ProgramPayload::full(&self.draft).map_err(|errors| {
                    self.notifier.notify(
                        &format!("Please complete the required fields: {}", errors),
                        Severity::Error,
                    );
                    self.errors = errors.clone();
                    GrantError::Validation(errors)
                })?
            }
        };

        let result = match self.mode.program_id() {
            Some(id) => self.programs.update(id, &payload).await,
            None => self.programs.create(&payload).await,
        };

        let program = match result {
            Ok(program) => program,
            Err(e) => {
                warn!("Submission of '{}' failed: {}", payload.name(), e);
                self.notifier.notify(&e.user_message(), Severity::Error);
                return Err(e);
            }
        };

        if self.mode == ProgramMode::New {
            if let Err(e) = self.drafts.clear() {
                warn!("Could not clear local draft after submission: {}", e);
            }
            self.notifier.notify("Program created", Severity::Success);
        } else {
            self.notifier.notify("Program updated", Severity::Success);
        }

        info!("Submitted program {} ({})", program.id, program.name);
        self.draft = ProgramDraft::default();
        self.errors.clear();
        self.step = WizardStep::Submitted {
            program_id: program.id.clone(),
        };
        Ok(program)
    }

    /// Upload a newly selected image; the draft then refers to it like a
    /// pre-existing one so a retried submit does not upload it again
    async fn upload_selected_image(&mut self) -> Result<()> {
        let Some(file) = self.draft.image.as_ref() else {
            return Ok(());
        };

        let url = match self.programs.upload_image(file).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Upload of {} failed: {}", file.file_name, e);
                self.notifier.notify(&e.user_message(), Severity::Error);
                return Err(e);
            }
        };

        debug!("Uploaded program image to {}", url);
        self.draft.existing_image = Some(url);
        self.draft.image = None;
        Ok(())
    }

    /// Persist everything except the selected image file. Local drafts only
    /// exist for new programs.
    pub fn save_draft(&self) -> Result<()> {
        self.require_new("save a local draft")?;
        self.drafts.set(&self.draft)
    }

    /// Replace the draft with the stored snapshot, keeping the selected image.
    /// Returns false when nothing is stored.
    pub fn restore_draft(&mut self) -> Result<bool> {
        self.require_new("restore a local draft")?;
        match self.drafts.get()? {
            Some(mut stored) => {
                stored.image = self.draft.image.take();
                self.draft = stored;
                self.errors.clear();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Discard the edits and start over on Overview. New programs also lose
    /// their stored draft; existing programs go back to the remote values.
    pub fn reset(&mut self) -> Result<()> {
        match &self.origin {
            Some(origin) => self.draft = origin.clone(),
            None => {
                self.drafts.clear()?;
                self.draft = ProgramDraft::default();
            }
        }
        self.errors.clear();
        self.step = WizardStep::Editing(Tab::Overview);
        Ok(())
    }

    fn require_new(&self, action: &str) -> Result<()> {
        match self.mode.program_id() {
            None => Ok(()),
            Some(id) => Err(GrantError::InvalidState(format!(
                "cannot {} while editing program {}",
                action, id
            ))),
        }
    }

    fn editing_tab(&self) -> Result<Tab> {
        self.current_tab()
            .ok_or_else(|| GrantError::InvalidState("wizard has already been submitted".to_string()))
    }

    fn next_tab(&self, tab: Tab) -> Option<Tab> {
        let tabs = self.tabs();
        tabs.iter()
            .position(|t| *t == tab)
            .and_then(|i| tabs.get(i + 1))
            .copied()
    }
}
