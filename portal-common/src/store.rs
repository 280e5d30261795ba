//! Portal store
//!
//! [`PortalStore`] owns the organization collection together with the
//! selection reconciler and the event bus. It is the one mutation path:
//! each method runs a pure engine transform, swaps in the result, reconciles
//! the selection against it and announces the change.
//!
//! A stale path is not an error at this level. The engine reports
//! [`Error::PathNotFound`], the store keeps its collection and answers
//! [`MutationOutcome::NoOp`]. Validation and generation failures propagate.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::auth::{login, LoginOutcome, LoginRequest};
use crate::config::MasterConfig;
use crate::engine::{self, edit_organization, Inserted, OrganizationPatch};
use crate::error::{Error, Result};
use crate::events::{EventBus, PortalEvent, RosterChange, StructureChange};
use crate::generation::{apply_lesson_content, with_timeout, ContentGenerator};
use crate::import::{import_structure, StructurePayload};
use crate::interchange::{export_organization, from_snapshot, import_organization_text, to_snapshot};
use crate::model::{Lesson, LessonDraft, NewResource, NewUser, Organization, Organizations, StudyResource, User};
use crate::progress::{completion_percentage, recompute_progress};
use crate::resolver::{find_organization, resolve_lesson, LessonPath, ModulePath};
use crate::seed::demo_organizations;
use crate::selection::{ReconcileOutcome, SelectionReconciler, SelectionState};
use crate::time;

/// Async handle shared between tasks
pub type SharedPortal = Arc<RwLock<PortalStore>>;

/// Result of a store mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The collection changed
    Applied,
    /// A node was inserted under this fresh id
    Created(String),
    /// The target path no longer resolves; nothing changed
    NoOp,
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, MutationOutcome::NoOp)
    }

    pub fn created_id(&self) -> Option<&str> {
        match self {
            MutationOutcome::Created(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct PortalStore {
    organizations: Organizations,
    selection: SelectionReconciler,
    events: EventBus,
}

impl PortalStore {
    pub fn new(organizations: Organizations) -> Self {
        Self::with_event_bus(organizations, EventBus::default())
    }

    pub fn with_event_bus(organizations: Organizations, events: EventBus) -> Self {
        Self {
            organizations,
            selection: SelectionReconciler::new(),
            events,
        }
    }

    /// Store seeded with the built-in demo tenants
    pub fn with_demo_data() -> Self {
        Self::new(demo_organizations())
    }

    /// Load a snapshot file written by [`PortalStore::save_snapshot`]
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let organizations = from_snapshot(&text)?;
        info!(
            "Loaded {} organizations from {}",
            organizations.len(),
            path.display()
        );
        Ok(Self::new(organizations))
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        std::fs::write(path, to_snapshot(&self.organizations)?)?;
        debug!("Wrote snapshot to {}", path.display());
        Ok(())
    }

    pub fn into_shared(self) -> SharedPortal {
        Arc::new(RwLock::new(self))
    }

    // ========================================
    // Read access
    // ========================================

    pub fn organizations(&self) -> &[Organization] {
        &self.organizations
    }

    pub fn organization(&self, organization_id: &str) -> Option<&Organization> {
        find_organization(&self.organizations, organization_id)
    }

    pub fn selection(&self) -> &SelectionReconciler {
        &self.selection
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PortalEvent> {
        self.events.subscribe()
    }

    pub fn export_organization(&self, organization_id: &str) -> Result<String> {
        export_organization(&self.organizations, organization_id)
    }

    // ========================================
    // Organizations
    // ========================================

    pub fn create_organization(&mut self, name: &str, theme_color: &str) -> Result<MutationOutcome> {
        let result = engine::create_organization(&self.organizations, name, theme_color);
        let outcome = self.apply_insert("create_organization", name, result)?;
        if let Some(id) = outcome.created_id() {
            self.events.emit_lossy(PortalEvent::OrganizationCreated {
                organization_id: id.to_string(),
                timestamp: time::now(),
            });
        }
        Ok(outcome)
    }

    pub fn delete_organization(&mut self, organization_id: &str) -> Result<MutationOutcome> {
        let result = engine::delete_organization(&self.organizations, organization_id);
        let outcome = self.apply("delete_organization", organization_id, result)?;
        if outcome.is_applied() {
            self.events.emit_lossy(PortalEvent::OrganizationDeleted {
                organization_id: organization_id.to_string(),
                timestamp: time::now(),
            });
        }
        Ok(outcome)
    }

    pub fn update_organization(&mut self, organization_id: &str, patch: &OrganizationPatch) -> Result<MutationOutcome> {
        let result = engine::update_organization(&self.organizations, organization_id, patch);
        let outcome = self.apply("update_organization", organization_id, result)?;
        self.announce_organization_update(organization_id, &outcome);
        Ok(outcome)
    }

    /// Swap in an organization parsed from edited interchange text
    pub fn replace_organization_text(&mut self, organization_id: &str, text: &str) -> Result<MutationOutcome> {
        let result = import_organization_text(&self.organizations, organization_id, text);
        let outcome = self.apply("replace_organization", organization_id, result)?;
        self.announce_organization_update(organization_id, &outcome);
        Ok(outcome)
    }

    // ========================================
    // Curriculum
    // ========================================

    pub fn create_phase(&mut self, organization_id: &str, title: &str) -> Result<MutationOutcome> {
        let result = engine::create_phase(&self.organizations, organization_id, title);
        let outcome = self.apply_insert("create_phase", organization_id, result)?;
        self.announce_structure(organization_id, StructureChange::PhaseCreated, &outcome, None);
        Ok(outcome)
    }

    pub fn rename_phase(&mut self, organization_id: &str, phase_id: &str, title: &str) -> Result<MutationOutcome> {
        let result = engine::rename_phase(&self.organizations, organization_id, phase_id, title);
        let outcome = self.apply("rename_phase", organization_id, result)?;
        self.announce_structure(organization_id, StructureChange::PhaseRenamed, &outcome, Some(phase_id));
        Ok(outcome)
    }

    pub fn delete_phase(&mut self, organization_id: &str, phase_id: &str) -> Result<MutationOutcome> {
        let result = engine::delete_phase(&self.organizations, organization_id, phase_id);
        let outcome = self.apply("delete_phase", organization_id, result)?;
        self.announce_structure(organization_id, StructureChange::PhaseDeleted, &outcome, Some(phase_id));
        Ok(outcome)
    }

    pub fn create_module(&mut self, organization_id: &str, phase_id: &str, title: &str) -> Result<MutationOutcome> {
        let result = engine::create_module(&self.organizations, organization_id, phase_id, title);
        let outcome = self.apply_insert("create_module", organization_id, result)?;
        self.announce_structure(organization_id, StructureChange::ModuleCreated, &outcome, None);
        Ok(outcome)
    }

    pub fn rename_module(&mut self, path: &ModulePath, title: &str) -> Result<MutationOutcome> {
        let result = engine::rename_module(&self.organizations, path, title);
        let outcome = self.apply("rename_module", &path.organization_id, result)?;
        self.announce_structure(&path.organization_id, StructureChange::ModuleRenamed, &outcome, Some(&path.module_id));
        Ok(outcome)
    }

    pub fn delete_module(&mut self, path: &ModulePath) -> Result<MutationOutcome> {
        let result = engine::delete_module(&self.organizations, path);
        let outcome = self.apply("delete_module", &path.organization_id, result)?;
        self.announce_structure(&path.organization_id, StructureChange::ModuleDeleted, &outcome, Some(&path.module_id));
        Ok(outcome)
    }

    pub fn create_lesson(&mut self, path: &ModulePath, draft: LessonDraft) -> Result<MutationOutcome> {
        let result = engine::create_lesson(&self.organizations, path, draft);
        let outcome = self.apply_insert("create_lesson", &path.organization_id, result)?;
        self.announce_structure(&path.organization_id, StructureChange::LessonCreated, &outcome, None);
        Ok(outcome)
    }

    pub fn update_lesson(&mut self, path: &ModulePath, lesson: Lesson) -> Result<MutationOutcome> {
        let lesson_id = lesson.id.clone();
        let result = engine::update_lesson(&self.organizations, path, lesson);
        let outcome = self.apply("update_lesson", &path.organization_id, result)?;
        self.announce_structure(&path.organization_id, StructureChange::LessonUpdated, &outcome, Some(&lesson_id));
        Ok(outcome)
    }

    pub fn delete_lesson(&mut self, path: &LessonPath) -> Result<MutationOutcome> {
        let result = engine::delete_lesson(&self.organizations, path);
        let outcome = self.apply("delete_lesson", &path.organization_id, result)?;
        self.announce_structure(&path.organization_id, StructureChange::LessonDeleted, &outcome, Some(&path.lesson_id));
        Ok(outcome)
    }

    /// Flip a lesson's completed flag; every roster entry gets the new percentage
    pub fn toggle_lesson_completion(&mut self, path: &LessonPath) -> Result<MutationOutcome> {
        let result = engine::toggle_lesson_completion(&self.organizations, path);
        let outcome = self.apply("toggle_lesson_completion", &path.organization_id, result)?;
        if outcome.is_applied() {
            let completed = resolve_lesson(&self.organizations, path).is_some_and(|l| l.completed);
            self.events.emit_lossy(PortalEvent::LessonCompletionToggled {
                organization_id: path.organization_id.clone(),
                lesson_id: path.lesson_id.clone(),
                completed,
                timestamp: time::now(),
            });
            self.announce_progress(&path.organization_id);
        }
        Ok(outcome)
    }

    /// Re-project the organization's completion percentage onto its roster
    pub fn recompute_progress(&mut self, organization_id: &str) -> Result<MutationOutcome> {
        let result = edit_organization(&self.organizations, organization_id, |org| {
            recompute_progress(org);
            Ok(())
        });
        let outcome = self.apply("recompute_progress", organization_id, result)?;
        if outcome.is_applied() {
            self.announce_progress(organization_id);
        }
        Ok(outcome)
    }

    /// Append a payload verbatim
    ///
    /// Progress is re-projected afterwards only when the payload brings
    /// completed lessons with it.
    pub fn import_structure(&mut self, organization_id: &str, payload: StructurePayload) -> Result<MutationOutcome> {
        let counts = payload.counts();
        let had_completed = payload.has_completed_lessons();
        let result = import_structure(&self.organizations, organization_id, payload);
        let outcome = self.apply("import_structure", organization_id, result)?;
        if outcome.is_applied() {
            self.events.emit_lossy(PortalEvent::StructureImported {
                organization_id: organization_id.to_string(),
                counts,
                timestamp: time::now(),
            });
            if had_completed {
                self.recompute_progress(organization_id)?;
            }
        }
        Ok(outcome)
    }

    // ========================================
    // Roster, resources and posts
    // ========================================

    pub fn add_user(&mut self, organization_id: &str, new: NewUser) -> Result<MutationOutcome> {
        let result = engine::add_user(&self.organizations, organization_id, new);
        let outcome = self.apply_insert("add_user", organization_id, result)?;
        self.announce_roster(organization_id, RosterChange::UserAdded, &outcome, None);
        Ok(outcome)
    }

    pub fn update_user(&mut self, organization_id: &str, user: User) -> Result<MutationOutcome> {
        let user_id = user.id.clone();
        let result = engine::update_user(&self.organizations, organization_id, user);
        let outcome = self.apply("update_user", organization_id, result)?;
        self.announce_roster(organization_id, RosterChange::UserUpdated, &outcome, Some(&user_id));
        Ok(outcome)
    }

    pub fn delete_user(&mut self, organization_id: &str, user_id: &str) -> Result<MutationOutcome> {
        let result = engine::delete_user(&self.organizations, organization_id, user_id);
        let outcome = self.apply("delete_user", organization_id, result)?;
        self.announce_roster(organization_id, RosterChange::UserRemoved, &outcome, Some(user_id));
        Ok(outcome)
    }

    pub fn add_resource(&mut self, organization_id: &str, new: NewResource) -> Result<MutationOutcome> {
        let result = engine::add_resource(&self.organizations, organization_id, new);
        let outcome = self.apply_insert("add_resource", organization_id, result)?;
        self.announce_roster(organization_id, RosterChange::ResourceAdded, &outcome, None);
        Ok(outcome)
    }

    pub fn update_resource(&mut self, organization_id: &str, resource: StudyResource) -> Result<MutationOutcome> {
        let resource_id = resource.id.clone();
        let result = engine::update_resource(&self.organizations, organization_id, resource);
        let outcome = self.apply("update_resource", organization_id, result)?;
        self.announce_roster(organization_id, RosterChange::ResourceUpdated, &outcome, Some(&resource_id));
        Ok(outcome)
    }

    pub fn delete_resource(&mut self, organization_id: &str, resource_id: &str) -> Result<MutationOutcome> {
        let result = engine::delete_resource(&self.organizations, organization_id, resource_id);
        let outcome = self.apply("delete_resource", organization_id, result)?;
        self.announce_roster(organization_id, RosterChange::ResourceRemoved, &outcome, Some(resource_id));
        Ok(outcome)
    }

    pub fn add_post(&mut self, organization_id: &str, author_id: &str, content: &str) -> Result<MutationOutcome> {
        let result = engine::add_post(&self.organizations, organization_id, author_id, content);
        let outcome = self.apply_insert("add_post", organization_id, result)?;
        self.announce_roster(organization_id, RosterChange::PostAdded, &outcome, None);
        Ok(outcome)
    }

    pub fn delete_post(&mut self, organization_id: &str, post_id: &str) -> Result<MutationOutcome> {
        let result = engine::delete_post(&self.organizations, organization_id, post_id);
        let outcome = self.apply("delete_post", organization_id, result)?;
        self.announce_roster(organization_id, RosterChange::PostRemoved, &outcome, Some(post_id));
        Ok(outcome)
    }

    /// Check credentials; a session user created on the way is kept
    pub fn login(&mut self, request: &LoginRequest, master: &MasterConfig) -> Result<LoginOutcome> {
        let outcome = login(&self.organizations, request, master)?;
        if outcome.organizations != self.organizations {
            if let Some(organization_id) = outcome.organization_id.clone() {
                let result = Ok(outcome.organizations.clone());
                let applied = self.apply("login", &organization_id, result)?;
                self.announce_roster(&organization_id, RosterChange::UserAdded, &applied, Some(&outcome.user.id));
            }
        }
        Ok(outcome)
    }

    // ========================================
    // Selection
    // ========================================

    pub fn open_lesson(&mut self, path: LessonPath) -> Result<()> {
        let before = self.selection.state();
        self.selection.open(&self.organizations, path)?;
        self.announce_selection(before);
        Ok(())
    }

    pub fn start_edit(&mut self) -> Result<()> {
        let before = self.selection.state();
        self.selection.start_edit()?;
        self.announce_selection(before);
        Ok(())
    }

    pub fn start_new_lesson(&mut self, module: ModulePath, draft: LessonDraft) -> Result<()> {
        let before = self.selection.state();
        self.selection.start_new(&self.organizations, module, draft)?;
        self.announce_selection(before);
        Ok(())
    }

    pub fn draft_mut(&mut self) -> Option<&mut LessonDraft> {
        self.selection.draft_mut()
    }

    /// Commit the in-progress draft through the engine
    pub fn save_draft(&mut self) -> Result<MutationOutcome> {
        let before = self.selection.state();
        let next = match self.selection.save(&self.organizations) {
            Ok(next) => next,
            Err(Error::PathNotFound(path)) => {
                debug!("save_draft skipped: {} no longer resolves", path);
                return Ok(MutationOutcome::NoOp);
            }
            Err(e) => return Err(e),
        };
        self.commit(next);
        info!("Saved lesson draft");
        self.announce_selection(before);
        Ok(MutationOutcome::Applied)
    }

    pub fn cancel_edit(&mut self) {
        let before = self.selection.state();
        self.selection.cancel();
        self.announce_selection(before);
    }

    pub fn close_lesson(&mut self) {
        let before = self.selection.state();
        self.selection.close();
        self.announce_selection(before);
    }

    // ========================================
    // Internals
    // ========================================

    fn apply(&mut self, operation: &str, organization_id: &str, result: Result<Organizations>) -> Result<MutationOutcome> {
        match result {
            Ok(next) => {
                self.commit(next);
                info!("{} applied to {}", operation, organization_id);
                Ok(MutationOutcome::Applied)
            }
            Err(Error::PathNotFound(path)) => {
                debug!("{} skipped: {} no longer resolves", operation, path);
                Ok(MutationOutcome::NoOp)
            }
            Err(e) => {
                warn!("{} rejected for {}: {}", operation, organization_id, e);
                Err(e)
            }
        }
    }

    fn apply_insert(&mut self, operation: &str, organization_id: &str, result: Result<Inserted>) -> Result<MutationOutcome> {
        let mut created = None;
        let result = result.map(|inserted| {
            created = Some(inserted.id);
            inserted.organizations
        });
        let outcome = self.apply(operation, organization_id, result)?;
        Ok(match (outcome, created) {
            (MutationOutcome::Applied, Some(id)) => MutationOutcome::Created(id),
            (outcome, _) => outcome,
        })
    }

    /// Swap in a new collection and bring the selection in line with it
    fn commit(&mut self, next: Organizations) {
        let before = self.selection.state();
        self.organizations = next;
        if self.selection.reconcile(&self.organizations) == ReconcileOutcome::Cleared {
            info!("Selected lesson was removed; selection cleared");
        }
        self.announce_selection(before);
    }

    fn announce_selection(&self, before: SelectionState) {
        let state = self.selection.state();
        if state != before {
            self.events.emit_lossy(PortalEvent::SelectionChanged {
                state,
                timestamp: time::now(),
            });
        }
    }

    fn announce_organization_update(&self, organization_id: &str, outcome: &MutationOutcome) {
        if outcome.is_applied() {
            self.events.emit_lossy(PortalEvent::OrganizationUpdated {
                organization_id: organization_id.to_string(),
                timestamp: time::now(),
            });
        }
    }

    fn announce_structure(
        &self,
        organization_id: &str,
        change: StructureChange,
        outcome: &MutationOutcome,
        node_id: Option<&str>,
    ) {
        let Some(node_id) = outcome.created_id().or(node_id) else {
            return;
        };
        if outcome.is_applied() {
            self.events.emit_lossy(PortalEvent::StructureChanged {
                organization_id: organization_id.to_string(),
                change,
                node_id: node_id.to_string(),
                timestamp: time::now(),
            });
        }
    }

    fn announce_roster(&self, organization_id: &str, change: RosterChange, outcome: &MutationOutcome, item_id: Option<&str>) {
        let Some(item_id) = outcome.created_id().or(item_id) else {
            return;
        };
        if outcome.is_applied() {
            self.events.emit_lossy(PortalEvent::RosterChanged {
                organization_id: organization_id.to_string(),
                change,
                item_id: item_id.to_string(),
                timestamp: time::now(),
            });
        }
    }

    fn announce_progress(&self, organization_id: &str) {
        if let Some(org) = self.organization(organization_id) {
            self.events.emit_lossy(PortalEvent::ProgressRecomputed {
                organization_id: organization_id.to_string(),
                completion_percentage: completion_percentage(org),
                timestamp: time::now(),
            });
        }
    }
}

// ========================================
// Asynchronous operations
// ========================================

/// Generate a program for an organization and append it
///
/// The generator runs without the store lock held, so other mutations can
/// proceed meanwhile. The payload's identifiers are replaced with freshly
/// allocated ones before merging. If the organization was deleted while the
/// call was pending, the result is dropped and the outcome is `NoOp`.
pub async fn genesis(
    shared: &SharedPortal,
    organization_id: &str,
    prompt: &str,
    generator: &dyn ContentGenerator,
    limit: Duration,
) -> Result<MutationOutcome> {
    if shared.read().await.organization(organization_id).is_none() {
        debug!("genesis skipped: organization {} not found", organization_id);
        return Ok(MutationOutcome::NoOp);
    }

    info!("Generating structure for {} with {} generator", organization_id, generator.name());
    let mut payload = with_timeout(limit, generator.generate_structure(prompt)).await?;
    if payload.is_empty() {
        return Err(Error::Generation("generator returned an empty structure".to_string()));
    }
    payload.reassign_identifiers();

    shared.write().await.import_structure(organization_id, payload)
}

/// Generate a summary and quiz for one lesson and store them on it
pub async fn generate_lesson_content(
    shared: &SharedPortal,
    path: &LessonPath,
    generator: &dyn ContentGenerator,
    limit: Duration,
) -> Result<MutationOutcome> {
    let (title, context) = {
        let store = shared.read().await;
        match resolve_lesson(store.organizations(), path) {
            Some(lesson) => (lesson.title.clone(), lesson.description.clone()),
            None => {
                debug!("lesson content skipped: {} not found", path);
                return Ok(MutationOutcome::NoOp);
            }
        }
    };

    let content = with_timeout(limit, generator.generate_lesson(&title, &context)).await?;

    let mut store = shared.write().await;
    let result = apply_lesson_content(store.organizations(), path, content);
    let outcome = store.apply("generate_lesson_content", &path.organization_id, result)?;
    store.announce_structure(&path.organization_id, StructureChange::LessonUpdated, &outcome, Some(&path.lesson_id));
    Ok(outcome)
}
