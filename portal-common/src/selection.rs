//! Selection reconciler
//!
//! Holds the single "currently viewed lesson" and keeps it consistent with
//! the canonical tree.
//!
//! ```text
//!   Idle ──open──▶ Viewing ──start_edit──▶ Editing
//!    ▲               │  ▲                    │
//!    │             close└──── save/cancel ───┘
//!    └──────── (lesson no longer resolves) ──┘
//! ```
//!
//! [`SelectionReconciler::reconcile`] must run after every tree mutation; the
//! store does this on its single mutation path.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{create_lesson, update_lesson};
use crate::error::{Error, Result};
use crate::model::{Lesson, LessonDraft, Organization, Organizations};
use crate::resolver::{resolve, resolve_lesson, LessonPath, ModulePath, TreePath};

/// What the in-progress draft will be committed as
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    /// Editing a lesson that exists; `lesson` is the held (viewed) copy
    Existing { path: LessonPath, lesson: Lesson },
    /// Composing a new lesson for a module
    New { module: ModulePath },
}

/// Current selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Idle,
    Viewing {
        path: LessonPath,
        lesson: Lesson,
    },
    Editing {
        target: EditTarget,
        draft: LessonDraft,
    },
}

/// Coarse selection state, for events and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SelectionState {
    Idle,
    Viewing,
    Editing,
}

/// Result of reconciling the selection against a new tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Held lesson still matches the canonical copy (or nothing is held)
    Unchanged,
    /// Held lesson was refreshed from the canonical copy
    Refreshed,
    /// Held lesson (or target module) no longer resolves; now Idle
    Cleared,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionReconciler {
    selection: Selection,
}

impl SelectionReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn state(&self) -> SelectionState {
        match self.selection {
            Selection::Idle => SelectionState::Idle,
            Selection::Viewing { .. } => SelectionState::Viewing,
            Selection::Editing { .. } => SelectionState::Editing,
        }
    }

    /// The held lesson, while viewing or editing an existing lesson
    pub fn viewed(&self) -> Option<&Lesson> {
        match &self.selection {
            Selection::Viewing { lesson, .. } => Some(lesson),
            Selection::Editing {
                target: EditTarget::Existing { lesson, .. },
                ..
            } => Some(lesson),
            _ => None,
        }
    }

    /// Path of the held lesson, while viewing or editing an existing lesson
    pub fn viewed_path(&self) -> Option<&LessonPath> {
        match &self.selection {
            Selection::Viewing { path, .. } => Some(path),
            Selection::Editing {
                target: EditTarget::Existing { path, .. },
                ..
            } => Some(path),
            _ => None,
        }
    }

    pub fn draft(&self) -> Option<&LessonDraft> {
        match &self.selection {
            Selection::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut LessonDraft> {
        match &mut self.selection {
            Selection::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Open a lesson for viewing, replacing any current selection
    pub fn open(&mut self, orgs: &[Organization], path: LessonPath) -> Result<()> {
        let lesson = resolve_lesson(orgs, &path)
            .ok_or_else(|| Error::not_found(&path))?
            .clone();
        debug!("Selection: viewing {}", path);
        self.selection = Selection::Viewing { path, lesson };
        Ok(())
    }

    /// Viewing → Editing, with the draft initialized from the viewed lesson
    pub fn start_edit(&mut self) -> Result<()> {
        match std::mem::take(&mut self.selection) {
            Selection::Viewing { path, lesson } => {
                let draft = lesson.to_draft();
                self.selection = Selection::Editing {
                    target: EditTarget::Existing { path, lesson },
                    draft,
                };
                Ok(())
            }
            other => {
                self.selection = other;
                Err(Error::InvalidState("no lesson is being viewed".to_string()))
            }
        }
    }

    /// Start composing a new lesson in `module`
    pub fn start_new(&mut self, orgs: &[Organization], module: ModulePath, draft: LessonDraft) -> Result<()> {
        let path = TreePath::Module(module.clone());
        if resolve(orgs, &path).is_none() {
            return Err(Error::not_found(path));
        }
        self.selection = Selection::Editing {
            target: EditTarget::New { module },
            draft,
        };
        Ok(())
    }

    /// Commit the draft and return the new collection
    ///
    /// Editing → Viewing: the viewed reference becomes the committed lesson.
    /// On error the selection is left as it was.
    pub fn save(&mut self, orgs: &[Organization]) -> Result<Organizations> {
        let (target, draft) = match &self.selection {
            Selection::Editing { target, draft } => (target, draft.clone()),
            _ => return Err(Error::InvalidState("no draft to save".to_string())),
        };

        let (next, path) = match target {
            EditTarget::Existing { path, .. } => {
                let committed = Lesson::from_draft(path.lesson_id.clone(), draft);
                let next = update_lesson(orgs, &path.module(), committed)?;
                (next, path.clone())
            }
            EditTarget::New { module } => {
                let inserted = create_lesson(orgs, module, draft)?;
                let path = module.lesson(&inserted.id);
                (inserted.organizations, path)
            }
        };

        let lesson = resolve_lesson(&next, &path)
            .ok_or_else(|| Error::not_found(&path))?
            .clone();
        debug!("Selection: saved {}", path);
        self.selection = Selection::Viewing { path, lesson };
        Ok(next)
    }

    /// Discard the draft; back to viewing the unchanged lesson (or Idle for
    /// a new lesson that was never saved)
    pub fn cancel(&mut self) {
        if !matches!(self.selection, Selection::Editing { .. }) {
            return;
        }
        if let Selection::Editing { target, .. } = std::mem::take(&mut self.selection) {
            self.selection = match target {
                EditTarget::Existing { path, lesson } => Selection::Viewing { path, lesson },
                EditTarget::New { .. } => Selection::Idle,
            };
        }
    }

    pub fn close(&mut self) {
        self.selection = Selection::Idle;
    }

    /// Bring the held lesson in line with `orgs`
    pub fn reconcile(&mut self, orgs: &[Organization]) -> ReconcileOutcome {
        let outcome = match &mut self.selection {
            Selection::Idle => ReconcileOutcome::Unchanged,
            Selection::Viewing { path, lesson } => match resolve_lesson(orgs, path) {
                None => ReconcileOutcome::Cleared,
                Some(canonical) if *canonical != *lesson => {
                    *lesson = canonical.clone();
                    ReconcileOutcome::Refreshed
                }
                Some(_) => ReconcileOutcome::Unchanged,
            },
            Selection::Editing {
                target: EditTarget::Existing { path, lesson },
                draft,
            } => match resolve_lesson(orgs, path) {
                None => ReconcileOutcome::Cleared,
                Some(canonical) if *canonical != *lesson => {
                    rebase_draft(draft, lesson, canonical);
                    *lesson = canonical.clone();
                    ReconcileOutcome::Refreshed
                }
                Some(_) => ReconcileOutcome::Unchanged,
            },
            Selection::Editing {
                target: EditTarget::New { module },
                ..
            } => match resolve(orgs, &TreePath::Module(module.clone())) {
                None => ReconcileOutcome::Cleared,
                Some(_) => ReconcileOutcome::Unchanged,
            },
        };

        if outcome == ReconcileOutcome::Cleared {
            debug!("Selection: held node no longer resolves, clearing");
            self.selection = Selection::Idle;
        }
        outcome
    }
}

/// Carry canonical changes into fields the draft has not edited
fn rebase_draft(draft: &mut LessonDraft, held: &Lesson, canonical: &Lesson) {
    macro_rules! rebase {
        ($($field:ident),*) => {
            $(if draft.$field == held.$field {
                draft.$field = canonical.$field.clone();
            })*
        };
    }
    rebase!(
        title,
        description,
        thumbnail,
        video_url,
        duration,
        completed,
        transcription,
        quiz_url,
        ai_summary,
        ai_quiz
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{delete_lesson, delete_module, delete_phase, toggle_lesson_completion};
    use crate::seed::demo_organizations;

    fn l1() -> LessonPath {
        LessonPath::new("c1", "p1", "w1", "l1")
    }

    #[test]
    fn test_open_and_close() {
        let orgs = demo_organizations();
        let mut selection = SelectionReconciler::new();
        assert_eq!(selection.state(), SelectionState::Idle);

        selection.open(&orgs, l1()).unwrap();
        assert_eq!(selection.state(), SelectionState::Viewing);
        assert_eq!(selection.viewed().unwrap().id, "l1");

        selection.close();
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn test_open_unresolvable_lesson_stays_idle() {
        let orgs = demo_organizations();
        let mut selection = SelectionReconciler::new();
        let err = selection.open(&orgs, LessonPath::new("c1", "p1", "w1", "l404")).unwrap_err();
        assert!(err.is_path_not_found());
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn test_start_edit_requires_viewing() {
        let mut selection = SelectionReconciler::new();
        assert!(matches!(selection.start_edit(), Err(Error::InvalidState(_))));
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn test_edit_save_commits_and_views_result() {
        let orgs = demo_organizations();
        let mut selection = SelectionReconciler::new();
        selection.open(&orgs, l1()).unwrap();
        selection.start_edit().unwrap();
        selection.draft_mut().unwrap().title = "Intro (updated)".to_string();

        let next = selection.save(&orgs).unwrap();
        assert_eq!(selection.state(), SelectionState::Viewing);
        assert_eq!(selection.viewed().unwrap().title, "Intro (updated)");
        assert_eq!(resolve_lesson(&next, &l1()).unwrap().title, "Intro (updated)");
    }

    #[test]
    fn test_cancel_discards_draft() {
        let orgs = demo_organizations();
        let mut selection = SelectionReconciler::new();
        selection.open(&orgs, l1()).unwrap();
        selection.start_edit().unwrap();
        selection.draft_mut().unwrap().title = "Throwaway".to_string();

        selection.cancel();
        assert_eq!(selection.state(), SelectionState::Viewing);
        assert_eq!(selection.viewed().unwrap().title, "Intro a la IA Generativa");
    }

    #[test]
    fn test_new_lesson_save_creates_it() {
        let orgs = demo_organizations();
        let mut selection = SelectionReconciler::new();
        let module = ModulePath::new("c1", "p1", "w1");
        selection.start_new(&orgs, module.clone(), LessonDraft::new("Fresh")).unwrap();
        assert!(selection.viewed().is_none());

        let next = selection.save(&orgs).unwrap();
        let path = selection.viewed_path().unwrap().clone();
        assert_eq!(path.module(), module);
        assert_eq!(resolve_lesson(&next, &path).unwrap().title, "Fresh");
    }

    #[test]
    fn test_cancel_new_lesson_goes_idle() {
        let orgs = demo_organizations();
        let mut selection = SelectionReconciler::new();
        selection
            .start_new(&orgs, ModulePath::new("c1", "p1", "w1"), LessonDraft::new("x"))
            .unwrap();
        selection.cancel();
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn test_reconcile_refreshes_completion_badge() {
        let orgs = demo_organizations();
        let mut selection = SelectionReconciler::new();
        selection.open(&orgs, l1()).unwrap();
        assert!(selection.viewed().unwrap().completed);

        let next = toggle_lesson_completion(&orgs, &l1()).unwrap();
        assert_eq!(selection.reconcile(&next), ReconcileOutcome::Refreshed);
        assert_eq!(selection.state(), SelectionState::Viewing);
        assert!(!selection.viewed().unwrap().completed);

        assert_eq!(selection.reconcile(&next), ReconcileOutcome::Unchanged);
    }

    #[test]
    fn test_reconcile_clears_after_lesson_delete() {
        let orgs = demo_organizations();
        let mut selection = SelectionReconciler::new();
        selection.open(&orgs, l1()).unwrap();

        let next = delete_lesson(&orgs, &l1()).unwrap();
        assert_eq!(selection.reconcile(&next), ReconcileOutcome::Cleared);
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn test_reconcile_clears_after_cascading_module_delete() {
        let orgs = demo_organizations();
        let mut selection = SelectionReconciler::new();
        selection.open(&orgs, l1()).unwrap();

        let next = delete_module(&orgs, &ModulePath::new("c1", "p1", "w1")).unwrap();
        assert_eq!(selection.reconcile(&next), ReconcileOutcome::Cleared);
        assert!(resolve_lesson(&next, &l1()).is_none());
    }

    #[test]
    fn test_reconcile_clears_editing_after_phase_delete() {
        let orgs = demo_organizations();
        let mut selection = SelectionReconciler::new();
        selection.open(&orgs, l1()).unwrap();
        selection.start_edit().unwrap();

        let next = delete_phase(&orgs, "c1", "p1").unwrap();
        assert_eq!(selection.reconcile(&next), ReconcileOutcome::Cleared);
        assert!(selection.draft().is_none());
    }

    #[test]
    fn test_reconcile_while_editing_keeps_user_edits() {
        let orgs = demo_organizations();
        let mut selection = SelectionReconciler::new();
        selection.open(&orgs, l1()).unwrap();
        selection.start_edit().unwrap();
        selection.draft_mut().unwrap().title = "Edited title".to_string();

        let next = toggle_lesson_completion(&orgs, &l1()).unwrap();
        assert_eq!(selection.reconcile(&next), ReconcileOutcome::Refreshed);

        let draft = selection.draft().unwrap();
        assert_eq!(draft.title, "Edited title");
        assert!(!draft.completed);
        assert!(!selection.viewed().unwrap().completed);
    }
}
