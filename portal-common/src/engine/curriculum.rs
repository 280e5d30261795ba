//! Phase, module and lesson operations

use tracing::debug;

use super::{edit_lesson, edit_module, edit_organization, edit_phase, remove_at, replace_by_id, Inserted};
use crate::error::{Error, Result};
use crate::ids::{allocate, IdKind};
use crate::model::{Lesson, LessonDraft, Module, Organization, Organizations, Phase};
use crate::progress::recompute_progress;
use crate::resolver::{LessonPath, ModulePath, TreePath};

/// Append a phase with a fresh id and no modules
pub fn create_phase(orgs: &[Organization], organization_id: &str, title: &str) -> Result<Inserted> {
    let id = allocate(IdKind::Phase);
    let organizations = edit_organization(orgs, organization_id, |org| {
        org.phases.push(Phase {
            id: id.clone(),
            title: title.to_string(),
            modules: Vec::new(),
        });
        Ok(())
    })?;
    debug!("Created phase {} in {}", id, organization_id);
    Ok(Inserted { organizations, id })
}

/// Replace a phase title; id and modules untouched
pub fn rename_phase(orgs: &[Organization], organization_id: &str, phase_id: &str, title: &str) -> Result<Organizations> {
    edit_phase(orgs, &TreePath::phase(organization_id, phase_id), |phase| {
        phase.title = title.to_string();
        Ok(())
    })
}

/// Remove a phase with every module and lesson under it
pub fn delete_phase(orgs: &[Organization], organization_id: &str, phase_id: &str) -> Result<Organizations> {
    remove_at(orgs, &TreePath::phase(organization_id, phase_id))
}

/// Append a module with a fresh id and no lessons to a phase
pub fn create_module(orgs: &[Organization], organization_id: &str, phase_id: &str, title: &str) -> Result<Inserted> {
    let id = allocate(IdKind::Module);
    let organizations = edit_phase(orgs, &TreePath::phase(organization_id, phase_id), |phase| {
        phase.modules.push(Module {
            id: id.clone(),
            title: title.to_string(),
            lessons: Vec::new(),
        });
        Ok(())
    })?;
    Ok(Inserted { organizations, id })
}

pub fn rename_module(orgs: &[Organization], path: &ModulePath, title: &str) -> Result<Organizations> {
    edit_module(orgs, &TreePath::Module(path.clone()), |module| {
        module.title = title.to_string();
        Ok(())
    })
}

/// Remove a module with all of its lessons
pub fn delete_module(orgs: &[Organization], path: &ModulePath) -> Result<Organizations> {
    remove_at(orgs, &TreePath::Module(path.clone()))
}

/// Append a lesson built from `draft` with an engine-assigned id
pub fn create_lesson(orgs: &[Organization], path: &ModulePath, draft: LessonDraft) -> Result<Inserted> {
    let id = allocate(IdKind::Lesson);
    let lesson = Lesson::from_draft(id.clone(), draft);
    let organizations = edit_module(orgs, &TreePath::Module(path.clone()), |module| {
        module.lessons.push(lesson);
        Ok(())
    })?;
    Ok(Inserted { organizations, id })
}

/// Replace the lesson whose id matches `lesson.id` in the addressed module
pub fn update_lesson(orgs: &[Organization], path: &ModulePath, lesson: Lesson) -> Result<Organizations> {
    let lesson_path = TreePath::Lesson(path.lesson(&lesson.id));
    edit_module(orgs, &TreePath::Module(path.clone()), |module| {
        replace_by_id(&mut module.lessons, lesson)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(&lesson_path))
    })
}

pub fn delete_lesson(orgs: &[Organization], path: &LessonPath) -> Result<Organizations> {
    remove_at(orgs, &TreePath::Lesson(path.clone()))
}

/// Flip a lesson's completed flag and re-project organization progress
///
/// Both steps happen on the same copy, so no caller ever observes the
/// flipped flag with stale user progress.
pub fn toggle_lesson_completion(orgs: &[Organization], path: &LessonPath) -> Result<Organizations> {
    let mut next = edit_lesson(orgs, &TreePath::Lesson(path.clone()), |lesson| {
        lesson.completed = !lesson.completed;
        Ok(())
    })?;

    if let Some(org) = next.iter_mut().find(|o| o.id == path.organization_id) {
        recompute_progress(org);
    }
    Ok(next)
}
