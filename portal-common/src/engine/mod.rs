//! Mutation engine
//!
//! Every structural change is a pure transform over the whole collection:
//! the input slice is never touched, and a successful call returns a new
//! `Organizations` value. A stale identifier path yields
//! [`Error::PathNotFound`], meaning the caller keeps its input unchanged.
//!
//! All operations funnel through two path-based primitives, [`edit_at`] and
//! [`remove_at`], so no call site rebuilds the four nested levels by hand.

mod curriculum;
mod organization;
mod roster;

pub use curriculum::{
    create_lesson, create_module, create_phase, delete_lesson, delete_module, delete_phase,
    rename_module, rename_phase, toggle_lesson_completion, update_lesson,
};
pub use organization::{
    create_organization, delete_organization, replace_organization, update_organization,
    validate_replacement, OrganizationPatch,
};
pub use roster::{
    add_post, add_resource, add_user, delete_post, delete_resource, delete_user, update_resource,
    update_user,
};

use crate::error::{Error, Result};
use crate::model::{Identified, Lesson, Module, Organization, Organizations, Phase};
use crate::resolver::{resolve_mut, NodeMut, TreePath};

/// Outcome of an insertion: the new collection and the assigned identifier
#[derive(Debug, Clone)]
pub struct Inserted {
    pub organizations: Organizations,
    pub id: String,
}

// ========================================
// Path-based primitives
// ========================================

/// Copy the collection, apply `edit` to the node at `path`, return the copy
///
/// If `edit` fails the copy is dropped, so the caller's collection is never
/// left half-mutated.
pub fn edit_at<F>(orgs: &[Organization], path: &TreePath, edit: F) -> Result<Organizations>
where
    F: FnOnce(NodeMut<'_>) -> Result<()>,
{
    let mut next = orgs.to_vec();
    let node = resolve_mut(&mut next, path).ok_or_else(|| Error::not_found(path))?;
    edit(node)?;
    Ok(next)
}

/// Remove the node at `path` together with all of its descendants
pub fn remove_at(orgs: &[Organization], path: &TreePath) -> Result<Organizations> {
    let leaf = path.leaf_id().to_string();
    match path.parent() {
        None => {
            let mut next = orgs.to_vec();
            remove_by_id(&mut next, &leaf).ok_or_else(|| Error::not_found(path))?;
            Ok(next)
        }
        Some(parent) => edit_at(orgs, &parent, |node| {
            let removed = match node {
                NodeMut::Organization(org) => remove_by_id(&mut org.phases, &leaf).is_some(),
                NodeMut::Phase(phase) => remove_by_id(&mut phase.modules, &leaf).is_some(),
                NodeMut::Module(module) => remove_by_id(&mut module.lessons, &leaf).is_some(),
                NodeMut::Lesson(_) => false,
            };
            if removed {
                Ok(())
            } else {
                Err(Error::not_found(path))
            }
        }),
    }
}

pub(crate) fn edit_organization<F>(orgs: &[Organization], organization_id: &str, edit: F) -> Result<Organizations>
where
    F: FnOnce(&mut Organization) -> Result<()>,
{
    let path = TreePath::organization(organization_id);
    edit_at(orgs, &path, |node| match node {
        NodeMut::Organization(org) => edit(org),
        _ => Err(Error::not_found(&path)),
    })
}

pub(crate) fn edit_phase<F>(orgs: &[Organization], path: &TreePath, edit: F) -> Result<Organizations>
where
    F: FnOnce(&mut Phase) -> Result<()>,
{
    edit_at(orgs, path, |node| match node {
        NodeMut::Phase(phase) => edit(phase),
        _ => Err(Error::not_found(path)),
    })
}

pub(crate) fn edit_module<F>(orgs: &[Organization], path: &TreePath, edit: F) -> Result<Organizations>
where
    F: FnOnce(&mut Module) -> Result<()>,
{
    edit_at(orgs, path, |node| match node {
        NodeMut::Module(module) => edit(module),
        _ => Err(Error::not_found(path)),
    })
}

pub(crate) fn edit_lesson<F>(orgs: &[Organization], path: &TreePath, edit: F) -> Result<Organizations>
where
    F: FnOnce(&mut Lesson) -> Result<()>,
{
    edit_at(orgs, path, |node| match node {
        NodeMut::Lesson(lesson) => edit(lesson),
        _ => Err(Error::not_found(path)),
    })
}

// ========================================
// Ordered list helpers
// ========================================

/// Remove the element with `id`, preserving the order of the rest
pub(crate) fn remove_by_id<T: Identified>(items: &mut Vec<T>, id: &str) -> Option<T> {
    let index = items.iter().position(|item| item.id() == id)?;
    Some(items.remove(index))
}

/// Replace the element whose id matches `replacement`, keeping its position
pub(crate) fn replace_by_id<T: Identified>(items: &mut [T], replacement: T) -> Option<T> {
    let slot = items.iter_mut().find(|item| item.id() == replacement.id())?;
    Some(std::mem::replace(slot, replacement))
}
