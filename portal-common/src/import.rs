//! Bulk structure import ("genesis")
//!
//! Appends an externally produced payload of phases, users and resources to an
//! organization. Existing nodes are never reordered, replaced or deduplicated.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::edit_organization;
use crate::error::Result;
use crate::ids::{allocate, IdKind};
use crate::model::{Organization, Organizations, Phase, StudyResource, User};

/// Tree-shaped payload, same shape as the store's own collections
///
/// A collection omitted from the JSON is treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructurePayload {
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub resources: Vec<StudyResource>,
}

/// Node counts of a payload, used for logging and events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounts {
    pub phases: usize,
    pub modules: usize,
    pub lessons: usize,
    pub users: usize,
    pub resources: usize,
}

impl StructurePayload {
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty() && self.users.is_empty() && self.resources.is_empty()
    }

    pub fn counts(&self) -> ImportCounts {
        ImportCounts {
            phases: self.phases.len(),
            modules: self.phases.iter().map(|p| p.modules.len()).sum(),
            lessons: self.phases.iter().map(|p| p.lessons().count()).sum(),
            users: self.users.len(),
            resources: self.resources.len(),
        }
    }

    /// True when any imported lesson arrives already completed
    pub fn has_completed_lessons(&self) -> bool {
        self.phases.iter().any(|p| p.lessons().any(|l| l.completed))
    }

    /// Replace every phase, module, lesson, user and resource id with a
    /// freshly allocated one
    ///
    /// Used before merging generator output, whose identifiers are only
    /// unique within a single response.
    pub fn reassign_identifiers(&mut self) {
        for phase in &mut self.phases {
            phase.id = allocate(IdKind::Phase);
            for module in &mut phase.modules {
                module.id = allocate(IdKind::Module);
                for lesson in &mut module.lessons {
                    lesson.id = allocate(IdKind::Lesson);
                }
            }
        }
        for user in &mut self.users {
            user.id = allocate(IdKind::User);
        }
        for resource in &mut self.resources {
            resource.id = allocate(IdKind::Resource);
        }
    }
}

/// Append `payload` verbatim to the organization's collections
///
/// Identifiers are trusted as supplied. Imported users get their
/// `organization_id` pointed at the target. Progress is not recomputed here;
/// callers importing completed lessons trigger that separately.
pub fn import_structure(
    orgs: &[Organization],
    organization_id: &str,
    payload: StructurePayload,
) -> Result<Organizations> {
    let counts = payload.counts();
    let next = edit_organization(orgs, organization_id, |org| {
        let StructurePayload {
            phases,
            users,
            resources,
        } = payload;
        org.phases.extend(phases);
        org.users.extend(users.into_iter().map(|mut user| {
            user.organization_id = organization_id.to_string();
            user
        }));
        org.resources.extend(resources);
        Ok(())
    })?;

    info!(
        "Imported into {}: {} phases, {} modules, {} lessons, {} users, {} resources",
        organization_id, counts.phases, counts.modules, counts.lessons, counts.users, counts.resources
    );
    Ok(next)
}
