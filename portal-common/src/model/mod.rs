//! Content hierarchy data model
//!
//! Organization → Phase → Module → Lesson, plus the per-organization roster,
//! forum posts and study resources. Every list keeps insertion order; every
//! identifier is unique within its parent's list.
//!
//! All types serialize with camelCase keys. That JSON shape is the
//! interchange format used by export and raw edit (see [`crate::interchange`]).

mod community;
mod curriculum;
mod organization;
mod roster;

pub use community::{ForumPost, NewResource, ResourceKind, StudyResource};
pub use curriculum::{Lesson, LessonDraft, Module, Phase, QuizQuestion};
pub use organization::{slugify, Organization, SkillLabels};
pub use roster::{Credentials, NewUser, SkillMap, User, UserRole, MAX_PROGRESS, MAX_SKILL};

/// The whole store: every tenant, in creation order
pub type Organizations = Vec<Organization>;

/// Anything stored in an ordered, id-keyed list of the tree
pub trait Identified {
    fn id(&self) -> &str;
}

macro_rules! impl_identified {
    ($($ty:ty),* $(,)?) => {
        $(impl Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_identified!(Organization, Phase, Module, Lesson, User, ForumPost, StudyResource, QuizQuestion);
