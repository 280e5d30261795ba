//! Identifier allocation
//!
//! Identifiers are opaque strings: a short kind prefix plus a random UUIDv4
//! suffix. Uniqueness holds for practical purposes within a run; collisions
//! are not detected.

use uuid::Uuid;

/// Node kind an identifier is allocated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Organization,
    Phase,
    Module,
    Lesson,
    User,
    Resource,
    Post,
    Question,
}

impl IdKind {
    /// Prefix placed in front of the random suffix
    pub fn prefix(self) -> &'static str {
        match self {
            IdKind::Organization => "c",
            IdKind::Phase => "p",
            IdKind::Module => "w",
            IdKind::Lesson => "l",
            IdKind::User => "u",
            IdKind::Resource => "r",
            IdKind::Post => "post",
            IdKind::Question => "q",
        }
    }
}

/// Allocate a fresh identifier for a node of the given kind
pub fn allocate(kind: IdKind) -> String {
    format!("{}-{}", kind.prefix(), Uuid::new_v4().simple())
}

/// Session-only identifier for users created on first login
pub fn allocate_temporary() -> String {
    format!("temp-{}", Uuid::new_v4().simple())
}
