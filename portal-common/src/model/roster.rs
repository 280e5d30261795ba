//! Roster types: users, roles, credentials and skill attributes

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Named skill attributes (0-99), ordered by key for stable output
pub type SkillMap = BTreeMap<String, u8>;

/// Highest value a skill attribute may hold
pub const MAX_SKILL: u8 = 99;

/// Highest completion percentage
pub const MAX_PROGRESS: u8 = 100;

/// User role
///
/// Exactly one MASTER identity exists process-wide
/// ([`crate::auth::master_user`]); it never appears in a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Master,
    Admin,
    Student,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            UserRole::Master => "MASTER",
            UserRole::Admin => "ADMIN",
            UserRole::Student => "STUDENT",
        })
    }
}

/// Login credential pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    pub role: UserRole,
    /// Back-reference to the owning organization (not ownership)
    #[serde(default)]
    pub organization_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Completion percentage (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<SkillMap>,
    /// Job title shown next to the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl User {
    /// Build a roster entry from caller-supplied fields
    pub fn from_new(id: impl Into<String>, organization_id: impl Into<String>, new: NewUser) -> Self {
        Self {
            id: id.into(),
            name: new.name,
            credentials: new.credentials,
            role: new.role,
            organization_id: organization_id.into(),
            avatar_url: new.avatar_url,
            progress: new.progress,
            skills: new.skills,
            position: new.position,
        }
    }

    /// Reject progress above 100 and skill values above 99
    pub fn check_ranges(&self) -> Result<()> {
        if let Some(progress) = self.progress.filter(|&p| p > MAX_PROGRESS) {
            return Err(Error::Validation(format!(
                "user '{}' progress {} exceeds {}",
                self.id, progress, MAX_PROGRESS
            )));
        }
        let too_high = self.skills.iter().flatten().find(|(_, value)| **value > MAX_SKILL);
        if let Some((key, value)) = too_high {
            return Err(Error::Validation(format!(
                "user '{}' skill '{}' is {} (max {})",
                self.id, key, value, MAX_SKILL
            )));
        }
        Ok(())
    }
}

/// Fields of a user the caller supplies on `add_user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    pub role: UserRole,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub skills: Option<SkillMap>,
    #[serde(default)]
    pub position: Option<String>,
}

impl NewUser {
    pub fn student(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            credentials: None,
            role: UserRole::Student,
            avatar_url: None,
            progress: None,
            skills: None,
            position: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_uppercase() {
        let json = serde_json::to_string(&UserRole::Student).unwrap();
        assert_eq!(json, "\"STUDENT\"");
        let role: UserRole = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, UserRole::Admin);
        assert_eq!(UserRole::Master.to_string(), "MASTER");
    }

    #[test]
    fn test_check_ranges() {
        let mut user = User::from_new("u9", "c1", NewUser::student("Ana"));
        user.progress = Some(100);
        user.skills = Some(SkillMap::from([("prompting".to_string(), 99)]));
        assert!(user.check_ranges().is_ok());

        user.progress = Some(101);
        assert!(matches!(user.check_ranges(), Err(Error::Validation(_))));

        user.progress = Some(40);
        user.skills = Some(SkillMap::from([("prompting".to_string(), 100)]));
        assert!(matches!(user.check_ranges(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_from_new_sets_back_reference() {
        let user = User::from_new("u9", "c1", NewUser::student("Ana"));
        assert_eq!(user.organization_id, "c1");
        assert_eq!(user.role, UserRole::Student);
        assert!(user.skills.is_none());
    }
}
