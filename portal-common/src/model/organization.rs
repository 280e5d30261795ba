//! Organization (tenant) type and slug derivation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ForumPost, Lesson, Phase, StudyResource, User};

/// Custom display labels for skill keys (e.g. `prompting` → "Código")
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillLabels(pub BTreeMap<String, String>);

impl SkillLabels {
    /// Display label for a skill key, falling back to the key itself
    pub fn label_for<'a>(&'a self, key: &'a str) -> &'a str {
        self.0.get(key).map(String::as_str).unwrap_or(key)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SkillLabels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        SkillLabels(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A client tenant owning its curriculum tree and roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// URL slug derived from the name; unique across all organizations
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Hex code of the primary theme color
    pub theme_color: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub posts: Vec<ForumPost>,
    #[serde(default)]
    pub resources: Vec<StudyResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_labels: Option<SkillLabels>,
}

impl Organization {
    /// Empty tenant with a slug derived from `name`
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        theme_color: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            slug: slugify(&name),
            name,
            logo_url: None,
            theme_color: theme_color.into(),
            created_at,
            phases: Vec::new(),
            users: Vec::new(),
            posts: Vec::new(),
            resources: Vec::new(),
            skill_labels: None,
        }
    }

    /// Every lesson of the curriculum, in tree order
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.phases.iter().flat_map(|p| p.lessons())
    }

    pub fn lesson_count(&self) -> usize {
        self.lessons().count()
    }

    pub fn completed_lesson_count(&self) -> usize {
        self.lessons().filter(|l| l.completed).count()
    }

    pub fn find_user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }
}

/// Derive a URL slug: lowercase, whitespace runs replaced by a single hyphen
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("ADA Ltda"), "ada-ltda");
        assert_eq!(slugify("SIMPLEDATA"), "simpledata");
        assert_eq!(slugify("  Acme   Learning  Co "), "acme-learning-co");
    }

    #[test]
    fn test_new_organization_is_empty() {
        let org = Organization::new("c9", "New Client", "#10b981", Utc::now());
        assert_eq!(org.slug, "new-client");
        assert!(org.phases.is_empty());
        assert!(org.users.is_empty());
        assert_eq!(org.lesson_count(), 0);
    }

    #[test]
    fn test_skill_label_falls_back_to_key() {
        let labels: SkillLabels = [("prompting", "Código")].into_iter().collect();
        assert_eq!(labels.label_for("prompting"), "Código");
        assert_eq!(labels.label_for("strategy"), "strategy");
    }
}
