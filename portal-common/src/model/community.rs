//! Forum posts and study resources owned by an organization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Forum post; append-only from the store's point of view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumPost {
    pub id: String,
    pub user_id: String,
    /// Author display name at the time of posting
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: u32,
}

/// Kind tag of a study resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Document,
    Link,
    File,
    Video,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Document => write!(f, "document"),
            ResourceKind::Link => write!(f, "link"),
            ResourceKind::File => write!(f, "file"),
            ResourceKind::Video => write!(f, "video"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyResource {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
}

impl StudyResource {
    pub fn from_new(id: impl Into<String>, new: NewResource) -> Self {
        Self {
            id: id.into(),
            title: new.title,
            description: new.description,
            url: new.url,
            kind: new.kind,
        }
    }
}

/// Study resource fields supplied by the caller on `add_resource`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResource {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
}
