//! Roster, study resource and forum post operations
//!
//! Same append / replace-in-place / filter pattern as the curriculum, scoped
//! to an organization's own lists.

use super::{edit_organization, remove_by_id, replace_by_id, Inserted};
use crate::error::{Error, Result};
use crate::ids::{allocate, IdKind};
use crate::model::{ForumPost, NewResource, NewUser, Organization, Organizations, StudyResource, User};
use crate::progress::completion_percentage;
use crate::time;

/// Append a user to the roster
///
/// A user added without an explicit progress figure receives the
/// organization's current completion percentage, keeping the roster
/// consistent with the shared-progress model.
pub fn add_user(orgs: &[Organization], organization_id: &str, new: NewUser) -> Result<Inserted> {
    let id = allocate(IdKind::User);
    let organizations = edit_organization(orgs, organization_id, |org| {
        let mut user = User::from_new(id.clone(), organization_id, new);
        if user.progress.is_none() {
            user.progress = Some(completion_percentage(org));
        }
        user.check_ranges()?;
        org.users.push(user);
        Ok(())
    })?;
    Ok(Inserted { organizations, id })
}

/// Replace the roster entry whose id matches `user.id`
pub fn update_user(orgs: &[Organization], organization_id: &str, mut user: User) -> Result<Organizations> {
    user.organization_id = organization_id.to_string();
    user.check_ranges()?;
    edit_organization(orgs, organization_id, |org| {
        let user_id = user.id.clone();
        replace_by_id(&mut org.users, user)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("{}/users/{}", organization_id, user_id)))
    })
}

pub fn delete_user(orgs: &[Organization], organization_id: &str, user_id: &str) -> Result<Organizations> {
    edit_organization(orgs, organization_id, |org| {
        remove_by_id(&mut org.users, user_id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("{}/users/{}", organization_id, user_id)))
    })
}

pub fn add_resource(orgs: &[Organization], organization_id: &str, new: NewResource) -> Result<Inserted> {
    let id = allocate(IdKind::Resource);
    let organizations = edit_organization(orgs, organization_id, |org| {
        org.resources.push(StudyResource::from_new(id.clone(), new));
        Ok(())
    })?;
    Ok(Inserted { organizations, id })
}

pub fn update_resource(orgs: &[Organization], organization_id: &str, resource: StudyResource) -> Result<Organizations> {
    edit_organization(orgs, organization_id, |org| {
        let resource_id = resource.id.clone();
        replace_by_id(&mut org.resources, resource)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("{}/resources/{}", organization_id, resource_id)))
    })
}

pub fn delete_resource(orgs: &[Organization], organization_id: &str, resource_id: &str) -> Result<Organizations> {
    edit_organization(orgs, organization_id, |org| {
        remove_by_id(&mut org.resources, resource_id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("{}/resources/{}", organization_id, resource_id)))
    })
}

/// Append a forum post by a roster member
///
/// The author's display name and avatar are copied onto the post, so later
/// renames do not rewrite history.
pub fn add_post(orgs: &[Organization], organization_id: &str, author_id: &str, content: &str) -> Result<Inserted> {
    if content.trim().is_empty() {
        return Err(Error::Validation("post content must not be empty".to_string()));
    }
    let id = allocate(IdKind::Post);
    let organizations = edit_organization(orgs, organization_id, |org| {
        let author = org
            .find_user(author_id)
            .ok_or_else(|| Error::not_found(format!("{}/users/{}", organization_id, author_id)))?;
        let post = ForumPost {
            id: id.clone(),
            user_id: author.id.clone(),
            user_name: author.name.clone(),
            user_avatar: author.avatar_url.clone(),
            content: content.to_string(),
            created_at: time::now(),
            likes: 0,
        };
        org.posts.push(post);
        Ok(())
    })?;
    Ok(Inserted { organizations, id })
}

pub fn delete_post(orgs: &[Organization], organization_id: &str, post_id: &str) -> Result<Organizations> {
    edit_organization(orgs, organization_id, |org| {
        remove_by_id(&mut org.posts, post_id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("{}/posts/{}", organization_id, post_id)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResourceKind, UserRole};
    use crate::seed::demo_organizations;

    #[test]
    fn test_add_user_appends_with_back_reference_and_progress() {
        let orgs = demo_organizations();
        let inserted = add_user(&orgs, "c1", NewUser::student("Valentina Rojas")).unwrap();
        let user = inserted.organizations[0].users.last().unwrap();
        assert_eq!(user.id, inserted.id);
        assert_eq!(user.organization_id, "c1");
        // c1 demo curriculum: one lesson, completed
        assert_eq!(user.progress, Some(100));
    }

    #[test]
    fn test_update_user_preserves_position() {
        let orgs = demo_organizations();
        let mut user = orgs[0].users[1].clone();
        user.role = UserRole::Admin;
        let next = update_user(&orgs, "c1", user).unwrap();
        assert_eq!(next[0].users[1].role, UserRole::Admin);
        assert_eq!(next[0].users.len(), orgs[0].users.len());
    }

    #[test]
    fn test_user_values_out_of_range_are_rejected() {
        let orgs = demo_organizations();
        let mut new = NewUser::student("Valentina Rojas");
        new.progress = Some(140);
        assert!(matches!(add_user(&orgs, "c1", new), Err(Error::Validation(_))));

        let mut user = orgs[0].users[0].clone();
        if let Some(skills) = user.skills.as_mut() {
            skills.insert("prompting".to_string(), 100);
        }
        assert!(matches!(update_user(&orgs, "c1", user), Err(Error::Validation(_))));
    }

    #[test]
    fn test_delete_user_is_idempotent_as_not_found() {
        let orgs = demo_organizations();
        let next = delete_user(&orgs, "c1", "u3").unwrap();
        assert!(next[0].find_user("u3").is_none());
        assert!(delete_user(&next, "c1", "u3").unwrap_err().is_path_not_found());
    }

    #[test]
    fn test_resource_lifecycle() {
        let orgs = demo_organizations();
        let new = NewResource {
            title: "Gemini docs".to_string(),
            description: String::new(),
            url: "https://ai.google.dev".to_string(),
            kind: ResourceKind::Link,
        };
        let inserted = add_resource(&orgs, "c1", new).unwrap();
        let mut resource = inserted.organizations[0].resources[0].clone();
        resource.kind = ResourceKind::Document;

        let updated = update_resource(&inserted.organizations, "c1", resource).unwrap();
        assert_eq!(updated[0].resources[0].kind, ResourceKind::Document);

        let deleted = delete_resource(&updated, "c1", &inserted.id).unwrap();
        assert!(deleted[0].resources.is_empty());
    }

    #[test]
    fn test_add_post_snapshots_author_name() {
        let orgs = demo_organizations();
        let inserted = add_post(&orgs, "c1", "u3", "Great session!").unwrap();
        let post = inserted.organizations[0].posts.last().unwrap();
        assert_eq!(post.user_name, "Cristobal Arias");
        assert_eq!(post.likes, 0);
        assert_eq!(inserted.organizations[0].posts.len(), 2);
    }

    #[test]
    fn test_add_post_unknown_author_is_not_found() {
        let orgs = demo_organizations();
        assert!(add_post(&orgs, "c1", "u404", "hi").unwrap_err().is_path_not_found());
    }

    #[test]
    fn test_delete_post() {
        let orgs = demo_organizations();
        let next = delete_post(&orgs, "c1", "post1").unwrap();
        assert!(next[0].posts.is_empty());
    }
}
