//! Login check
//!
//! A deliberately trivial credential check: one configured master identity,
//! and per-organization roster lookup by username or display name. Unknown
//! names get a session-only student appended to the roster.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::MasterConfig;
use crate::engine::edit_organization;
use crate::error::{Error, Result};
use crate::ids::allocate_temporary;
use crate::model::{Organization, Organizations, User, UserRole};
use crate::progress::completion_percentage;
use crate::resolver::find_organization_by_slug;

pub const MASTER_USER_ID: &str = "master1";

/// Organization id carried by the master identity; matches no tenant
pub const MASTER_ORGANIZATION_ID: &str = "AIWIS";

/// Display name for a session user when nothing was typed
pub const DEMO_USER_NAME: &str = "Usuario Demo";

/// The process-wide master identity; never stored in a roster
pub fn master_user() -> User {
    User {
        id: MASTER_USER_ID.to_string(),
        name: "Armin Salazar".to_string(),
        credentials: None,
        role: UserRole::Master,
        organization_id: MASTER_ORGANIZATION_ID.to_string(),
        avatar_url: Some("https://ui-avatars.com/api/?name=Armin+Salazar&background=random".to_string()),
        progress: None,
        skills: None,
        position: Some("CEO / MASTER".to_string()),
    }
}

/// Login form contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LoginRequest {
    Master {
        username: String,
        password: String,
    },
    #[serde(rename_all = "camelCase")]
    Client {
        organization_slug: String,
        username: String,
        password: String,
    },
}

/// A successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    /// Tenant the session is scoped to; `None` for the master session
    pub organization_id: Option<String>,
    /// The collection after login (a session user may have been appended)
    pub organizations: Organizations,
}

impl LoginOutcome {
    pub fn is_master(&self) -> bool {
        self.user.role == UserRole::Master
    }
}

/// Check credentials and produce a session
pub fn login(orgs: &[Organization], request: &LoginRequest, master: &MasterConfig) -> Result<LoginOutcome> {
    match request {
        LoginRequest::Master { username, password } => login_master(orgs, username, password, master),
        LoginRequest::Client {
            organization_slug,
            username,
            password,
        } => login_client(orgs, organization_slug, username, password, master),
    }
}

fn login_master(orgs: &[Organization], username: &str, password: &str, master: &MasterConfig) -> Result<LoginOutcome> {
    if !username.eq_ignore_ascii_case(&master.username) || password != master.password {
        warn!("Rejected master login for '{}'", username);
        return Err(Error::Authentication("invalid master credentials".to_string()));
    }
    info!("Master session opened");
    Ok(LoginOutcome {
        user: master_user(),
        organization_id: None,
        organizations: orgs.to_vec(),
    })
}

fn login_client(
    orgs: &[Organization],
    slug: &str,
    username: &str,
    password: &str,
    master: &MasterConfig,
) -> Result<LoginOutcome> {
    let org = find_organization_by_slug(orgs, slug)
        .ok_or_else(|| Error::Authentication(format!("unknown organization '{}'", slug)))?;

    if let Some(user) = find_roster_user(org, username) {
        let expected = user
            .credentials
            .as_ref()
            .map(|c| c.password.as_str())
            .unwrap_or(&master.default_password);
        if password != expected {
            warn!("Rejected login for user {} in {}", user.id, org.id);
            return Err(Error::Authentication("invalid password".to_string()));
        }
        info!("User {} logged into {}", user.id, org.id);
        return Ok(LoginOutcome {
            user: user.clone(),
            organization_id: Some(org.id.clone()),
            organizations: orgs.to_vec(),
        });
    }

    if password != master.default_password {
        warn!("Rejected session login for '{}' in {}", username, org.id);
        return Err(Error::Authentication("invalid password".to_string()));
    }

    let name = match username.trim() {
        "" => DEMO_USER_NAME.to_string(),
        typed => typed.to_string(),
    };
    let user = User {
        id: allocate_temporary(),
        name,
        credentials: None,
        role: UserRole::Student,
        organization_id: org.id.clone(),
        avatar_url: None,
        progress: Some(completion_percentage(org)),
        skills: None,
        position: None,
    };
    debug!("Appending session user {} to {}", user.id, org.id);

    let organizations = edit_organization(orgs, &org.id, |target| {
        target.users.push(user.clone());
        Ok(())
    })?;
    info!("Session user {} logged into {}", user.id, org.id);
    Ok(LoginOutcome {
        user,
        organization_id: Some(org.id.clone()),
        organizations,
    })
}

/// Credential username match first, then display-name substring match
///
/// A blank username matches nobody.
fn find_roster_user<'a>(org: &'a Organization, username: &str) -> Option<&'a User> {
    let typed = username.trim().to_lowercase();
    if typed.is_empty() {
        return None;
    }
    org.users
        .iter()
        .find(|u| {
            u.credentials
                .as_ref()
                .is_some_and(|c| c.username.to_lowercase() == typed)
        })
        .or_else(|| org.users.iter().find(|u| u.name.to_lowercase().contains(&typed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Credentials;
    use crate::seed::demo_organizations;

    fn client(slug: &str, username: &str, password: &str) -> LoginRequest {
        LoginRequest::Client {
            organization_slug: slug.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_master_login_is_case_insensitive_on_username() {
        let orgs = demo_organizations();
        let request = LoginRequest::Master {
            username: "AIWIS".to_string(),
            password: "1234".to_string(),
        };
        let outcome = login(&orgs, &request, &MasterConfig::default()).unwrap();
        assert!(outcome.is_master());
        assert_eq!(outcome.user.organization_id, MASTER_ORGANIZATION_ID);
        assert!(outcome.organization_id.is_none());
    }

    #[test]
    fn test_master_login_wrong_password() {
        let orgs = demo_organizations();
        let request = LoginRequest::Master {
            username: "aiwis".to_string(),
            password: "123".to_string(),
        };
        assert!(matches!(
            login(&orgs, &request, &MasterConfig::default()),
            Err(Error::Authentication(_))
        ));
    }

    #[test]
    fn test_client_login_matches_name_substring() {
        let orgs = demo_organizations();
        let outcome = login(&orgs, &client("simpledata", "cristobal", "1234"), &MasterConfig::default()).unwrap();
        assert_eq!(outcome.user.id, "u3");
        assert_eq!(outcome.organization_id.as_deref(), Some("c1"));
        assert_eq!(outcome.organizations, orgs);
    }

    #[test]
    fn test_client_login_prefers_stored_credentials() {
        let mut orgs = demo_organizations();
        orgs[0].users[0].credentials = Some(Credentials {
            username: "jescalona".to_string(),
            password: "pw".to_string(),
        });
        let master = MasterConfig::default();

        let outcome = login(&orgs, &client("simpledata", "jescalona", "pw"), &master).unwrap();
        assert_eq!(outcome.user.id, "u2");
        assert!(login(&orgs, &client("simpledata", "juan", "1234"), &master).is_err());
    }

    #[test]
    fn test_client_login_unknown_org() {
        let orgs = demo_organizations();
        assert!(matches!(
            login(&orgs, &client("nope", "juan", "1234"), &MasterConfig::default()),
            Err(Error::Authentication(_))
        ));
    }

    #[test]
    fn test_unknown_name_creates_session_student() {
        let orgs = demo_organizations();
        let outcome = login(&orgs, &client("simpledata", "Valentina", "1234"), &MasterConfig::default()).unwrap();

        assert!(outcome.user.id.starts_with("temp-"));
        assert_eq!(outcome.user.role, UserRole::Student);
        // c1 demo curriculum is fully completed
        assert_eq!(outcome.user.progress, Some(100));
        let roster = &outcome.organizations[0].users;
        assert_eq!(roster.len(), orgs[0].users.len() + 1);
        assert_eq!(roster.last(), Some(&outcome.user));
    }

    #[test]
    fn test_blank_name_becomes_demo_user() {
        let orgs = demo_organizations();
        let outcome = login(&orgs, &client("afri", "  ", "1234"), &MasterConfig::default()).unwrap();
        assert_eq!(outcome.user.name, DEMO_USER_NAME);
        // AFRI has no lessons
        assert_eq!(outcome.user.progress, Some(0));
    }
}
