//! Read-only queries for dashboards and the CLI

use serde::Serialize;

use crate::model::{Organization, User};
use crate::scoring::overall_score;

/// One search hit: a roster user and the name of the organization owning it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMatch<'a> {
    pub organization_id: &'a str,
    pub organization_name: &'a str,
    pub user: &'a User,
}

/// Users whose name, or whose organization's name, contains `term`
///
/// Case-insensitive. A blank term matches everyone.
pub fn search_users<'a>(orgs: &'a [Organization], term: &str) -> Vec<UserMatch<'a>> {
    let needle = term.trim().to_lowercase();
    let needle = needle.as_str();
    orgs.iter()
        .flat_map(|org| {
            let org_matches = org.name.to_lowercase().contains(needle);
            org.users
                .iter()
                .filter(move |u| org_matches || u.name.to_lowercase().contains(needle))
                .map(move |user| UserMatch {
                    organization_id: &org.id,
                    organization_name: &org.name,
                    user,
                })
        })
        .collect()
}

pub fn total_users(orgs: &[Organization]) -> usize {
    orgs.iter().map(|o| o.users.len()).sum()
}

pub fn total_lessons(orgs: &[Organization]) -> usize {
    orgs.iter().map(Organization::lesson_count).sum()
}

/// Roster sorted by overall score, best first; ties keep roster order
pub fn leaderboard(org: &Organization) -> Vec<(&User, u32)> {
    let mut ranked: Vec<_> = org.users.iter().map(|u| (u, overall_score(u))).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}
