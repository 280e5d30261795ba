//! Plain-text interchange
//!
//! Organizations export to pretty-printed JSON (camelCase keys, the model's
//! serde shape). A caller-edited export can be parsed back and swapped in
//! wholesale; the edit is rejected unless `id` and `name` survive.
//!
//! The same format, as an array, is used for whole-collection snapshots.

use std::collections::HashSet;

use serde_json::Value;
use tracing::info;

use crate::engine::replace_organization;
use crate::error::{Error, Result};
use crate::model::{Identified, Organization, Organizations, User};
use crate::resolver::{find_organization, TreePath};

/// Serialize one organization to interchange text
pub fn export_organization(orgs: &[Organization], organization_id: &str) -> Result<String> {
    let org = find_organization(orgs, organization_id)
        .ok_or_else(|| Error::not_found(TreePath::organization(organization_id)))?;
    Ok(serde_json::to_string_pretty(org)?)
}

/// Replace an organization with the parsed contents of `text`
pub fn import_organization_text(orgs: &[Organization], organization_id: &str, text: &str) -> Result<Organizations> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::Validation(format!("edited text is not valid JSON: {}", e)))?;
    let next = replace_organization(orgs, organization_id, value)?;
    info!("Replaced organization {} from edited text", organization_id);
    Ok(next)
}

/// Serialize the whole collection
pub fn to_snapshot(orgs: &[Organization]) -> Result<String> {
    Ok(serde_json::to_string_pretty(orgs)?)
}

/// Parse a whole-collection snapshot and check its identifier invariants
pub fn from_snapshot(text: &str) -> Result<Organizations> {
    let orgs: Organizations = serde_json::from_str(text)?;
    validate_collection(&orgs)?;
    Ok(orgs)
}

/// Check identifier uniqueness at every level and slug uniqueness
pub fn validate_collection(orgs: &[Organization]) -> Result<()> {
    ensure_unique("organization", "", orgs)?;
    let mut slugs = HashSet::new();
    for org in orgs {
        if !slugs.insert(org.slug.as_str()) {
            return Err(Error::Validation(format!("duplicate slug '{}'", org.slug)));
        }
        validate_organization(org)?;
    }
    Ok(())
}

/// Check one organization: unique ids within every parent list and roster
/// values inside their ranges
pub fn validate_organization(org: &Organization) -> Result<()> {
    ensure_unique("phase", &org.id, &org.phases)?;
    ensure_unique("user", &org.id, &org.users)?;
    ensure_unique("post", &org.id, &org.posts)?;
    ensure_unique("resource", &org.id, &org.resources)?;
    for phase in &org.phases {
        ensure_unique("module", &phase.id, &phase.modules)?;
        for module in &phase.modules {
            ensure_unique("lesson", &module.id, &module.lessons)?;
        }
    }
    org.users.iter().try_for_each(User::check_ranges)
}

fn ensure_unique<T: Identified>(kind: &str, parent: &str, items: &[T]) -> Result<()> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.id()) {
            return Err(Error::Validation(format!(
                "duplicate {} id '{}' under '{}'",
                kind,
                item.id(),
                parent
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_organizations;

    #[test]
    fn test_export_then_import_unedited_is_identity() {
        let orgs = demo_organizations();
        for org in &orgs {
            let text = export_organization(&orgs, &org.id).unwrap();
            let next = import_organization_text(&orgs, &org.id, &text).unwrap();
            assert_eq!(next, orgs);
        }
    }

    #[test]
    fn test_import_edited_name() {
        let orgs = demo_organizations();
        let text = export_organization(&orgs, "c2").unwrap();
        let edited = text.replace("\"name\": \"AFRI\"", "\"name\": \"AFRI Group\"");
        let next = import_organization_text(&orgs, "c2", &edited).unwrap();
        assert_eq!(next[1].name, "AFRI Group");
    }

    #[test]
    fn test_import_without_name_is_rejected_and_state_unchanged() {
        let orgs = demo_organizations();
        let text = r##"{ "id": "c2", "slug": "afri", "themeColor": "#10b981", "createdAt": "2025-01-02T00:00:00Z" }"##;
        let err = import_organization_text(&orgs, "c2", text).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(orgs[1].name, "AFRI");
    }

    #[test]
    fn test_import_without_id_is_rejected() {
        let orgs = demo_organizations();
        let text = r##"{ "name": "AFRI", "slug": "afri", "themeColor": "#10b981", "createdAt": "2025-01-02T00:00:00Z" }"##;
        assert!(matches!(
            import_organization_text(&orgs, "c2", text),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_import_malformed_text_is_rejected() {
        let orgs = demo_organizations();
        assert!(matches!(
            import_organization_text(&orgs, "c2", "{ not json"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_export_unknown_org_is_not_found() {
        let orgs = demo_organizations();
        assert!(export_organization(&orgs, "c404").unwrap_err().is_path_not_found());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let orgs = demo_organizations();
        let text = to_snapshot(&orgs).unwrap();
        assert_eq!(from_snapshot(&text).unwrap(), orgs);
    }

    #[test]
    fn test_validate_collection_detects_duplicate_lesson_ids() {
        let mut orgs = demo_organizations();
        let dup = orgs[0].phases[0].modules[0].lessons[0].clone();
        orgs[0].phases[0].modules[0].lessons.push(dup);
        assert!(matches!(validate_collection(&orgs), Err(Error::Validation(_))));
    }

    #[test]
    fn test_validate_collection_detects_duplicate_slugs() {
        let mut orgs = demo_organizations();
        orgs[1].slug = orgs[0].slug.clone();
        assert!(validate_collection(&orgs).is_err());
    }
}
