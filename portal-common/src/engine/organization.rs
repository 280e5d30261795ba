//! Organization provisioning, partial update and wholesale replacement

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::{remove_at, Inserted};
use crate::error::{Error, Result};
use crate::ids::{allocate, IdKind};
use crate::interchange::validate_organization;
use crate::model::{slugify, Organization, Organizations, Phase, SkillLabels};
use crate::resolver::{find_organization, TreePath};
use crate::time;

/// Provision a new, empty organization
///
/// The slug is derived from `name` and must not collide with any existing
/// organization's slug.
pub fn create_organization(orgs: &[Organization], name: &str, theme_color: &str) -> Result<Inserted> {
    if name.trim().is_empty() {
        return Err(Error::Validation("organization name must not be empty".to_string()));
    }
    let slug = slugify(name);
    if orgs.iter().any(|o| o.slug == slug) {
        return Err(Error::Validation(format!("slug '{}' is already in use", slug)));
    }

    let id = allocate(IdKind::Organization);
    let mut organizations = orgs.to_vec();
    organizations.push(Organization::new(id.clone(), name.trim(), theme_color, time::now()));
    Ok(Inserted { organizations, id })
}

/// Remove an organization and everything it owns
pub fn delete_organization(orgs: &[Organization], organization_id: &str) -> Result<Organizations> {
    remove_at(orgs, &TreePath::organization(organization_id))
}

/// Top-level fields to shallow-merge into an organization
///
/// Keys use the interchange (camelCase) names. Any top-level field may be
/// replaced, including whole subtrees such as `phases`; the merge result is
/// validated before it is accepted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizationPatch {
    fields: Map<String, Value>,
}

impl OrganizationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a patch from a JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::Validation(format!(
                "organization patch must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Set an arbitrary top-level field
    pub fn set(mut self, key: &str, value: impl Serialize) -> Result<Self> {
        self.fields.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.fields.insert("name".to_string(), Value::String(name.into()));
        self
    }

    pub fn theme_color(mut self, color: impl Into<String>) -> Self {
        self.fields.insert("themeColor".to_string(), Value::String(color.into()));
        self
    }

    pub fn logo_url(mut self, url: impl Into<String>) -> Self {
        self.fields.insert("logoUrl".to_string(), Value::String(url.into()));
        self
    }

    pub fn skill_labels(self, labels: &SkillLabels) -> Result<Self> {
        self.set("skillLabels", labels)
    }

    pub fn phases(self, phases: &[Phase]) -> Result<Self> {
        self.set("phases", phases)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Shallow-merge `patch` into the organization and validate the result
///
/// Rejects (with [`Error::Validation`]) a merge that would drop or blank the
/// `id` or `name`, change the `id`, collide on `slug`, fail to parse as an
/// organization, repeat an id within any list, or put a roster value out of
/// range. On rejection the input is unchanged.
pub fn update_organization(
    orgs: &[Organization],
    organization_id: &str,
    patch: &OrganizationPatch,
) -> Result<Organizations> {
    let current = find_organization(orgs, organization_id)
        .ok_or_else(|| Error::not_found(TreePath::organization(organization_id)))?;

    let mut merged = match serde_json::to_value(current)? {
        Value::Object(fields) => fields,
        _ => return Err(Error::Validation("organization did not serialize to an object".to_string())),
    };
    for (key, value) in &patch.fields {
        merged.insert(key.clone(), value.clone());
    }

    replace_organization(orgs, organization_id, Value::Object(merged))
}

/// Replace an organization wholesale with a caller-edited JSON value
pub fn replace_organization(orgs: &[Organization], organization_id: &str, replacement: Value) -> Result<Organizations> {
    let index = orgs
        .iter()
        .position(|o| o.id == organization_id)
        .ok_or_else(|| Error::not_found(TreePath::organization(organization_id)))?;

    let organization = validate_replacement(orgs, organization_id, replacement).inspect_err(|e| {
        warn!("Rejected replacement of organization {}: {}", organization_id, e);
    })?;

    let mut next = orgs.to_vec();
    next[index] = organization;
    Ok(next)
}

/// Check that a replacement value is a well-formed organization that keeps
/// its identity, and parse it
pub fn validate_replacement(orgs: &[Organization], organization_id: &str, replacement: Value) -> Result<Organization> {
    let fields = match &replacement {
        Value::Object(fields) => fields,
        other => {
            return Err(Error::Validation(format!(
                "organization must be an object, got {}",
                json_kind(other)
            )))
        }
    };

    match fields.get("id") {
        Some(Value::String(id)) if id == organization_id => {}
        Some(Value::String(id)) if id.trim().is_empty() => {
            return Err(Error::Validation("organization id must not be empty".to_string()))
        }
        Some(Value::String(id)) => {
            return Err(Error::Validation(format!(
                "organization id cannot change ({} -> {})",
                organization_id, id
            )))
        }
        _ => return Err(Error::Validation("organization id is missing".to_string())),
    }
    match fields.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => {}
        _ => return Err(Error::Validation("organization name is missing or empty".to_string())),
    }

    let mut organization: Organization = serde_json::from_value(replacement)
        .map_err(|e| Error::Validation(format!("organization does not parse: {}", e)))?;

    if organization.slug.trim().is_empty() {
        organization.slug = slugify(&organization.name);
    }
    if orgs
        .iter()
        .any(|o| o.id != organization_id && o.slug == organization.slug)
    {
        return Err(Error::Validation(format!(
            "slug '{}' is already in use",
            organization.slug
        )));
    }

    validate_organization(&organization)?;

    // The roster back-reference always points at the owner
    for user in &mut organization.users {
        user.organization_id = organization_id.to_string();
    }
    Ok(organization)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
