//! Reusable named permission presets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GrantDuration, RoleTemplateId};

/// Named preset of default grant fields.
///
/// Referenced, never owned, by access grants; deletion is blocked while
/// any grant still references the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTemplate {
    /// Stable template identifier.
    pub id: RoleTemplateId,
    /// Unique template name.
    pub role_name: String,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// Default super-admin flag for grants created from this template.
    pub is_super_admin: bool,
    /// Default duration for grants created from this template.
    pub duration: GrantDuration,
    /// Who created the template.
    pub created_by: String,
    /// When the template was created.
    pub created_at: DateTime<Utc>,
    /// Who last updated the template, if ever updated.
    pub updated_by: Option<String>,
    /// When the template was last updated, if ever updated.
    pub updated_at: Option<DateTime<Utc>>,
}
