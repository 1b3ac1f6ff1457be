//! Access grant entity and its duration component.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EmailAddress, GrantId, PermissionMap, PrincipalId, RoleTemplateId};

/// Optional day/month/year duration attached to a grant.
///
/// All components are non-negative; an all-absent (or all-zero) duration
/// means the grant never expires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantDuration {
    /// Whole days.
    pub days: Option<u32>,
    /// Whole months (30-day approximation applies downstream).
    pub months: Option<u32>,
    /// Whole years (365-day approximation applies downstream).
    pub years: Option<u32>,
}

impl GrantDuration {
    /// Whether every component is absent or zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.unwrap_or(0) == 0 && self.months.unwrap_or(0) == 0 && self.years.unwrap_or(0) == 0
    }
}

/// Time-bounded authorization record for one principal.
///
/// At most one grant exists per principal at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessGrant {
    /// Stable grant identifier.
    pub id: GrantId,
    /// Owning principal reference.
    pub principal_id: PrincipalId,
    /// Optional reference to the template this grant was created from.
    pub role_template_id: Option<RoleTemplateId>,
    /// Free-text role label.
    pub role_name: String,
    /// Denormalized principal email for direct lookups.
    pub email: Option<EmailAddress>,
    /// Short-circuits all map and scope checks when set.
    pub is_super_admin: bool,
    /// Duration the grant was created or last updated with.
    pub duration: GrantDuration,
    /// Derived absolute expiry; `None` means the grant never expires.
    pub expiry_at: Option<DateTime<Utc>>,
    /// Page name to view/edit toggles.
    pub page_access: PermissionMap,
    /// Subpage name to view/edit toggles.
    pub subpage_access: PermissionMap,
    /// Section name to view/edit toggles.
    pub section_access: PermissionMap,
    /// Job scope identifiers the principal may touch.
    pub allowed_job_ids: Vec<String>,
    /// Department scope identifiers the principal may touch.
    pub allowed_department_ids: Vec<i32>,
    /// Candidate scope identifiers the principal may touch.
    pub allowed_candidate_ids: Vec<String>,
    /// Bypasses all scope-list checks when set.
    pub is_unrestricted: bool,
    /// Who created the grant.
    pub created_by: String,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
    /// Who last updated the grant, if ever updated.
    pub updated_by: Option<String>,
    /// When the grant was last updated, if ever updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl AccessGrant {
    /// Whether map and scope checks are bypassed for this grant.
    #[must_use]
    pub fn has_full_access(&self) -> bool {
        self.is_super_admin || self.is_unrestricted
    }
}
