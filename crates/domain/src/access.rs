//! Effective authorization view resolved for one principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccessGrant, GrantId, PermissionMap, Principal, PrincipalId, RoleTemplateId};

/// Informal interview-stage classification derived from team rosters.
///
/// This is a best-effort tag; resolution never fails because of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageRole {
    /// Member of the first-interview team.
    FirstInterview,
    /// Member of the second-interview team.
    SecondInterview,
    /// Member of the HR team.
    Hr,
    /// No roster match, or roster lookup failed.
    #[default]
    Unclassified,
}

impl StageRole {
    /// Returns the transport string for this classification.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstInterview => "first_interview",
            Self::SecondInterview => "second_interview",
            Self::Hr => "hr",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Merged authorization view for a resolved principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveAccess {
    /// Resolved principal id.
    pub principal_id: PrincipalId,
    /// Principal display name.
    pub display_name: String,
    /// Principal department, if known.
    pub department: Option<String>,
    /// Backing grant id.
    pub grant_id: GrantId,
    /// Template the grant was created from, if any.
    pub role_template_id: Option<RoleTemplateId>,
    /// Role label on the grant.
    pub role_name: String,
    /// Super-admin override flag.
    pub is_super_admin: bool,
    /// Scope-bypass override flag.
    pub is_unrestricted: bool,
    /// Sentinel: every map and scope check passes when set.
    pub full_access: bool,
    /// Absolute expiry, if the grant is time-bounded.
    pub expiry_at: Option<DateTime<Utc>>,
    /// Page toggles (empty under the full-access sentinel).
    pub page_access: PermissionMap,
    /// Subpage toggles (empty under the full-access sentinel).
    pub subpage_access: PermissionMap,
    /// Section toggles (empty under the full-access sentinel).
    pub section_access: PermissionMap,
    /// Job scope list.
    pub allowed_job_ids: Vec<String>,
    /// Department scope list.
    pub allowed_department_ids: Vec<i32>,
    /// Candidate scope list.
    pub allowed_candidate_ids: Vec<String>,
    /// Best-effort interview-stage classification.
    pub stage_role: StageRole,
}

impl EffectiveAccess {
    /// Builds the view from a grant and its principal.
    ///
    /// When the grant carries a super-admin or unrestricted override, the
    /// permission maps are left empty and `full_access` is the sentinel —
    /// callers must not inspect the maps in that case.
    #[must_use]
    pub fn from_grant(grant: &AccessGrant, principal: &Principal, stage_role: StageRole) -> Self {
        let full_access = grant.has_full_access();

        Self {
            principal_id: principal.id,
            display_name: principal.display_name.clone(),
            department: principal.department.clone(),
            grant_id: grant.id,
            role_template_id: grant.role_template_id,
            role_name: grant.role_name.clone(),
            is_super_admin: grant.is_super_admin,
            is_unrestricted: grant.is_unrestricted,
            full_access,
            expiry_at: grant.expiry_at,
            page_access: if full_access {
                PermissionMap::new()
            } else {
                grant.page_access.clone()
            },
            subpage_access: if full_access {
                PermissionMap::new()
            } else {
                grant.subpage_access.clone()
            },
            section_access: if full_access {
                PermissionMap::new()
            } else {
                grant.section_access.clone()
            },
            allowed_job_ids: grant.allowed_job_ids.clone(),
            allowed_department_ids: grant.allowed_department_ids.clone(),
            allowed_candidate_ids: grant.allowed_candidate_ids.clone(),
            stage_role,
        }
    }
}
