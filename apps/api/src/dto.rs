use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use staffgate_application::{
    BulkRevocationFailure, BulkRevocationOutcome, GrantDetails, GrantPage, GrantPatch,
    GrantSummary, NamedToggle, NewGrant, NewRoleTemplate, RevocationOutcome, RoleTemplatePatch,
};
use staffgate_domain::{
    AccessGrant, EffectiveAccess, GrantDuration, PermissionMap, PrincipalId, RoleTemplate,
    RoleTemplateId,
};

/// Operator recorded when a request carries no explicit actor.
pub const DEFAULT_OPERATOR: &str = "admin";

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for grant creation.
#[derive(Debug, Deserialize)]
pub struct CreateGrantRequest {
    pub principal_id: i64,
    pub role_template_id: Option<i64>,
    pub role_name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub is_super_admin: bool,
    pub duration_days: Option<u32>,
    pub duration_months: Option<u32>,
    pub duration_years: Option<u32>,
    #[serde(default)]
    pub page_access: PermissionMap,
    #[serde(default)]
    pub subpage_access: PermissionMap,
    #[serde(default)]
    pub section_access: PermissionMap,
    #[serde(default)]
    pub allowed_job_ids: Vec<String>,
    #[serde(default)]
    pub allowed_department_ids: Vec<i32>,
    #[serde(default)]
    pub allowed_candidate_ids: Vec<String>,
    #[serde(default)]
    pub is_unrestricted: bool,
    pub created_by: Option<String>,
}

impl From<CreateGrantRequest> for NewGrant {
    fn from(value: CreateGrantRequest) -> Self {
        Self {
            principal_id: PrincipalId::from_i64(value.principal_id),
            role_template_id: value.role_template_id.map(RoleTemplateId::from_i64),
            role_name: value.role_name,
            email: value.email,
            is_super_admin: value.is_super_admin,
            duration: GrantDuration {
                days: value.duration_days,
                months: value.duration_months,
                years: value.duration_years,
            },
            page_access: value.page_access,
            subpage_access: value.subpage_access,
            section_access: value.section_access,
            allowed_job_ids: value.allowed_job_ids,
            allowed_department_ids: value.allowed_department_ids,
            allowed_candidate_ids: value.allowed_candidate_ids,
            is_unrestricted: value.is_unrestricted,
            created_by: value.created_by.unwrap_or_else(|| DEFAULT_OPERATOR.to_owned()),
        }
    }
}

/// Incoming payload for partial grant updates.
#[derive(Debug, Deserialize)]
pub struct UpdateGrantRequest {
    pub role_template_id: Option<i64>,
    pub role_name: Option<String>,
    pub is_super_admin: Option<bool>,
    pub duration_days: Option<u32>,
    pub duration_months: Option<u32>,
    pub duration_years: Option<u32>,
    pub page_access: Option<PermissionMap>,
    pub subpage_access: Option<PermissionMap>,
    pub section_access: Option<PermissionMap>,
    pub allowed_job_ids: Option<Vec<String>>,
    pub allowed_department_ids: Option<Vec<i32>>,
    pub allowed_candidate_ids: Option<Vec<String>>,
    pub is_unrestricted: Option<bool>,
    pub updated_by: Option<String>,
}

impl From<UpdateGrantRequest> for GrantPatch {
    fn from(value: UpdateGrantRequest) -> Self {
        Self {
            role_template_id: value.role_template_id.map(RoleTemplateId::from_i64),
            role_name: value.role_name,
            is_super_admin: value.is_super_admin,
            duration_days: value.duration_days,
            duration_months: value.duration_months,
            duration_years: value.duration_years,
            page_access: value.page_access,
            subpage_access: value.subpage_access,
            section_access: value.section_access,
            allowed_job_ids: value.allowed_job_ids,
            allowed_department_ids: value.allowed_department_ids,
            allowed_candidate_ids: value.allowed_candidate_ids,
            is_unrestricted: value.is_unrestricted,
            updated_by: value.updated_by.unwrap_or_else(|| DEFAULT_OPERATOR.to_owned()),
        }
    }
}

/// API representation of an access grant.
#[derive(Debug, Serialize)]
pub struct GrantResponse {
    pub id: i64,
    pub principal_id: i64,
    pub role_template_id: Option<i64>,
    pub role_name: String,
    pub email: Option<String>,
    pub is_super_admin: bool,
    pub duration_days: Option<u32>,
    pub duration_months: Option<u32>,
    pub duration_years: Option<u32>,
    pub expiry_at: Option<DateTime<Utc>>,
    pub page_access: PermissionMap,
    pub subpage_access: PermissionMap,
    pub section_access: PermissionMap,
    pub allowed_job_ids: Vec<String>,
    pub allowed_department_ids: Vec<i32>,
    pub allowed_candidate_ids: Vec<String>,
    pub is_unrestricted: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<AccessGrant> for GrantResponse {
    fn from(value: AccessGrant) -> Self {
        Self {
            id: value.id.as_i64(),
            principal_id: value.principal_id.as_i64(),
            role_template_id: value.role_template_id.map(|id| id.as_i64()),
            role_name: value.role_name,
            email: value.email.map(String::from),
            is_super_admin: value.is_super_admin,
            duration_days: value.duration.days,
            duration_months: value.duration.months,
            duration_years: value.duration.years,
            expiry_at: value.expiry_at,
            page_access: value.page_access,
            subpage_access: value.subpage_access,
            section_access: value.section_access,
            allowed_job_ids: value.allowed_job_ids,
            allowed_department_ids: value.allowed_department_ids,
            allowed_candidate_ids: value.allowed_candidate_ids,
            is_unrestricted: value.is_unrestricted,
            created_by: value.created_by,
            created_at: value.created_at,
            updated_by: value.updated_by,
            updated_at: value.updated_at,
        }
    }
}

/// One page of grants.
#[derive(Debug, Serialize)]
pub struct GrantPageResponse {
    pub items: Vec<GrantResponse>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl From<GrantPage> for GrantPageResponse {
    fn from(value: GrantPage) -> Self {
        Self {
            items: value.items.into_iter().map(GrantResponse::from).collect(),
            total: value.total,
            page: value.page,
            page_size: value.page_size,
        }
    }
}

/// Counted summary of one grant.
#[derive(Debug, Serialize)]
pub struct GrantSummaryResponse {
    pub principal_id: i64,
    pub role_name: String,
    pub is_super_admin: bool,
    pub is_unrestricted: bool,
    pub expiry_at: Option<DateTime<Utc>>,
    pub total_pages: usize,
    pub total_subpages: usize,
    pub total_sections: usize,
    pub allowed_jobs_count: usize,
    pub allowed_departments_count: usize,
    pub allowed_candidates_count: usize,
}

impl From<GrantSummary> for GrantSummaryResponse {
    fn from(value: GrantSummary) -> Self {
        Self {
            principal_id: value.principal_id.as_i64(),
            role_name: value.role_name,
            is_super_admin: value.is_super_admin,
            is_unrestricted: value.is_unrestricted,
            expiry_at: value.expiry_at,
            total_pages: value.total_pages,
            total_subpages: value.total_subpages,
            total_sections: value.total_sections,
            allowed_jobs_count: value.allowed_jobs_count,
            allowed_departments_count: value.allowed_departments_count,
            allowed_candidates_count: value.allowed_candidates_count,
        }
    }
}

/// One named surface with its toggles.
#[derive(Debug, Serialize)]
pub struct NamedToggleResponse {
    pub name: String,
    pub can_view: bool,
    pub can_edit: bool,
}

impl From<NamedToggle> for NamedToggleResponse {
    fn from(value: NamedToggle) -> Self {
        Self {
            name: value.name,
            can_view: value.can_view,
            can_edit: value.can_edit,
        }
    }
}

/// Expanded permission listing of one grant.
#[derive(Debug, Serialize)]
pub struct GrantDetailsResponse {
    pub principal_id: i64,
    pub role_name: String,
    pub is_super_admin: bool,
    pub is_unrestricted: bool,
    pub expiry_at: Option<DateTime<Utc>>,
    pub page_access: Vec<NamedToggleResponse>,
    pub subpage_access: Vec<NamedToggleResponse>,
    pub section_access: Vec<NamedToggleResponse>,
    pub allowed_job_ids: Vec<String>,
    pub allowed_department_ids: Vec<i32>,
    pub allowed_candidate_ids: Vec<String>,
}

impl From<GrantDetails> for GrantDetailsResponse {
    fn from(value: GrantDetails) -> Self {
        Self {
            principal_id: value.principal_id.as_i64(),
            role_name: value.role_name,
            is_super_admin: value.is_super_admin,
            is_unrestricted: value.is_unrestricted,
            expiry_at: value.expiry_at,
            page_access: value
                .page_access
                .into_iter()
                .map(NamedToggleResponse::from)
                .collect(),
            subpage_access: value
                .subpage_access
                .into_iter()
                .map(NamedToggleResponse::from)
                .collect(),
            section_access: value
                .section_access
                .into_iter()
                .map(NamedToggleResponse::from)
                .collect(),
            allowed_job_ids: value.allowed_job_ids,
            allowed_department_ids: value.allowed_department_ids,
            allowed_candidate_ids: value.allowed_candidate_ids,
        }
    }
}

/// Merged authorization view for a resolved principal.
#[derive(Debug, Serialize)]
pub struct EffectiveAccessResponse {
    pub principal_id: i64,
    pub display_name: String,
    pub department: Option<String>,
    pub grant_id: i64,
    pub role_template_id: Option<i64>,
    pub role_name: String,
    pub is_super_admin: bool,
    pub is_unrestricted: bool,
    pub full_access: bool,
    pub expiry_at: Option<DateTime<Utc>>,
    pub page_access: PermissionMap,
    pub subpage_access: PermissionMap,
    pub section_access: PermissionMap,
    pub allowed_job_ids: Vec<String>,
    pub allowed_department_ids: Vec<i32>,
    pub allowed_candidate_ids: Vec<String>,
    pub stage_role: &'static str,
}

impl From<EffectiveAccess> for EffectiveAccessResponse {
    fn from(value: EffectiveAccess) -> Self {
        Self {
            principal_id: value.principal_id.as_i64(),
            display_name: value.display_name,
            department: value.department,
            grant_id: value.grant_id.as_i64(),
            role_template_id: value.role_template_id.map(|id| id.as_i64()),
            role_name: value.role_name,
            is_super_admin: value.is_super_admin,
            is_unrestricted: value.is_unrestricted,
            full_access: value.full_access,
            expiry_at: value.expiry_at,
            page_access: value.page_access,
            subpage_access: value.subpage_access,
            section_access: value.section_access,
            allowed_job_ids: value.allowed_job_ids,
            allowed_department_ids: value.allowed_department_ids,
            allowed_candidate_ids: value.allowed_candidate_ids,
            stage_role: value.stage_role.as_str(),
        }
    }
}

/// Result of one revocation.
#[derive(Debug, Serialize)]
pub struct RevocationResponse {
    pub success: bool,
    pub principal_id: i64,
    pub grant_deleted: bool,
    pub principal_deleted: bool,
    pub event_published: bool,
}

impl From<RevocationOutcome> for RevocationResponse {
    fn from(value: RevocationOutcome) -> Self {
        Self {
            success: value.grant_deleted || value.principal_deleted,
            principal_id: value.principal_id.as_i64(),
            grant_deleted: value.grant_deleted,
            principal_deleted: value.principal_deleted,
            event_published: value.event_published,
        }
    }
}

/// One failed email inside a bulk revocation.
#[derive(Debug, Serialize)]
pub struct BulkRevocationErrorResponse {
    pub email: String,
    pub error: String,
}

impl From<BulkRevocationFailure> for BulkRevocationErrorResponse {
    fn from(value: BulkRevocationFailure) -> Self {
        Self {
            email: value.email,
            error: value.error,
        }
    }
}

/// Aggregate result of a bulk revocation.
#[derive(Debug, Serialize)]
pub struct BulkRevocationResponse {
    pub total_emails: usize,
    pub successful_deletions: usize,
    pub failed_deletions: usize,
    pub errors: Vec<BulkRevocationErrorResponse>,
    pub event_published_count: usize,
}

impl From<BulkRevocationOutcome> for BulkRevocationResponse {
    fn from(value: BulkRevocationOutcome) -> Self {
        Self {
            total_emails: value.total_emails,
            successful_deletions: value.successful_deletions,
            failed_deletions: value.failed_deletions,
            errors: value
                .errors
                .into_iter()
                .map(BulkRevocationErrorResponse::from)
                .collect(),
            event_published_count: value.event_published_count,
        }
    }
}

/// Incoming payload for role template creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleTemplateRequest {
    pub role_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_super_admin: bool,
    pub duration_days: Option<u32>,
    pub duration_months: Option<u32>,
    pub duration_years: Option<u32>,
    pub created_by: Option<String>,
}

impl From<CreateRoleTemplateRequest> for NewRoleTemplate {
    fn from(value: CreateRoleTemplateRequest) -> Self {
        Self {
            role_name: value.role_name,
            description: value.description,
            is_super_admin: value.is_super_admin,
            duration: GrantDuration {
                days: value.duration_days,
                months: value.duration_months,
                years: value.duration_years,
            },
            created_by: value.created_by.unwrap_or_else(|| DEFAULT_OPERATOR.to_owned()),
        }
    }
}

/// Incoming payload for partial role template updates.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleTemplateRequest {
    pub role_name: Option<String>,
    pub description: Option<String>,
    pub is_super_admin: Option<bool>,
    pub duration_days: Option<u32>,
    pub duration_months: Option<u32>,
    pub duration_years: Option<u32>,
    pub updated_by: Option<String>,
}

impl UpdateRoleTemplateRequest {
    fn duration(&self) -> Option<GrantDuration> {
        if self.duration_days.is_none()
            && self.duration_months.is_none()
            && self.duration_years.is_none()
        {
            return None;
        }

        Some(GrantDuration {
            days: self.duration_days,
            months: self.duration_months,
            years: self.duration_years,
        })
    }
}

impl From<UpdateRoleTemplateRequest> for RoleTemplatePatch {
    fn from(value: UpdateRoleTemplateRequest) -> Self {
        let duration = value.duration();
        Self {
            role_name: value.role_name,
            description: value.description,
            is_super_admin: value.is_super_admin,
            duration,
            updated_by: value.updated_by.unwrap_or_else(|| DEFAULT_OPERATOR.to_owned()),
        }
    }
}

/// API representation of a role template.
#[derive(Debug, Serialize)]
pub struct RoleTemplateResponse {
    pub id: i64,
    pub role_name: String,
    pub description: Option<String>,
    pub is_super_admin: bool,
    pub duration_days: Option<u32>,
    pub duration_months: Option<u32>,
    pub duration_years: Option<u32>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<RoleTemplate> for RoleTemplateResponse {
    fn from(value: RoleTemplate) -> Self {
        Self {
            id: value.id.as_i64(),
            role_name: value.role_name,
            description: value.description,
            is_super_admin: value.is_super_admin,
            duration_days: value.duration.days,
            duration_months: value.duration.months,
            duration_years: value.duration.years,
            created_by: value.created_by,
            created_at: value.created_at,
            updated_by: value.updated_by,
            updated_at: value.updated_at,
        }
    }
}

/// Splits a comma-separated path segment into individual emails.
pub fn split_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use staffgate_application::NewGrant;

    use super::{CreateGrantRequest, split_emails};

    #[test]
    fn minimal_create_request_defaults_optional_fields() {
        let parsed: Result<CreateGrantRequest, _> = serde_json::from_str(
            r#"{"principal_id": 12, "role_name": "Recruiter"}"#,
        );
        let request = match parsed {
            Ok(request) => request,
            Err(error) => panic!("failed to parse request: {error}"),
        };

        assert!(!request.is_super_admin);
        assert!(request.page_access.is_empty());
        assert!(request.allowed_job_ids.is_empty());

        let input = NewGrant::from(request);
        assert_eq!(input.created_by, "admin");
        assert!(input.duration.is_empty());
    }

    #[test]
    fn email_path_segment_splits_on_commas() {
        let emails = split_emails(" a@example.com, b@example.com ,,c@example.com");
        assert_eq!(
            emails,
            vec![
                "a@example.com".to_owned(),
                "b@example.com".to_owned(),
                "c@example.com".to_owned(),
            ]
        );
    }
}
