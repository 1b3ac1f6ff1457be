//! Grant lifecycle ports and application service.
//!
//! Owns grant creation (including the synchronous shadow-principal sync),
//! lookup, listing, partial update with expiry recomputation, and the
//! derived summary/detail read views.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use staffgate_core::{AppError, AppResult, NonEmptyString};
use staffgate_domain::{
    AccessGrant, EmailAddress, GrantDuration, GrantId, PermissionMap, PrincipalId, RoleTemplateId,
    expiry_at,
};

use crate::{PrincipalSyncService, RoleTemplateRepository};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Fully-resolved grant row handed to the repository for insertion.
#[derive(Debug, Clone)]
pub struct GrantRecord {
    /// Owning principal reference.
    pub principal_id: PrincipalId,
    /// Optional template reference, already validated to exist.
    pub role_template_id: Option<RoleTemplateId>,
    /// Free-text role label.
    pub role_name: String,
    /// Denormalized principal email.
    pub email: Option<EmailAddress>,
    /// Super-admin override flag.
    pub is_super_admin: bool,
    /// Duration the grant was created with.
    pub duration: GrantDuration,
    /// Derived absolute expiry.
    pub expiry_at: Option<DateTime<Utc>>,
    /// Page toggles.
    pub page_access: PermissionMap,
    /// Subpage toggles.
    pub subpage_access: PermissionMap,
    /// Section toggles.
    pub section_access: PermissionMap,
    /// Job scope list.
    pub allowed_job_ids: Vec<String>,
    /// Department scope list.
    pub allowed_department_ids: Vec<i32>,
    /// Candidate scope list.
    pub allowed_candidate_ids: Vec<String>,
    /// Scope-bypass override flag.
    pub is_unrestricted: bool,
    /// Who created the grant.
    pub created_by: String,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
}

/// Filter and pagination parameters for grant listing.
#[derive(Debug, Clone, Default)]
pub struct GrantListQuery {
    /// Matches role name, principal name, or principal email (substring,
    /// case-insensitive).
    pub search: Option<String>,
    /// Filters on the super-admin flag.
    pub is_super_admin: Option<bool>,
    /// Filters on the originating template.
    pub role_template_id: Option<RoleTemplateId>,
    /// Filters on the owning principal.
    pub principal_id: Option<PrincipalId>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub page_size: u32,
}

/// One page of grants, ordered by creation time descending.
#[derive(Debug, Clone)]
pub struct GrantPage {
    /// Grants on this page.
    pub items: Vec<AccessGrant>,
    /// Total matching rows across all pages.
    pub total: u64,
    /// 1-based page number echoed back.
    pub page: u32,
    /// Page size echoed back.
    pub page_size: u32,
}

/// Repository port for grant persistence.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Inserts a grant row and returns it with its assigned id.
    async fn insert(&self, record: GrantRecord) -> AppResult<AccessGrant>;

    /// Finds a grant by its id.
    async fn find_by_id(&self, id: GrantId) -> AppResult<Option<AccessGrant>>;

    /// Finds the grant owned by a principal.
    async fn find_by_principal(&self, principal_id: PrincipalId)
    -> AppResult<Option<AccessGrant>>;

    /// Finds a grant by normalized email: the denormalized email column
    /// first, falling back to a join through the principal table.
    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<AccessGrant>>;

    /// Lists grants with filtering and pagination, newest first.
    async fn list(&self, query: &GrantListQuery) -> AppResult<GrantPage>;

    /// Persists an updated grant row. Fails with `NotFound` when the row
    /// no longer exists.
    async fn update(&self, grant: &AccessGrant) -> AppResult<()>;

    /// Hard-deletes a grant row. Fails with `NotFound` when missing; the
    /// revocation coordinator owns idempotency above this layer.
    async fn delete(&self, id: GrantId) -> AppResult<()>;

    /// Counts grants referencing a role template.
    async fn count_by_role_template(&self, id: RoleTemplateId) -> AppResult<u64>;
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Fields accepted when creating a grant.
#[derive(Debug, Clone)]
pub struct NewGrant {
    /// Principal the grant applies to.
    pub principal_id: PrincipalId,
    /// Optional template reference.
    pub role_template_id: Option<RoleTemplateId>,
    /// Free-text role label.
    pub role_name: String,
    /// Denormalized email; defaults to the principal's email when absent.
    pub email: Option<String>,
    /// Super-admin override flag.
    pub is_super_admin: bool,
    /// Optional duration.
    pub duration: GrantDuration,
    /// Page toggles.
    pub page_access: PermissionMap,
    /// Subpage toggles.
    pub subpage_access: PermissionMap,
    /// Section toggles.
    pub section_access: PermissionMap,
    /// Job scope list.
    pub allowed_job_ids: Vec<String>,
    /// Department scope list.
    pub allowed_department_ids: Vec<i32>,
    /// Candidate scope list.
    pub allowed_candidate_ids: Vec<String>,
    /// Scope-bypass override flag.
    pub is_unrestricted: bool,
    /// Who is creating the grant.
    pub created_by: String,
}

/// Partial grant update; absent fields stay untouched.
#[derive(Debug, Clone, Default)]
pub struct GrantPatch {
    /// New template reference.
    pub role_template_id: Option<RoleTemplateId>,
    /// New role label.
    pub role_name: Option<String>,
    /// New super-admin flag.
    pub is_super_admin: Option<bool>,
    /// New day component; presence triggers expiry recomputation.
    pub duration_days: Option<u32>,
    /// New month component; presence triggers expiry recomputation.
    pub duration_months: Option<u32>,
    /// New year component; presence triggers expiry recomputation.
    pub duration_years: Option<u32>,
    /// Replacement page toggles.
    pub page_access: Option<PermissionMap>,
    /// Replacement subpage toggles.
    pub subpage_access: Option<PermissionMap>,
    /// Replacement section toggles.
    pub section_access: Option<PermissionMap>,
    /// Replacement job scope list.
    pub allowed_job_ids: Option<Vec<String>>,
    /// Replacement department scope list.
    pub allowed_department_ids: Option<Vec<i32>>,
    /// Replacement candidate scope list.
    pub allowed_candidate_ids: Option<Vec<String>>,
    /// New scope-bypass flag.
    pub is_unrestricted: Option<bool>,
    /// Who is applying the patch.
    pub updated_by: String,
}

impl GrantPatch {
    fn touches_duration(&self) -> bool {
        self.duration_days.is_some()
            || self.duration_months.is_some()
            || self.duration_years.is_some()
    }
}

// ---------------------------------------------------------------------------
// Read views
// ---------------------------------------------------------------------------

/// Counts of permitted surfaces and scopes for one grant.
#[derive(Debug, Clone, PartialEq)]
pub struct GrantSummary {
    /// Owning principal.
    pub principal_id: PrincipalId,
    /// Role label.
    pub role_name: String,
    /// Super-admin flag.
    pub is_super_admin: bool,
    /// Scope-bypass flag.
    pub is_unrestricted: bool,
    /// Absolute expiry, if time-bounded.
    pub expiry_at: Option<DateTime<Utc>>,
    /// Number of page entries.
    pub total_pages: usize,
    /// Number of subpage entries.
    pub total_subpages: usize,
    /// Number of section entries.
    pub total_sections: usize,
    /// Number of job scope entries.
    pub allowed_jobs_count: usize,
    /// Number of department scope entries.
    pub allowed_departments_count: usize,
    /// Number of candidate scope entries.
    pub allowed_candidates_count: usize,
}

/// One named surface with its toggles, for the expanded detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedToggle {
    /// Surface name.
    pub name: String,
    /// View toggle.
    pub can_view: bool,
    /// Edit toggle.
    pub can_edit: bool,
}

/// Expanded permission listing for one grant.
#[derive(Debug, Clone, PartialEq)]
pub struct GrantDetails {
    /// Owning principal.
    pub principal_id: PrincipalId,
    /// Role label.
    pub role_name: String,
    /// Super-admin flag.
    pub is_super_admin: bool,
    /// Scope-bypass flag.
    pub is_unrestricted: bool,
    /// Absolute expiry, if time-bounded.
    pub expiry_at: Option<DateTime<Utc>>,
    /// Page entries.
    pub page_access: Vec<NamedToggle>,
    /// Subpage entries.
    pub subpage_access: Vec<NamedToggle>,
    /// Section entries.
    pub section_access: Vec<NamedToggle>,
    /// Job scope list.
    pub allowed_job_ids: Vec<String>,
    /// Department scope list.
    pub allowed_department_ids: Vec<i32>,
    /// Candidate scope list.
    pub allowed_candidate_ids: Vec<String>,
}

fn expand(map: &PermissionMap) -> Vec<NamedToggle> {
    map.iter()
        .map(|(name, toggle)| NamedToggle {
            name: name.clone(),
            can_view: toggle.can_view,
            can_edit: toggle.can_edit,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for grant lifecycle operations.
#[derive(Clone)]
pub struct GrantService {
    grants: Arc<dyn GrantRepository>,
    role_templates: Arc<dyn RoleTemplateRepository>,
    principal_sync: PrincipalSyncService,
}

impl GrantService {
    /// Creates a new grant service.
    #[must_use]
    pub fn new(
        grants: Arc<dyn GrantRepository>,
        role_templates: Arc<dyn RoleTemplateRepository>,
        principal_sync: PrincipalSyncService,
    ) -> Self {
        Self {
            grants,
            role_templates,
            principal_sync,
        }
    }

    /// Creates a grant for a principal.
    ///
    /// Runs the shadow-principal sync synchronously so the foreign-key
    /// reference is valid at commit time. Fails with `NotFound` when the
    /// template or the principal cannot be resolved, and with `Conflict`
    /// when the principal already holds a grant.
    pub async fn create(&self, input: NewGrant) -> AppResult<AccessGrant> {
        let role_name = NonEmptyString::new(input.role_name)?;
        input.page_access.validate()?;
        input.subpage_access.validate()?;
        input.section_access.validate()?;

        if let Some(template_id) = input.role_template_id
            && self.role_templates.find_by_id(template_id).await?.is_none()
        {
            return Err(AppError::NotFound(format!(
                "role template '{template_id}' does not exist"
            )));
        }

        let principal = self
            .principal_sync
            .ensure_principal(input.principal_id)
            .await?;

        if self
            .grants
            .find_by_principal(input.principal_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "principal '{}' already holds an access grant",
                input.principal_id
            )));
        }

        let email = match input.email {
            Some(raw) => Some(EmailAddress::new(raw)?),
            None => Some(principal.email.clone()),
        };

        let now = Utc::now();
        let record = GrantRecord {
            principal_id: input.principal_id,
            role_template_id: input.role_template_id,
            role_name: role_name.into(),
            email,
            is_super_admin: input.is_super_admin,
            duration: input.duration,
            expiry_at: expiry_at(now, &input.duration),
            page_access: input.page_access,
            subpage_access: input.subpage_access,
            section_access: input.section_access,
            allowed_job_ids: input.allowed_job_ids,
            allowed_department_ids: input.allowed_department_ids,
            allowed_candidate_ids: input.allowed_candidate_ids,
            is_unrestricted: input.is_unrestricted,
            created_by: input.created_by,
            created_at: now,
        };

        self.grants.insert(record).await
    }

    /// Returns a grant by id.
    pub async fn get(&self, id: GrantId) -> AppResult<AccessGrant> {
        self.grants
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("access grant '{id}' does not exist")))
    }

    /// Returns the grant owned by a principal.
    pub async fn get_by_principal(&self, principal_id: PrincipalId) -> AppResult<AccessGrant> {
        self.grants
            .find_by_principal(principal_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "principal '{principal_id}' does not hold an access grant"
                ))
            })
    }

    /// Lists grants with filtering and pagination.
    pub async fn list(&self, mut query: GrantListQuery) -> AppResult<GrantPage> {
        if query.page == 0 {
            query.page = 1;
        }
        if query.page_size == 0 {
            query.page_size = 10;
        }

        self.grants.list(&query).await
    }

    /// Applies a partial update, recomputing the expiry only when a
    /// duration field is present in the patch.
    pub async fn update(&self, id: GrantId, patch: GrantPatch) -> AppResult<AccessGrant> {
        let mut grant = self.get(id).await?;

        if let Some(template_id) = patch.role_template_id {
            if self.role_templates.find_by_id(template_id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "role template '{template_id}' does not exist"
                )));
            }
            grant.role_template_id = Some(template_id);
        }

        if let Some(role_name) = patch.role_name.clone() {
            grant.role_name = NonEmptyString::new(role_name)?.into();
        }
        if let Some(is_super_admin) = patch.is_super_admin {
            grant.is_super_admin = is_super_admin;
        }
        if let Some(map) = patch.page_access.clone() {
            map.validate()?;
            grant.page_access = map;
        }
        if let Some(map) = patch.subpage_access.clone() {
            map.validate()?;
            grant.subpage_access = map;
        }
        if let Some(map) = patch.section_access.clone() {
            map.validate()?;
            grant.section_access = map;
        }
        if let Some(job_ids) = patch.allowed_job_ids.clone() {
            grant.allowed_job_ids = job_ids;
        }
        if let Some(department_ids) = patch.allowed_department_ids.clone() {
            grant.allowed_department_ids = department_ids;
        }
        if let Some(candidate_ids) = patch.allowed_candidate_ids.clone() {
            grant.allowed_candidate_ids = candidate_ids;
        }
        if let Some(is_unrestricted) = patch.is_unrestricted {
            grant.is_unrestricted = is_unrestricted;
        }

        if patch.touches_duration() {
            grant.duration = GrantDuration {
                days: patch.duration_days.or(grant.duration.days),
                months: patch.duration_months.or(grant.duration.months),
                years: patch.duration_years.or(grant.duration.years),
            };
            grant.expiry_at = expiry_at(Utc::now(), &grant.duration);
        }

        grant.updated_by = Some(patch.updated_by);
        grant.updated_at = Some(Utc::now());

        self.grants.update(&grant).await?;
        Ok(grant)
    }

    /// Returns the counted summary view for a grant.
    pub async fn summary(&self, id: GrantId) -> AppResult<GrantSummary> {
        let grant = self.get(id).await?;

        Ok(GrantSummary {
            principal_id: grant.principal_id,
            role_name: grant.role_name,
            is_super_admin: grant.is_super_admin,
            is_unrestricted: grant.is_unrestricted,
            expiry_at: grant.expiry_at,
            total_pages: grant.page_access.len(),
            total_subpages: grant.subpage_access.len(),
            total_sections: grant.section_access.len(),
            allowed_jobs_count: grant.allowed_job_ids.len(),
            allowed_departments_count: grant.allowed_department_ids.len(),
            allowed_candidates_count: grant.allowed_candidate_ids.len(),
        })
    }

    /// Returns the expanded permission listing for a grant.
    pub async fn details(&self, id: GrantId) -> AppResult<GrantDetails> {
        let grant = self.get(id).await?;

        Ok(GrantDetails {
            principal_id: grant.principal_id,
            role_name: grant.role_name.clone(),
            is_super_admin: grant.is_super_admin,
            is_unrestricted: grant.is_unrestricted,
            expiry_at: grant.expiry_at,
            page_access: expand(&grant.page_access),
            subpage_access: expand(&grant.subpage_access),
            section_access: expand(&grant.section_access),
            allowed_job_ids: grant.allowed_job_ids,
            allowed_department_ids: grant.allowed_department_ids,
            allowed_candidate_ids: grant.allowed_candidate_ids,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use staffgate_core::{AppError, AppResult};
    use staffgate_domain::{
        AccessGrant, AccessToggle, EmailAddress, GrantDuration, GrantId, PermissionMap,
        PrincipalId, RoleTemplate, RoleTemplateId,
    };
    use tokio::sync::Mutex;

    use crate::principal_sync_service::tests::{
        FakePrincipalDirectory, FakePrincipalRepository, principal,
    };
    use crate::{PrincipalSyncService, RoleTemplateRecord, RoleTemplateRepository};

    use super::{GrantListQuery, GrantPage, GrantPatch, GrantRecord, GrantRepository, GrantService,
        NewGrant};

    #[derive(Default)]
    pub(crate) struct FakeGrantRepository {
        pub(crate) rows: Mutex<HashMap<i64, AccessGrant>>,
        next_id: AtomicI64,
    }

    #[async_trait]
    impl GrantRepository for FakeGrantRepository {
        async fn insert(&self, record: GrantRecord) -> AppResult<AccessGrant> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let grant = AccessGrant {
                id: GrantId::from_i64(id),
                principal_id: record.principal_id,
                role_template_id: record.role_template_id,
                role_name: record.role_name,
                email: record.email,
                is_super_admin: record.is_super_admin,
                duration: record.duration,
                expiry_at: record.expiry_at,
                page_access: record.page_access,
                subpage_access: record.subpage_access,
                section_access: record.section_access,
                allowed_job_ids: record.allowed_job_ids,
                allowed_department_ids: record.allowed_department_ids,
                allowed_candidate_ids: record.allowed_candidate_ids,
                is_unrestricted: record.is_unrestricted,
                created_by: record.created_by,
                created_at: record.created_at,
                updated_by: None,
                updated_at: None,
            };
            self.rows.lock().await.insert(id, grant.clone());
            Ok(grant)
        }

        async fn find_by_id(&self, id: GrantId) -> AppResult<Option<AccessGrant>> {
            Ok(self.rows.lock().await.get(&id.as_i64()).cloned())
        }

        async fn find_by_principal(
            &self,
            principal_id: PrincipalId,
        ) -> AppResult<Option<AccessGrant>> {
            Ok(self
                .rows
                .lock()
                .await
                .values()
                .find(|grant| grant.principal_id == principal_id)
                .cloned())
        }

        async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<AccessGrant>> {
            Ok(self
                .rows
                .lock()
                .await
                .values()
                .find(|grant| grant.email.as_ref() == Some(email))
                .cloned())
        }

        async fn list(&self, query: &GrantListQuery) -> AppResult<GrantPage> {
            let rows = self.rows.lock().await;
            let mut items: Vec<AccessGrant> = rows
                .values()
                .filter(|grant| {
                    query
                        .is_super_admin
                        .is_none_or(|flag| grant.is_super_admin == flag)
                })
                .filter(|grant| {
                    query
                        .principal_id
                        .is_none_or(|id| grant.principal_id == id)
                })
                .cloned()
                .collect();
            items.sort_by(|left, right| right.created_at.cmp(&left.created_at));
            let total = items.len() as u64;
            Ok(GrantPage {
                items,
                total,
                page: query.page,
                page_size: query.page_size,
            })
        }

        async fn update(&self, grant: &AccessGrant) -> AppResult<()> {
            let mut rows = self.rows.lock().await;
            if !rows.contains_key(&grant.id.as_i64()) {
                return Err(AppError::NotFound("grant vanished".to_owned()));
            }
            rows.insert(grant.id.as_i64(), grant.clone());
            Ok(())
        }

        async fn delete(&self, id: GrantId) -> AppResult<()> {
            if self.rows.lock().await.remove(&id.as_i64()).is_none() {
                return Err(AppError::NotFound(format!(
                    "access grant '{id}' does not exist"
                )));
            }
            Ok(())
        }

        async fn count_by_role_template(&self, id: RoleTemplateId) -> AppResult<u64> {
            Ok(self
                .rows
                .lock()
                .await
                .values()
                .filter(|grant| grant.role_template_id == Some(id))
                .count() as u64)
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeRoleTemplateRepository {
        pub(crate) rows: Mutex<HashMap<i64, RoleTemplate>>,
        next_id: AtomicI64,
    }

    #[async_trait]
    impl RoleTemplateRepository for FakeRoleTemplateRepository {
        async fn insert(&self, record: RoleTemplateRecord) -> AppResult<RoleTemplate> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let template = RoleTemplate {
                id: RoleTemplateId::from_i64(id),
                role_name: record.role_name,
                description: record.description,
                is_super_admin: record.is_super_admin,
                duration: record.duration,
                created_by: record.created_by,
                created_at: record.created_at,
                updated_by: None,
                updated_at: None,
            };
            self.rows.lock().await.insert(id, template.clone());
            Ok(template)
        }

        async fn find_by_id(&self, id: RoleTemplateId) -> AppResult<Option<RoleTemplate>> {
            Ok(self.rows.lock().await.get(&id.as_i64()).cloned())
        }

        async fn find_by_name(&self, role_name: &str) -> AppResult<Option<RoleTemplate>> {
            Ok(self
                .rows
                .lock()
                .await
                .values()
                .find(|template| template.role_name == role_name)
                .cloned())
        }

        async fn list(&self) -> AppResult<Vec<RoleTemplate>> {
            Ok(self.rows.lock().await.values().cloned().collect())
        }

        async fn update(&self, template: &RoleTemplate) -> AppResult<()> {
            self.rows
                .lock()
                .await
                .insert(template.id.as_i64(), template.clone());
            Ok(())
        }

        async fn delete(&self, id: RoleTemplateId) -> AppResult<()> {
            if self.rows.lock().await.remove(&id.as_i64()).is_none() {
                return Err(AppError::NotFound(format!(
                    "role template '{id}' does not exist"
                )));
            }
            Ok(())
        }
    }

    pub(crate) struct GrantHarness {
        pub(crate) grants: Arc<FakeGrantRepository>,
        pub(crate) principals: Arc<FakePrincipalRepository>,
        pub(crate) templates: Arc<FakeRoleTemplateRepository>,
        pub(crate) service: GrantService,
    }

    pub(crate) fn harness_with_directory(directory: FakePrincipalDirectory) -> GrantHarness {
        let grants = Arc::new(FakeGrantRepository::default());
        let principals = Arc::new(FakePrincipalRepository::default());
        let templates = Arc::new(FakeRoleTemplateRepository::default());
        let service = GrantService::new(
            grants.clone(),
            templates.clone(),
            PrincipalSyncService::new(principals.clone(), Arc::new(directory)),
        );

        GrantHarness {
            grants,
            principals,
            templates,
            service,
        }
    }

    pub(crate) fn new_grant(principal_id: i64) -> NewGrant {
        NewGrant {
            principal_id: PrincipalId::from_i64(principal_id),
            role_template_id: None,
            role_name: "Recruiter".to_owned(),
            email: None,
            is_super_admin: false,
            duration: GrantDuration::default(),
            page_access: PermissionMap::new(),
            subpage_access: PermissionMap::new(),
            section_access: PermissionMap::new(),
            allowed_job_ids: Vec::new(),
            allowed_department_ids: Vec::new(),
            allowed_candidate_ids: Vec::new(),
            is_unrestricted: false,
            created_by: "admin".to_owned(),
        }
    }

    #[tokio::test]
    async fn create_materializes_shadow_principal_from_directory() {
        let directory = FakePrincipalDirectory {
            rows: HashMap::from([(11, principal(11, "Eleven@Example.com"))]),
        };
        let harness = harness_with_directory(directory);

        let created = harness.service.create(new_grant(11)).await;
        assert!(created.is_ok());

        let shadow = harness.principals.rows.lock().await;
        let materialized = shadow.get(&11);
        assert!(materialized.is_some_and(|p| p.email.as_str() == "eleven@example.com"));
    }

    #[tokio::test]
    async fn create_defaults_denormalized_email_to_principal_email() {
        let directory = FakePrincipalDirectory {
            rows: HashMap::from([(3, principal(3, "Three@Example.com"))]),
        };
        let harness = harness_with_directory(directory);

        let created = harness.service.create(new_grant(3)).await;
        let email = created.ok().and_then(|grant| grant.email);
        assert_eq!(email.map(String::from).as_deref(), Some("three@example.com"));
    }

    #[tokio::test]
    async fn second_grant_for_same_principal_conflicts() {
        let directory = FakePrincipalDirectory {
            rows: HashMap::from([(4, principal(4, "four@example.com"))]),
        };
        let harness = harness_with_directory(directory);

        assert!(harness.service.create(new_grant(4)).await.is_ok());
        let second = harness.service.create(new_grant(4)).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
        assert_eq!(harness.grants.rows.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_principal_in_both_sources_is_not_found() {
        let harness = harness_with_directory(FakePrincipalDirectory::default());

        let created = harness.service.create(new_grant(404)).await;
        assert!(matches!(created, Err(AppError::NotFound(_))));
        assert!(harness.grants.rows.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_role_template_is_not_found() {
        let directory = FakePrincipalDirectory {
            rows: HashMap::from([(5, principal(5, "five@example.com"))]),
        };
        let harness = harness_with_directory(directory);

        let mut input = new_grant(5);
        input.role_template_id = Some(RoleTemplateId::from_i64(77));
        let created = harness.service.create(input).await;
        assert!(matches!(created, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn creation_with_duration_derives_expiry_from_creation_time() {
        let directory = FakePrincipalDirectory {
            rows: HashMap::from([(6, principal(6, "six@example.com"))]),
        };
        let harness = harness_with_directory(directory);

        let mut input = new_grant(6);
        input.duration = GrantDuration {
            days: Some(1),
            months: Some(2),
            years: Some(1),
        };
        let created = harness.service.create(input).await;
        let Ok(grant) = created else {
            panic!("creation failed");
        };

        let expected = grant.created_at + Duration::days(1 + 2 * 30 + 365);
        assert_eq!(grant.expiry_at, Some(expected));
    }

    #[tokio::test]
    async fn creation_without_duration_has_no_expiry() {
        let directory = FakePrincipalDirectory {
            rows: HashMap::from([(8, principal(8, "eight@example.com"))]),
        };
        let harness = harness_with_directory(directory);

        let created = harness.service.create(new_grant(8)).await;
        assert!(created.is_ok_and(|grant| grant.expiry_at.is_none()));
    }

    #[tokio::test]
    async fn update_without_duration_fields_keeps_expiry() {
        let directory = FakePrincipalDirectory {
            rows: HashMap::from([(9, principal(9, "nine@example.com"))]),
        };
        let harness = harness_with_directory(directory);

        let mut input = new_grant(9);
        input.duration = GrantDuration {
            days: Some(30),
            ..GrantDuration::default()
        };
        let Ok(created) = harness.service.create(input).await else {
            panic!("creation failed");
        };

        let patch = GrantPatch {
            role_name: Some("Lead Recruiter".to_owned()),
            updated_by: "admin".to_owned(),
            ..GrantPatch::default()
        };
        let updated = harness.service.update(created.id, patch).await;
        let Ok(updated) = updated else {
            panic!("update failed");
        };

        assert_eq!(updated.expiry_at, created.expiry_at);
        assert_eq!(updated.role_name, "Lead Recruiter");
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn update_with_duration_field_recomputes_expiry() {
        let directory = FakePrincipalDirectory {
            rows: HashMap::from([(10, principal(10, "ten@example.com"))]),
        };
        let harness = harness_with_directory(directory);

        let Ok(created) = harness.service.create(new_grant(10)).await else {
            panic!("creation failed");
        };
        assert_eq!(created.expiry_at, None);

        let patch = GrantPatch {
            duration_days: Some(7),
            updated_by: "admin".to_owned(),
            ..GrantPatch::default()
        };
        let updated = harness.service.update(created.id, patch).await;
        let Ok(updated) = updated else {
            panic!("update failed");
        };

        let expiry = updated.expiry_at;
        assert!(expiry.is_some_and(|at| at > Utc::now() + Duration::days(6)));
    }

    #[tokio::test]
    async fn summary_counts_surfaces_and_scopes() {
        let directory = FakePrincipalDirectory {
            rows: HashMap::from([(12, principal(12, "twelve@example.com"))]),
        };
        let harness = harness_with_directory(directory);

        let mut input = new_grant(12);
        let pages = PermissionMap::from_entries([
            (
                "jobs".to_owned(),
                AccessToggle {
                    can_view: true,
                    can_edit: false,
                },
            ),
            (
                "candidates".to_owned(),
                AccessToggle {
                    can_view: true,
                    can_edit: true,
                },
            ),
        ]);
        let Ok(pages) = pages else {
            panic!("invalid map");
        };
        input.page_access = pages;
        input.allowed_job_ids = vec!["J-1".to_owned(), "J-2".to_owned(), "J-3".to_owned()];

        let Ok(created) = harness.service.create(input).await else {
            panic!("creation failed");
        };
        let summary = harness.service.summary(created.id).await;
        let Ok(summary) = summary else {
            panic!("summary failed");
        };

        assert_eq!(summary.total_pages, 2);
        assert_eq!(summary.total_subpages, 0);
        assert_eq!(summary.allowed_jobs_count, 3);
    }

    #[tokio::test]
    async fn details_expand_permission_maps() {
        let directory = FakePrincipalDirectory {
            rows: HashMap::from([(13, principal(13, "thirteen@example.com"))]),
        };
        let harness = harness_with_directory(directory);

        let mut input = new_grant(13);
        let sections = PermissionMap::from_entries([(
            "salary".to_owned(),
            AccessToggle {
                can_view: true,
                can_edit: false,
            },
        )]);
        let Ok(sections) = sections else {
            panic!("invalid map");
        };
        input.section_access = sections;

        let Ok(created) = harness.service.create(input).await else {
            panic!("creation failed");
        };
        let details = harness.service.details(created.id).await;
        let Ok(details) = details else {
            panic!("details failed");
        };

        assert_eq!(details.section_access.len(), 1);
        assert_eq!(details.section_access[0].name, "salary");
        assert!(details.section_access[0].can_view);
    }
}
