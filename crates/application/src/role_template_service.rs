//! Role template catalog management.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use staffgate_core::{AppError, AppResult, NonEmptyString};
use staffgate_domain::{GrantDuration, RoleTemplate, RoleTemplateId};

use crate::GrantRepository;

/// Fully-resolved template row handed to the repository for insertion.
#[derive(Debug, Clone)]
pub struct RoleTemplateRecord {
    /// Unique template name.
    pub role_name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Whether grants stamped from this template are super-admin.
    pub is_super_admin: bool,
    /// Default duration for grants stamped from this template.
    pub duration: GrantDuration,
    /// Who created the template.
    pub created_by: String,
    /// When the template was created.
    pub created_at: DateTime<Utc>,
}

/// Repository port for role template persistence.
#[async_trait]
pub trait RoleTemplateRepository: Send + Sync {
    /// Inserts a template row and returns it with its assigned id.
    async fn insert(&self, record: RoleTemplateRecord) -> AppResult<RoleTemplate>;

    /// Finds a template by id.
    async fn find_by_id(&self, id: RoleTemplateId) -> AppResult<Option<RoleTemplate>>;

    /// Finds a template by its exact name.
    async fn find_by_name(&self, role_name: &str) -> AppResult<Option<RoleTemplate>>;

    /// Lists all templates.
    async fn list(&self) -> AppResult<Vec<RoleTemplate>>;

    /// Persists an updated template row.
    async fn update(&self, template: &RoleTemplate) -> AppResult<()>;

    /// Hard-deletes a template row. Fails with `NotFound` when missing.
    async fn delete(&self, id: RoleTemplateId) -> AppResult<()>;
}

/// Fields accepted when creating a template.
#[derive(Debug, Clone)]
pub struct NewRoleTemplate {
    /// Unique template name.
    pub role_name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Whether grants stamped from this template are super-admin.
    pub is_super_admin: bool,
    /// Default duration for grants stamped from this template.
    pub duration: GrantDuration,
    /// Who is creating the template.
    pub created_by: String,
}

/// Partial template update; absent fields stay untouched.
#[derive(Debug, Clone, Default)]
pub struct RoleTemplatePatch {
    /// New template name; must stay unique.
    pub role_name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New super-admin flag.
    pub is_super_admin: Option<bool>,
    /// New default duration.
    pub duration: Option<GrantDuration>,
    /// Who is applying the patch.
    pub updated_by: String,
}

/// Application service for the role template catalog.
#[derive(Clone)]
pub struct RoleTemplateService {
    templates: Arc<dyn RoleTemplateRepository>,
    grants: Arc<dyn GrantRepository>,
}

impl RoleTemplateService {
    /// Creates a new role template service.
    #[must_use]
    pub fn new(
        templates: Arc<dyn RoleTemplateRepository>,
        grants: Arc<dyn GrantRepository>,
    ) -> Self {
        Self { templates, grants }
    }

    /// Creates a template, failing with `Conflict` when the name is taken.
    pub async fn create(&self, input: NewRoleTemplate) -> AppResult<RoleTemplate> {
        let role_name = NonEmptyString::new(input.role_name)?;

        if self
            .templates
            .find_by_name(role_name.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "role template '{}' already exists",
                role_name.as_str()
            )));
        }

        let record = RoleTemplateRecord {
            role_name: role_name.into(),
            description: input.description,
            is_super_admin: input.is_super_admin,
            duration: input.duration,
            created_by: input.created_by,
            created_at: Utc::now(),
        };
        self.templates.insert(record).await
    }

    /// Returns a template by id.
    pub async fn get(&self, id: RoleTemplateId) -> AppResult<RoleTemplate> {
        self.templates
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role template '{id}' does not exist")))
    }

    /// Lists all templates.
    pub async fn list(&self) -> AppResult<Vec<RoleTemplate>> {
        self.templates.list().await
    }

    /// Applies a partial update, re-checking name uniqueness on rename.
    pub async fn update(
        &self,
        id: RoleTemplateId,
        patch: RoleTemplatePatch,
    ) -> AppResult<RoleTemplate> {
        let mut template = self.get(id).await?;

        if let Some(role_name) = patch.role_name {
            let role_name = NonEmptyString::new(role_name)?;
            if role_name.as_str() != template.role_name
                && self
                    .templates
                    .find_by_name(role_name.as_str())
                    .await?
                    .is_some()
            {
                return Err(AppError::Conflict(format!(
                    "role template '{}' already exists",
                    role_name.as_str()
                )));
            }
            template.role_name = role_name.into();
        }
        if let Some(description) = patch.description {
            template.description = Some(description);
        }
        if let Some(is_super_admin) = patch.is_super_admin {
            template.is_super_admin = is_super_admin;
        }
        if let Some(duration) = patch.duration {
            template.duration = duration;
        }

        template.updated_by = Some(patch.updated_by);
        template.updated_at = Some(Utc::now());

        self.templates.update(&template).await?;
        Ok(template)
    }

    /// Deletes a template, refusing while any grant still references it.
    pub async fn delete(&self, id: RoleTemplateId) -> AppResult<()> {
        let template = self.get(id).await?;

        let referencing = self.grants.count_by_role_template(template.id).await?;
        if referencing > 0 {
            return Err(AppError::Conflict(format!(
                "role template '{}' is referenced by {referencing} access grant(s)",
                template.role_name
            )));
        }

        self.templates.delete(template.id).await
    }
}
