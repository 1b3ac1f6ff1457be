use async_trait::async_trait;
use chrono::{DateTime, Utc};

use staffgate_application::{RoleTemplateRecord, RoleTemplateRepository};
use staffgate_core::{AppError, AppResult};
use staffgate_domain::{GrantDuration, RoleTemplate, RoleTemplateId};

use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed repository for role templates.
#[derive(Clone)]
pub struct PostgresRoleTemplateRepository {
    pool: PgPool,
}

impl PostgresRoleTemplateRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleTemplateRow {
    id: i64,
    role_name: String,
    description: Option<String>,
    is_super_admin: bool,
    duration_days: Option<i32>,
    duration_months: Option<i32>,
    duration_years: Option<i32>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_by: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl RoleTemplateRow {
    fn into_template(self) -> AppResult<RoleTemplate> {
        let component = |value: Option<i32>| -> AppResult<Option<u32>> {
            value.map(u32::try_from).transpose().map_err(|error| {
                AppError::Internal(format!(
                    "negative duration component stored for role template '{}': {error}",
                    self.id
                ))
            })
        };

        Ok(RoleTemplate {
            id: RoleTemplateId::from_i64(self.id),
            role_name: self.role_name.clone(),
            description: self.description.clone(),
            is_super_admin: self.is_super_admin,
            duration: GrantDuration {
                days: component(self.duration_days)?,
                months: component(self.duration_months)?,
                years: component(self.duration_years)?,
            },
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            updated_by: self.updated_by.clone(),
            updated_at: self.updated_at,
        })
    }
}

const TEMPLATE_COLUMNS: &str = r#"
    id,
    role_name,
    description,
    is_super_admin,
    duration_days,
    duration_months,
    duration_years,
    created_by,
    created_at,
    updated_by,
    updated_at
"#;

fn signed_component(value: Option<u32>) -> Option<i32> {
    value.and_then(|component| i32::try_from(component).ok())
}

#[async_trait]
impl RoleTemplateRepository for PostgresRoleTemplateRepository {
    async fn insert(&self, record: RoleTemplateRecord) -> AppResult<RoleTemplate> {
        let row = sqlx::query_as::<_, RoleTemplateRow>(&format!(
            r#"
            INSERT INTO role_templates (
                role_name,
                description,
                is_super_admin,
                duration_days,
                duration_months,
                duration_years,
                created_by,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(record.role_name.as_str())
        .bind(record.description.as_deref())
        .bind(record.is_super_admin)
        .bind(signed_component(record.duration.days))
        .bind(signed_component(record.duration.months))
        .bind(signed_component(record.duration.years))
        .bind(record.created_by.as_str())
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| match error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                AppError::Conflict(format!(
                    "role template '{}' already exists",
                    record.role_name
                ))
            }
            error => AppError::Internal(format!(
                "failed to insert role template '{}': {error}",
                record.role_name
            )),
        })?;

        row.into_template()
    }

    async fn find_by_id(&self, id: RoleTemplateId) -> AppResult<Option<RoleTemplate>> {
        let row = sqlx::query_as::<_, RoleTemplateRow>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM role_templates
            WHERE id = $1
            "#
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load role template '{id}': {error}"))
        })?;

        row.map(RoleTemplateRow::into_template).transpose()
    }

    async fn find_by_name(&self, role_name: &str) -> AppResult<Option<RoleTemplate>> {
        let row = sqlx::query_as::<_, RoleTemplateRow>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM role_templates
            WHERE role_name = $1
            "#
        ))
        .bind(role_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load role template named '{role_name}': {error}"
            ))
        })?;

        row.map(RoleTemplateRow::into_template).transpose()
    }

    async fn list(&self) -> AppResult<Vec<RoleTemplate>> {
        let rows = sqlx::query_as::<_, RoleTemplateRow>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM role_templates
            ORDER BY role_name ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role templates: {error}"))
        })?;

        rows.into_iter()
            .map(RoleTemplateRow::into_template)
            .collect()
    }

    async fn update(&self, template: &RoleTemplate) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE role_templates
            SET role_name = $2,
                description = $3,
                is_super_admin = $4,
                duration_days = $5,
                duration_months = $6,
                duration_years = $7,
                updated_by = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(template.id.as_i64())
        .bind(template.role_name.as_str())
        .bind(template.description.as_deref())
        .bind(template.is_super_admin)
        .bind(signed_component(template.duration.days))
        .bind(signed_component(template.duration.months))
        .bind(signed_component(template.duration.years))
        .bind(template.updated_by.as_deref())
        .bind(template.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to update role template '{}': {error}",
                template.id
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "role template '{}' does not exist",
                template.id
            )));
        }

        Ok(())
    }

    async fn delete(&self, id: RoleTemplateId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM role_templates WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete role template '{id}': {error}"))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "role template '{id}' does not exist"
            )));
        }

        Ok(())
    }
}
