use async_trait::async_trait;
use chrono::{DateTime, Utc};

use staffgate_application::{GrantListQuery, GrantPage, GrantRecord, GrantRepository};
use staffgate_core::{AppError, AppResult};
use staffgate_domain::{
    AccessGrant, EmailAddress, GrantDuration, GrantId, PermissionMap, PrincipalId, RoleTemplateId,
};

use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed repository for access grants.
#[derive(Clone)]
pub struct PostgresGrantRepository {
    pool: PgPool,
}

impl PostgresGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    id: i64,
    principal_id: i64,
    role_template_id: Option<i64>,
    role_name: String,
    email: Option<String>,
    is_super_admin: bool,
    duration_days: Option<i32>,
    duration_months: Option<i32>,
    duration_years: Option<i32>,
    expiry_at: Option<DateTime<Utc>>,
    page_access: Json<PermissionMap>,
    subpage_access: Json<PermissionMap>,
    section_access: Json<PermissionMap>,
    allowed_job_ids: Vec<String>,
    allowed_department_ids: Vec<i32>,
    allowed_candidate_ids: Vec<String>,
    is_unrestricted: bool,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_by: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

fn duration_component(value: Option<i32>, grant_id: i64) -> AppResult<Option<u32>> {
    value
        .map(u32::try_from)
        .transpose()
        .map_err(|error| {
            AppError::Internal(format!(
                "negative duration component stored for grant '{grant_id}': {error}"
            ))
        })
}

impl GrantRow {
    fn into_grant(self) -> AppResult<AccessGrant> {
        let email = self
            .email
            .map(EmailAddress::new)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!(
                    "malformed email stored for grant '{}': {error}",
                    self.id
                ))
            })?;

        let duration = GrantDuration {
            days: duration_component(self.duration_days, self.id)?,
            months: duration_component(self.duration_months, self.id)?,
            years: duration_component(self.duration_years, self.id)?,
        };

        Ok(AccessGrant {
            id: GrantId::from_i64(self.id),
            principal_id: PrincipalId::from_i64(self.principal_id),
            role_template_id: self.role_template_id.map(RoleTemplateId::from_i64),
            role_name: self.role_name,
            email,
            is_super_admin: self.is_super_admin,
            duration,
            expiry_at: self.expiry_at,
            page_access: self.page_access.0,
            subpage_access: self.subpage_access.0,
            section_access: self.section_access.0,
            allowed_job_ids: self.allowed_job_ids,
            allowed_department_ids: self.allowed_department_ids,
            allowed_candidate_ids: self.allowed_candidate_ids,
            is_unrestricted: self.is_unrestricted,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_by: self.updated_by,
            updated_at: self.updated_at,
        })
    }
}

const GRANT_COLUMNS: &str = r#"
    grants.id,
    grants.principal_id,
    grants.role_template_id,
    grants.role_name,
    grants.email,
    grants.is_super_admin,
    grants.duration_days,
    grants.duration_months,
    grants.duration_years,
    grants.expiry_at,
    grants.page_access,
    grants.subpage_access,
    grants.section_access,
    grants.allowed_job_ids,
    grants.allowed_department_ids,
    grants.allowed_candidate_ids,
    grants.is_unrestricted,
    grants.created_by,
    grants.created_at,
    grants.updated_by,
    grants.updated_at
"#;

fn signed_component(value: Option<u32>) -> Option<i32> {
    value.and_then(|component| i32::try_from(component).ok())
}

#[async_trait]
impl GrantRepository for PostgresGrantRepository {
    async fn insert(&self, record: GrantRecord) -> AppResult<AccessGrant> {
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            INSERT INTO access_grants AS grants (
                principal_id,
                role_template_id,
                role_name,
                email,
                is_super_admin,
                duration_days,
                duration_months,
                duration_years,
                expiry_at,
                page_access,
                subpage_access,
                section_access,
                allowed_job_ids,
                allowed_department_ids,
                allowed_candidate_ids,
                is_unrestricted,
                created_by,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {GRANT_COLUMNS}
            "#
        ))
        .bind(record.principal_id.as_i64())
        .bind(record.role_template_id.map(|id| id.as_i64()))
        .bind(record.role_name.as_str())
        .bind(record.email.as_ref().map(EmailAddress::as_str))
        .bind(record.is_super_admin)
        .bind(signed_component(record.duration.days))
        .bind(signed_component(record.duration.months))
        .bind(signed_component(record.duration.years))
        .bind(record.expiry_at)
        .bind(Json(&record.page_access))
        .bind(Json(&record.subpage_access))
        .bind(Json(&record.section_access))
        .bind(&record.allowed_job_ids)
        .bind(&record.allowed_department_ids)
        .bind(&record.allowed_candidate_ids)
        .bind(record.is_unrestricted)
        .bind(record.created_by.as_str())
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| match error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                AppError::Conflict(format!(
                    "principal '{}' already holds an access grant",
                    record.principal_id
                ))
            }
            error => AppError::Internal(format!(
                "failed to insert access grant for principal '{}': {error}",
                record.principal_id
            )),
        })?;

        row.into_grant()
    }

    async fn find_by_id(&self, id: GrantId) -> AppResult<Option<AccessGrant>> {
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM access_grants AS grants
            WHERE grants.id = $1
            "#
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load access grant '{id}': {error}"))
        })?;

        row.map(GrantRow::into_grant).transpose()
    }

    async fn find_by_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Option<AccessGrant>> {
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM access_grants AS grants
            WHERE grants.principal_id = $1
            "#
        ))
        .bind(principal_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load access grant for principal '{principal_id}': {error}"
            ))
        })?;

        row.map(GrantRow::into_grant).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<AccessGrant>> {
        // The denormalized email column is authoritative when populated;
        // older rows fall back to a join through the shadow principal.
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM access_grants AS grants
            LEFT JOIN principals ON principals.id = grants.principal_id
            WHERE lower(grants.email) = $1 OR lower(principals.email) = $1
            ORDER BY (lower(grants.email) = $1) DESC
            LIMIT 1
            "#
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load access grant for email '{email}': {error}"
            ))
        })?;

        row.map(GrantRow::into_grant).transpose()
    }

    async fn list(&self, query: &GrantListQuery) -> AppResult<GrantPage> {
        let search = query
            .search
            .as_ref()
            .map(|term| format!("%{}%", term.trim()));
        let offset = i64::from(query.page.saturating_sub(1)) * i64::from(query.page_size);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM access_grants AS grants
            LEFT JOIN principals ON principals.id = grants.principal_id
            WHERE ($1::TEXT IS NULL
                   OR grants.role_name ILIKE $1
                   OR grants.email ILIKE $1
                   OR principals.display_name ILIKE $1
                   OR principals.email ILIKE $1)
              AND ($2::BOOLEAN IS NULL OR grants.is_super_admin = $2)
              AND ($3::BIGINT IS NULL OR grants.role_template_id = $3)
              AND ($4::BIGINT IS NULL OR grants.principal_id = $4)
            "#,
        )
        .bind(search.as_deref())
        .bind(query.is_super_admin)
        .bind(query.role_template_id.map(|id| id.as_i64()))
        .bind(query.principal_id.map(|id| id.as_i64()))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count access grants: {error}"))
        })?;

        let rows = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM access_grants AS grants
            LEFT JOIN principals ON principals.id = grants.principal_id
            WHERE ($1::TEXT IS NULL
                   OR grants.role_name ILIKE $1
                   OR grants.email ILIKE $1
                   OR principals.display_name ILIKE $1
                   OR principals.email ILIKE $1)
              AND ($2::BOOLEAN IS NULL OR grants.is_super_admin = $2)
              AND ($3::BIGINT IS NULL OR grants.role_template_id = $3)
              AND ($4::BIGINT IS NULL OR grants.principal_id = $4)
            ORDER BY grants.created_at DESC, grants.id DESC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(search.as_deref())
        .bind(query.is_super_admin)
        .bind(query.role_template_id.map(|id| id.as_i64()))
        .bind(query.principal_id.map(|id| id.as_i64()))
        .bind(i64::from(query.page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list access grants: {error}"))
        })?;

        let items = rows
            .into_iter()
            .map(GrantRow::into_grant)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(GrantPage {
            items,
            total: u64::try_from(total).unwrap_or_default(),
            page: query.page,
            page_size: query.page_size,
        })
    }

    async fn update(&self, grant: &AccessGrant) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE access_grants
            SET role_template_id = $2,
                role_name = $3,
                email = $4,
                is_super_admin = $5,
                duration_days = $6,
                duration_months = $7,
                duration_years = $8,
                expiry_at = $9,
                page_access = $10,
                subpage_access = $11,
                section_access = $12,
                allowed_job_ids = $13,
                allowed_department_ids = $14,
                allowed_candidate_ids = $15,
                is_unrestricted = $16,
                updated_by = $17,
                updated_at = $18
            WHERE id = $1
            "#,
        )
        .bind(grant.id.as_i64())
        .bind(grant.role_template_id.map(|id| id.as_i64()))
        .bind(grant.role_name.as_str())
        .bind(grant.email.as_ref().map(EmailAddress::as_str))
        .bind(grant.is_super_admin)
        .bind(signed_component(grant.duration.days))
        .bind(signed_component(grant.duration.months))
        .bind(signed_component(grant.duration.years))
        .bind(grant.expiry_at)
        .bind(Json(&grant.page_access))
        .bind(Json(&grant.subpage_access))
        .bind(Json(&grant.section_access))
        .bind(&grant.allowed_job_ids)
        .bind(&grant.allowed_department_ids)
        .bind(&grant.allowed_candidate_ids)
        .bind(grant.is_unrestricted)
        .bind(grant.updated_by.as_deref())
        .bind(grant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update access grant '{}': {error}", grant.id))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "access grant '{}' does not exist",
                grant.id
            )));
        }

        Ok(())
    }

    async fn delete(&self, id: GrantId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM access_grants WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete access grant '{id}': {error}"))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "access grant '{id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn count_by_role_template(&self, id: RoleTemplateId) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM access_grants WHERE role_template_id = $1")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await
                .map_err(|error| {
                    AppError::Internal(format!(
                        "failed to count access grants for role template '{id}': {error}"
                    ))
                })?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests;
