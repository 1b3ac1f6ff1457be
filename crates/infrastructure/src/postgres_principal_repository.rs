use async_trait::async_trait;

use staffgate_application::{PrincipalDirectory, PrincipalRepository};
use staffgate_core::{AppError, AppResult};
use staffgate_domain::{EmailAddress, Principal, PrincipalId};

use sqlx::{FromRow, PgPool};

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: i64,
    display_name: String,
    email: String,
    department: Option<String>,
}

impl PrincipalRow {
    fn into_principal(self) -> AppResult<Principal> {
        let email = EmailAddress::new(self.email).map_err(|error| {
            AppError::Internal(format!(
                "malformed email stored for principal '{}': {error}",
                self.id
            ))
        })?;

        Ok(Principal {
            id: PrincipalId::from_i64(self.id),
            display_name: self.display_name,
            email,
            department: self.department,
        })
    }
}

/// PostgreSQL-backed repository for the local shadow principal table.
#[derive(Clone)]
pub struct PostgresPrincipalRepository {
    pool: PgPool,
}

impl PostgresPrincipalRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalRepository for PostgresPrincipalRepository {
    async fn find_by_id(&self, id: PrincipalId) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, display_name, email, department
            FROM principals
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load principal '{id}': {error}"))
        })?;

        row.map(PrincipalRow::into_principal).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, display_name, email, department
            FROM principals
            WHERE lower(email) = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load principal for email '{email}': {error}"
            ))
        })?;

        row.map(PrincipalRow::into_principal).transpose()
    }

    async fn insert(&self, principal: &Principal) -> AppResult<()> {
        // The id comes from the directory, not a local sequence; a
        // concurrent sync of the same principal is a no-op.
        sqlx::query(
            r#"
            INSERT INTO principals (id, display_name, email, department)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(principal.id.as_i64())
        .bind(principal.display_name.as_str())
        .bind(principal.email.as_str())
        .bind(principal.department.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to insert shadow principal '{}': {error}",
                principal.id
            ))
        })?;

        Ok(())
    }
}

/// PostgreSQL-backed read adapter over the externally-synced directory table.
#[derive(Clone)]
pub struct PostgresPrincipalDirectory {
    pool: PgPool,
}

impl PostgresPrincipalDirectory {
    /// Creates a directory adapter with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalDirectory for PostgresPrincipalDirectory {
    async fn find_by_id(&self, id: PrincipalId) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, full_name AS display_name, email, department
            FROM directory_users
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load directory user '{id}': {error}"
            ))
        })?;

        row.map(PrincipalRow::into_principal).transpose()
    }
}
