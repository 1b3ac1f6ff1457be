//! Transactional revocation branches.
//!
//! Each public method runs inside a single transaction so that a partially
//! applied revocation can never be observed: the grant row, any orphaned
//! grants for the same principal, and the shadow principal row all vanish
//! together or not at all.

use async_trait::async_trait;

use staffgate_application::{
    BulkRevocationFailure, BulkRevocationRecord, RevocationRepository, RevokedTarget,
};
use staffgate_core::{AppError, AppResult};
use staffgate_domain::{EmailAddress, GrantId, PrincipalId, RevokedAccessKind};

use sqlx::{PgPool, Postgres, Transaction};

/// PostgreSQL-backed revocation coordinator.
#[derive(Clone)]
pub struct PostgresRevocationRepository {
    pool: PgPool,
}

impl PostgresRevocationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start revocation transaction: {error}"))
        })
    }
}

async fn find_grant_principal(
    transaction: &mut Transaction<'_, Postgres>,
    grant_id: GrantId,
) -> AppResult<Option<i64>> {
    sqlx::query_scalar::<_, i64>("SELECT principal_id FROM access_grants WHERE id = $1 FOR UPDATE")
        .bind(grant_id.as_i64())
        .fetch_optional(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to lock access grant '{grant_id}' for revocation: {error}"
            ))
        })
}

async fn delete_grants_for_principal(
    transaction: &mut Transaction<'_, Postgres>,
    principal_id: i64,
) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM access_grants WHERE principal_id = $1")
        .bind(principal_id)
        .execute(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to delete access grants for principal '{principal_id}': {error}"
            ))
        })?;

    Ok(result.rows_affected())
}

async fn delete_principal(
    transaction: &mut Transaction<'_, Postgres>,
    principal_id: i64,
) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM principals WHERE id = $1")
        .bind(principal_id)
        .execute(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to delete shadow principal '{principal_id}': {error}"
            ))
        })?;

    Ok(result.rows_affected() > 0)
}

/// Removes every record tied to `principal_id` and reports what was removed.
async fn revoke_principal_records(
    transaction: &mut Transaction<'_, Postgres>,
    principal_id: i64,
    kind: RevokedAccessKind,
) -> AppResult<RevokedTarget> {
    let grants_deleted = delete_grants_for_principal(transaction, principal_id).await?;
    let principal_deleted = delete_principal(transaction, principal_id).await?;

    // When the target was resolved through a grant, the first deleted row
    // is the grant itself; everything beyond it was an orphan. On a
    // principal-only match every swept grant is an orphan.
    let orphan_grants_deleted = match kind {
        RevokedAccessKind::Grant => grants_deleted.saturating_sub(1),
        RevokedAccessKind::PrincipalOnly => grants_deleted,
    };

    Ok(RevokedTarget {
        principal_id: PrincipalId::from_i64(principal_id),
        grant_deleted: grants_deleted > 0,
        principal_deleted,
        orphan_grants_deleted,
        kind,
    })
}

/// Resolves an email to a principal id against grants first, then the
/// shadow table, mirroring the dual-source identity model.
async fn resolve_email(
    transaction: &mut Transaction<'_, Postgres>,
    email: &EmailAddress,
) -> AppResult<Option<(i64, RevokedAccessKind)>> {
    let via_grant = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT grants.principal_id
        FROM access_grants AS grants
        LEFT JOIN principals ON principals.id = grants.principal_id
        WHERE lower(grants.email) = $1 OR lower(principals.email) = $1
        LIMIT 1
        "#,
    )
    .bind(email.as_str())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to resolve access grant for email '{email}': {error}"
        ))
    })?;

    if let Some(principal_id) = via_grant {
        return Ok(Some((principal_id, RevokedAccessKind::Grant)));
    }

    let via_principal =
        sqlx::query_scalar::<_, i64>("SELECT id FROM principals WHERE lower(email) = $1")
            .bind(email.as_str())
            .fetch_optional(&mut **transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to resolve shadow principal for email '{email}': {error}"
                ))
            })?;

    Ok(via_principal.map(|principal_id| (principal_id, RevokedAccessKind::PrincipalOnly)))
}

async fn revoke_email_in_transaction(
    transaction: &mut Transaction<'_, Postgres>,
    email: &EmailAddress,
) -> AppResult<RevokedTarget> {
    let Some((principal_id, kind)) = resolve_email(transaction, email).await? else {
        return Err(AppError::NotFound(format!(
            "no access records exist for '{email}'"
        )));
    };

    revoke_principal_records(transaction, principal_id, kind).await
}

fn commit_error(error: sqlx::Error) -> AppError {
    AppError::Internal(format!("failed to commit revocation transaction: {error}"))
}

#[async_trait]
impl RevocationRepository for PostgresRevocationRepository {
    async fn revoke_by_grant_id(&self, id: GrantId) -> AppResult<RevokedTarget> {
        let mut transaction = self.begin().await?;

        let Some(principal_id) = find_grant_principal(&mut transaction, id).await? else {
            return Err(AppError::NotFound(format!(
                "access grant '{id}' does not exist"
            )));
        };

        let target =
            revoke_principal_records(&mut transaction, principal_id, RevokedAccessKind::Grant)
                .await?;
        transaction.commit().await.map_err(commit_error)?;

        Ok(target)
    }

    async fn revoke_by_email(&self, email: &EmailAddress) -> AppResult<RevokedTarget> {
        let mut transaction = self.begin().await?;

        let target = revoke_email_in_transaction(&mut transaction, email).await?;
        transaction.commit().await.map_err(commit_error)?;

        Ok(target)
    }

    async fn revoke_many_by_email(
        &self,
        emails: &[EmailAddress],
    ) -> AppResult<BulkRevocationRecord> {
        let mut transaction = self.begin().await?;
        let mut record = BulkRevocationRecord::default();

        for email in emails {
            match revoke_email_in_transaction(&mut transaction, email).await {
                Ok(target) => record.revoked.push((email.clone(), target)),
                Err(AppError::NotFound(message)) => record.failures.push(BulkRevocationFailure {
                    email: email.as_str().to_owned(),
                    error: message,
                }),
                // A storage failure aborts the whole batch; partial bulk
                // revocations must not commit.
                Err(error) => return Err(error),
            }
        }

        transaction.commit().await.map_err(commit_error)?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests;
