use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use staffgate_application::RevocationRepository;
use staffgate_core::AppError;
use staffgate_domain::{EmailAddress, GrantId, RevokedAccessKind};

use super::PostgresRevocationRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres revocation tests: {error}");
    }

    Some(pool)
}

async fn seed_principal(pool: &PgPool, id: i64, email: &str) {
    let insert = sqlx::query(
        r#"
        INSERT INTO principals (id, display_name, email, department)
        VALUES ($1, $2, $3, 'Talent')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(format!("Principal {id}"))
    .bind(email)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}

async fn seed_grant(pool: &PgPool, principal_id: i64, email: &str) -> i64 {
    let inserted: Result<i64, _> = sqlx::query_scalar(
        r#"
        INSERT INTO access_grants (principal_id, role_name, email, created_by)
        VALUES ($1, 'Recruiter', $2, 'admin')
        RETURNING id
        "#,
    )
    .bind(principal_id)
    .bind(email)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(id) => id,
        Err(error) => panic!("failed to seed grant: {error}"),
    }
}

async fn grant_exists(pool: &PgPool, id: i64) -> bool {
    let count: Result<i64, _> =
        sqlx::query_scalar("SELECT COUNT(*) FROM access_grants WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await;
    count.ok() == Some(1)
}

async fn principal_exists(pool: &PgPool, id: i64) -> bool {
    let count: Result<i64, _> = sqlx::query_scalar("SELECT COUNT(*) FROM principals WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await;
    count.ok() == Some(1)
}

fn email(value: &str) -> EmailAddress {
    match EmailAddress::new(value) {
        Ok(email) => email,
        Err(error) => panic!("invalid test email: {error}"),
    }
}

#[tokio::test]
async fn revoking_by_grant_id_removes_grant_and_principal() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRevocationRepository::new(pool.clone());

    seed_principal(&pool, 91_001, "byid@example.com").await;
    let grant_id = seed_grant(&pool, 91_001, "byid@example.com").await;

    let target = repository.revoke_by_grant_id(GrantId::from_i64(grant_id)).await;
    let Ok(target) = target else {
        panic!("revocation failed");
    };
    assert!(target.grant_deleted);
    assert!(target.principal_deleted);
    assert_eq!(target.kind, RevokedAccessKind::Grant);

    assert!(!grant_exists(&pool, grant_id).await);
    assert!(!principal_exists(&pool, 91_001).await);
}

#[tokio::test]
async fn revoking_a_missing_grant_id_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRevocationRepository::new(pool);

    let target = repository
        .revoke_by_grant_id(GrantId::from_i64(888_888))
        .await;
    assert!(matches!(target, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn revoking_a_principal_without_a_grant_reports_principal_only() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRevocationRepository::new(pool.clone());

    seed_principal(&pool, 91_002, "shadowonly@example.com").await;

    let target = repository
        .revoke_by_email(&email("ShadowOnly@Example.com"))
        .await;
    let Ok(target) = target else {
        panic!("revocation failed");
    };
    assert!(!target.grant_deleted);
    assert!(target.principal_deleted);
    assert_eq!(target.kind, RevokedAccessKind::PrincipalOnly);

    assert!(!principal_exists(&pool, 91_002).await);
}

#[tokio::test]
async fn revoking_an_unknown_email_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRevocationRepository::new(pool);

    let target = repository.revoke_by_email(&email("ghost@example.com")).await;
    assert!(matches!(target, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn bulk_revocation_commits_hits_and_reports_misses() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRevocationRepository::new(pool.clone());

    seed_principal(&pool, 91_003, "bulk-a@example.com").await;
    seed_principal(&pool, 91_004, "bulk-b@example.com").await;
    let grant_a = seed_grant(&pool, 91_003, "bulk-a@example.com").await;

    let record = repository
        .revoke_many_by_email(&[
            email("bulk-a@example.com"),
            email("bulk-b@example.com"),
            email("bulk-missing@example.com"),
        ])
        .await;
    let Ok(record) = record else {
        panic!("bulk revocation failed");
    };

    assert_eq!(record.revoked.len(), 2);
    assert_eq!(record.failures.len(), 1);
    assert_eq!(record.failures[0].email, "bulk-missing@example.com");

    assert!(!grant_exists(&pool, grant_a).await);
    assert!(!principal_exists(&pool, 91_003).await);
    assert!(!principal_exists(&pool, 91_004).await);
}
