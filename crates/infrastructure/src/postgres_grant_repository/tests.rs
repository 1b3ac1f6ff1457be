use chrono::Utc;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use staffgate_application::{GrantListQuery, GrantRecord, GrantRepository};
use staffgate_core::AppError;
use staffgate_domain::{EmailAddress, GrantDuration, PermissionMap, PrincipalId, RoleTemplateId};

use super::PostgresGrantRepository;

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
        panic!("failed to run migrations for postgres grant tests: {error}");
    }

    Some(pool)
}

async fn ensure_principal(pool: &PgPool, id: i64, email: &str) {
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

fn email(value: &str) -> EmailAddress {
    match EmailAddress::new(value) {
        Ok(email) => email,
        Err(error) => panic!("invalid test email: {error}"),
    }
}

fn record(principal_id: i64, email_value: Option<&str>) -> GrantRecord {
    GrantRecord {
        principal_id: PrincipalId::from_i64(principal_id),
        role_template_id: None,
        role_name: "Recruiter".to_owned(),
        email: email_value.map(email),
        is_super_admin: false,
        duration: GrantDuration {
            days: Some(30),
            ..GrantDuration::default()
        },
        expiry_at: None,
        page_access: PermissionMap::new(),
        subpage_access: PermissionMap::new(),
        section_access: PermissionMap::new(),
        allowed_job_ids: vec!["J-100".to_owned()],
        allowed_department_ids: vec![4],
        allowed_candidate_ids: Vec::new(),
        is_unrestricted: false,
        created_by: "admin".to_owned(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn insert_and_lookups_round_trip() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresGrantRepository::new(pool.clone());

    ensure_principal(&pool, 90_001, "roundtrip@example.com").await;
    let inserted = repository
        .insert(record(90_001, Some("roundtrip@example.com")))
        .await;
    let Ok(inserted) = inserted else {
        panic!("insert failed");
    };
    assert_eq!(inserted.duration.days, Some(30));
    assert_eq!(inserted.allowed_job_ids, vec!["J-100".to_owned()]);

    let by_principal = repository
        .find_by_principal(PrincipalId::from_i64(90_001))
        .await;
    assert!(by_principal.is_ok_and(|found| found.is_some_and(|grant| grant.id == inserted.id)));

    let by_email = repository.find_by_email(&email("RoundTrip@Example.com")).await;
    assert!(by_email.is_ok_and(|found| found.is_some_and(|grant| grant.id == inserted.id)));

    assert!(repository.delete(inserted.id).await.is_ok());
}

#[tokio::test]
async fn duplicate_principal_insert_is_a_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresGrantRepository::new(pool.clone());

    ensure_principal(&pool, 90_002, "dup@example.com").await;
    let first = repository.insert(record(90_002, Some("dup@example.com"))).await;
    let Ok(first) = first else {
        panic!("insert failed");
    };

    let second = repository.insert(record(90_002, Some("dup@example.com"))).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    assert!(repository.delete(first.id).await.is_ok());
}

#[tokio::test]
async fn email_lookup_falls_back_to_principal_join() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresGrantRepository::new(pool.clone());

    ensure_principal(&pool, 90_003, "joined@example.com").await;
    let inserted = repository.insert(record(90_003, None)).await;
    let Ok(inserted) = inserted else {
        panic!("insert failed");
    };

    let found = repository.find_by_email(&email("joined@example.com")).await;
    assert!(found.is_ok_and(|found| found.is_some_and(|grant| grant.id == inserted.id)));

    assert!(repository.delete(inserted.id).await.is_ok());
}

#[tokio::test]
async fn list_filters_by_super_admin_flag() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresGrantRepository::new(pool.clone());

    ensure_principal(&pool, 90_004, "super@example.com").await;
    let mut super_admin = record(90_004, Some("super@example.com"));
    super_admin.is_super_admin = true;
    let inserted = repository.insert(super_admin).await;
    let Ok(inserted) = inserted else {
        panic!("insert failed");
    };

    let page = repository
        .list(&GrantListQuery {
            is_super_admin: Some(true),
            principal_id: Some(PrincipalId::from_i64(90_004)),
            page: 1,
            page_size: 10,
            ..GrantListQuery::default()
        })
        .await;
    let Ok(page) = page else {
        panic!("list failed");
    };
    assert_eq!(page.total, 1);
    assert!(page.items.iter().all(|grant| grant.is_super_admin));

    assert!(repository.delete(inserted.id).await.is_ok());
}

#[tokio::test]
async fn counting_by_missing_template_is_zero() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresGrantRepository::new(pool);

    let count = repository
        .count_by_role_template(RoleTemplateId::from_i64(999_999))
        .await;
    assert_eq!(count.ok(), Some(0));
}
