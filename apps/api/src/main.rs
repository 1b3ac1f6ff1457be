//! Staffgate API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod state;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use staffgate_application::{
    AccessResolverService, GrantService, PrincipalSyncService, RevocationService,
    RoleTemplateService,
};
use staffgate_core::AppError;
use staffgate_infrastructure::{
    BroadcastConfig, HttpRevocationPublisher, PostgresGrantRepository,
    PostgresPrincipalDirectory, PostgresPrincipalRepository, PostgresRevocationRepository,
    PostgresRoleTemplateRepository, PostgresTeamRosterRepository,
};

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let grant_repository = Arc::new(PostgresGrantRepository::new(pool.clone()));
    let principal_repository = Arc::new(PostgresPrincipalRepository::new(pool.clone()));
    let principal_directory = Arc::new(PostgresPrincipalDirectory::new(pool.clone()));
    let role_template_repository = Arc::new(PostgresRoleTemplateRepository::new(pool.clone()));
    let roster_repository = Arc::new(PostgresTeamRosterRepository::new(pool.clone()));
    let revocation_repository = Arc::new(PostgresRevocationRepository::new(pool.clone()));

    let principal_sync = PrincipalSyncService::new(principal_repository, principal_directory);
    let grant_service = GrantService::new(
        grant_repository.clone(),
        role_template_repository.clone(),
        principal_sync.clone(),
    );
    let role_template_service =
        RoleTemplateService::new(role_template_repository, grant_repository.clone());
    let access_resolver_service =
        AccessResolverService::new(grant_repository, roster_repository, principal_sync);

    let http_client = reqwest::Client::new();
    let publisher = Arc::new(HttpRevocationPublisher::new(
        http_client,
        BroadcastConfig {
            url: config.broadcast_url.clone(),
            service_key: config.broadcast_service_key.clone(),
            timeout: config.broadcast_timeout,
        },
    ));
    let revocation_service = RevocationService::new(revocation_repository, publisher);

    let app_state = AppState {
        grant_service,
        role_template_service,
        revocation_service,
        access_resolver_service,
    };

    let app = api_router::build_router(app_state, &config.frontend_url)?;
    let address = config.socket_address()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "staffgate-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
