use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use staffgate_core::AppError;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/access-grants",
            get(handlers::grants::list_grants_handler)
                .post(handlers::grants::create_grant_handler),
        )
        .route(
            "/access-grants/{id}",
            get(handlers::grants::get_grant_handler)
                .put(handlers::grants::update_grant_handler)
                .delete(handlers::grants::revoke_grant_handler),
        )
        .route(
            "/access-grants/{id}/summary",
            get(handlers::grants::grant_summary_handler),
        )
        .route(
            "/access-grants/{id}/details",
            get(handlers::grants::grant_details_handler),
        )
        .route(
            "/access-grants/by-principal/{principal_id}",
            get(handlers::grants::get_grant_by_principal_handler),
        )
        .route(
            "/access-grants/by-email/{email}",
            delete(handlers::grants::revoke_by_email_handler),
        )
        .route(
            "/access-grants/by-emails/{emails}",
            delete(handlers::grants::revoke_by_emails_handler),
        )
        .route(
            "/effective-access",
            get(handlers::access::effective_access_handler),
        )
        .route(
            "/role-templates",
            get(handlers::role_templates::list_role_templates_handler)
                .post(handlers::role_templates::create_role_template_handler),
        )
        .route(
            "/role-templates/{id}",
            get(handlers::role_templates::get_role_template_handler)
                .put(handlers::role_templates::update_role_template_handler)
                .delete(handlers::role_templates::delete_role_template_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}
