use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use staffgate_application::{GrantListQuery, RevocationRequest};
use staffgate_domain::{GrantId, PrincipalId, RoleTemplateId};

use crate::dto::{
    BulkRevocationResponse, CreateGrantRequest, DEFAULT_OPERATOR, GrantDetailsResponse,
    GrantPageResponse, GrantResponse, GrantSummaryResponse, RevocationResponse,
    UpdateGrantRequest, split_emails,
};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct ListGrantsQuery {
    pub search: Option<String>,
    pub is_super_admin: Option<bool>,
    pub role_template_id: Option<i64>,
    pub principal_id: Option<i64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, serde::Deserialize)]
pub struct RevokeQuery {
    pub revoked_by: Option<String>,
    pub reason: Option<String>,
}

impl RevokeQuery {
    fn into_request(self) -> RevocationRequest {
        RevocationRequest {
            revoked_by: self.revoked_by.unwrap_or_else(|| DEFAULT_OPERATOR.to_owned()),
            reason: self.reason,
        }
    }
}

pub async fn create_grant_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateGrantRequest>,
) -> ApiResult<(StatusCode, Json<GrantResponse>)> {
    let grant = state.grant_service.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(GrantResponse::from(grant))))
}

pub async fn list_grants_handler(
    State(state): State<AppState>,
    Query(query): Query<ListGrantsQuery>,
) -> ApiResult<Json<GrantPageResponse>> {
    let page = state
        .grant_service
        .list(GrantListQuery {
            search: query.search,
            is_super_admin: query.is_super_admin,
            role_template_id: query.role_template_id.map(RoleTemplateId::from_i64),
            principal_id: query.principal_id.map(PrincipalId::from_i64),
            page: query.page.unwrap_or(1),
            page_size: query.page_size.unwrap_or(10),
        })
        .await?;

    Ok(Json(GrantPageResponse::from(page)))
}

pub async fn get_grant_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<GrantResponse>> {
    let grant = state.grant_service.get(GrantId::from_i64(id)).await?;
    Ok(Json(GrantResponse::from(grant)))
}

pub async fn get_grant_by_principal_handler(
    State(state): State<AppState>,
    Path(principal_id): Path<i64>,
) -> ApiResult<Json<GrantResponse>> {
    let grant = state
        .grant_service
        .get_by_principal(PrincipalId::from_i64(principal_id))
        .await?;
    Ok(Json(GrantResponse::from(grant)))
}

pub async fn update_grant_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateGrantRequest>,
) -> ApiResult<Json<GrantResponse>> {
    let grant = state
        .grant_service
        .update(GrantId::from_i64(id), payload.into())
        .await?;
    Ok(Json(GrantResponse::from(grant)))
}

pub async fn grant_summary_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<GrantSummaryResponse>> {
    let summary = state.grant_service.summary(GrantId::from_i64(id)).await?;
    Ok(Json(GrantSummaryResponse::from(summary)))
}

pub async fn grant_details_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<GrantDetailsResponse>> {
    let details = state.grant_service.details(GrantId::from_i64(id)).await?;
    Ok(Json(GrantDetailsResponse::from(details)))
}

pub async fn revoke_grant_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<RevokeQuery>,
) -> ApiResult<Json<RevocationResponse>> {
    let outcome = state
        .revocation_service
        .revoke_by_grant_id(GrantId::from_i64(id), &query.into_request())
        .await?;
    Ok(Json(RevocationResponse::from(outcome)))
}

pub async fn revoke_by_email_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Query(query): Query<RevokeQuery>,
) -> ApiResult<Json<RevocationResponse>> {
    let outcome = state
        .revocation_service
        .revoke_by_email(email.as_str(), &query.into_request())
        .await?;
    Ok(Json(RevocationResponse::from(outcome)))
}

pub async fn revoke_by_emails_handler(
    State(state): State<AppState>,
    Path(emails): Path<String>,
    Query(query): Query<RevokeQuery>,
) -> ApiResult<Json<BulkRevocationResponse>> {
    let emails = split_emails(emails.as_str());
    let outcome = state
        .revocation_service
        .revoke_many_by_email(&emails, &query.into_request())
        .await?;
    Ok(Json(BulkRevocationResponse::from(outcome)))
}
