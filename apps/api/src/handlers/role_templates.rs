use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use staffgate_domain::RoleTemplateId;

use crate::dto::{CreateRoleTemplateRequest, RoleTemplateResponse, UpdateRoleTemplateRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_role_template_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleTemplateRequest>,
) -> ApiResult<(StatusCode, Json<RoleTemplateResponse>)> {
    let template = state.role_template_service.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(RoleTemplateResponse::from(template))))
}

pub async fn list_role_templates_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RoleTemplateResponse>>> {
    let templates = state
        .role_template_service
        .list()
        .await?
        .into_iter()
        .map(RoleTemplateResponse::from)
        .collect();
    Ok(Json(templates))
}

pub async fn get_role_template_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RoleTemplateResponse>> {
    let template = state
        .role_template_service
        .get(RoleTemplateId::from_i64(id))
        .await?;
    Ok(Json(RoleTemplateResponse::from(template)))
}

pub async fn update_role_template_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRoleTemplateRequest>,
) -> ApiResult<Json<RoleTemplateResponse>> {
    let template = state
        .role_template_service
        .update(RoleTemplateId::from_i64(id), payload.into())
        .await?;
    Ok(Json(RoleTemplateResponse::from(template)))
}

pub async fn delete_role_template_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .role_template_service
        .delete(RoleTemplateId::from_i64(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
