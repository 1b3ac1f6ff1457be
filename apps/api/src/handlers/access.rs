use axum::Json;
use axum::extract::{Query, State};

use crate::dto::EffectiveAccessResponse;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct EffectiveAccessQuery {
    pub email: String,
}

pub async fn effective_access_handler(
    State(state): State<AppState>,
    Query(query): Query<EffectiveAccessQuery>,
) -> ApiResult<Json<EffectiveAccessResponse>> {
    let access = state
        .access_resolver_service
        .resolve(query.email.as_str())
        .await?;
    Ok(Json(EffectiveAccessResponse::from(access)))
}
