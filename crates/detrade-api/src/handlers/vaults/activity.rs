use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use crate::{
    AppState,
    dto::{ActivitiesQuery, ActivityPageDTO, ApiResponse, LastRequestDTO, LastRequestQuery},
    errors::ApiError,
};

#[utoipa::path(
    get,
    path = "/vaults/{vault_id}/last_request",
    tag = "Vaults",
    params(
        ("vault_id" = String, Path, description = "Vault identifier"),
        ("user" = String, Query, description = "Address owning the requests", example = "0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be")
    ),
    responses(
        (status = 200, description = "Latest deposit and redeem request ids of the user", body = LastRequestDTO),
        (status = 400, description = "Missing user address"),
        (status = 404, description = "Vault not found"),
        (status = 503, description = "Event store unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_vault_last_request(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    WithRejection(Query(params), _): WithRejection<Query<LastRequestQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user = params
        .user
        .ok_or_else(|| ApiError::BadRequest("Missing user address".to_string()))?;
    let last = state.vaults.last_request(&vault_id, &user).await?;

    Ok(Json(ApiResponse::ok(LastRequestDTO::from(last.as_ref()))))
}

#[utoipa::path(
    get,
    path = "/vaults/{vault_id}/activities",
    tag = "Vaults",
    params(
        ("vault_id" = String, Path, description = "Vault identifier"),
        ("types" = Option<String>, Query, description = "Comma separated event types. A lone depositRequest or redeemRequest also lists its settlements", example = "depositRequest"),
        ("page" = Option<i64>, Query, description = "Page number starting at 1", example = 1),
        ("limit" = Option<i64>, Query, description = "Events per page, at most 100", example = 10)
    ),
    responses(
        (status = 200, description = "Vault events, newest first", body = ActivityPageDTO),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "Vault not found"),
        (status = 503, description = "Event store unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_vault_activities(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    WithRejection(Query(params), _): WithRejection<Query<ActivitiesQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.to_activity_query()?;
    let page = state.vaults.activities(&vault_id, &query).await?;

    Ok(Json(ApiResponse::ok(ActivityPageDTO::from(&page))))
}
