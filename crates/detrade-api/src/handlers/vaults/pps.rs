use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;

use detrade_types::TimeFilter;

use crate::{
    AppState,
    dto::{ApiResponse, PpsPointDTO, TimeQuery},
    errors::ApiError,
};

#[utoipa::path(
    get,
    path = "/vaults/{vault_id}/pps",
    tag = "Vaults",
    params(
        ("vault_id" = String, Path, description = "Vault identifier"),
        ("time" = TimeFilter, Query, description = "Time window of the series", example = "1m")
    ),
    responses(
        (status = 200, description = "Share price history, oldest first", body = [PpsPointDTO]),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "Vault not found"),
        (status = 503, description = "Event store unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_vault_pps(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    WithRejection(Query(params), _): WithRejection<Query<TimeQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let since = params.since(Utc::now().timestamp());
    let points = state.vaults.pps_series(&vault_id, since).await?;

    let points: Vec<PpsPointDTO> = points.iter().map(Into::into).collect();
    Ok(Json(ApiResponse::ok(points)))
}

#[utoipa::path(
    get,
    path = "/vaults/{vault_id}/pps/latest",
    tag = "Vaults",
    params(
        ("vault_id" = String, Path, description = "Vault identifier")
    ),
    responses(
        (status = 200, description = "Most recent share price", body = PpsPointDTO),
        (status = 404, description = "Vault not found or no share price available"),
        (status = 503, description = "Event store unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_vault_latest_pps(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let point = state
        .vaults
        .latest_pps(&vault_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No share price available for vault {vault_id}")))?;

    Ok(Json(ApiResponse::ok(PpsPointDTO::from(&point))))
}
