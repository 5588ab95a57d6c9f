use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use detrade_types::TimeFilter;

use crate::{
    AppState,
    dto::{ApiResponse, TimeQuery, TvlPointDTO},
    errors::ApiError,
};

#[utoipa::path(
    get,
    path = "/vaults/{vault_id}/tvl",
    tag = "Vaults",
    params(
        ("vault_id" = String, Path, description = "Vault identifier"),
        ("time" = TimeFilter, Query, description = "Time window of the series", example = "3m")
    ),
    responses(
        (status = 200, description = "Total value locked, one point per block timestamp", body = [TvlPointDTO]),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "Vault not found"),
        (status = 503, description = "Event store unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_vault_tvl(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    WithRejection(Query(params), _): WithRejection<Query<TimeQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let points = state.vaults.tvl_series(&vault_id, params.time).await?;

    let points: Vec<TvlPointDTO> = points.iter().map(Into::into).collect();
    Ok(Json(ApiResponse::ok(points)))
}

#[utoipa::path(
    get,
    path = "/vaults/{vault_id}/tvl/latest",
    tag = "Vaults",
    params(
        ("vault_id" = String, Path, description = "Vault identifier")
    ),
    responses(
        (status = 200, description = "Most recent total value locked", body = TvlPointDTO),
        (status = 404, description = "Vault not found or no TVL available"),
        (status = 503, description = "Event store unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_vault_latest_tvl(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let point = state
        .vaults
        .latest_tvl(&vault_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No TVL available for vault {vault_id}")))?;

    Ok(Json(ApiResponse::ok(TvlPointDTO::from(&point))))
}
