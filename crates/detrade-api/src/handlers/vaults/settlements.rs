use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use detrade_types::TimeFilter;

use crate::{
    AppState,
    dto::{ApiResponse, SettlementDTO, TimeQuery},
    errors::ApiError,
};

#[utoipa::path(
    get,
    path = "/vaults/{vault_id}/settlements",
    tag = "Vaults",
    params(
        ("vault_id" = String, Path, description = "Vault identifier"),
        ("time" = TimeFilter, Query, description = "Time window", example = "1w")
    ),
    responses(
        (status = 200, description = "Deposit and redeem settlements, newest first", body = [SettlementDTO]),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "Vault not found"),
        (status = 503, description = "Event store unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_vault_settlements(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    WithRejection(Query(params), _): WithRejection<Query<TimeQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let settlements = state.vaults.settlements(&vault_id, params.time).await?;

    let settlements: Vec<SettlementDTO> = settlements.iter().map(Into::into).collect();
    Ok(Json(ApiResponse::ok(settlements)))
}
