use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use detrade_types::AprPeriod;

use crate::{
    AppState,
    dto::{ApiResponse, AprDTO},
    errors::ApiError,
};

#[utoipa::path(
    get,
    path = "/vaults/{vault_id}/apr/net",
    tag = "Vaults",
    params(
        ("vault_id" = String, Path, description = "Vault identifier")
    ),
    responses(
        (status = 200, description = "APR since inception", body = AprDTO),
        (status = 400, description = "Vault inactive or unsupported"),
        (status = 404, description = "Vault not found"),
        (status = 503, description = "Event store unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_vault_net_apr(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let apr = state.vaults.net_apr(&vault_id).await?;
    Ok(Json(ApiResponse::ok(AprDTO::from(&apr))))
}

#[utoipa::path(
    get,
    path = "/vaults/{vault_id}/apr/30d",
    tag = "Vaults",
    params(
        ("vault_id" = String, Path, description = "Vault identifier")
    ),
    responses(
        (status = 200, description = "APR over the last 30 days", body = AprDTO),
        (status = 400, description = "Vault inactive or unsupported"),
        (status = 404, description = "Vault not found"),
        (status = 503, description = "Event store unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_vault_thirty_day_apr(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    period_apr(&state, &vault_id, AprPeriod::ThirtyDays).await
}

#[utoipa::path(
    get,
    path = "/vaults/{vault_id}/apr/7d",
    tag = "Vaults",
    params(
        ("vault_id" = String, Path, description = "Vault identifier")
    ),
    responses(
        (status = 200, description = "APR over the last 7 days, interpolated at the window start", body = AprDTO),
        (status = 400, description = "Vault inactive or unsupported"),
        (status = 404, description = "Vault not found"),
        (status = 503, description = "Event store unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_vault_seven_day_apr(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    period_apr(&state, &vault_id, AprPeriod::SevenDays).await
}

async fn period_apr(
    state: &AppState,
    vault_id: &str,
    period: AprPeriod,
) -> Result<Json<ApiResponse<AprDTO>>, ApiError> {
    let apr = state.vaults.period_apr(vault_id, period).await?;
    Ok(Json(ApiResponse::ok(AprDTO::from(&apr))))
}
