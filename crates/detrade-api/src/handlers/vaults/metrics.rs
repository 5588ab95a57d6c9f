use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use crate::{
    AppState,
    dto::{ApiResponse, BulkMetricsDTO, BulkMetricsQuery},
    errors::ApiError,
};

#[utoipa::path(
    get,
    path = "/vaults/metrics",
    tag = "Vaults",
    params(
        ("vault_ids" = Option<String>, Query, description = "Comma separated vault ids, every active vault when omitted", example = "usdc-vault,weth-vault")
    ),
    responses(
        (status = 200, description = "Latest TVL and APRs per vault", body = BulkMetricsDTO),
        (status = 404, description = "No active vault matched"),
        (status = 503, description = "Vault registry unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_vaults_metrics(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<BulkMetricsQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let metrics = state.vaults.bulk_metrics(&params.ids()).await?;
    if metrics.is_empty() {
        return Err(ApiError::NotFound("No active vaults found".to_string()));
    }

    Ok(Json(ApiResponse::ok(BulkMetricsDTO::from(metrics.as_ref()))))
}
