use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use utoipa::OpenApi as OpenApiT;
use utoipa_swagger_ui::SwaggerUi;

use crate::AppState;
use crate::handlers;

pub fn api_router<T: OpenApiT>(_state: AppState) -> Router<AppState> {
    let open_api = T::openapi();
    let vaults_router = Router::new()
        .route("/metrics", get(handlers::get_vaults_metrics))
        .route("/{vault_id}/pps", get(handlers::get_vault_pps))
        .route("/{vault_id}/pps/latest", get(handlers::get_vault_latest_pps))
        .route("/{vault_id}/apr/net", get(handlers::get_vault_net_apr))
        .route("/{vault_id}/apr/30d", get(handlers::get_vault_thirty_day_apr))
        .route("/{vault_id}/apr/7d", get(handlers::get_vault_seven_day_apr))
        .route("/{vault_id}/tvl", get(handlers::get_vault_tvl))
        .route("/{vault_id}/tvl/latest", get(handlers::get_vault_latest_tvl))
        .route("/{vault_id}/settlements", get(handlers::get_vault_settlements))
        .route("/{vault_id}/last_request", get(handlers::get_vault_last_request))
        .route("/{vault_id}/activities", get(handlers::get_vault_activities));

    let prices_router = Router::new().route("/{token}", get(handlers::get_token_price));

    Router::new()
        .route("/health", get(health))
        .nest("/v1/vaults", vaults_router)
        .nest("/v1/prices", prices_router)
        .merge(SwaggerUi::new("/v1/docs").url("/v1/docs/openapi.json", open_api))
        .fallback(handler_404)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        "The requested resource was not found",
    )
}
