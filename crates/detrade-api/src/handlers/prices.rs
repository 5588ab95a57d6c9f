use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    AppState,
    dto::{ApiResponse, TokenPriceDTO},
    errors::ApiError,
};

#[utoipa::path(
    get,
    path = "/prices/{token}",
    tag = "Prices",
    params(
        ("token" = String, Path, description = "Token symbol", example = "WETH")
    ),
    responses(
        (status = 200, description = "USD price of the token", body = TokenPriceDTO),
        (status = 400, description = "Unsupported token"),
        (status = 503, description = "Price sources unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_token_price(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let usd = state.prices.price_of(&token).await?;
    Ok(Json(ApiResponse::ok(TokenPriceDTO { token, usd })))
}
