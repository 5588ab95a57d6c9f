use axum::{Json, extract::rejection::QueryRejection, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use detrade_kpi::KpiError;
use detrade_quoting::QuotingError;

use crate::dto::ApiResponse;

#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Internal server error")]
    InternalServerError,
}

impl From<KpiError> for ApiError {
    fn from(err: KpiError) -> Self {
        // NOTE: Store failures are already logged in the DatabaseError layer
        if err.is_retryable() {
            return Self::ServiceUnavailable(
                "Vault data is temporarily unavailable, please retry".to_string(),
            );
        }

        match err {
            KpiError::VaultNotFound(vault_id) => {
                Self::NotFound(format!("Vault {vault_id} not found"))
            }
            KpiError::VaultInactive(_)
            | KpiError::UnsupportedDecimals { .. }
            | KpiError::InvalidParameter(_) => Self::BadRequest(err.to_string()),
            KpiError::Upstream(e) if e.is_not_found() => {
                Self::NotFound("The requested resource was not found".to_string())
            }
            KpiError::Upstream(_) | KpiError::InvalidAmount(_) | KpiError::DivisionByZero(_) => {
                tracing::error!(error = %err, "Failed to compute vault metrics");
                // Don't expose internal details to clients
                Self::InternalServerError
            }
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QuotingError> for ApiError {
    fn from(err: QuotingError) -> Self {
        match err {
            QuotingError::UnsupportedToken(token) => {
                Self::BadRequest(format!("Unsupported token: {token}"))
            }
            QuotingError::RateLimited
            | QuotingError::Http(_)
            | QuotingError::MissingPrice(_)
            | QuotingError::AllSourcesFailed(_) => Self::ServiceUnavailable(
                "Price sources are temporarily unavailable, please retry".to_string(),
            ),
            QuotingError::MissingApiKey => {
                tracing::error!(error = %err, "Price oracle misconfigured");
                Self::InternalServerError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        let response: ApiResponse<()> = ApiResponse::error(msg);
        (status, Json(response)).into_response()
    }
}
