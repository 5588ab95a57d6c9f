use detrade_db::DatabaseError;
use detrade_types::UnsupportedDecimals;

#[derive(Debug, thiserror::Error)]
pub enum KpiError {
    #[error("Vault not found: {0}")]
    VaultNotFound(String),
    #[error("Vault is not active: {0}")]
    VaultInactive(String),
    #[error("Vault {vault_id} has {source}")]
    UnsupportedDecimals {
        vault_id: String,
        source: UnsupportedDecimals,
    },
    #[error("Event store unavailable: {0}")]
    Upstream(#[from] DatabaseError),
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),
    #[error("Division by zero: {0}")]
    DivisionByZero(&'static str),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl KpiError {
    /// Whether the failure is transient and the caller may retry.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream(e) => e.is_retryable(),
            _ => false,
        }
    }
}
