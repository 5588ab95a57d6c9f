#[derive(Debug, thiserror::Error)]
pub enum QuotingError {
    #[error("Unsupported token: {0}")]
    UnsupportedToken(String),
    #[error("Price source rate limited the request")]
    RateLimited,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("No price found for {0}")]
    MissingPrice(String),
    #[error("CoinMarketCap API key not configured")]
    MissingApiKey,
    #[error("All price sources failed for {0}")]
    AllSourcesFailed(String),
}
