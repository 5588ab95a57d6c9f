pub mod coingecko;
pub mod coinmarketcap;
pub mod error;
pub mod token;

use std::str::FromStr;
use std::time::{Duration, Instant};

use moka::future::Cache;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::coingecko::fetch_coingecko_price;
use crate::coinmarketcap::fetch_coinmarketcap_price;

pub use error::QuotingError;
pub use token::QuotedToken;

/// USD price source consumed by the API layer.
#[async_trait::async_trait]
pub trait PriceOracle: Send + Sync {
    async fn price_of(&self, token: &str) -> Result<Decimal, QuotingError>;
}

/// Cached token prices with a 60-second TTL.
///
/// CoinGecko is the primary source; CoinMarketCap is only queried when it fails
/// and an API key is configured.
pub struct TokenPrices {
    client: reqwest::Client,
    coinmarketcap_api_key: Option<String>,
    cache: Cache<QuotedToken, Decimal>,
    last_request: Mutex<Option<Instant>>,
}

impl TokenPrices {
    const CACHE_DURATION: Duration = Duration::from_secs(60);
    /// Minimum spacing between two outbound requests.
    const REQUEST_SPACING: Duration = Duration::from_secs(1);

    pub fn new(coinmarketcap_api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            coinmarketcap_api_key,
            cache: Cache::builder().time_to_live(Self::CACHE_DURATION).build(),
            last_request: Mutex::new(None),
        }
    }

    pub async fn of(&self, token: QuotedToken) -> Result<Decimal, QuotingError> {
        if let Some(cached_price) = self.cache.get(&token).await {
            return Ok(cached_price);
        }

        let price = match self.fetch_primary(token).await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!(token = token.symbol(), error = %e, "CoinGecko failed, trying CoinMarketCap");
                self.fetch_fallback(token).await.map_err(|e| {
                    tracing::error!(token = token.symbol(), error = %e, "All price sources failed");
                    QuotingError::AllSourcesFailed(token.symbol().to_string())
                })?
            }
        };

        self.cache.insert(token, price).await;
        Ok(price)
    }

    async fn fetch_primary(&self, token: QuotedToken) -> Result<Decimal, QuotingError> {
        self.throttle().await;
        fetch_coingecko_price(&self.client, token).await
    }

    async fn fetch_fallback(&self, token: QuotedToken) -> Result<Decimal, QuotingError> {
        let api_key = self
            .coinmarketcap_api_key
            .as_deref()
            .ok_or(QuotingError::MissingApiKey)?;
        self.throttle().await;
        fetch_coinmarketcap_price(&self.client, api_key, token).await
    }

    async fn throttle(&self) {
        let mut last_request = self.last_request.lock().await;
        if let Some(elapsed) = last_request.map(|at| at.elapsed())
            && elapsed < Self::REQUEST_SPACING
        {
            tokio::time::sleep(Self::REQUEST_SPACING - elapsed).await;
        }
        *last_request = Some(Instant::now());
    }
}

#[async_trait::async_trait]
impl PriceOracle for TokenPrices {
    async fn price_of(&self, token: &str) -> Result<Decimal, QuotingError> {
        let token = QuotedToken::from_str(token)?;
        self.of(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cached_price_skips_sources() {
        let prices = TokenPrices::new(None);
        prices.cache.insert(QuotedToken::Eurc, Decimal::new(108, 2)).await;

        let price = prices.price_of("eurc").await.unwrap();
        assert_eq!(price, Decimal::new(108, 2));
    }

    #[tokio::test]
    async fn test_unsupported_token() {
        let prices = TokenPrices::new(None);
        assert!(matches!(
            prices.price_of("DOGE").await,
            Err(QuotingError::UnsupportedToken(_))
        ));
    }

    #[tokio::test]
    async fn test_fallback_requires_api_key() {
        let prices = TokenPrices::new(None);
        assert!(matches!(
            prices.fetch_fallback(QuotedToken::Usdc).await,
            Err(QuotingError::MissingApiKey)
        ));
    }
}
