use std::collections::HashMap;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::Deserialize;

use crate::error::QuotingError;
use crate::token::QuotedToken;

const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// `{"usd-coin": {"usd": 0.9998}}`
type SimplePriceResponse = HashMap<String, Quote>;

#[derive(Debug, Deserialize)]
struct Quote {
    usd: Option<f64>,
}

/// Fetch the USD price of `token` from the public CoinGecko API.
pub async fn fetch_coingecko_price(
    client: &reqwest::Client,
    token: QuotedToken,
) -> Result<Decimal, QuotingError> {
    let response = client
        .get(COINGECKO_API_URL)
        .query(&[("ids", token.coingecko_id()), ("vs_currencies", "usd")])
        .send()
        .await?;

    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        return Err(QuotingError::RateLimited);
    }

    let body: SimplePriceResponse = response.error_for_status()?.json().await?;
    price_from_response(&body, token)
}

fn price_from_response(
    body: &SimplePriceResponse,
    token: QuotedToken,
) -> Result<Decimal, QuotingError> {
    body.get(token.coingecko_id())
        .and_then(|quote| quote.usd)
        .and_then(Decimal::from_f64)
        .ok_or_else(|| QuotingError::MissingPrice(token.coingecko_id().to_string()))
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    #[test]
    fn test_price_from_response() {
        let body: SimplePriceResponse =
            serde_json::from_str(r#"{"ethereum": {"usd": 3120.5}}"#).unwrap();
        assert_eq!(
            price_from_response(&body, QuotedToken::Weth).unwrap(),
            dec!(3120.5)
        );
        assert!(matches!(
            price_from_response(&body, QuotedToken::Usdc),
            Err(QuotingError::MissingPrice(_))
        ));
    }
}
