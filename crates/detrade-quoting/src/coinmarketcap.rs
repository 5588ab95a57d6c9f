use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::Deserialize;

use crate::error::QuotingError;
use crate::token::QuotedToken;

const COINMARKETCAP_API_URL: &str = "https://pro-api.coinmarketcap.com/v2/tools/price-conversion";

#[derive(Debug, Deserialize)]
struct ConversionResponse {
    data: Vec<ConversionItem>,
}

#[derive(Debug, Deserialize)]
struct ConversionItem {
    id: u64,
    quote: Option<ConversionQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct ConversionQuote {
    usd: Option<UsdQuote>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    price: Option<f64>,
}

impl ConversionItem {
    fn usd_price(&self) -> Option<f64> {
        self.quote.as_ref()?.usd.as_ref()?.price
    }
}

/// Fetch the USD price of `token` by symbol from CoinMarketCap.
pub async fn fetch_coinmarketcap_price(
    client: &reqwest::Client,
    api_key: &str,
    token: QuotedToken,
) -> Result<Decimal, QuotingError> {
    let response = client
        .get(COINMARKETCAP_API_URL)
        .query(&[("symbol", token.symbol()), ("amount", "1"), ("convert", "USD")])
        .header("X-CMC_PRO_API_KEY", api_key)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?
        .error_for_status()?;

    let body: ConversionResponse = response.json().await?;
    price_from_response(&body, token)
}

/// A symbol can map to several assets: prefer CoinMarketCap id 1, then the
/// first one carrying a price.
fn price_from_response(
    body: &ConversionResponse,
    token: QuotedToken,
) -> Result<Decimal, QuotingError> {
    body.data
        .iter()
        .find(|item| item.id == 1 && item.usd_price().is_some())
        .or_else(|| body.data.iter().find(|item| item.usd_price().is_some()))
        .and_then(ConversionItem::usd_price)
        .and_then(Decimal::from_f64)
        .ok_or_else(|| QuotingError::MissingPrice(token.symbol().to_string()))
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    #[test]
    fn test_first_priced_asset_wins() {
        let body: ConversionResponse = serde_json::from_str(
            r#"{"data": [
                {"id": 9001, "quote": {"USD": {"price": null}}},
                {"id": 3408, "quote": {"USD": {"price": 0.9999}}},
                {"id": 7777, "quote": {"USD": {"price": 5.0}}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            price_from_response(&body, QuotedToken::Usdc).unwrap(),
            dec!(0.9999)
        );
    }

    #[test]
    fn test_no_price() {
        let body: ConversionResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(price_from_response(&body, QuotedToken::Eurc).is_err());
    }
}
