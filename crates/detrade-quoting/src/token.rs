use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::QuotingError;

/// Underlying tokens of the vaults, the only assets we quote.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, Hash, Eq, PartialEq)]
pub enum QuotedToken {
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "WETH")]
    Weth,
    #[serde(rename = "EURC")]
    Eurc,
    #[serde(rename = "cbBTC")]
    CbBtc,
}

impl QuotedToken {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Usdc => "USDC",
            Self::Weth => "WETH",
            Self::Eurc => "EURC",
            Self::CbBtc => "cbBTC",
        }
    }

    pub const fn coingecko_id(self) -> &'static str {
        match self {
            Self::Usdc => "usd-coin",
            Self::Weth => "ethereum",
            Self::Eurc => "euro-coin",
            Self::CbBtc => "coinbase-wrapped-btc",
        }
    }
}

impl FromStr for QuotedToken {
    type Err = QuotingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USDC" => Ok(Self::Usdc),
            "WETH" => Ok(Self::Weth),
            "EURC" => Ok(Self::Eurc),
            "CBBTC" => Ok(Self::CbBtc),
            _ => Err(QuotingError::UnsupportedToken(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(QuotedToken::from_str("usdc").unwrap(), QuotedToken::Usdc);
        assert_eq!(QuotedToken::from_str("CBbtc").unwrap(), QuotedToken::CbBtc);
        assert_eq!(QuotedToken::Weth.coingecko_id(), "ethereum");
        assert!(matches!(
            QuotedToken::from_str("DOGE"),
            Err(QuotingError::UnsupportedToken(_))
        ));
    }
}
