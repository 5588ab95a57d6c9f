use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Underlying token precision of a vault.
///
/// Share prices are always expressed at 18 decimals, so only tokens whose
/// native precision we know how to rescale are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TokenDecimals {
    Six,
    Eighteen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported token decimals: {0} (expected 6 or 18)")]
pub struct UnsupportedDecimals(pub i32);

impl TokenDecimals {
    pub const fn value(self) -> u32 {
        match self {
            Self::Six => 6,
            Self::Eighteen => 18,
        }
    }

    /// Exponent needed to lift a native amount to 18 decimals.
    pub const fn scale_to_wad(self) -> u32 {
        18 - self.value()
    }
}

impl TryFrom<i32> for TokenDecimals {
    type Error = UnsupportedDecimals;

    fn try_from(decimals: i32) -> Result<Self, Self::Error> {
        match decimals {
            6 => Ok(Self::Six),
            18 => Ok(Self::Eighteen),
            other => Err(UnsupportedDecimals(other)),
        }
    }
}

impl From<TokenDecimals> for i32 {
    fn from(decimals: TokenDecimals) -> Self {
        decimals.value() as Self
    }
}
