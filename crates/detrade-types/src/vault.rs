use serde::{Deserialize, Serialize};

use crate::decimals::{TokenDecimals, UnsupportedDecimals};

/// Read-only vault reference data consulted by the KPI computations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    pub id: String,
    pub name: String,
    pub underlying_token: String,
    pub underlying_token_decimals: i32,
    pub is_active: bool,
}

impl VaultConfig {
    pub fn decimals(&self) -> Result<TokenDecimals, UnsupportedDecimals> {
        TokenDecimals::try_from(self.underlying_token_decimals)
    }
}
