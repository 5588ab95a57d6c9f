use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPriceDTO {
    pub token: String,
    #[schema(value_type = String, example = "1.0001")]
    pub usd: Decimal,
}
