use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Kind of a vault event as written by the subgraph indexer.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    ToSchema,
    Hash,
    Eq,
    PartialEq,
    Display,
    AsRefStr,
    EnumString,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    TotalAssetsUpdated,
    SettleDeposit,
    SettleRedeem,
    HighWaterMarkUpdated,
    DepositRequest,
    RedeemRequest,
}

impl EventType {
    /// Events carrying a `totalAssets` snapshot usable for TVL.
    pub const TVL_SOURCES: [Self; 3] = [
        Self::SettleDeposit,
        Self::SettleRedeem,
        Self::TotalAssetsUpdated,
    ];

    /// Precedence when several TVL snapshots share a block timestamp.
    /// Settlements reflect the post-transaction state, bare updates are provisional.
    pub const fn tvl_priority(self) -> Option<u8> {
        match self {
            Self::SettleRedeem => Some(3),
            Self::SettleDeposit => Some(2),
            Self::TotalAssetsUpdated => Some(1),
            Self::HighWaterMarkUpdated | Self::DepositRequest | Self::RedeemRequest => None,
        }
    }

    /// Settlement that completes a request of this kind.
    pub const fn settlement_of(self) -> Option<Self> {
        match self {
            Self::DepositRequest => Some(Self::SettleDeposit),
            Self::RedeemRequest => Some(Self::SettleRedeem),
            _ => None,
        }
    }
}

/// A single event of the append-only vault event log.
///
/// Amounts are kept as the decimal strings emitted on-chain (`uint256`), they
/// are only parsed by the fixed-point helpers of the KPI crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub block_timestamp: i64,
    pub total_assets: Option<String>,
    pub total_supply: Option<String>,
    pub new_high_water_mark: Option<String>,
    pub transaction_hash: Option<String>,
    pub sequence: Option<i64>,
    /// Lowercase address owning a deposit or redeem request.
    pub controller: Option<String>,
    pub request_id: Option<String>,
    pub assets: Option<String>,
    pub shares: Option<String>,
}

impl RawEvent {
    pub fn new(id: impl Into<String>, event_type: EventType, block_timestamp: i64) -> Self {
        Self {
            id: id.into(),
            event_type,
            block_timestamp,
            total_assets: None,
            total_supply: None,
            new_high_water_mark: None,
            transaction_hash: None,
            sequence: None,
            controller: None,
            request_id: None,
            assets: None,
            shares: None,
        }
    }

    #[must_use]
    pub fn with_totals(mut self, total_assets: &str, total_supply: &str) -> Self {
        self.total_assets = Some(total_assets.to_owned());
        self.total_supply = Some(total_supply.to_owned());
        self
    }

    #[must_use]
    pub fn with_total_assets(mut self, total_assets: &str) -> Self {
        self.total_assets = Some(total_assets.to_owned());
        self
    }

    #[must_use]
    pub fn with_high_water_mark(mut self, high_water_mark: &str) -> Self {
        self.new_high_water_mark = Some(high_water_mark.to_owned());
        self
    }

    #[must_use]
    pub fn with_transaction_hash(mut self, hash: &str) -> Self {
        self.transaction_hash = Some(hash.to_owned());
        self
    }

    #[must_use]
    pub fn with_request(mut self, controller: &str, request_id: &str) -> Self {
        self.controller = Some(controller.to_lowercase());
        self.request_id = Some(request_id.to_owned());
        self
    }

    #[must_use]
    pub fn with_amounts(mut self, assets: &str, shares: &str) -> Self {
        self.assets = Some(assets.to_owned());
        self.shares = Some(shares.to_owned());
        self
    }

    /// `totalAssets`, ignoring empty strings the indexer sometimes writes.
    pub fn total_assets(&self) -> Option<&str> {
        non_empty(self.total_assets.as_deref())
    }

    pub fn total_supply(&self) -> Option<&str> {
        non_empty(self.total_supply.as_deref())
    }

    pub fn new_high_water_mark(&self) -> Option<&str> {
        non_empty(self.new_high_water_mark.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_event_type_wire_names() {
        assert_eq!(EventType::TotalAssetsUpdated.as_ref(), "totalAssetsUpdated");
        assert_eq!(EventType::HighWaterMarkUpdated.to_string(), "highWaterMarkUpdated");
        assert_eq!(
            EventType::from_str("settleRedeem").unwrap(),
            EventType::SettleRedeem
        );
        assert!(EventType::from_str("transfer").is_err());
    }

    #[test]
    fn test_tvl_priority_order() {
        let redeem = EventType::SettleRedeem.tvl_priority();
        let deposit = EventType::SettleDeposit.tvl_priority();
        let update = EventType::TotalAssetsUpdated.tvl_priority();
        assert!(redeem > deposit);
        assert!(deposit > update);
        assert_eq!(EventType::DepositRequest.tvl_priority(), None);
    }

    #[test]
    fn test_requests_settle_into_matching_kind() {
        assert_eq!(
            EventType::DepositRequest.settlement_of(),
            Some(EventType::SettleDeposit)
        );
        assert_eq!(
            EventType::RedeemRequest.settlement_of(),
            Some(EventType::SettleRedeem)
        );
        assert_eq!(EventType::TotalAssetsUpdated.settlement_of(), None);
    }

    #[test]
    fn test_empty_amounts_are_missing() {
        let event = RawEvent::new("0x01", EventType::SettleDeposit, 10).with_totals("", "100");
        assert_eq!(event.total_assets(), None);
        assert_eq!(event.total_supply(), Some("100"));
    }
}
