//! Read-side seams over the indexed vault data.
//!
//! The KPI engine only talks to [`EventStore`] and [`VaultRegistry`]; the
//! Postgres implementation backs production and the in-memory one backs tests.

pub mod memory;
pub mod postgres;

use detrade_types::{EventType, RawEvent, VaultConfig};

use crate::errors::DatabaseError;

pub use memory::{InMemoryEventStore, InMemoryVaultRegistry};
pub use postgres::PostgresStore;

/// Query over the events of a single vault, answered newest first.
/// Empty `event_types` matches every kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub event_types: Vec<EventType>,
    /// Matches events whose `transactionHash` equals the hash or whose `id` starts with it.
    pub transaction_hash: Option<String>,
    /// Lowercase request owner.
    pub controller: Option<String>,
    pub since: Option<i64>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl EventFilter {
    pub fn of_types(event_types: &[EventType]) -> Self {
        Self {
            event_types: event_types.to_vec(),
            ..Self::default()
        }
    }

    pub fn related_to(transaction_hash: &str) -> Self {
        Self {
            transaction_hash: Some(transaction_hash.to_owned()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn since(mut self, since: Option<i64>) -> Self {
        self.since = since;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: Option<i64>) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn owned_by(mut self, controller: &str) -> Self {
        self.controller = Some(controller.to_lowercase());
        self
    }

    /// In-process evaluation of the filter predicate (offset and limit excluded).
    pub fn matches(&self, event: &RawEvent) -> bool {
        if !self.event_types.is_empty() && !self.event_types.contains(&event.event_type) {
            return false;
        }

        if let Some(hash) = &self.transaction_hash {
            let same_hash = event.transaction_hash.as_deref() == Some(hash.as_str());
            if !same_hash && !event.id.starts_with(hash.as_str()) {
                return false;
            }
        }

        if let Some(controller) = &self.controller
            && event.controller.as_deref() != Some(controller.as_str())
        {
            return false;
        }

        self.since.is_none_or(|since| event.block_timestamp >= since)
    }
}

#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    async fn find(
        &self,
        vault_id: &str,
        filter: &EventFilter,
    ) -> Result<Vec<RawEvent>, DatabaseError>;

    /// Number of events matching `filter`, ignoring its offset and limit.
    async fn count(&self, vault_id: &str, filter: &EventFilter) -> Result<i64, DatabaseError>;
}

#[async_trait::async_trait]
pub trait VaultRegistry: Send + Sync {
    /// Returns [`DatabaseError::NotFound`] for unknown vaults.
    async fn vault_config(&self, vault_id: &str) -> Result<VaultConfig, DatabaseError>;

    async fn active_vaults(&self) -> Result<Vec<VaultConfig>, DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0x8f1e4a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7";

    #[test]
    fn test_related_filter_matches_hash_or_id_prefix() {
        let filter = EventFilter::related_to(HASH);

        let by_hash = RawEvent::new("other-id", EventType::SettleDeposit, 1).with_transaction_hash(HASH);
        let by_id = RawEvent::new(format!("{HASH}05000000"), EventType::SettleDeposit, 1);
        let unrelated = RawEvent::new("0xdeadbeef", EventType::SettleDeposit, 1);

        assert!(filter.matches(&by_hash));
        assert!(filter.matches(&by_id));
        assert!(!filter.matches(&unrelated));
    }

    #[test]
    fn test_type_and_since_filters() {
        let filter = EventFilter::of_types(&[EventType::TotalAssetsUpdated]).since(Some(100));

        assert!(filter.matches(&RawEvent::new("a", EventType::TotalAssetsUpdated, 100)));
        assert!(!filter.matches(&RawEvent::new("b", EventType::TotalAssetsUpdated, 99)));
        assert!(!filter.matches(&RawEvent::new("c", EventType::SettleRedeem, 150)));
    }

    #[test]
    fn test_owner_filter_ignores_address_case() {
        let filter = EventFilter::of_types(&[EventType::DepositRequest]).owned_by("0xAbC");

        let owned = RawEvent::new("a", EventType::DepositRequest, 1).with_request("0xabc", "1");
        let other = RawEvent::new("b", EventType::DepositRequest, 1).with_request("0xdef", "2");
        let anonymous = RawEvent::new("c", EventType::DepositRequest, 1);

        assert!(filter.matches(&owned));
        assert!(!filter.matches(&other));
        assert!(!filter.matches(&anonymous));
    }
}
