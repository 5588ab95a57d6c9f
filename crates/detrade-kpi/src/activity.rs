//! Paged view over the raw event log and per-user request lookups.

use detrade_db::EventFilter;
use detrade_types::{EventType, RawEvent};

use crate::pps::resolve_transaction_hash;

pub const DEFAULT_ACTIVITY_LIMIT: i64 = 10;
pub const MAX_ACTIVITY_LIMIT: i64 = 100;

/// Page of the event log, newest first. An empty `event_types` lists every kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityQuery {
    pub event_types: Vec<EventType>,
    pub page: i64,
    pub limit: i64,
}

impl ActivityQuery {
    /// Pages start at 1 and hold between 1 and [`MAX_ACTIVITY_LIMIT`] events.
    pub fn new(event_types: Vec<EventType>, page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            event_types,
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
                .clamp(1, MAX_ACTIVITY_LIMIT),
        }
    }

    /// A lone request kind also lists the settlements completing it.
    pub fn expanded_types(&self) -> Vec<EventType> {
        match self.event_types.as_slice() {
            [single] => std::iter::once(*single)
                .chain(single.settlement_of())
                .collect(),
            types => types.to_vec(),
        }
    }

    pub fn filter(&self) -> EventFilter {
        EventFilter::of_types(&self.expanded_types())
            .offset(Some((self.page - 1).saturating_mul(self.limit)))
            .limit(Some(self.limit))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: String,
    pub owner: Option<String>,
    pub event_type: EventType,
    pub block_timestamp: i64,
    pub assets: Option<String>,
    pub shares: Option<String>,
    pub total_assets: Option<String>,
    pub total_supply: Option<String>,
    pub transaction_hash: Option<String>,
}

impl From<RawEvent> for Activity {
    fn from(event: RawEvent) -> Self {
        Self {
            transaction_hash: resolve_transaction_hash(&event),
            id: event.id,
            owner: event.controller,
            event_type: event.event_type,
            block_timestamp: event.block_timestamp,
            assets: event.assets,
            shares: event.shares,
            total_assets: event.total_assets,
            total_supply: event.total_supply,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityPage {
    pub activities: Vec<Activity>,
    /// Matching events across all pages.
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl ActivityPage {
    pub const fn pages(&self) -> i64 {
        (self.total + self.limit - 1) / self.limit
    }
}

/// Most recent request ids a user opened on a vault.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastRequest {
    pub deposit_request_id: Option<String>,
    pub redeem_request_id: Option<String>,
}
