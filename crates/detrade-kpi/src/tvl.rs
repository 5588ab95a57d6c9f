use std::collections::BTreeMap;
use std::sync::Arc;

use num_bigint::BigUint;

use detrade_db::{EventFilter, EventStore};
use detrade_types::{EventType, RawEvent, SECONDS_PER_YEAR, TimeFilter, TokenDecimals};

use crate::error::KpiError;
use crate::fixed_point::{format_units, parse_amount};

/// Largest timestamp representable as a signed 32-bit integer.
const MAX_TIMESTAMP: i64 = i32::MAX as i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvlPoint {
    pub block_timestamp: i64,
    /// `total_assets_raw` in underlying token units, as a decimal string.
    pub total_assets: String,
    pub total_assets_raw: String,
    pub event_type: EventType,
}

/// Positive, within 32 bits, and at most one year past `now`.
pub const fn is_valid_timestamp(timestamp: i64, now: i64) -> bool {
    timestamp > 0 && timestamp < MAX_TIMESTAMP && timestamp < now + SECONDS_PER_YEAR
}

struct Candidate<'a> {
    event: &'a RawEvent,
    priority: u8,
    total_assets: BigUint,
}

impl Candidate<'_> {
    /// Higher priority wins, then the greater event id.
    fn beats(&self, other: &Self) -> bool {
        (self.priority, &self.event.id) > (other.priority, &other.event.id)
    }
}

/// One point per distinct block timestamp, oldest first.
///
/// The output does not depend on the order of `events`.
pub fn aggregate_tvl(events: &[RawEvent], decimals: TokenDecimals, now: i64) -> Vec<TvlPoint> {
    let mut by_timestamp: BTreeMap<i64, Candidate<'_>> = BTreeMap::new();

    for event in events {
        let Some(priority) = event.event_type.tvl_priority() else {
            continue;
        };
        if !is_valid_timestamp(event.block_timestamp, now) {
            tracing::debug!(event_id = %event.id, block_timestamp = event.block_timestamp, "Ignoring event with invalid timestamp");
            continue;
        }
        let Some(total_assets) = event.total_assets().and_then(|v| parse_amount(v).ok()) else {
            continue;
        };

        let candidate = Candidate {
            event,
            priority,
            total_assets,
        };
        let replaces = by_timestamp
            .get(&event.block_timestamp)
            .is_none_or(|current| candidate.beats(current));
        if replaces {
            by_timestamp.insert(event.block_timestamp, candidate);
        }
    }

    by_timestamp
        .into_iter()
        .map(|(block_timestamp, candidate)| TvlPoint {
            block_timestamp,
            total_assets: format_units(&candidate.total_assets, decimals.value()),
            total_assets_raw: candidate.total_assets.to_string(),
            event_type: candidate.event.event_type,
        })
        .collect()
}

/// Keep the points inside the window ending at `now`.
pub fn filter_tvl(points: Vec<TvlPoint>, filter: TimeFilter, now: i64) -> Vec<TvlPoint> {
    let start = filter.start_timestamp(now);
    points
        .into_iter()
        .filter(|p| p.block_timestamp >= start)
        .collect()
}

/// Builds TVL series from the settlement and update events of a vault.
#[derive(Clone)]
pub struct TvlAggregator {
    store: Arc<dyn EventStore>,
}

impl TvlAggregator {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub async fn series(
        &self,
        vault_id: &str,
        decimals: TokenDecimals,
        filter: TimeFilter,
        now: i64,
    ) -> Result<Vec<TvlPoint>, KpiError> {
        let since = filter.to_days().map(|_| filter.start_timestamp(now));
        let events = self
            .store
            .find(vault_id, &EventFilter::of_types(&EventType::TVL_SOURCES).since(since))
            .await?;

        Ok(filter_tvl(aggregate_tvl(&events, decimals, now), filter, now))
    }

    /// Most recent point, `None` when the vault has no usable event.
    pub async fn latest(
        &self,
        vault_id: &str,
        decimals: TokenDecimals,
        now: i64,
    ) -> Result<Option<TvlPoint>, KpiError> {
        let events = self
            .store
            .find(vault_id, &EventFilter::of_types(&EventType::TVL_SOURCES))
            .await?;

        Ok(aggregate_tvl(&events, decimals, now).pop())
    }
}
