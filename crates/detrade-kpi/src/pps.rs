use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use num_bigint::BigUint;

use detrade_db::{EventFilter, EventStore};
use detrade_metrics::{KpiMetrics, SkipReason};
use detrade_types::{EventType, RawEvent, TokenDecimals};

use crate::error::KpiError;
use crate::fixed_point::{high_water_mark_price, share_price, wad, wad_to_f64};

/// Maximum number of related-event lookups in flight for one vault.
const RELATED_LOOKUP_CONCURRENCY: usize = 8;

/// `0x` followed by 64 lowercase hex digits.
const TRANSACTION_HASH_LEN: usize = 66;

/// Event kind a share price was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PpsSource {
    SettleDeposit,
    SettleRedeem,
    HighWaterMark,
}

impl PpsSource {
    /// Resolution order; the first strategy that matches a related event wins.
    pub const PRIORITY: [Self; 3] = [Self::SettleDeposit, Self::SettleRedeem, Self::HighWaterMark];

    pub const fn event_type(self) -> EventType {
        match self {
            Self::SettleDeposit => EventType::SettleDeposit,
            Self::SettleRedeem => EventType::SettleRedeem,
            Self::HighWaterMark => EventType::HighWaterMarkUpdated,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SettleDeposit => "settleDeposit",
            Self::SettleRedeem => "settleRedeem",
            Self::HighWaterMark => "highWaterMarkUpdated",
        }
    }

    /// Evaluate this strategy alone. `None` means no related event carries the
    /// fields it needs.
    pub fn resolve(
        self,
        related: &[RawEvent],
        decimals: TokenDecimals,
    ) -> Option<Result<BigUint, KpiError>> {
        let event_type = self.event_type();
        let candidates = related.iter().filter(|e| e.event_type == event_type);

        match self {
            Self::SettleDeposit | Self::SettleRedeem => candidates
                .filter_map(|e| Some((e.total_assets()?, e.total_supply()?)))
                .map(|(assets, supply)| share_price(assets, supply, decimals))
                .next(),
            Self::HighWaterMark => candidates
                .filter_map(RawEvent::new_high_water_mark)
                .map(|hwm| high_water_mark_price(hwm, decimals))
                .next(),
        }
    }
}

/// Share price at 18 decimals, reconstructed from one `totalAssetsUpdated` event.
#[derive(Debug, Clone, PartialEq)]
pub struct PpsPoint {
    pub block_timestamp: i64,
    pub transaction_hash: String,
    pub pps_raw: BigUint,
    /// Always `pps_raw / 1e18`.
    pub pps_formatted: f64,
    pub source: PpsSource,
    /// The computation failed and `pps_raw` holds the 1.0 fallback.
    pub degraded: bool,
}

impl PpsPoint {
    pub fn new(
        block_timestamp: i64,
        transaction_hash: impl Into<String>,
        pps_raw: BigUint,
        source: PpsSource,
        degraded: bool,
    ) -> Self {
        Self {
            block_timestamp,
            transaction_hash: transaction_hash.into(),
            pps_formatted: wad_to_f64(&pps_raw),
            pps_raw,
            source,
            degraded,
        }
    }
}

/// Explicit `transactionHash`, else the hash prefix of the event id.
pub fn resolve_transaction_hash(event: &RawEvent) -> Option<String> {
    if let Some(hash) = event.transaction_hash.as_deref().map(str::trim)
        && !hash.is_empty()
    {
        return Some(hash.to_owned());
    }

    let prefix = event.id.get(..TRANSACTION_HASH_LEN)?;
    let digits = prefix.strip_prefix("0x")?;
    digits
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        .then(|| prefix.to_owned())
}

/// Resolved share price, its source, and whether the 1.0 fallback was applied.
pub fn resolve_pps(
    related: &[RawEvent],
    decimals: TokenDecimals,
) -> Option<(PpsSource, BigUint, bool)> {
    PpsSource::PRIORITY.into_iter().find_map(|source| {
        source.resolve(related, decimals).map(|result| match result {
            Ok(pps) => (source, pps, false),
            Err(e) => {
                tracing::debug!(source = source.as_str(), error = %e, "Share price computation failed");
                (source, wad(), true)
            }
        })
    })
}

/// Rebuilds the share price history of a vault from its event log.
#[derive(Clone)]
pub struct PpsReconstructor {
    store: Arc<dyn EventStore>,
    metrics: Arc<KpiMetrics>,
}

impl PpsReconstructor {
    pub fn new(store: Arc<dyn EventStore>, metrics: Arc<KpiMetrics>) -> Self {
        Self { store, metrics }
    }

    /// Share prices sorted by `(block_timestamp, transaction_hash)`.
    ///
    /// `recent` caps the number of `totalAssetsUpdated` events considered to the
    /// most recent ones.
    pub async fn reconstruct(
        &self,
        vault_id: &str,
        decimals: TokenDecimals,
        recent: Option<i64>,
    ) -> Result<Vec<PpsPoint>, KpiError> {
        let filter = EventFilter::of_types(&[EventType::TotalAssetsUpdated]).limit(recent);
        let updates = self.store.find(vault_id, &filter).await?;
        let total = updates.len();

        let lookups: Vec<(RawEvent, String)> = updates
            .into_iter()
            .filter_map(|event| match resolve_transaction_hash(&event) {
                Some(hash) => Some((event, hash)),
                None => {
                    tracing::debug!(vault_id, event_id = %event.id, "Skipping event without transaction hash");
                    self.metrics
                        .record_event_skipped(vault_id, SkipReason::MissingTransactionHash);
                    None
                }
            })
            .collect();

        let resolved: Vec<Option<PpsPoint>> = stream::iter(lookups)
            .map(|(event, hash)| async move {
                let related = self
                    .store
                    .find(vault_id, &EventFilter::related_to(&hash))
                    .await?;
                Ok::<_, KpiError>(self.point_for(vault_id, &event, hash, &related, decimals))
            })
            .buffer_unordered(RELATED_LOOKUP_CONCURRENCY)
            .try_collect()
            .await?;

        let mut points: Vec<PpsPoint> = resolved.into_iter().flatten().collect();
        points.sort_by(|a, b| {
            a.block_timestamp
                .cmp(&b.block_timestamp)
                .then_with(|| a.transaction_hash.cmp(&b.transaction_hash))
        });

        tracing::debug!(vault_id, events = total, points = points.len(), "Reconstructed share prices");
        Ok(points)
    }

    fn point_for(
        &self,
        vault_id: &str,
        event: &RawEvent,
        transaction_hash: String,
        related: &[RawEvent],
        decimals: TokenDecimals,
    ) -> Option<PpsPoint> {
        let Some((source, pps_raw, degraded)) = resolve_pps(related, decimals) else {
            self.metrics
                .record_event_skipped(vault_id, SkipReason::NoCompanionEvent);
            return None;
        };

        if degraded {
            tracing::warn!(
                vault_id,
                transaction_hash = %transaction_hash,
                "Share price degraded to 1.0"
            );
            self.metrics.record_pps_fallback(vault_id, source.as_str());
        }

        Some(PpsPoint::new(
            event.block_timestamp,
            transaction_hash,
            pps_raw,
            source,
            degraded,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use detrade_db::{DatabaseError, InMemoryEventStore};
    use detrade_metrics::MetricsRegistry;

    use super::*;

    const HASH_A: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
    const HASH_B: &str = "0x2222222222222222222222222222222222222222222222222222222222222222";
    const HASH_C: &str = "0x3333333333333333333333333333333333333333333333333333333333333333";

    fn reconstructor(store: InMemoryEventStore) -> PpsReconstructor {
        PpsReconstructor::new(Arc::new(store), MetricsRegistry::new().kpi.clone())
    }

    #[test]
    fn test_transaction_hash_from_id_prefix() {
        let event = RawEvent::new(format!("{HASH_A}-12"), EventType::TotalAssetsUpdated, 1);
        assert_eq!(resolve_transaction_hash(&event).as_deref(), Some(HASH_A));

        let explicit = RawEvent::new("whatever", EventType::TotalAssetsUpdated, 1)
            .with_transaction_hash(HASH_B);
        assert_eq!(resolve_transaction_hash(&explicit).as_deref(), Some(HASH_B));

        let upper = RawEvent::new(format!("0x{}", "AB".repeat(32)), EventType::TotalAssetsUpdated, 1);
        assert_eq!(resolve_transaction_hash(&upper), None);

        let short = RawEvent::new("0x1234", EventType::TotalAssetsUpdated, 1);
        assert_eq!(resolve_transaction_hash(&short), None);
    }

    #[test]
    fn test_settle_deposit_beats_settle_redeem() {
        let related = vec![
            RawEvent::new("r", EventType::SettleRedeem, 1).with_totals("2000", "1000"),
            RawEvent::new("d", EventType::SettleDeposit, 1).with_totals("1500", "1000"),
        ];
        let (source, pps, degraded) = resolve_pps(&related, TokenDecimals::Eighteen).unwrap();
        assert_eq!(source, PpsSource::SettleDeposit);
        assert_eq!(pps.to_string(), "1500000000000000000");
        assert!(!degraded);
    }

    #[test]
    fn test_settle_redeem_used_without_deposit() {
        let related = vec![
            RawEvent::new("d", EventType::SettleDeposit, 1).with_total_assets("1500"),
            RawEvent::new("r", EventType::SettleRedeem, 1).with_totals("2000", "1000"),
            RawEvent::new("h", EventType::HighWaterMarkUpdated, 1).with_high_water_mark("3"),
        ];
        let (source, pps, _) = resolve_pps(&related, TokenDecimals::Eighteen).unwrap();
        assert_eq!(source, PpsSource::SettleRedeem);
        assert_eq!(pps.to_string(), "2000000000000000000");
    }

    #[test]
    fn test_high_water_mark_only_without_settlements() {
        let related = vec![
            RawEvent::new("t", EventType::TotalAssetsUpdated, 1).with_total_assets("10"),
            RawEvent::new("h", EventType::HighWaterMarkUpdated, 1).with_high_water_mark("1020000"),
        ];
        let (source, pps, _) = resolve_pps(&related, TokenDecimals::Six).unwrap();
        assert_eq!(source, PpsSource::HighWaterMark);
        assert_eq!(pps.to_string(), "1020000000000000000");

        let bare = vec![RawEvent::new("t", EventType::TotalAssetsUpdated, 1)];
        assert!(resolve_pps(&bare, TokenDecimals::Six).is_none());
    }

    #[test]
    fn test_zero_supply_degrades_to_one() {
        let related =
            vec![RawEvent::new("d", EventType::SettleDeposit, 1).with_totals("1000", "0")];
        let (source, pps, degraded) = resolve_pps(&related, TokenDecimals::Six).unwrap();
        assert_eq!(source, PpsSource::SettleDeposit);
        assert_eq!(pps, wad());
        assert!(degraded);
    }

    #[tokio::test]
    async fn test_reconstruct_series() {
        let store = InMemoryEventStore::new().with_events(
            "vault",
            vec![
                // Newer update, price from a settleRedeem found by id prefix
                RawEvent::new(format!("{HASH_B}-1"), EventType::TotalAssetsUpdated, 2_000),
                RawEvent::new(format!("{HASH_B}-2"), EventType::SettleRedeem, 2_000)
                    .with_totals("1100000", "1000000000000000000"),
                // Older update, price from a settleDeposit found by explicit hash
                RawEvent::new("update-a", EventType::TotalAssetsUpdated, 1_000)
                    .with_transaction_hash(HASH_A),
                RawEvent::new("deposit-a", EventType::SettleDeposit, 1_000)
                    .with_totals("1000000", "1000000000000000000")
                    .with_transaction_hash(HASH_A),
                // Informational update without any companion event
                RawEvent::new(format!("{HASH_C}-1"), EventType::TotalAssetsUpdated, 3_000),
                // Unusable id
                RawEvent::new("no-hash", EventType::TotalAssetsUpdated, 4_000),
            ],
        );

        let points = reconstructor(store)
            .reconstruct("vault", TokenDecimals::Six, None)
            .await
            .unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].block_timestamp, 1_000);
        assert_eq!(points[0].transaction_hash, HASH_A);
        assert_eq!(points[0].pps_raw, wad());
        assert_eq!(points[0].source, PpsSource::SettleDeposit);
        assert_eq!(points[1].block_timestamp, 2_000);
        assert_eq!(points[1].source, PpsSource::SettleRedeem);
        assert!((points[1].pps_formatted - 1.1).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_recent_cap_keeps_newest_updates() {
        let store = InMemoryEventStore::new().with_events(
            "vault",
            vec![
                RawEvent::new(format!("{HASH_A}-1"), EventType::TotalAssetsUpdated, 1_000),
                RawEvent::new(format!("{HASH_A}-2"), EventType::SettleDeposit, 1_000)
                    .with_totals("1", "1"),
                RawEvent::new(format!("{HASH_B}-1"), EventType::TotalAssetsUpdated, 2_000),
                RawEvent::new(format!("{HASH_B}-2"), EventType::SettleDeposit, 2_000)
                    .with_totals("2", "1"),
            ],
        );

        let points = reconstructor(store)
            .reconstruct("vault", TokenDecimals::Eighteen, Some(1))
            .await
            .unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].block_timestamp, 2_000);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = InMemoryEventStore::new();
        store.set_unavailable("vault");

        let err = reconstructor(store)
            .reconstruct("vault", TokenDecimals::Six, None)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_zero_supply_settlement_does_not_abort_series() {
        let store = InMemoryEventStore::new().with_events(
            "vault",
            vec![
                RawEvent::new(format!("{HASH_A}-1"), EventType::TotalAssetsUpdated, 100),
                RawEvent::new(format!("{HASH_A}-2"), EventType::SettleDeposit, 100)
                    .with_totals("1000000", "0"),
                RawEvent::new(format!("{HASH_B}-1"), EventType::TotalAssetsUpdated, 200),
                RawEvent::new(format!("{HASH_B}-2"), EventType::SettleDeposit, 200)
                    .with_totals("2000000", "1000000000000000000"),
            ],
        );

        let points = reconstructor(store)
            .reconstruct("vault", TokenDecimals::Six, None)
            .await
            .unwrap();

        let summary: Vec<(i64, String, f64, bool)> = points
            .iter()
            .map(|p| (p.block_timestamp, p.pps_raw.to_string(), p.pps_formatted, p.degraded))
            .collect();
        assert_eq!(
            summary,
            [
                (100, "1000000000000000000".to_string(), 1.0, true),
                (200, "2000000000000000000".to_string(), 2.0, false),
            ]
        );
    }

    /// Answers related-event lookups after a per-hash delay and records completion order.
    struct DelayedStore {
        inner: InMemoryEventStore,
        delays: Vec<(&'static str, Duration)>,
        completed: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl EventStore for DelayedStore {
        async fn find(
            &self,
            vault_id: &str,
            filter: &EventFilter,
        ) -> Result<Vec<RawEvent>, DatabaseError> {
            let hash = filter.transaction_hash.clone();
            if let Some((_, delay)) = self
                .delays
                .iter()
                .find(|(h, _)| hash.as_deref() == Some(*h))
            {
                tokio::time::sleep(*delay).await;
            }

            let events = self.inner.find(vault_id, filter).await?;
            if let Some(hash) = hash {
                self.completed
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(hash);
            }
            Ok(events)
        }

        async fn count(&self, vault_id: &str, filter: &EventFilter) -> Result<i64, DatabaseError> {
            self.inner.count(vault_id, filter).await
        }
    }

    #[tokio::test]
    async fn test_out_of_order_lookups_keep_series_order() {
        let events = || {
            [(HASH_A, 1_000, "1000000"), (HASH_B, 2_000, "1050000"), (HASH_C, 3_000, "1100000")]
                .into_iter()
                .flat_map(|(hash, ts, assets)| {
                    [
                        RawEvent::new(format!("{hash}-1"), EventType::TotalAssetsUpdated, ts),
                        RawEvent::new(format!("{hash}-2"), EventType::SettleDeposit, ts)
                            .with_totals(assets, "1000000000000000000"),
                    ]
                })
                .collect::<Vec<_>>()
        };

        let expected = reconstructor(InMemoryEventStore::new().with_events("vault", events()))
            .reconstruct("vault", TokenDecimals::Six, None)
            .await
            .unwrap();

        // Oldest update answers last
        let store = Arc::new(DelayedStore {
            inner: InMemoryEventStore::new().with_events("vault", events()),
            delays: vec![
                (HASH_A, Duration::from_millis(60)),
                (HASH_B, Duration::from_millis(30)),
                (HASH_C, Duration::from_millis(0)),
            ],
            completed: Mutex::new(Vec::new()),
        });
        let delayed = PpsReconstructor::new(store.clone(), MetricsRegistry::new().kpi.clone())
            .reconstruct("vault", TokenDecimals::Six, None)
            .await
            .unwrap();

        let completed = store.completed.lock().unwrap().clone();
        assert_eq!(completed, [HASH_C, HASH_B, HASH_A]);
        assert_eq!(delayed, expected);
        assert_eq!(delayed.len(), 3);
        assert!(delayed.windows(2).all(|w| w[0].block_timestamp < w[1].block_timestamp));
    }
}
