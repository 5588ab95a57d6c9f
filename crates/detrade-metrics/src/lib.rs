use std::sync::Arc;

use opentelemetry::{KeyValue, global, metrics::Counter};

#[derive(Debug)]
pub struct MetricsRegistry {
    pub kpi: Arc<KpiMetrics>,
    pub cache: Arc<CacheMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            kpi: KpiMetrics::new(),
            cache: CacheMetrics::new(),
        })
    }
}

#[derive(Debug)]
pub struct KpiMetrics {
    pps_fallbacks: Counter<u64>,
    events_skipped: Counter<u64>,
}

impl KpiMetrics {
    fn new() -> Arc<Self> {
        let meter = global::meter("detrade-vaults-api");
        let pps_fallbacks = meter
            .u64_counter("pps_fallbacks_total")
            .with_description("Number of share prices replaced by 1.0 after an arithmetic failure")
            .with_unit("count")
            .init();

        let events_skipped = meter
            .u64_counter("pps_events_skipped_total")
            .with_description("Number of totalAssetsUpdated events that produced no share price")
            .with_unit("count")
            .init();

        Arc::new(Self {
            pps_fallbacks,
            events_skipped,
        })
    }

    pub fn record_pps_fallback(&self, vault_id: &str, source: &str) {
        self.pps_fallbacks.add(
            1,
            &[
                KeyValue::new("vault_id", vault_id.to_string()),
                KeyValue::new("source", source.to_string()),
            ],
        );
    }

    pub fn record_event_skipped(&self, vault_id: &str, reason: SkipReason) {
        self.events_skipped.add(
            1,
            &[
                KeyValue::new("vault_id", vault_id.to_string()),
                KeyValue::new("reason", reason.as_str().to_string()),
            ],
        );
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    MissingTransactionHash,
    NoCompanionEvent,
}

impl SkipReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingTransactionHash => "missing_transaction_hash",
            Self::NoCompanionEvent => "no_companion_event",
        }
    }
}

#[derive(Debug)]
pub struct CacheMetrics {
    lookups: Counter<u64>,
}

impl CacheMetrics {
    fn new() -> Arc<Self> {
        let meter = global::meter("detrade-vaults-api");
        let lookups = meter
            .u64_counter("cache_lookups_total")
            .with_description("Number of in-process cache lookups, by cache and outcome")
            .with_unit("count")
            .init();

        Arc::new(Self { lookups })
    }

    pub fn record_lookup(&self, cache: &'static str, hit: bool) {
        self.lookups.add(
            1,
            &[
                KeyValue::new("cache", cache),
                KeyValue::new("outcome", if hit { "hit" } else { "miss" }),
            ],
        );
    }
}
