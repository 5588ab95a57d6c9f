use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use moka::future::Cache;
use num_bigint::BigUint;

use detrade_db::{DatabaseError, EventFilter, EventStore, VaultRegistry};
use detrade_metrics::MetricsRegistry;
use detrade_types::{AprPeriod, EventType, TimeFilter, TokenDecimals, VaultConfig};

use crate::activity::{Activity, ActivityPage, ActivityQuery, LastRequest};
use crate::apr::{AprResult, calculate_net_apr, calculate_period_apr};
use crate::error::KpiError;
use crate::fixed_point::share_price;
use crate::pps::{PpsPoint, PpsReconstructor};
use crate::tvl::{TvlAggregator, TvlPoint};

/// Number of recent `totalAssetsUpdated` events used for bulk APR figures.
pub const BULK_PPS_EVENTS: i64 = 50;

pub type BulkMetrics = BTreeMap<String, Option<VaultMetrics>>;

#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    pub pps_cache_ttl: Duration,
    pub bulk_cache_ttl: Duration,
    pub last_request_cache_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            pps_cache_ttl: Duration::from_secs(30),
            bulk_cache_ttl: Duration::from_secs(180),
            last_request_cache_ttl: Duration::from_secs(30),
        }
    }
}

/// Headline figures of one vault. APRs are `None` with fewer than two share prices.
#[derive(Debug, Clone, PartialEq)]
pub struct VaultMetrics {
    pub tvl: Option<TvlPoint>,
    pub net_apr: Option<f64>,
    pub thirty_day_apr: Option<f64>,
    pub seven_day_apr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub id: String,
    pub event_type: EventType,
    pub block_timestamp: i64,
    pub transaction_hash: Option<String>,
    pub total_assets: Option<String>,
    pub total_supply: Option<String>,
    /// Share price implied by the settlement totals, when computable.
    pub pps_raw: Option<BigUint>,
    pub sequence: Option<i64>,
}

/// Query operations over the vault event log.
pub struct VaultMetricsService {
    registry: Arc<dyn VaultRegistry>,
    store: Arc<dyn EventStore>,
    reconstructor: PpsReconstructor,
    tvl: TvlAggregator,
    metrics: Arc<MetricsRegistry>,
    pps_cache: Cache<(String, Option<i64>), Arc<Vec<PpsPoint>>>,
    bulk_cache: Cache<String, Arc<BulkMetrics>>,
    last_request_cache: Cache<(String, String), Arc<LastRequest>>,
}

impl VaultMetricsService {
    pub fn new(
        store: Arc<dyn EventStore>,
        registry: Arc<dyn VaultRegistry>,
        metrics: Arc<MetricsRegistry>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            reconstructor: PpsReconstructor::new(store.clone(), metrics.kpi.clone()),
            tvl: TvlAggregator::new(store.clone()),
            registry,
            store,
            metrics,
            pps_cache: Cache::builder()
                .time_to_live(config.pps_cache_ttl)
                .max_capacity(1_000)
                .build(),
            bulk_cache: Cache::builder()
                .time_to_live(config.bulk_cache_ttl)
                .max_capacity(100)
                .build(),
            last_request_cache: Cache::builder()
                .time_to_live(config.last_request_cache_ttl)
                .max_capacity(10_000)
                .build(),
        }
    }

    /// Share prices since `since` (inclusive), oldest first.
    pub async fn pps_series(
        &self,
        vault_id: &str,
        since: Option<i64>,
    ) -> Result<Vec<PpsPoint>, KpiError> {
        let (_, decimals) = self.vault(vault_id).await?;
        let points = self.cached_pps(vault_id, decimals, None).await?;

        Ok(points
            .iter()
            .filter(|p| since.is_none_or(|since| p.block_timestamp >= since))
            .cloned()
            .collect())
    }

    /// `None` when no share price could be reconstructed.
    pub async fn latest_pps(&self, vault_id: &str) -> Result<Option<PpsPoint>, KpiError> {
        let (_, decimals) = self.vault(vault_id).await?;
        let points = self.cached_pps(vault_id, decimals, None).await?;
        Ok(points.last().cloned())
    }

    pub async fn net_apr(&self, vault_id: &str) -> Result<AprResult, KpiError> {
        let decimals = self.active_vault(vault_id).await?;
        let points = self.cached_pps(vault_id, decimals, None).await?;
        Ok(calculate_net_apr(&points))
    }

    pub async fn period_apr(
        &self,
        vault_id: &str,
        period: AprPeriod,
    ) -> Result<AprResult, KpiError> {
        let decimals = self.active_vault(vault_id).await?;
        let points = self.cached_pps(vault_id, decimals, None).await?;
        Ok(calculate_period_apr(&points, period))
    }

    pub async fn tvl_series(
        &self,
        vault_id: &str,
        filter: TimeFilter,
    ) -> Result<Vec<TvlPoint>, KpiError> {
        let (_, decimals) = self.vault(vault_id).await?;
        self.tvl
            .series(vault_id, decimals, filter, Utc::now().timestamp())
            .await
    }

    pub async fn latest_tvl(&self, vault_id: &str) -> Result<Option<TvlPoint>, KpiError> {
        let (_, decimals) = self.vault(vault_id).await?;
        self.tvl
            .latest(vault_id, decimals, Utc::now().timestamp())
            .await
    }

    /// Settlement events inside the window, newest first.
    pub async fn settlements(
        &self,
        vault_id: &str,
        filter: TimeFilter,
    ) -> Result<Vec<Settlement>, KpiError> {
        let (_, decimals) = self.vault(vault_id).await?;
        let since = filter
            .to_days()
            .map(|_| filter.start_timestamp(Utc::now().timestamp()));

        let events = self
            .store
            .find(
                vault_id,
                &EventFilter::of_types(&[EventType::SettleDeposit, EventType::SettleRedeem])
                    .since(since),
            )
            .await?;

        Ok(events
            .into_iter()
            .map(|event| {
                let pps_raw = event
                    .total_assets()
                    .zip(event.total_supply())
                    .and_then(|(assets, supply)| share_price(assets, supply, decimals).ok());

                Settlement {
                    pps_raw,
                    id: event.id,
                    event_type: event.event_type,
                    block_timestamp: event.block_timestamp,
                    transaction_hash: event.transaction_hash,
                    total_assets: event.total_assets,
                    total_supply: event.total_supply,
                    sequence: event.sequence,
                }
            })
            .collect())
    }

    /// Metrics of several vaults computed concurrently.
    ///
    /// Unknown and inactive ids are left out; an empty `vault_ids` selects every
    /// active vault. A vault whose computation fails maps to `None` without
    /// failing the others.
    pub async fn bulk_metrics(&self, vault_ids: &[String]) -> Result<Arc<BulkMetrics>, KpiError> {
        let mut ids: Vec<String> = vault_ids.to_vec();
        ids.sort();
        ids.dedup();
        let cache_key = ids.join(",");

        if let Some(cached) = self.bulk_cache.get(&cache_key).await {
            self.metrics.cache.record_lookup("bulk_metrics", true);
            return Ok(cached);
        }
        self.metrics.cache.record_lookup("bulk_metrics", false);

        let vaults: Vec<VaultConfig> = self
            .registry
            .active_vaults()
            .await?
            .into_iter()
            .filter(|v| ids.is_empty() || ids.binary_search(&v.id).is_ok())
            .collect();

        let results = join_all(vaults.iter().map(|vault| async move {
            match self.vault_metrics(vault).await {
                Ok(metrics) => (vault.id.clone(), Some(metrics)),
                Err(e) => {
                    tracing::error!(vault_id = %vault.id, error = %e, "Failed to compute vault metrics");
                    (vault.id.clone(), None)
                }
            }
        }))
        .await;

        let metrics = Arc::new(results.into_iter().collect::<BulkMetrics>());
        self.bulk_cache.insert(cache_key, metrics.clone()).await;
        Ok(metrics)
    }

    /// Latest deposit and redeem request ids opened by `user`.
    pub async fn last_request(
        &self,
        vault_id: &str,
        user: &str,
    ) -> Result<Arc<LastRequest>, KpiError> {
        let user = user.trim().to_lowercase();
        if user.is_empty() {
            return Err(KpiError::InvalidParameter("user address is required".into()));
        }

        let key = (vault_id.to_string(), user);
        if let Some(cached) = self.last_request_cache.get(&key).await {
            self.metrics.cache.record_lookup("last_request", true);
            return Ok(cached);
        }
        self.metrics.cache.record_lookup("last_request", false);

        self.known_vault(vault_id).await?;
        let latest_id = |kind: EventType| {
            let filter = EventFilter::of_types(&[kind])
                .owned_by(&key.1)
                .limit(Some(1));
            async move {
                let events = self.store.find(vault_id, &filter).await?;
                Ok::<_, KpiError>(events.into_iter().next().and_then(|e| e.request_id))
            }
        };

        let (deposit_request_id, redeem_request_id) = futures::try_join!(
            latest_id(EventType::DepositRequest),
            latest_id(EventType::RedeemRequest),
        )?;

        let last = Arc::new(LastRequest {
            deposit_request_id,
            redeem_request_id,
        });
        self.last_request_cache.insert(key, last.clone()).await;
        Ok(last)
    }

    /// One page of the vault's event log, newest first.
    pub async fn activities(
        &self,
        vault_id: &str,
        query: &ActivityQuery,
    ) -> Result<ActivityPage, KpiError> {
        self.known_vault(vault_id).await?;
        let filter = query.filter();

        let (events, total) = futures::try_join!(
            self.store.find(vault_id, &filter),
            self.store.count(vault_id, &filter),
        )?;

        Ok(ActivityPage {
            activities: events.into_iter().map(Activity::from).collect(),
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn vault_metrics(&self, vault: &VaultConfig) -> Result<VaultMetrics, KpiError> {
        let decimals = vault
            .decimals()
            .map_err(|source| KpiError::UnsupportedDecimals {
                vault_id: vault.id.clone(),
                source,
            })?;

        let (tvl, points) = futures::try_join!(
            self.tvl.latest(&vault.id, decimals, Utc::now().timestamp()),
            self.cached_pps(&vault.id, decimals, Some(BULK_PPS_EVENTS)),
        )?;

        let apr = |result: AprResult| (points.len() >= 2).then_some(result.apr);
        Ok(VaultMetrics {
            tvl,
            net_apr: apr(calculate_net_apr(&points)),
            thirty_day_apr: apr(calculate_period_apr(&points, AprPeriod::ThirtyDays)),
            seven_day_apr: apr(calculate_period_apr(&points, AprPeriod::SevenDays)),
        })
    }

    async fn cached_pps(
        &self,
        vault_id: &str,
        decimals: TokenDecimals,
        recent: Option<i64>,
    ) -> Result<Arc<Vec<PpsPoint>>, KpiError> {
        let key = (vault_id.to_string(), recent);
        if let Some(cached) = self.pps_cache.get(&key).await {
            self.metrics.cache.record_lookup("pps_series", true);
            return Ok(cached);
        }
        self.metrics.cache.record_lookup("pps_series", false);

        let points = Arc::new(
            self.reconstructor
                .reconstruct(vault_id, decimals, recent)
                .await?,
        );
        self.pps_cache.insert(key, points.clone()).await;
        Ok(points)
    }

    async fn known_vault(&self, vault_id: &str) -> Result<VaultConfig, KpiError> {
        self.registry
            .vault_config(vault_id)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => KpiError::VaultNotFound(vault_id.to_string()),
                other => KpiError::Upstream(other),
            })
    }

    async fn vault(&self, vault_id: &str) -> Result<(VaultConfig, TokenDecimals), KpiError> {
        let vault = self.known_vault(vault_id).await?;

        let decimals = vault
            .decimals()
            .map_err(|source| KpiError::UnsupportedDecimals {
                vault_id: vault_id.to_string(),
                source,
            })?;

        Ok((vault, decimals))
    }

    async fn active_vault(&self, vault_id: &str) -> Result<TokenDecimals, KpiError> {
        let (vault, decimals) = self.vault(vault_id).await?;
        if !vault.is_active {
            return Err(KpiError::VaultInactive(vault_id.to_string()));
        }
        Ok(decimals)
    }
}

#[cfg(test)]
mod tests {
    use detrade_db::{InMemoryEventStore, InMemoryVaultRegistry};
    use detrade_types::{RawEvent, SECONDS_PER_DAY};

    use super::*;
    use crate::apr::AprMethod;

    fn vault(id: &str, decimals: i32, is_active: bool) -> VaultConfig {
        VaultConfig {
            id: id.to_string(),
            name: id.to_string(),
            underlying_token: "USDC".to_string(),
            underlying_token_decimals: decimals,
            is_active,
        }
    }

    fn hash(n: i64) -> String {
        format!("0x{n:064x}")
    }

    /// A `totalAssetsUpdated` event and its settleDeposit sibling for a 6-decimal vault.
    fn settlement(n: i64, block_timestamp: i64, total_assets: &str) -> Vec<RawEvent> {
        let hash = hash(n);
        vec![
            RawEvent::new(format!("{hash}-0"), EventType::TotalAssetsUpdated, block_timestamp)
                .with_total_assets(total_assets),
            RawEvent::new(format!("{hash}-1"), EventType::SettleDeposit, block_timestamp)
                .with_totals(total_assets, "1000000000000000000000"),
        ]
    }

    fn service(store: InMemoryEventStore, vaults: Vec<VaultConfig>) -> VaultMetricsService {
        VaultMetricsService::new(
            Arc::new(store),
            Arc::new(InMemoryVaultRegistry::new(vaults)),
            MetricsRegistry::new(),
            ServiceConfig::default(),
        )
    }

    fn year_of_history(now: i64) -> InMemoryEventStore {
        let start = now - 365 * SECONDS_PER_DAY;
        let mut events = settlement(1, start, "1000000000");
        events.extend(settlement(2, now, "1100000000"));
        InMemoryEventStore::new().with_events("usdc", events)
    }

    #[tokio::test]
    async fn test_net_apr_for_vault() {
        let now = Utc::now().timestamp();
        let service = service(year_of_history(now), vec![vault("usdc", 6, true)]);

        let result = service.net_apr("usdc").await.unwrap();
        assert!((result.apr - 10.0).abs() < 1e-9);
        assert_eq!(result.method, AprMethod::Geometric);

        let latest = service.latest_pps("usdc").await.unwrap().unwrap();
        assert_eq!(latest.block_timestamp, now);
        assert_eq!(latest.pps_raw.to_string(), "1100000000000000000");
    }

    #[tokio::test]
    async fn test_pps_series_since() {
        let now = Utc::now().timestamp();
        let service = service(year_of_history(now), vec![vault("usdc", 6, true)]);

        assert_eq!(service.pps_series("usdc", None).await.unwrap().len(), 2);
        let recent = service.pps_series("usdc", Some(now - SECONDS_PER_DAY)).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].block_timestamp, now);
    }

    #[tokio::test]
    async fn test_vault_validation() {
        let service = service(
            InMemoryEventStore::new(),
            vec![vault("cbbtc", 8, true), vault("eurc", 6, false)],
        );

        assert!(matches!(
            service.pps_series("missing", None).await,
            Err(KpiError::VaultNotFound(_))
        ));
        assert!(matches!(
            service.tvl_series("cbbtc", TimeFilter::All).await,
            Err(KpiError::UnsupportedDecimals { .. })
        ));
        assert!(matches!(
            service.latest_pps("cbbtc").await,
            Err(KpiError::UnsupportedDecimals { .. })
        ));
        assert!(matches!(
            service.period_apr("eurc", AprPeriod::SevenDays).await,
            Err(KpiError::VaultInactive(_))
        ));
        // Inactive vaults still expose their history
        assert!(service.tvl_series("eurc", TimeFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latest_tvl_and_empty_history() {
        let now = Utc::now().timestamp();
        let service = service(
            year_of_history(now),
            vec![vault("usdc", 6, true), vault("empty", 18, true)],
        );

        let tvl = service.latest_tvl("usdc").await.unwrap().unwrap();
        assert_eq!(tvl.total_assets, "1100");
        assert_eq!(tvl.event_type, EventType::SettleDeposit);

        assert!(service.latest_tvl("empty").await.unwrap().is_none());
        assert!(service.latest_pps("empty").await.unwrap().is_none());
        let apr = service.net_apr("empty").await.unwrap();
        assert_eq!(apr.method, AprMethod::InsufficientData);
    }

    #[tokio::test]
    async fn test_settlements_newest_first() {
        let now = Utc::now().timestamp();
        let service = service(year_of_history(now), vec![vault("usdc", 6, true)]);

        let all = service.settlements("usdc", TimeFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].block_timestamp, now);
        assert_eq!(
            all[0].pps_raw.as_ref().map(ToString::to_string).as_deref(),
            Some("1100000000000000000")
        );

        let week = service.settlements("usdc", TimeFilter::OneWeek).await.unwrap();
        assert_eq!(week.len(), 1);
    }

    #[tokio::test]
    async fn test_bulk_metrics_isolates_failures() {
        let now = Utc::now().timestamp();
        let store = year_of_history(now);
        store.append("eth", settlement(3, now, "5000000"));
        store.set_unavailable("eth");

        let service = service(
            store,
            vec![
                vault("usdc", 6, true),
                vault("eth", 6, true),
                vault("inactive", 6, false),
            ],
        );

        let ids = vec![
            "usdc".to_string(),
            "eth".to_string(),
            "inactive".to_string(),
            "unknown".to_string(),
        ];
        let metrics = service.bulk_metrics(&ids).await.unwrap();

        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics.get("eth"), Some(&None));

        let usdc = metrics.get("usdc").unwrap().as_ref().unwrap();
        assert_eq!(usdc.tvl.as_ref().unwrap().total_assets, "1100");
        assert!((usdc.net_apr.unwrap() - 10.0).abs() < 1e-9);
        assert!(usdc.seven_day_apr.is_some());

        // Same ids in another order hit the cache
        let reordered: Vec<String> = ids.into_iter().rev().collect();
        let cached = service.bulk_metrics(&reordered).await.unwrap();
        assert!(Arc::ptr_eq(&metrics, &cached));
    }

    #[tokio::test]
    async fn test_bulk_metrics_defaults_to_active_vaults() {
        let now = Utc::now().timestamp();
        let service = service(
            year_of_history(now),
            vec![vault("usdc", 6, true), vault("young", 6, true), vault("old", 6, false)],
        );

        let metrics = service.bulk_metrics(&[]).await.unwrap();
        let ids: Vec<&str> = metrics.keys().map(String::as_str).collect();
        assert_eq!(ids, ["usdc", "young"]);

        let young = metrics.get("young").unwrap().as_ref().unwrap();
        assert_eq!(young.net_apr, None);
        assert_eq!(young.tvl, None);
    }

    fn request(n: i64, kind: EventType, ts: i64, user: &str, request_id: &str) -> RawEvent {
        RawEvent::new(format!("{}-0", hash(n)), kind, ts)
            .with_request(user, request_id)
            .with_amounts("1000000", "0")
    }

    #[tokio::test]
    async fn test_last_request_is_cached_per_user() {
        let store = Arc::new(InMemoryEventStore::new().with_events(
            "usdc",
            vec![
                request(1, EventType::DepositRequest, 100, "0xAlice", "1"),
                request(2, EventType::DepositRequest, 200, "0xalice", "2"),
                request(3, EventType::RedeemRequest, 300, "0xbob", "3"),
            ],
        ));
        let service = VaultMetricsService::new(
            store.clone(),
            Arc::new(InMemoryVaultRegistry::new([vault("usdc", 6, true)])),
            MetricsRegistry::new(),
            ServiceConfig::default(),
        );

        let alice = service.last_request("usdc", " 0xALICE ").await.unwrap();
        assert_eq!(alice.deposit_request_id.as_deref(), Some("2"));
        assert_eq!(alice.redeem_request_id, None);

        let bob = service.last_request("usdc", "0xbob").await.unwrap();
        assert_eq!(bob.deposit_request_id, None);
        assert_eq!(bob.redeem_request_id.as_deref(), Some("3"));

        // A newer request stays hidden until the cached answer expires
        store.append("usdc", vec![request(4, EventType::RedeemRequest, 400, "0xalice", "4")]);
        let cached = service.last_request("usdc", "0xalice").await.unwrap();
        assert!(Arc::ptr_eq(&alice, &cached));

        assert!(matches!(
            service.last_request("usdc", "  ").await,
            Err(KpiError::InvalidParameter(_))
        ));
        assert!(matches!(
            service.last_request("missing", "0xalice").await,
            Err(KpiError::VaultNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_activities_pages_newest_first() {
        let mut events = vec![
            request(1, EventType::DepositRequest, 100, "0xalice", "1"),
            request(2, EventType::DepositRequest, 200, "0xbob", "2"),
            request(3, EventType::RedeemRequest, 300, "0xalice", "3"),
        ];
        events.extend(settlement(4, 400, "2000000"));
        // Inactive vaults keep their activity feed
        let service = service(
            InMemoryEventStore::new().with_events("usdc", events),
            vec![vault("usdc", 6, false)],
        );

        let deposits = ActivityQuery::new(vec![EventType::DepositRequest], Some(1), Some(2));
        let page = service.activities("usdc", &deposits).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.pages(), 2);
        let kinds: Vec<EventType> = page.activities.iter().map(|a| a.event_type).collect();
        assert_eq!(kinds, [EventType::SettleDeposit, EventType::DepositRequest]);
        assert_eq!(page.activities[1].owner.as_deref(), Some("0xbob"));
        assert_eq!(page.activities[1].transaction_hash.as_deref(), Some(hash(2).as_str()));

        let second = ActivityQuery::new(vec![EventType::DepositRequest], Some(2), Some(2));
        let page = service.activities("usdc", &second).await.unwrap();
        assert_eq!(page.activities.len(), 1);
        assert_eq!(page.activities[0].block_timestamp, 100);

        let everything = ActivityQuery::new(vec![], None, None);
        let page = service.activities("usdc", &everything).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.activities[0].block_timestamp, 400);
    }
}
