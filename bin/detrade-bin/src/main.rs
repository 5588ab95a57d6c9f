mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenvy::dotenv;
use pragma_common::{services::ServiceGroup, telemetry::init_telemetry};

use crate::cli::AppCli;
use detrade_api::{ApiService, AppState};
use detrade_db::{PostgresStore, init_pool, run_migrations};
use detrade_kpi::{ServiceConfig, VaultMetricsService};
use detrade_metrics::MetricsRegistry;
use detrade_quoting::TokenPrices;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let AppCli {
        database_url,
        otel_collector_endpoint,
        api_port,
        db_query_timeout_secs,
        pps_cache_ttl_secs,
        bulk_cache_ttl_secs,
        last_request_cache_ttl_secs,
        coinmarketcap_api_key,
    } = AppCli::parse();

    let app_name = "detrade_vaults_api";
    init_telemetry(app_name, otel_collector_endpoint)
        .map_err(|e| anyhow!("Could not init telemetry: {e}"))?;

    let pool = init_pool(app_name, &database_url)?;
    run_migrations(&pool).await?;

    let store = Arc::new(PostgresStore::new(
        pool,
        Duration::from_secs(db_query_timeout_secs),
    ));
    let config = ServiceConfig {
        pps_cache_ttl: Duration::from_secs(pps_cache_ttl_secs),
        bulk_cache_ttl: Duration::from_secs(bulk_cache_ttl_secs),
        last_request_cache_ttl: Duration::from_secs(last_request_cache_ttl_secs),
    };
    if coinmarketcap_api_key.is_none() {
        tracing::warn!("COINMARKETCAP_API_KEY not set; CoinGecko is the only price source");
    }

    let app_state = AppState {
        vaults: Arc::new(VaultMetricsService::new(
            store.clone(),
            store,
            MetricsRegistry::new(),
            config,
        )),
        prices: Arc::new(TokenPrices::new(coinmarketcap_api_key)),
    };

    let api_service = ApiService::new(app_state, "0.0.0.0", api_port);

    ServiceGroup::default()
        .with(api_service)
        .start_and_drive_to_end()
        .await?;

    Ok(())
}
