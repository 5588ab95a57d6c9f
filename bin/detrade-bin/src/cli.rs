use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct AppCli {
    /// Database URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// OTEL collector endpoint
    #[arg(long, env = "OTEL_COLLECTOR_ENDPOINT")]
    pub otel_collector_endpoint: Option<String>,

    /// API port
    #[arg(long, env = "API_PORT", default_value = "8080")]
    pub api_port: u16,

    /// Upper bound of a single event store query, in seconds
    #[arg(long, env = "DB_QUERY_TIMEOUT_SECS", default_value = "10")]
    pub db_query_timeout_secs: u64,

    /// Lifetime of a cached share price series, in seconds
    #[arg(long, env = "PPS_CACHE_TTL_SECS", default_value = "30")]
    pub pps_cache_ttl_secs: u64,

    /// Lifetime of a cached bulk metrics response, in seconds
    #[arg(long, env = "BULK_CACHE_TTL_SECS", default_value = "180")]
    pub bulk_cache_ttl_secs: u64,

    /// Lifetime of a cached last request lookup, in seconds
    #[arg(long, env = "LAST_REQUEST_CACHE_TTL_SECS", default_value = "30")]
    pub last_request_cache_ttl_secs: u64,

    /// CoinMarketCap API key, enables the fallback price source
    #[arg(long, env = "COINMARKETCAP_API_KEY")]
    pub coinmarketcap_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = AppCli::try_parse_from(["detrade", "--database-url", "postgres://localhost/detrade"])
            .unwrap();
        assert_eq!(cli.api_port, 8080);
        assert_eq!(cli.db_query_timeout_secs, 10);
        assert_eq!(cli.bulk_cache_ttl_secs, 180);
        assert_eq!(cli.last_request_cache_ttl_secs, 30);
    }
}
