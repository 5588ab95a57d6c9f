pub mod activity;
pub mod apr;
pub mod error;
pub mod fixed_point;
pub mod pps;
pub mod service;
pub mod tvl;

pub use activity::{
    Activity, ActivityPage, ActivityQuery, DEFAULT_ACTIVITY_LIMIT, LastRequest, MAX_ACTIVITY_LIMIT,
};
pub use apr::{
    AprAnchor, AprMethod, AprResult, Interpolation, calculate_net_apr, calculate_period_apr,
    calculate_seven_day_apr, calculate_thirty_day_apr,
};
pub use error::KpiError;
pub use pps::{PpsPoint, PpsReconstructor, PpsSource};
pub use service::{BulkMetrics, ServiceConfig, Settlement, VaultMetrics, VaultMetricsService};
pub use tvl::{TvlAggregator, TvlPoint, aggregate_tvl};
