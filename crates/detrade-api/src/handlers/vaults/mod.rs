pub mod activity;
pub mod apr;
pub mod metrics;
pub mod pps;
pub mod settlements;
pub mod tvl;

pub use activity::*;
pub use apr::*;
pub use metrics::*;
pub use pps::*;
pub use settlements::*;
pub use tvl::*;
