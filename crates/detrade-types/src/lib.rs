pub mod decimals;
pub mod event;
pub mod time;
pub mod vault;

pub use decimals::{TokenDecimals, UnsupportedDecimals};
pub use event::{EventType, RawEvent};
pub use time::{AprPeriod, SECONDS_PER_DAY, SECONDS_PER_YEAR, TimeFilter};
pub use vault::VaultConfig;
