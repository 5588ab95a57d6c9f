use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
pub const SECONDS_PER_YEAR: i64 = 365 * SECONDS_PER_DAY;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TimeFilter {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "1w")]
    OneWeek,
}

impl TimeFilter {
    pub const fn to_days(&self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::ThreeMonths => Some(90),
            Self::OneMonth => Some(30),
            Self::OneWeek => Some(7),
        }
    }

    /// First timestamp (inclusive) covered by the window ending at `now`.
    pub const fn start_timestamp(&self, now: i64) -> i64 {
        match self.to_days() {
            Some(days) => now - days * SECONDS_PER_DAY,
            None => 0,
        }
    }
}

/// Trailing window of a period APR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AprPeriod {
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
}

impl AprPeriod {
    pub const fn days(&self) -> i64 {
        match self {
            Self::SevenDays => 7,
            Self::ThirtyDays => 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_timestamp() {
        let now = 1_750_000_000;
        assert_eq!(TimeFilter::All.start_timestamp(now), 0);
        assert_eq!(TimeFilter::OneWeek.start_timestamp(now), now - 7 * SECONDS_PER_DAY);
        assert_eq!(
            TimeFilter::ThreeMonths.start_timestamp(now),
            now - 90 * SECONDS_PER_DAY
        );
    }

    #[test]
    fn test_apr_period_days() {
        assert_eq!(AprPeriod::SevenDays.days(), 7);
        assert_eq!(AprPeriod::ThirtyDays.days(), 30);
    }
}
