//! Annualized yield from a share price series.
//!
//! Share prices are rounded to 6 decimals before use and the final percentage
//! to 2 decimals. Fewer than two usable points never fail: they produce
//! [`AprResult::neutral`].

use detrade_types::{AprPeriod, SECONDS_PER_DAY, SECONDS_PER_YEAR};

use crate::fixed_point::round_to;
use crate::pps::PpsPoint;

const PPS_DECIMALS: i32 = 6;
const APR_DECIMALS: i32 = 2;
const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AprMethod {
    /// Compounded over more than a year of history.
    Geometric,
    /// Simple extrapolation of a sub-year return.
    Linear,
    /// Return against the last point at least the period old.
    ReferencePoint,
    /// Return against a price interpolated at exactly the period boundary.
    Interpolated,
    InsufficientData,
}

impl AprMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Geometric => "geometric",
            Self::Linear => "linear",
            Self::ReferencePoint => "referencePoint",
            Self::Interpolated => "interpolated",
            Self::InsufficientData => "insufficientData",
        }
    }
}

/// A share price an APR was measured from or to.
#[derive(Debug, Clone, PartialEq)]
pub struct AprAnchor {
    pub block_timestamp: i64,
    pub pps: f64,
    /// `None` for interpolated anchors.
    pub transaction_hash: Option<String>,
    pub interpolated: bool,
}

impl AprAnchor {
    fn from_point(point: &PpsPoint) -> Self {
        Self {
            block_timestamp: point.block_timestamp,
            pps: rounded_pps(point),
            transaction_hash: Some(point.transaction_hash.clone()),
            interpolated: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation {
    pub before: AprAnchor,
    pub after: AprAnchor,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AprResult {
    /// Percentage, rounded to 2 decimals.
    pub apr: f64,
    pub start: Option<AprAnchor>,
    pub end: Option<AprAnchor>,
    pub total_return: f64,
    pub duration_in_years: f64,
    pub method: AprMethod,
    pub interpolation: Option<Interpolation>,
}

impl AprResult {
    pub const fn neutral() -> Self {
        Self {
            apr: 0.0,
            start: None,
            end: None,
            total_return: 0.0,
            duration_in_years: 0.0,
            method: AprMethod::InsufficientData,
            interpolation: None,
        }
    }
}

fn rounded_pps(point: &PpsPoint) -> f64 {
    round_to(point.pps_formatted, PPS_DECIMALS)
}

fn chronological(points: &[PpsPoint]) -> Vec<&PpsPoint> {
    let mut sorted: Vec<&PpsPoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.block_timestamp);
    sorted
}

/// Lifetime APR between the oldest and the newest share price.
pub fn calculate_net_apr(points: &[PpsPoint]) -> AprResult {
    let sorted = chronological(points);
    if sorted.len() < 2 {
        return AprResult::neutral();
    }
    let (Some(oldest), Some(newest)) = (sorted.first(), sorted.last()) else {
        return AprResult::neutral();
    };

    let start = AprAnchor::from_point(oldest);
    let end = AprAnchor::from_point(newest);
    let duration = newest.block_timestamp - oldest.block_timestamp;
    if duration <= 0 || start.pps <= 0.0 {
        return AprResult::neutral();
    }

    let total_return = (end.pps - start.pps) / start.pps;
    let duration_in_years = duration as f64 / SECONDS_PER_YEAR as f64;

    let (apr, method) = if duration_in_years >= 1.0 {
        (
            ((1.0 + total_return).powf(1.0 / duration_in_years) - 1.0) * 100.0,
            AprMethod::Geometric,
        )
    } else {
        (total_return / duration_in_years * 100.0, AprMethod::Linear)
    };

    AprResult {
        apr: round_to(apr, APR_DECIMALS),
        start: Some(start),
        end: Some(end),
        total_return,
        duration_in_years,
        method,
        interpolation: None,
    }
}

pub fn calculate_period_apr(points: &[PpsPoint], period: AprPeriod) -> AprResult {
    match period {
        AprPeriod::SevenDays => calculate_seven_day_apr(points),
        AprPeriod::ThirtyDays => calculate_thirty_day_apr(points),
    }
}

/// APR over the last 30 days, measured from the newest point at least 30 days
/// older than the latest one, or from the oldest point for younger vaults.
pub fn calculate_thirty_day_apr(points: &[PpsPoint]) -> AprResult {
    let sorted = chronological(points);
    if sorted.len() < 2 {
        return AprResult::neutral();
    }
    let (Some(oldest), Some(latest)) = (sorted.first(), sorted.last()) else {
        return AprResult::neutral();
    };

    let target = latest.block_timestamp - AprPeriod::ThirtyDays.days() * SECONDS_PER_DAY;
    let reference = sorted
        .iter()
        .rev()
        .find(|p| p.block_timestamp <= target)
        .unwrap_or(oldest);

    let start = AprAnchor::from_point(reference);
    let end = AprAnchor::from_point(latest);
    if start.pps <= 0.0 {
        return AprResult::neutral();
    }

    let days = (latest.block_timestamp - reference.block_timestamp) as f64 / SECONDS_PER_DAY as f64;
    let adjusted_days = days.max(1.0);
    let total_return = (end.pps - start.pps) / start.pps;
    let apr = total_return * (DAYS_PER_YEAR / adjusted_days) * 100.0;

    AprResult {
        apr: round_to(apr, APR_DECIMALS),
        start: Some(start),
        end: Some(end),
        total_return,
        duration_in_years: adjusted_days / DAYS_PER_YEAR,
        method: AprMethod::ReferencePoint,
        interpolation: None,
    }
}

/// APR over exactly 7 days, against a share price linearly interpolated at
/// `latest - 7d` between the two points around that instant.
///
/// When no point is older than the boundary the two oldest points are used and
/// the line is extrapolated backwards.
pub fn calculate_seven_day_apr(points: &[PpsPoint]) -> AprResult {
    let sorted = chronological(points);
    if sorted.len() < 2 {
        return AprResult::neutral();
    }
    let Some(latest) = sorted.last() else {
        return AprResult::neutral();
    };

    let period_days = AprPeriod::SevenDays.days();
    let target = latest.block_timestamp - period_days * SECONDS_PER_DAY;

    // Oldest point at or after the boundary; there is always one since `latest` qualifies.
    let after_index = sorted
        .iter()
        .position(|p| p.block_timestamp >= target)
        .unwrap_or(sorted.len() - 1);
    let (before, after) = if after_index == 0 {
        (sorted[0], sorted[1])
    } else {
        (sorted[after_index - 1], sorted[after_index])
    };

    let before_anchor = AprAnchor::from_point(before);
    let after_anchor = AprAnchor::from_point(after);

    let span = after.block_timestamp - before.block_timestamp;
    let factor = if span == 0 {
        0.0
    } else {
        (target - before.block_timestamp) as f64 / span as f64
    };
    let interpolated_pps = round_to(
        before_anchor.pps + (after_anchor.pps - before_anchor.pps) * factor,
        PPS_DECIMALS,
    );
    if interpolated_pps <= 0.0 {
        return AprResult::neutral();
    }

    let end = AprAnchor::from_point(latest);
    let total_return = (end.pps - interpolated_pps) / interpolated_pps;
    let apr = total_return * (DAYS_PER_YEAR / period_days as f64) * 100.0;

    AprResult {
        apr: round_to(apr, APR_DECIMALS),
        start: Some(AprAnchor {
            block_timestamp: target,
            pps: interpolated_pps,
            transaction_hash: None,
            interpolated: true,
        }),
        end: Some(end),
        total_return,
        duration_in_years: period_days as f64 / DAYS_PER_YEAR,
        method: AprMethod::Interpolated,
        interpolation: Some(Interpolation {
            before: before_anchor,
            after: after_anchor,
            factor,
        }),
    }
}
