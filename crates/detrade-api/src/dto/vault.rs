use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use detrade_kpi::{
    AprAnchor, AprResult, BulkMetrics, Interpolation, PpsPoint, Settlement, TvlPoint,
    VaultMetrics,
};
use detrade_types::EventType;

use super::common::to_rfc3339;

/// Share price reconstructed from one `totalAssetsUpdated` event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PpsPointDTO {
    pub block_timestamp: i64,
    pub date: String,
    pub transaction_hash: String,
    /// Share price scaled by 1e18
    pub pps_raw: String,
    pub pps: f64,
    pub source: String,
    /// Set when the share price fell back to 1.0
    pub degraded: bool,
}

impl From<&PpsPoint> for PpsPointDTO {
    fn from(point: &PpsPoint) -> Self {
        Self {
            block_timestamp: point.block_timestamp,
            date: to_rfc3339(point.block_timestamp),
            transaction_hash: point.transaction_hash.clone(),
            pps_raw: point.pps_raw.to_string(),
            pps: point.pps_formatted,
            source: point.source.as_str().to_string(),
            degraded: point.degraded,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AprAnchorDTO {
    pub block_timestamp: i64,
    pub pps: f64,
    pub transaction_hash: Option<String>,
    pub interpolated: bool,
}

impl From<&AprAnchor> for AprAnchorDTO {
    fn from(anchor: &AprAnchor) -> Self {
        Self {
            block_timestamp: anchor.block_timestamp,
            pps: anchor.pps,
            transaction_hash: anchor.transaction_hash.clone(),
            interpolated: anchor.interpolated,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InterpolationDTO {
    pub before: AprAnchorDTO,
    pub after: AprAnchorDTO,
    pub factor: f64,
}

impl From<&Interpolation> for InterpolationDTO {
    fn from(interpolation: &Interpolation) -> Self {
        Self {
            before: (&interpolation.before).into(),
            after: (&interpolation.after).into(),
            factor: interpolation.factor,
        }
    }
}

/// Annualized return in percent, with the share prices it was derived from
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AprDTO {
    pub apr: f64,
    pub start: Option<AprAnchorDTO>,
    pub end: Option<AprAnchorDTO>,
    pub total_return: f64,
    pub duration_in_years: f64,
    #[schema(example = "interpolated")]
    pub method: String,
    pub interpolation: Option<InterpolationDTO>,
}

impl From<&AprResult> for AprDTO {
    fn from(result: &AprResult) -> Self {
        Self {
            apr: result.apr,
            start: result.start.as_ref().map(Into::into),
            end: result.end.as_ref().map(Into::into),
            total_return: result.total_return,
            duration_in_years: result.duration_in_years,
            method: result.method.as_str().to_string(),
            interpolation: result.interpolation.as_ref().map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TvlPointDTO {
    pub block_timestamp: i64,
    pub date: String,
    /// Total assets in underlying token units
    pub total_assets: String,
    pub total_assets_raw: String,
    pub event_type: EventType,
}

impl From<&TvlPoint> for TvlPointDTO {
    fn from(point: &TvlPoint) -> Self {
        Self {
            block_timestamp: point.block_timestamp,
            date: to_rfc3339(point.block_timestamp),
            total_assets: point.total_assets.clone(),
            total_assets_raw: point.total_assets_raw.clone(),
            event_type: point.event_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettlementDTO {
    pub id: String,
    pub event_type: EventType,
    pub block_timestamp: i64,
    pub date: String,
    pub transaction_hash: Option<String>,
    pub total_assets: Option<String>,
    pub total_supply: Option<String>,
    /// Share price implied by the settlement totals, scaled by 1e18
    pub pps_raw: Option<String>,
    pub sequence: Option<i64>,
}

impl From<&Settlement> for SettlementDTO {
    fn from(settlement: &Settlement) -> Self {
        Self {
            id: settlement.id.clone(),
            event_type: settlement.event_type,
            block_timestamp: settlement.block_timestamp,
            date: to_rfc3339(settlement.block_timestamp),
            transaction_hash: settlement.transaction_hash.clone(),
            total_assets: settlement.total_assets.clone(),
            total_supply: settlement.total_supply.clone(),
            pps_raw: settlement.pps_raw.as_ref().map(ToString::to_string),
            sequence: settlement.sequence,
        }
    }
}

/// Headline metrics of one vault
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VaultMetricsDTO {
    pub tvl: Option<TvlPointDTO>,
    pub net_apr: Option<f64>,
    pub thirty_day_apr: Option<f64>,
    pub seven_day_apr: Option<f64>,
}

impl From<&VaultMetrics> for VaultMetricsDTO {
    fn from(metrics: &VaultMetrics) -> Self {
        Self {
            tvl: metrics.tvl.as_ref().map(Into::into),
            net_apr: metrics.net_apr,
            thirty_day_apr: metrics.thirty_day_apr,
            seven_day_apr: metrics.seven_day_apr,
        }
    }
}

/// Metrics keyed by vault id, `null` for a vault whose computation failed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkMetricsDTO(pub BTreeMap<String, Option<VaultMetricsDTO>>);

impl From<&BulkMetrics> for BulkMetricsDTO {
    fn from(metrics: &BulkMetrics) -> Self {
        Self(
            metrics
                .iter()
                .map(|(id, m)| (id.clone(), m.as_ref().map(Into::into)))
                .collect(),
        )
    }
}
