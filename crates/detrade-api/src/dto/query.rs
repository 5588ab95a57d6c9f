use std::str::FromStr;

use serde::Deserialize;
use utoipa::ToSchema;

use detrade_kpi::ActivityQuery;
use detrade_types::{EventType, TimeFilter};

use crate::errors::ApiError;

/// Query parameters for endpoints that accept a time window
#[derive(Debug, Deserialize, ToSchema)]
pub struct TimeQuery {
    #[serde(default)]
    pub time: TimeFilter,
}

impl TimeQuery {
    /// Window start, `None` for the whole history.
    pub fn since(&self, now: i64) -> Option<i64> {
        self.time.to_days().map(|_| self.time.start_timestamp(now))
    }
}

/// Query parameters for the bulk metrics endpoint
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BulkMetricsQuery {
    /// Comma separated vault ids, every active vault when omitted
    pub vault_ids: Option<String>,
}

impl BulkMetricsQuery {
    pub fn ids(&self) -> Vec<String> {
        self.vault_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Query parameters of the last request endpoint
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LastRequestQuery {
    #[serde(alias = "userAddress")]
    pub user: Option<String>,
}

/// Query parameters of the activity feed
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ActivitiesQuery {
    /// Comma separated event types, every kind when omitted
    pub types: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ActivitiesQuery {
    pub fn to_activity_query(&self) -> Result<ActivityQuery, ApiError> {
        let event_types = self
            .types
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| {
                EventType::from_str(t)
                    .map_err(|_| ApiError::BadRequest(format!("Unknown event type: {t}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ActivityQuery::new(event_types, self.page, self.limit))
    }
}
