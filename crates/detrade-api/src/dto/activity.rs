use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use detrade_kpi::{Activity, ActivityPage, LastRequest};
use detrade_types::EventType;

use super::common::to_rfc3339;

/// Latest request ids a user opened on a vault, `null` when none
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LastRequestDTO {
    pub deposit_request_id: Option<String>,
    pub redeem_request_id: Option<String>,
}

impl From<&LastRequest> for LastRequestDTO {
    fn from(last: &LastRequest) -> Self {
        Self {
            deposit_request_id: last.deposit_request_id.clone(),
            redeem_request_id: last.redeem_request_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityDTO {
    pub id: String,
    pub owner: Option<String>,
    pub event_type: EventType,
    pub block_timestamp: i64,
    pub date: String,
    pub assets: Option<String>,
    pub shares: Option<String>,
    pub total_assets: Option<String>,
    pub total_supply: Option<String>,
    pub transaction_hash: Option<String>,
}

impl From<&Activity> for ActivityDTO {
    fn from(activity: &Activity) -> Self {
        Self {
            id: activity.id.clone(),
            owner: activity.owner.clone(),
            event_type: activity.event_type,
            block_timestamp: activity.block_timestamp,
            date: to_rfc3339(activity.block_timestamp),
            assets: activity.assets.clone(),
            shares: activity.shares.clone(),
            total_assets: activity.total_assets.clone(),
            total_supply: activity.total_supply.clone(),
            transaction_hash: activity.transaction_hash.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginationDTO {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

/// One page of vault activity, newest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityPageDTO {
    pub activities: Vec<ActivityDTO>,
    pub pagination: PaginationDTO,
}

impl From<&ActivityPage> for ActivityPageDTO {
    fn from(page: &ActivityPage) -> Self {
        Self {
            activities: page.activities.iter().map(Into::into).collect(),
            pagination: PaginationDTO {
                total: page.total,
                page: page.page,
                limit: page.limit,
                pages: page.pages(),
            },
        }
    }
}
