use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use detrade_types::{EventType, RawEvent};

use crate::schema::subgraph_events;
use crate::store::EventFilter;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = subgraph_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubgraphEvent {
    pub vault_id: String,
    pub id: String,
    pub event_type: String,
    pub block_timestamp: Option<i64>,
    pub total_assets: Option<String>,
    pub total_supply: Option<String>,
    pub new_high_water_mark: Option<String>,
    pub transaction_hash: Option<String>,
    pub sequence: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub controller: Option<String>,
    pub request_id: Option<String>,
    pub assets: Option<String>,
    pub shares: Option<String>,
}

impl SubgraphEvent {
    /// Events of a vault matching `filter`, newest first.
    /// Rows without a block timestamp are never returned.
    pub fn find_filtered(
        vault_id: &str,
        filter: &EventFilter,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Vec<Self>> {
        let mut query = Self::filtered(vault_id, filter)
            .select(Self::as_select())
            .order((
                subgraph_events::block_timestamp.desc(),
                subgraph_events::id.desc(),
            ));

        if let Some(offset) = filter.offset {
            query = query.offset(offset);
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        query.load(conn)
    }

    /// Number of rows `find_filtered` would return without offset and limit.
    pub fn count_filtered(
        vault_id: &str,
        filter: &EventFilter,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<i64> {
        Self::filtered(vault_id, filter).count().get_result(conn)
    }

    fn filtered(vault_id: &str, filter: &EventFilter) -> subgraph_events::BoxedQuery<'static, Pg> {
        let mut query = subgraph_events::table
            .filter(subgraph_events::vault_id.eq(vault_id.to_owned()))
            .filter(subgraph_events::block_timestamp.is_not_null())
            .into_boxed();

        if !filter.event_types.is_empty() {
            let types: Vec<String> = filter
                .event_types
                .iter()
                .map(|t| t.as_ref().to_owned())
                .collect();
            query = query.filter(subgraph_events::event_type.eq_any(types));
        }

        if let Some(hash) = &filter.transaction_hash {
            query = query.filter(
                subgraph_events::transaction_hash
                    .eq(hash.clone())
                    .or(subgraph_events::id.like(format!("{}%", escape_like(hash)))),
            );
        }

        if let Some(controller) = &filter.controller {
            query = query.filter(subgraph_events::controller.eq(controller.clone()));
        }

        if let Some(since) = filter.since {
            query = query.filter(subgraph_events::block_timestamp.ge(since));
        }

        query
    }

    /// Convert to the domain event, dropping event kinds the API does not know about.
    pub fn into_raw_event(self) -> Option<RawEvent> {
        let event_type = EventType::from_str(&self.event_type).ok()?;
        let block_timestamp = self.block_timestamp?;

        Some(RawEvent {
            id: self.id,
            event_type,
            block_timestamp,
            total_assets: self.total_assets,
            total_supply: self.total_supply,
            new_high_water_mark: self.new_high_water_mark,
            transaction_hash: self.transaction_hash,
            sequence: self.sequence,
            controller: self.controller,
            request_id: self.request_id,
            assets: self.assets,
            shares: self.shares,
        })
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
