use std::time::Duration;

use deadpool_diesel::postgres::Pool;

use detrade_types::{RawEvent, VaultConfig};

use super::{EventFilter, EventStore, VaultRegistry};
use crate::{
    errors::DatabaseError,
    models::{SubgraphEvent, Vault},
    pool::DetradePool,
};

/// [`EventStore`] and [`VaultRegistry`] backed by the Postgres tables the indexer fills.
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
    query_timeout: Duration,
}

impl PostgresStore {
    pub const fn new(pool: Pool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[async_trait::async_trait]
impl EventStore for PostgresStore {
    async fn find(
        &self,
        vault_id: &str,
        filter: &EventFilter,
    ) -> Result<Vec<RawEvent>, DatabaseError> {
        let vault_id_owned = vault_id.to_owned();
        let filter_owned = filter.clone();

        let rows = self
            .pool
            .interact_with_timeout(
                format!("find events for vault: {vault_id}"),
                self.query_timeout,
                move |conn| SubgraphEvent::find_filtered(&vault_id_owned, &filter_owned, conn),
            )
            .await?;

        let total = rows.len();
        let events: Vec<RawEvent> = rows
            .into_iter()
            .filter_map(SubgraphEvent::into_raw_event)
            .collect();

        if events.len() != total {
            tracing::debug!(
                vault_id = %vault_id,
                dropped = total - events.len(),
                "Ignored events of unknown type"
            );
        }

        Ok(events)
    }

    async fn count(&self, vault_id: &str, filter: &EventFilter) -> Result<i64, DatabaseError> {
        let vault_id_owned = vault_id.to_owned();
        let filter_owned = filter.clone();

        self.pool
            .interact_with_timeout(
                format!("count events for vault: {vault_id}"),
                self.query_timeout,
                move |conn| SubgraphEvent::count_filtered(&vault_id_owned, &filter_owned, conn),
            )
            .await
    }
}

#[async_trait::async_trait]
impl VaultRegistry for PostgresStore {
    async fn vault_config(&self, vault_id: &str) -> Result<VaultConfig, DatabaseError> {
        let vault_id_owned = vault_id.to_owned();
        self.pool
            .interact_with_timeout(
                format!("find vault by id: {vault_id}"),
                self.query_timeout,
                move |conn| Vault::find_by_id(&vault_id_owned, conn),
            )
            .await
            .map(VaultConfig::from)
    }

    async fn active_vaults(&self) -> Result<Vec<VaultConfig>, DatabaseError> {
        let vaults = self
            .pool
            .interact_with_timeout(
                "find active vaults".to_string(),
                self.query_timeout,
                Vault::find_active,
            )
            .await?;

        Ok(vaults.into_iter().map(VaultConfig::from).collect())
    }
}
