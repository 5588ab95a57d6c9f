use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use detrade_types::{RawEvent, VaultConfig};

use super::{EventFilter, EventStore, VaultRegistry};
use crate::errors::DatabaseError;

/// Event log kept in memory, used by tests and local tooling.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<String, Vec<RawEvent>>>,
    unavailable: RwLock<HashSet<String>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_events(self, vault_id: &str, events: Vec<RawEvent>) -> Self {
        self.append(vault_id, events);
        self
    }

    pub fn append(&self, vault_id: &str, events: Vec<RawEvent>) {
        let mut guard = self.events.write().unwrap_or_else(|e| e.into_inner());
        guard.entry(vault_id.to_owned()).or_default().extend(events);
    }

    /// Make every query for `vault_id` fail as if the backing store were down.
    pub fn set_unavailable(&self, vault_id: &str) {
        let mut guard = self.unavailable.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(vault_id.to_owned());
    }
}

#[async_trait::async_trait]
impl EventStore for InMemoryEventStore {
    async fn find(
        &self,
        vault_id: &str,
        filter: &EventFilter,
    ) -> Result<Vec<RawEvent>, DatabaseError> {
        let mut events = self.matching(vault_id, filter)?;

        events.sort_by(|a, b| {
            (b.block_timestamp, &b.id).cmp(&(a.block_timestamp, &a.id))
        });
        let offset = filter.offset.map_or(0, |o| usize::try_from(o).unwrap_or(0));
        let limit = filter.limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(0));

        Ok(events.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, vault_id: &str, filter: &EventFilter) -> Result<i64, DatabaseError> {
        let events = self.matching(vault_id, filter)?;
        Ok(i64::try_from(events.len()).unwrap_or(i64::MAX))
    }
}

impl InMemoryEventStore {
    fn matching(&self, vault_id: &str, filter: &EventFilter) -> Result<Vec<RawEvent>, DatabaseError> {
        let unavailable = self.unavailable.read().unwrap_or_else(|e| e.into_inner());
        if unavailable.contains(vault_id) {
            return Err(DatabaseError::query_error(
                format!("find events for vault: {vault_id}"),
                "event store unavailable",
            ));
        }
        drop(unavailable);

        let guard = self.events.read().unwrap_or_else(|e| e.into_inner());
        Ok(guard
            .get(vault_id)
            .map(|events| events.iter().filter(|e| filter.matches(e)).cloned().collect())
            .unwrap_or_default())
    }
}

/// Vault configurations kept in memory, used by tests and local tooling.
#[derive(Debug, Default)]
pub struct InMemoryVaultRegistry {
    vaults: HashMap<String, VaultConfig>,
}

impl InMemoryVaultRegistry {
    pub fn new(vaults: impl IntoIterator<Item = VaultConfig>) -> Self {
        Self {
            vaults: vaults.into_iter().map(|v| (v.id.clone(), v)).collect(),
        }
    }
}

#[async_trait::async_trait]
impl VaultRegistry for InMemoryVaultRegistry {
    async fn vault_config(&self, vault_id: &str) -> Result<VaultConfig, DatabaseError> {
        self.vaults
            .get(vault_id)
            .cloned()
            .ok_or_else(|| DatabaseError::not_found(format!("find vault by id: {vault_id}")))
    }

    async fn active_vaults(&self) -> Result<Vec<VaultConfig>, DatabaseError> {
        let mut vaults: Vec<VaultConfig> =
            self.vaults.values().filter(|v| v.is_active).cloned().collect();
        vaults.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(vaults)
    }
}
