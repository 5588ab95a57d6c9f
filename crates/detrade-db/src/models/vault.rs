use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use detrade_types::VaultConfig;

use crate::schema::vaults;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = vaults)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Vault {
    pub id: String,
    pub name: String,
    pub underlying_token: String,
    pub underlying_token_decimals: i32,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Vault {
    pub fn find_by_id(id: &str, conn: &mut diesel::PgConnection) -> QueryResult<Self> {
        vaults::table.find(id).select(Self::as_select()).first(conn)
    }

    pub fn find_active(conn: &mut diesel::PgConnection) -> QueryResult<Vec<Self>> {
        vaults::table
            .filter(vaults::is_active.eq(true))
            .select(Self::as_select())
            .order(vaults::id.asc())
            .load(conn)
    }
}

impl From<Vault> for VaultConfig {
    fn from(vault: Vault) -> Self {
        Self {
            id: vault.id,
            name: vault.name,
            underlying_token: vault.underlying_token,
            underlying_token_decimals: vault.underlying_token_decimals,
            is_active: vault.is_active,
        }
    }
}
