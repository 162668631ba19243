//! Durable identity store backed by DuckDB.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use tickgate_core::identity::{apply_quota, Identity, IdentityStore, QuotaDecision, StoreError};
use tickgate_core::tier::{Tier, TierPolicy};
use tickgate_core::TradingDate;

use crate::pool::ConnectionPool;
use crate::{escape_sql_string, finalize_transaction, migrations, BackendError, StoreConfig};

/// DuckDB-backed [`IdentityStore`]. Quota updates are serialized behind a
/// store-wide async mutex and applied inside a transaction, so concurrent
/// `check_and_consume` calls never observe the same pre-increment count.
pub struct DuckDbIdentityStore {
    pool: ConnectionPool,
    write_lock: Mutex<()>,
}

impl DuckDbIdentityStore {
    pub fn open_default() -> Result<Self, BackendError> {
        Self::open(StoreConfig::default())
    }

    pub fn open(config: StoreConfig) -> Result<Self, BackendError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::new(config.db_path, config.max_pool_size);
        let store = Self {
            pool,
            write_lock: Mutex::new(()),
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn initialize(&self) -> Result<(), BackendError> {
        let connection = self.pool.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    /// Registers a new API key on `tier` and returns the stored identity.
    pub fn insert_identity(&self, api_key: &str, tier: Tier) -> Result<Identity, BackendError> {
        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            api_key: api_key.to_owned(),
            tier,
            requests_made: 0,
            last_request_date: TradingDate::today_utc(),
        };

        let connection = self.pool.acquire()?;
        let sql = format!(
            r#"
INSERT INTO identities (id, api_key, tier, requests_made, last_request_date)
VALUES ('{id}', '{api_key}', '{tier}', 0, DATE '{last_request_date}');
"#,
            id = escape_sql_string(identity.id.as_str()),
            api_key = escape_sql_string(identity.api_key.as_str()),
            tier = escape_sql_string(identity.tier.as_str()),
            last_request_date = identity.last_request_date.format_iso(),
        );
        connection.execute_batch(sql.as_str())?;

        debug!(identity = %identity.id, tier = %identity.tier, "identity registered");
        Ok(identity)
    }

    fn load_identity(
        connection: &Connection,
        column: &str,
        value: &str,
    ) -> Result<Option<Identity>, BackendError> {
        let sql = format!(
            r#"
SELECT id, api_key, tier, requests_made, CAST(last_request_date AS VARCHAR)
FROM identities
WHERE {column} = '{value}'
"#,
            column = column,
            value = escape_sql_string(value),
        );

        let raw = connection.query_row(sql.as_str(), [], |row| {
            let id: String = row.get(0)?;
            let api_key: String = row.get(1)?;
            let tier: String = row.get(2)?;
            let requests_made: i64 = row.get(3)?;
            let last_request_date: String = row.get(4)?;
            Ok((id, api_key, tier, requests_made, last_request_date))
        });

        let (id, api_key, tier, requests_made, last_request_date) = match raw {
            Ok(raw) => raw,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        let tier = Tier::from_str(tier.as_str()).map_err(|_| BackendError::CorruptRow {
            table: "identities",
            detail: format!("unknown tier '{tier}' for identity '{id}'"),
        })?;
        let requests_made =
            u32::try_from(requests_made).map_err(|_| BackendError::CorruptRow {
                table: "identities",
                detail: format!("negative request counter for identity '{id}'"),
            })?;
        let last_request_date = TradingDate::parse(last_request_date.as_str()).map_err(|_| {
            BackendError::CorruptRow {
                table: "identities",
                detail: format!("unparseable last_request_date for identity '{id}'"),
            }
        })?;

        Ok(Some(Identity {
            id,
            api_key,
            tier,
            requests_made,
            last_request_date,
        }))
    }

    fn consume_in_transaction(
        connection: &Connection,
        identity_id: &str,
        policy: &TierPolicy,
        today: TradingDate,
    ) -> Result<Option<QuotaDecision>, BackendError> {
        let Some(identity) = Self::load_identity(connection, "id", identity_id)? else {
            return Ok(None);
        };

        let mut requests_made = identity.requests_made;
        let mut last_request_date = identity.last_request_date;
        let decision = apply_quota(&mut requests_made, &mut last_request_date, policy, today);

        // Only a counted admission changes durable state; denials and
        // unlimited tiers leave the row untouched.
        if let QuotaDecision::Allowed { used } = decision {
            if used > 0 {
                let sql = format!(
                    r#"
UPDATE identities
SET requests_made = {requests_made}, last_request_date = DATE '{last_request_date}'
WHERE id = '{id}';
"#,
                    requests_made = requests_made,
                    last_request_date = last_request_date.format_iso(),
                    id = escape_sql_string(identity_id),
                );
                connection.execute_batch(sql.as_str())?;
            }
        }

        Ok(Some(decision))
    }
}

#[async_trait]
impl IdentityStore for DuckDbIdentityStore {
    async fn resolve(&self, api_key: &str) -> Result<Option<Identity>, StoreError> {
        let connection = self.pool.acquire().map_err(BackendError::from)?;
        let identity = Self::load_identity(&connection, "api_key", api_key)?;
        Ok(identity)
    }

    async fn check_and_consume(
        &self,
        identity_id: &str,
        policy: &TierPolicy,
        today: TradingDate,
    ) -> Result<QuotaDecision, StoreError> {
        let _guard = self.write_lock.lock().await;

        let connection = self.pool.acquire().map_err(BackendError::from)?;
        connection
            .execute_batch("BEGIN TRANSACTION")
            .map_err(BackendError::from)?;
        let result = Self::consume_in_transaction(&connection, identity_id, policy, today);
        let decision = finalize_transaction(&connection, result)?;

        decision.ok_or_else(|| StoreError::UnknownIdentity {
            id: identity_id.to_owned(),
        })
    }
}
