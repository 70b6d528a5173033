//! # SQL Block Store
//!
//! The relational adapter behind [`BlockStore`], built on sqlx's `Any`
//! driver so the same code audits a Postgres archive in production and an
//! SQLite file (or `sqlite::memory:`) in tests.
//!
//! ## Table Mapping
//!
//! The block table is described by an explicit [`TableMapping`] instead of
//! schema metadata:
//!
//! | Field          | Column (default) | Type                   |
//! |----------------|------------------|------------------------|
//! | `number`       | `block_num`      | integer, primary key   |
//! | `hash`         | `block_hash`     | `bytea` / `BLOB`       |
//! | `parent_hash`  | `parent_hash`    | `bytea` / `BLOB`       |
//!
//! Identifiers are validated before they are spliced into SQL. Values are
//! always bound.
//!
//! ## Queries
//!
//! ```text
//! SELECT COUNT(*), CAST(MAX(block_num) AS BIGINT) FROM block
//! SELECT CAST(block_num AS BIGINT), block_hash, parent_hash FROM block WHERE block_num = $1
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::any::{AnyConnectOptions, AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, ConnectOptions, Row};

use super::block::{Block, BlockNumber};
use super::store::{BlockStore, StoreError, StoreResult, StoreStats};
use crate::config::{
    StoreConfig, DEFAULT_HASH_COLUMN, DEFAULT_NUMBER_COLUMN, DEFAULT_PARENT_HASH_COLUMN,
    DEFAULT_TABLE,
};

/// Longest identifier Postgres accepts without truncation.
const MAX_IDENTIFIER_LEN: usize = 63;

// ---------------------------------------------------------------------------
// TableMapping
// ---------------------------------------------------------------------------

/// Where the block fields live in the database.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableMapping {
    /// Table name, optionally schema-qualified (`archive.block`).
    pub name: String,
    pub number_column: String,
    pub hash_column: String,
    pub parent_hash_column: String,
}

impl Default for TableMapping {
    fn default() -> Self {
        Self {
            name: DEFAULT_TABLE.to_string(),
            number_column: DEFAULT_NUMBER_COLUMN.to_string(),
            hash_column: DEFAULT_HASH_COLUMN.to_string(),
            parent_hash_column: DEFAULT_PARENT_HASH_COLUMN.to_string(),
        }
    }
}

impl TableMapping {
    /// Mapping for `table` with the default column names.
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            name: table.into(),
            ..Self::default()
        }
    }

    /// `(column, field)` pairs, in select order.
    pub fn columns(&self) -> [(&str, &'static str); 3] {
        [
            (self.number_column.as_str(), "number"),
            (self.hash_column.as_str(), "hash"),
            (self.parent_hash_column.as_str(), "parent_hash"),
        ]
    }

    /// Reject anything that is not a plain SQL identifier.
    pub fn validate(&self) -> StoreResult<()> {
        if !is_identifier(&self.name, true) {
            return Err(StoreError::InvalidMapping(format!(
                "table name {:?} is not a valid identifier",
                self.name
            )));
        }
        for (column, field) in self.columns() {
            if !is_identifier(column, false) {
                return Err(StoreError::InvalidMapping(format!(
                    "column {column:?} for field `{field}` is not a valid identifier"
                )));
            }
        }
        Ok(())
    }

    fn stats_query(&self) -> String {
        format!(
            "SELECT COUNT(*) AS block_count, CAST(MAX({num}) AS BIGINT) AS max_block_num FROM {table}",
            num = self.number_column,
            table = self.name,
        )
    }

    fn lookup_query(&self) -> String {
        format!(
            "SELECT CAST({num} AS BIGINT) AS block_num, {hash} AS block_hash, {parent} AS parent_hash \
             FROM {table} WHERE {num} = $1",
            num = self.number_column,
            hash = self.hash_column,
            parent = self.parent_hash_column,
            table = self.name,
        )
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`, with at most one `schema.` prefix when allowed.
fn is_identifier(s: &str, allow_schema: bool) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    let max_parts = if allow_schema { 2 } else { 1 };
    if parts.len() > max_parts {
        return false;
    }
    parts.iter().all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                part.len() <= MAX_IDENTIFIER_LEN
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}

// ---------------------------------------------------------------------------
// SqlBlockStore
// ---------------------------------------------------------------------------

/// Read-only block store over a sqlx connection pool.
#[derive(Debug, Clone)]
pub struct SqlBlockStore {
    pool: AnyPool,
    mapping: TableMapping,
    query_timeout: Option<Duration>,
    stats_sql: String,
    lookup_sql: String,
}

impl SqlBlockStore {
    /// Open a pool against `config.uri`.
    ///
    /// Any failure here (bad URI, unreachable host, rejected credentials) is
    /// reported as [`StoreError::Unavailable`].
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let uri = config
            .require_uri()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        config.table.validate()?;

        sqlx::any::install_default_drivers();

        let mut options: AnyConnectOptions = uri
            .parse()
            .map_err(|e: sqlx::Error| StoreError::Unavailable(e.to_string()))?;
        if config.disable_statement_logging {
            options = options.disable_statement_logging();
        }

        let pool = AnyPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tracing::info!(
            target: "rollcheck::storage",
            uri = %config.redacted_uri().unwrap_or_default(),
            table = %config.table.name,
            max_connections = config.max_connections,
            "block store connected"
        );

        Self::from_pool(pool, config.table.clone(), config.query_timeout())
    }

    /// Wrap an existing pool.
    pub fn from_pool(
        pool: AnyPool,
        mapping: TableMapping,
        query_timeout: Option<Duration>,
    ) -> StoreResult<Self> {
        mapping.validate()?;
        Ok(Self {
            stats_sql: mapping.stats_query(),
            lookup_sql: mapping.lookup_query(),
            pool,
            mapping,
            query_timeout,
        })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn mapping(&self) -> &TableMapping {
        &self.mapping
    }

    /// Close every pooled connection. Pending lookups finish first.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!(target: "rollcheck::storage", "block store closed");
    }

}

/// Run a lookup of `block_num`, failing with [`StoreError::Timeout`] once
/// `limit` elapses. No limit waits forever.
async fn with_timeout<T, F>(
    limit: Option<Duration>,
    block_num: BlockNumber,
    fut: F,
) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| StoreError::Timeout {
                block_num,
                timeout_secs: limit.as_secs(),
            })?,
        None => fut.await,
    }
}

fn row_to_block(row: &AnyRow) -> StoreResult<Block> {
    let number: i64 = row
        .try_get("block_num")
        .map_err(|e| StoreError::InvalidRow(format!("block_num: {e}")))?;
    let hash: Vec<u8> = row
        .try_get("block_hash")
        .map_err(|e| StoreError::InvalidRow(format!("block_hash: {e}")))?;
    let parent_hash: Vec<u8> = row
        .try_get("parent_hash")
        .map_err(|e| StoreError::InvalidRow(format!("parent_hash: {e}")))?;
    let number = BlockNumber::try_from(number)
        .map_err(|_| StoreError::InvalidRow(format!("negative block number {number}")))?;

    Ok(Block {
        number,
        hash,
        parent_hash,
    })
}

#[async_trait]
impl BlockStore for SqlBlockStore {
    async fn count_and_max(&self) -> StoreResult<StoreStats> {
        let row = sqlx::query(&self.stats_sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let count: i64 = row
            .try_get("block_count")
            .map_err(|e| StoreError::InvalidRow(format!("block_count: {e}")))?;
        let max: Option<i64> = row
            .try_get("max_block_num")
            .map_err(|e| StoreError::InvalidRow(format!("max_block_num: {e}")))?;

        let count = u64::try_from(count)
            .map_err(|_| StoreError::InvalidRow(format!("negative row count {count}")))?;
        let max = max
            .map(|m| {
                BlockNumber::try_from(m)
                    .map_err(|_| StoreError::InvalidRow(format!("negative block number {m}")))
            })
            .transpose()?;

        tracing::debug!(target: "rollcheck::storage", count, ?max, "store statistics");
        Ok(StoreStats::new(count, max))
    }

    async fn block_by_number(&self, number: BlockNumber) -> StoreResult<Option<Block>> {
        let key = i64::try_from(number).map_err(|_| StoreError::Fetch {
            block_num: number,
            reason: "block number exceeds the store's integer range".to_string(),
        })?;

        let lookup = async {
            sqlx::query(&self.lookup_sql)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Fetch {
                    block_num: number,
                    reason: e.to_string(),
                })
        };

        match with_timeout(self.query_timeout, number, lookup).await? {
            Some(row) => row_to_block(&row).map(Some),
            None => Ok(None),
        }
    }
}
