//! `SQLite` implementation of [`ProposalStore`].

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Params};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::ProposalStore;
use super::schema::{
    CONSTRAINTS_TABLE, COUNT_TABLES_SQL, ORDERS_SQL, ORDERS_TABLE, PROPOSAL_IDS_SQL, SCHEMA_SQL,
    VIOLATED_CONSTRAINTS_SQL,
};
use crate::core::{ConstraintRecord, OrderRecord, Row, SqlValue, decode_row};
use crate::error::StorageError;

/// Timestamp layouts accepted from `DATETIME`/`TIMESTAMP` columns.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// A single long-lived `SQLite` connection.
///
/// The connection is `!Sync`; one handle serves one request at a time.
pub struct SqliteStorage {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStorage {
    /// Opens (or creates) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Sqlite`] if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened proposal store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Sqlite`] if `SQLite` cannot allocate it.
    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Creates the proposal tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Sqlite`] if the schema cannot be applied.
    pub fn init(&mut self) -> Result<(), StorageError> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Returns `true` if both proposal tables exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Sqlite`] if the catalog query fails.
    pub fn is_initialized(&self) -> Result<bool, StorageError> {
        let count: i64 = self.conn.query_row(COUNT_TABLES_SQL, [], |r| r.get(0))?;
        Ok(count == 2)
    }

    /// Raw connection, for seeding and maintenance.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Mutable raw connection, for transactions.
    pub const fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Runs a query and returns column-labeled rows.
    ///
    /// Column declared types decide how text is read: `DECIMAL`/`NUMERIC`
    /// text becomes [`SqlValue::Decimal`], `DATETIME`/`TIMESTAMP` text becomes
    /// [`SqlValue::Timestamp`]. Rows are returned unnormalized.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Sqlite`] on prepare or step failure.
    pub fn query_rows<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Row>, StorageError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let columns: Vec<(String, ColumnKind)> = stmt
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), ColumnKind::from_decl(c.decl_type())))
            .collect();

        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            let mut row = Row::new();
            for (idx, (name, kind)) in columns.iter().enumerate() {
                row.push(name.clone(), read_value(r.get_ref(idx)?, *kind));
            }
            out.push(row);
        }
        Ok(out)
    }

    fn query_records<T: DeserializeOwned>(
        &self,
        table: &'static str,
        sql: &str,
        proposal_id: i64,
    ) -> Result<Vec<T>, StorageError> {
        let rows = self.query_rows(sql, [proposal_id])?;
        debug!(table, proposal_id, rows = rows.len(), "fetched rows");
        rows.into_iter()
            .map(|row| {
                decode_row(row).map_err(|e| StorageError::RowDecode {
                    table,
                    message: e.to_string(),
                })
            })
            .collect()
    }
}

impl ProposalStore for SqliteStorage {
    fn violated_constraints(
        &self,
        proposal_id: i64,
    ) -> Result<Vec<ConstraintRecord>, StorageError> {
        self.query_records(CONSTRAINTS_TABLE, VIOLATED_CONSTRAINTS_SQL, proposal_id)
    }

    fn orders(&self, proposal_id: i64) -> Result<Vec<OrderRecord>, StorageError> {
        self.query_records(ORDERS_TABLE, ORDERS_SQL, proposal_id)
    }

    fn proposal_ids(&self) -> Result<Vec<i64>, StorageError> {
        let mut stmt = self.conn.prepare_cached(PROPOSAL_IDS_SQL)?;
        let ids = stmt
            .query_map([], |r| r.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// How a column's text values should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Plain,
    Decimal,
    Timestamp,
}

impl ColumnKind {
    fn from_decl(decl: Option<&str>) -> Self {
        let Some(decl) = decl.map(str::to_ascii_uppercase) else {
            return Self::Plain;
        };
        if decl.starts_with("DEC") || decl.starts_with("NUMERIC") {
            Self::Decimal
        } else if decl.contains("DATETIME") || decl.contains("TIMESTAMP") {
            Self::Timestamp
        } else {
            Self::Plain
        }
    }
}

fn read_value(value: ValueRef<'_>, kind: ColumnKind) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(f) => SqlValue::Real(f),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            match kind {
                ColumnKind::Decimal => {
                    Decimal::from_str(text.trim()).map_or(SqlValue::Text(text), SqlValue::Decimal)
                }
                ColumnKind::Timestamp => {
                    parse_timestamp(&text).map_or(SqlValue::Text(text), SqlValue::Timestamp)
                }
                ColumnKind::Plain => SqlValue::Text(text),
            }
        }
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text.trim(), fmt).ok())
}
