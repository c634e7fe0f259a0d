//! Connection seam between the execution engine and a database driver.
//!
//! The engine only ever sees these traits. [`crate::tds`] implements them
//! for SQL Server; tests implement them with scripted fakes.

use std::sync::Arc;

use async_trait::async_trait;
use sqlsweep_core::{Credentials, Instance};

use crate::error::DbError;

/// Fixed TDS port used unless configured otherwise.
pub const DEFAULT_PORT: u16 = 1433;

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
    Snapshot,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
            Self::Snapshot => "SNAPSHOT",
        }
    }
}

/// Opens connections scoped to an instance or to one of its databases.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Open a connection.
    ///
    /// With `database = None` the session lands in server context, which
    /// is only used for discovery.
    async fn open(
        &self,
        instance: &Instance,
        database: Option<&str>,
        credentials: &Credentials,
    ) -> Result<Arc<dyn Connection>, DbError>;
}

/// One open session, shareable between sibling tasks.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Start a new transaction at `isolation`.
    async fn begin(&self, isolation: IsolationLevel) -> Result<Box<dyn Transaction>, DbError>;

    /// Run `sql` and collect the `name` column of its first result set.
    async fn query_names(&self, sql: &str) -> Result<Vec<String>, DbError>;

    /// Close the session. Calling it again is a no-op.
    async fn close(&self) -> Result<(), DbError>;
}

/// A transaction in progress.
///
/// Dropping it without [`commit`](Transaction::commit) abandons it; no
/// rollback is sent on the spot. Whatever is left open is rolled back by
/// the next `begin` on the same session, or by its close.
#[async_trait]
pub trait Transaction: Send {
    /// Submit `sql` as a single batch and return the rows affected.
    async fn execute(&mut self, sql: &str) -> Result<u64, DbError>;

    async fn commit(self: Box<Self>) -> Result<(), DbError>;
}
