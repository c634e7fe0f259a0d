//! Database access for sqlsweep.
//!
//! - [`connection`]: the traits the execution engine talks to.
//! - [`tds`]: SQL Server implementation of those traits.
//! - [`executor`]: [`QueryExecutor`], one script in one transaction.

pub mod connection;
pub mod error;
pub mod executor;
pub mod tds;

pub use connection::{Connection, ConnectionFactory, IsolationLevel, Transaction, DEFAULT_PORT};
pub use error::{DbError, ScriptError};
pub use executor::QueryExecutor;
pub use tds::TdsConnectionFactory;
