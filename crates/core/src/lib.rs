//! Domain types shared by every sqlsweep crate.
//!
//! Nothing here performs I/O beyond reading the script catalog from disk.

pub mod catalog;
pub mod databases;
pub mod error;
pub mod instance;
pub mod outcome;
pub mod report;

pub use catalog::{QueryCatalog, ScriptDefinition};
pub use error::CoreError;
pub use instance::{Credentials, Instance};
pub use outcome::{ErrorKind, ExecutionOutcome, OutcomeStatus};
pub use report::{AggregatedReport, ReportStatus};
