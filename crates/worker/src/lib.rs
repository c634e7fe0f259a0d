//! Concurrent maintenance runs across SQL Server fleets.
//!
//! The fan-out is three levels deep. [`Orchestrator`] spawns one
//! [`InstanceRunner`] per instance, each of those spawns one
//! [`DatabaseRunner`] per discovered database, and each database runner
//! spawns one task per maintenance script. Every level settles: all
//! children are awaited and their outcomes collected, regardless of how
//! their siblings ended.

pub mod config;
pub mod context;
pub mod database;
pub mod instance;
pub mod job;
pub mod orchestrator;
pub mod settle;

pub use config::{NotifierConfig, WorkerConfig};
pub use context::RunContext;
pub use database::DatabaseRunner;
pub use instance::InstanceRunner;
pub use job::SweepJob;
pub use orchestrator::Orchestrator;
pub use settle::TaskSet;
