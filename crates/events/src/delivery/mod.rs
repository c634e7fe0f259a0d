//! External delivery channels for run reports.

pub mod log;
pub mod slack;
pub mod sns;
