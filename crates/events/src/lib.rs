//! Run reporting and notification delivery.
//!
//! - [`Reporter`]: builds the single per-run notification and publishes it.
//! - [`Notifier`]: the delivery seam.
//! - [`delivery`]: SNS, Slack webhook and log-only channels.

pub mod delivery;
pub mod notifier;
pub mod reporter;

pub use delivery::log::LogNotifier;
pub use delivery::slack::SlackNotifier;
pub use delivery::sns::SnsNotifier;
pub use notifier::{Notification, Notifier, NotifyError};
pub use reporter::{Reporter, DEFAULT_SUBJECT};
