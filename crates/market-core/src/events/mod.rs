//! Market event logging.

pub mod logger;

pub use logger::{EventLogger, PendingEvents, RunInfo};
