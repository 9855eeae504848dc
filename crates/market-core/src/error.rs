//! Top-level error type.

use crate::config::ConfigError;
use crate::context::ContextError;
use crate::coordinator::CoordinatorError;
use crate::schedule::ScheduleError;

/// Any fault that stops the market from starting or running
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("agent registration error: {0}")]
    Context(#[from] ContextError),
    #[error("coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),
    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
