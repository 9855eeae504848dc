//! Energy market simulation core: producers, consumers, trust feedback and
//! the tick coordinator that drives them.

pub mod components;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod rng;
pub mod schedule;
pub mod setup;
pub mod systems;

pub use components::*;
pub use config::{MarketConfig, DEFAULT_CONFIG_PATH};
pub use context::{AgentContext, ContextError};
pub use coordinator::{CoordinatorError, CoordinatorState, TickCoordinator, TickSettings};
pub use error::MarketError;
pub use events::{EventLogger, RunInfo};
pub use rng::{FixedSource, RandomSource, ScriptedSource, SimRng};
pub use schedule::{ScheduleError, ScheduleRunner, StepOutcome, TickClock};
pub use setup::{build_coordinator, populate, PopulationSummary};
pub use systems::{CoefficientProvider, Coefficients, StaticCoefficients, TrustFeedbackRule, TrustOutcome};

pub use market_events::{FailureCause, RunSummary};
