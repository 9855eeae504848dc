//! ECS Systems
//!
//! Per-tick market systems and the trust feedback rule they drive.

pub mod market;
pub mod trust;

// Re-export commonly used systems
pub use market::{
    handle_agents, write_events, LedgerEntry, MarketCoefficients, MarketLedger, MarketRandom,
};
pub use trust::{
    CoefficientProvider, Coefficients, StaticCoefficients, TrustFeedbackRule, TrustOutcome,
};
