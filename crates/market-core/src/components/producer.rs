//! Producer Model
//!
//! A producer sells electricity from a finite capacity. Every production
//! attempt either delivers or fails, and the outcome feeds its trust level.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use market_events::{FailureCause, ProductionStatus};

use crate::rng::RandomSource;
use crate::systems::trust::{
    trust_constants, CoefficientProvider, Coefficients, TrustFeedbackRule, TrustOutcome,
};

/// Constants for producer scoring and eligibility
pub mod producer_constants {
    /// Producers below this trust level are never selected
    pub const TRUST_GATE: f64 = 0.5;
    /// Added to `1 - trust_level` so a fully trusted producer keeps a non-zero score
    pub const SCORE_OFFSET: f64 = 0.001;
}

use producer_constants::*;

/// Kind of generation, informational only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnergyType {
    Wind,
    Solar,
    Hydro,
    Thermal,
    #[default]
    Other,
}

impl EnergyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyType::Wind => "wind",
            EnergyType::Solar => "solar",
            EnergyType::Hydro => "hydro",
            EnergyType::Thermal => "thermal",
            EnergyType::Other => "other",
        }
    }
}

/// What a production attempt needs from its surroundings
pub struct MarketEnv<'a> {
    pub rng: &'a mut dyn RandomSource,
    pub coefficients: &'a dyn CoefficientProvider,
}

impl<'a> MarketEnv<'a> {
    pub fn new(rng: &'a mut dyn RandomSource, coefficients: &'a dyn CoefficientProvider) -> Self {
        Self { rng, coefficients }
    }
}

/// Result of one production attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionReport {
    pub requested: f64,
    pub failure: Option<FailureCause>,
    /// Trust level after the feedback update
    pub trust_level: f64,
    /// Remaining capacity after the attempt
    pub capacity: f64,
}

impl ProductionReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn status(&self, producer_id: u64, name: &str) -> ProductionStatus {
        ProductionStatus {
            producer_id,
            name: name.to_string(),
            requested: self.requested,
            delivered: self.succeeded(),
            failure: self.failure,
            trust_level: self.trust_level,
            capacity: self.capacity,
        }
    }
}

/// An electricity producer
///
/// Trust level and capacity only change through [`Producer::produce`].
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    name: String,
    trust_level: f64,
    unit_cost: f64,
    capacity: f64,
    failure_prob: f64,
    alpha: f64,
    beta: f64,
    energy_type: EnergyType,
}

impl Producer {
    /// Creates a producer that never fails stochastically, with default
    /// learning rates. `trust_level` is clipped to `[0, 1]`.
    pub fn new(name: impl Into<String>, trust_level: f64, unit_cost: f64, capacity: f64) -> Self {
        Self {
            name: name.into(),
            trust_level: trust_level.clamp(trust_constants::MIN_TRUST, trust_constants::MAX_TRUST),
            unit_cost,
            capacity,
            failure_prob: 0.0,
            alpha: trust_constants::DEFAULT_ALPHA,
            beta: trust_constants::DEFAULT_BETA,
            energy_type: EnergyType::default(),
        }
    }

    pub fn with_failure_prob(mut self, failure_prob: f64) -> Self {
        self.failure_prob = failure_prob;
        self
    }

    pub fn with_energy_type(mut self, energy_type: EnergyType) -> Self {
        self.energy_type = energy_type;
        self
    }

    pub fn with_coefficients(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trust_level(&self) -> f64 {
        self.trust_level
    }

    pub fn unit_cost(&self) -> f64 {
        self.unit_cost
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn failure_prob(&self) -> f64 {
        self.failure_prob
    }

    pub fn energy_type(&self) -> EnergyType {
        self.energy_type
    }

    /// Configured learning rates
    pub fn coefficients(&self) -> Coefficients {
        Coefficients::new(self.alpha, self.beta)
    }

    /// Whether the producer passes the trust gate
    pub fn is_trusted(&self) -> bool {
        self.trust_level >= TRUST_GATE
    }

    /// Ranking value used during selection.
    ///
    /// Lower for more trusted producers; selection still takes the maximum.
    pub fn score(&self) -> f64 {
        self.unit_cost * (1.0 + SCORE_OFFSET - self.trust_level)
    }

    /// Attempts to deliver `amount` units.
    ///
    /// Delivery needs `0 <= amount <= capacity` and a failure trial that
    /// does not fire. The amount and capacity checks run first; when either
    /// fails no draw is taken. Either way the trust level is updated
    /// afterwards.
    pub fn produce(&mut self, amount: f64, env: &mut MarketEnv<'_>) -> ProductionReport {
        let failure = if amount.is_nan() || amount < 0.0 {
            Some(FailureCause::InvalidAmount)
        } else if amount > self.capacity {
            Some(FailureCause::InsufficientCapacity)
        } else if self.operation_failed(env.rng) {
            Some(FailureCause::OperationFailed)
        } else {
            None
        };

        let outcome = match failure {
            None => {
                self.capacity -= amount;
                TrustOutcome::Success
            }
            Some(_) => TrustOutcome::Failure,
        };
        debug_assert!(self.capacity >= 0.0, "capacity went negative: {}", self.capacity);

        let coefficients = env.coefficients.coefficients(self);
        self.trust_level = TrustFeedbackRule::update(self.trust_level, outcome, coefficients);

        tracing::debug!(
            producer = %self.name,
            trust_level = self.trust_level,
            capacity = self.capacity,
            delivered = failure.is_none(),
            "production status"
        );

        ProductionReport {
            requested: amount,
            failure,
            trust_level: self.trust_level,
            capacity: self.capacity,
        }
    }

    /// Bernoulli trial with probability `failure_prob`
    fn operation_failed(&self, rng: &mut dyn RandomSource) -> bool {
        rng.next_uniform() < self.failure_prob
    }
}
