//! Trust Feedback
//!
//! The rule that moves a producer's trust level after every production
//! attempt, and the provider that supplies its learning rates.

use serde::{Deserialize, Serialize};

use crate::components::producer::Producer;

/// Constants for trust adaptation
pub mod trust_constants {
    /// Default growth rate applied on a successful delivery
    pub const DEFAULT_ALPHA: f64 = 0.01;
    /// Default decay rate applied on a failed delivery
    pub const DEFAULT_BETA: f64 = 0.08;
    /// Lowest reachable trust level
    pub const MIN_TRUST: f64 = 0.0;
    /// Highest reachable trust level
    pub const MAX_TRUST: f64 = 1.0;
}

use trust_constants::*;

/// Result of a production attempt as seen by the trust rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustOutcome {
    Success,
    Failure,
}

/// Learning rates for one trust update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    /// Growth rate on success
    pub alpha: f64,
    /// Decay rate on failure
    pub beta: f64,
}

impl Coefficients {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Trust is meant to be lost faster than it is gained.
    pub fn decays_faster_than_grows(&self) -> bool {
        self.beta > self.alpha
    }
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA, DEFAULT_BETA)
    }
}

/// Multiplicative trust update with hard clipping to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustFeedbackRule;

impl TrustFeedbackRule {
    /// Returns the trust level after one outcome.
    ///
    /// Failure scales trust by `1 - beta`, success by `1 + alpha`. The rule
    /// only looks at the current level.
    pub fn update(trust_level: f64, outcome: TrustOutcome, coefficients: Coefficients) -> f64 {
        let updated = match outcome {
            TrustOutcome::Failure => (trust_level * (1.0 - coefficients.beta)).max(MIN_TRUST),
            TrustOutcome::Success => (trust_level * (1.0 + coefficients.alpha)).min(MAX_TRUST),
        };
        debug_assert!(
            (MIN_TRUST..=MAX_TRUST).contains(&updated),
            "trust level {} escaped [0, 1]",
            updated
        );
        updated
    }
}

/// Supplies the learning rates used when a producer's trust is updated.
///
/// A seasonality-driven provider (energy type availability, payment
/// history) can replace the static one without touching the producer.
pub trait CoefficientProvider {
    fn coefficients(&self, producer: &Producer) -> Coefficients;
}

/// Uses the rates configured on each producer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCoefficients;

impl CoefficientProvider for StaticCoefficients {
    fn coefficients(&self, producer: &Producer) -> Coefficients {
        producer.coefficients()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_success_grows_by_alpha() {
        let updated = TrustFeedbackRule::update(0.8, TrustOutcome::Success, Coefficients::default());
        assert!((updated - 0.808).abs() < 1e-12);
    }

    #[test]
    fn test_failure_decays_by_beta() {
        let updated = TrustFeedbackRule::update(0.8, TrustOutcome::Failure, Coefficients::default());
        assert!((updated - 0.736).abs() < 1e-12);
    }

    #[test]
    fn test_success_clips_at_one() {
        let updated = TrustFeedbackRule::update(0.995, TrustOutcome::Success, Coefficients::default());
        assert_eq!(updated, 1.0);
        assert_eq!(TrustFeedbackRule::update(1.0, TrustOutcome::Success, Coefficients::default()), 1.0);
    }

    #[test]
    fn test_failure_clips_at_zero() {
        let harsh = Coefficients::new(0.01, 1.5);
        assert_eq!(TrustFeedbackRule::update(0.4, TrustOutcome::Failure, harsh), 0.0);
        assert_eq!(TrustFeedbackRule::update(0.0, TrustOutcome::Failure, Coefficients::default()), 0.0);
    }

    #[test]
    fn test_default_coefficients_intent() {
        assert!(Coefficients::default().decays_faster_than_grows());
        assert!(!Coefficients::new(0.1, 0.05).decays_faster_than_grows());
    }

    #[test]
    fn test_static_provider_reads_producer() {
        let producer = Producer::new("Solar", 0.75, 6.0, 600.0).with_coefficients(0.02, 0.1);
        assert_eq!(
            StaticCoefficients.coefficients(&producer),
            Coefficients::new(0.02, 0.1)
        );
    }

    proptest! {
        #[test]
        fn trust_stays_bounded(
            start in 0.0f64..=1.0,
            alpha in 0.0001f64..2.0,
            beta in 0.0001f64..2.0,
            outcomes in proptest::collection::vec(any::<bool>(), 0..200),
        ) {
            let coefficients = Coefficients::new(alpha, beta);
            let mut trust = start;
            for success in outcomes {
                let outcome = if success { TrustOutcome::Success } else { TrustOutcome::Failure };
                trust = TrustFeedbackRule::update(trust, outcome, coefficients);
                prop_assert!((0.0..=1.0).contains(&trust));
            }
        }

        #[test]
        fn trust_moves_in_outcome_direction(
            start in 0.01f64..0.99,
            alpha in 0.001f64..0.5,
            beta in 0.001f64..0.99,
        ) {
            let coefficients = Coefficients::new(alpha, beta);
            let up = TrustFeedbackRule::update(start, TrustOutcome::Success, coefficients);
            let down = TrustFeedbackRule::update(start, TrustOutcome::Failure, coefficients);
            prop_assert!(up > start);
            prop_assert!(down < start);
        }
    }
}
