//! Consumer Model
//!
//! A consumer buys a fixed amount of electricity per tick and chooses among
//! the producers it is shown.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use market_events::{CandidateScore, DecisionRecord};

use super::producer::{MarketEnv, ProductionReport, Producer};

/// An electricity consumer
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    pub name: String,
    /// Maximum spend for one decision
    pub budget: f64,
    /// Units demanded per tick
    pub usage: f64,
}

/// Which producer a decision settled on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selection {
    Producer(String),
    NoProducerAvailable,
}

impl Selection {
    pub fn producer(&self) -> Option<&str> {
        match self {
            Selection::Producer(name) => Some(name),
            Selection::NoProducerAvailable => None,
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::Producer(name) => write!(f, "{}", name),
            Selection::NoProducerAvailable => write!(f, "no producer available"),
        }
    }
}

/// How a single producer fared inside a decision
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Trust level below the gate; nothing was attempted
    BelowTrustGate,
    /// `usage * unit_cost` exceeded the budget; nothing was attempted
    OverBudget { cost: f64 },
    /// Production was attempted
    Produced(ProductionReport),
}

/// One producer's entry in a decision log
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    /// Index of the producer in the sequence handed to the decision
    pub position: usize,
    pub producer: String,
    pub outcome: AttemptOutcome,
    /// Present only for candidates
    pub score: Option<f64>,
}

impl Attempt {
    pub fn report(&self) -> Option<&ProductionReport> {
        match &self.outcome {
            AttemptOutcome::Produced(report) => Some(report),
            _ => None,
        }
    }
}

/// Result of [`Consumer::make_decision`]
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub selection: Selection,
    pub attempts: Vec<Attempt>,
    winner: Option<usize>,
}

impl Decision {
    pub fn chosen(&self) -> Option<&str> {
        self.selection.producer()
    }

    /// Position of the winning producer in the sequence handed to the
    /// decision. Names need not be unique; positions are.
    pub fn chosen_position(&self) -> Option<usize> {
        self.winner
    }

    /// Candidates in evaluation order
    pub fn candidates(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.attempts
            .iter()
            .filter_map(|a| a.score.map(|score| (a.producer.as_str(), score)))
    }

    pub fn to_record(&self, consumer_id: u64, consumer_name: &str) -> DecisionRecord {
        DecisionRecord {
            consumer_id,
            consumer_name: consumer_name.to_string(),
            chosen: self.chosen().map(str::to_string),
            candidates: self
                .candidates()
                .map(|(producer, score)| CandidateScore {
                    producer: producer.to_string(),
                    score,
                })
                .collect(),
        }
    }
}

impl Consumer {
    pub fn new(name: impl Into<String>, budget: f64, usage: f64) -> Self {
        Self {
            name: name.into(),
            budget,
            usage,
        }
    }

    /// Cost of this tick's usage at the given unit price
    pub fn calculate_cost(&self, unit_cost: f64) -> f64 {
        self.usage * unit_cost
    }

    /// Chooses a producer for this tick.
    ///
    /// Every trusted, affordable producer is asked to produce `usage`; those
    /// that deliver become candidates scored after their trust update. The
    /// highest score wins and the first one seen wins ties. Producers keep
    /// whatever capacity and trust changes their attempt caused, chosen or
    /// not.
    pub fn make_decision<'p, I>(&self, producers: I, env: &mut MarketEnv<'_>) -> Decision
    where
        I: IntoIterator<Item = &'p mut Producer>,
    {
        let mut attempts = Vec::new();

        for (position, producer) in producers.into_iter().enumerate() {
            let outcome = if !producer.is_trusted() {
                AttemptOutcome::BelowTrustGate
            } else {
                let cost = self.calculate_cost(producer.unit_cost());
                if cost <= self.budget {
                    AttemptOutcome::Produced(producer.produce(self.usage, env))
                } else {
                    AttemptOutcome::OverBudget { cost }
                }
            };

            let score = match &outcome {
                AttemptOutcome::Produced(report) if report.succeeded() => Some(producer.score()),
                _ => None,
            };

            attempts.push(Attempt {
                position,
                producer: producer.name().to_string(),
                outcome,
                score,
            });
        }

        let mut best: Option<&Attempt> = None;
        for attempt in &attempts {
            if let Some(score) = attempt.score {
                match best.and_then(|top| top.score) {
                    Some(top) if score <= top => {}
                    _ => best = Some(attempt),
                }
            }
        }

        let (selection, winner) = match best {
            Some(attempt) => (
                Selection::Producer(attempt.producer.clone()),
                Some(attempt.position),
            ),
            None => (Selection::NoProducerAvailable, None),
        };

        Decision {
            selection,
            attempts,
            winner,
        }
    }
}
