//! End-of-run summary types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Producer state at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerSnapshot {
    pub id: u64,
    pub name: String,
    pub rank: u32,
    pub energy_type: String,
    pub unit_cost: f64,
    pub trust_level: f64,
    pub capacity: f64,
    /// Ticks on which a consumer chose this producer
    pub times_chosen: u64,
}

/// Aggregate result of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub seed: u64,
    /// Ticks on which at least one decision ran
    pub decision_ticks: u64,
    pub last_tick: u64,
    pub decisions: u64,
    /// Decisions that ended without any producer
    pub unserved: u64,
    pub producers: Vec<ProducerSnapshot>,
}

impl RunSummary {
    /// Decisions that ended with a chosen producer.
    pub fn purchases(&self) -> u64 {
        self.decisions - self.unserved
    }

    /// Fraction of decisions that found a producer.
    pub fn service_rate(&self) -> f64 {
        if self.decisions == 0 {
            return 0.0;
        }
        self.purchases() as f64 / self.decisions as f64
    }

    pub fn producer(&self, name: &str) -> Option<&ProducerSnapshot> {
        self.producers.iter().find(|p| p.name == name)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
