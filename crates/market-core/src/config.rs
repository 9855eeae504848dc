//! Configuration System
//!
//! Loads the simulation clock and the agent population from a TOML file.
//! Everything is validated before the first tick runs.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::components::EnergyType;
use crate::coordinator::TickSettings;
use crate::systems::trust::trust_constants::{DEFAULT_ALPHA, DEFAULT_BETA};

/// Default config file path
pub const DEFAULT_CONFIG_PATH: &str = "market.toml";

/// Complete market configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Clock and seed
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Consumer population; the reference population when omitted
    #[serde(default = "reference_consumers")]
    pub consumers: Vec<ConsumerSpec>,
    /// Producer population; the reference population when omitted
    #[serde(default = "reference_producers")]
    pub producers: Vec<ProducerSpec>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            consumers: reference_consumers(),
            producers: reference_producers(),
        }
    }
}

/// Simulation clock parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the failure-trial random source
    pub seed: u64,
    /// First tick on which consumers decide
    pub start_tick: u64,
    /// Ticks between decision rounds
    pub interval: u64,
    /// Last tick executed
    pub stop_tick: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let ticks = TickSettings::default();
        Self {
            seed: 42,
            start_tick: ticks.start_tick,
            interval: ticks.interval,
            stop_tick: ticks.stop_tick,
        }
    }
}

impl SimulationConfig {
    pub fn tick_settings(&self) -> TickSettings {
        TickSettings {
            start_tick: self.start_tick,
            interval: self.interval,
            stop_tick: self.stop_tick,
        }
    }
}

/// Construction parameters for one consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerSpec {
    pub id: u64,
    #[serde(default)]
    pub rank: u32,
    pub name: String,
    pub budget: f64,
    #[serde(default)]
    pub usage: f64,
}

/// Construction parameters for one producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerSpec {
    pub id: u64,
    #[serde(default)]
    pub rank: u32,
    pub name: String,
    pub trust_level: f64,
    pub unit_cost: f64,
    #[serde(default)]
    pub capacity: f64,
    #[serde(default)]
    pub energy_type: EnergyType,
    #[serde(default)]
    pub failure_prob: f64,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_beta")]
    pub beta: f64,
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_beta() -> f64 {
    DEFAULT_BETA
}

/// One household buying 9 units per tick on rank 0
pub fn reference_consumers() -> Vec<ConsumerSpec> {
    vec![ConsumerSpec {
        id: 123,
        rank: 0,
        name: "Genivaldo".to_string(),
        budget: 5000.0,
        usage: 9.0,
    }]
}

/// Wind, solar and hydro plants on rank 1
pub fn reference_producers() -> Vec<ProducerSpec> {
    let plant = |id, name: &str, trust_level, unit_cost, capacity, energy_type, failure_prob| ProducerSpec {
        id,
        rank: 1,
        name: name.to_string(),
        trust_level,
        unit_cost,
        capacity,
        energy_type,
        failure_prob,
        alpha: DEFAULT_ALPHA,
        beta: DEFAULT_BETA,
    };
    vec![
        plant(111, "Eólica", 0.8, 12.0, 1200.0, EnergyType::Wind, 0.2),
        plant(222, "Solar", 0.75, 6.0, 600.0, EnergyType::Solar, 0.15),
        plant(333, "Hidroelétrica", 0.9, 17.0, 1700.0, EnergyType::Hydro, 0.1),
    ]
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("{kind} '{name}': {problem}")]
    InvalidAgent {
        kind: &'static str,
        name: String,
        problem: String,
    },
    #[error("duplicate {kind} id {id} on rank {rank}")]
    DuplicateId { kind: &'static str, id: u64, rank: u32 },
    #[error("invalid simulation settings: {0}")]
    InvalidSimulation(String),
    #[error("population has no consumers")]
    NoConsumers,
}

impl MarketConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects configurations that cannot start a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.start_tick == 0 {
            return Err(ConfigError::InvalidSimulation(
                "start_tick must be at least 1".to_string(),
            ));
        }
        if sim.interval == 0 {
            return Err(ConfigError::InvalidSimulation(
                "interval must be at least 1".to_string(),
            ));
        }
        if sim.stop_tick < sim.start_tick {
            return Err(ConfigError::InvalidSimulation(format!(
                "stop_tick {} is before start_tick {}",
                sim.stop_tick, sim.start_tick
            )));
        }

        if self.consumers.is_empty() {
            return Err(ConfigError::NoConsumers);
        }

        let mut seen = HashSet::new();
        for consumer in &self.consumers {
            consumer.validate()?;
            if !seen.insert((consumer.id, consumer.rank)) {
                return Err(ConfigError::DuplicateId {
                    kind: "consumer",
                    id: consumer.id,
                    rank: consumer.rank,
                });
            }
        }

        let mut seen = HashSet::new();
        for producer in &self.producers {
            producer.validate()?;
            if !seen.insert((producer.id, producer.rank)) {
                return Err(ConfigError::DuplicateId {
                    kind: "producer",
                    id: producer.id,
                    rank: producer.rank,
                });
            }
            if producer.beta <= producer.alpha {
                tracing::warn!(
                    producer = %producer.name,
                    alpha = producer.alpha,
                    beta = producer.beta,
                    "trust grows at least as fast as it decays"
                );
            }
        }

        if self.producers.is_empty() {
            tracing::warn!("population has no producers; every decision will go unserved");
        }

        Ok(())
    }
}

fn invalid(kind: &'static str, name: &str, problem: impl Into<String>) -> ConfigError {
    ConfigError::InvalidAgent {
        kind,
        name: name.to_string(),
        problem: problem.into(),
    }
}

impl ConsumerSpec {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(invalid("consumer", &self.name, "name is empty"));
        }
        if !self.budget.is_finite() {
            return Err(invalid("consumer", &self.name, "budget must be finite"));
        }
        if !self.usage.is_finite() || self.usage < 0.0 {
            return Err(invalid("consumer", &self.name, "usage must be a non-negative number"));
        }
        Ok(())
    }
}

impl ProducerSpec {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(invalid("producer", &self.name, "name is empty"));
        }
        if !(0.0..=1.0).contains(&self.trust_level) {
            return Err(invalid("producer", &self.name, "trust_level must be within [0, 1]"));
        }
        if !self.unit_cost.is_finite() || self.unit_cost <= 0.0 {
            return Err(invalid("producer", &self.name, "unit_cost must be positive"));
        }
        if !self.capacity.is_finite() || self.capacity < 0.0 {
            return Err(invalid("producer", &self.name, "capacity must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.failure_prob) {
            return Err(invalid("producer", &self.name, "failure_prob must be within [0, 1]"));
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 || !self.beta.is_finite() || self.beta <= 0.0 {
            return Err(invalid("producer", &self.name, "alpha and beta must be positive"));
        }
        Ok(())
    }
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Energy Market Configuration

[simulation]
seed = 42
start_tick = 1
interval = 1
stop_tick = 20

[[consumers]]
id = 123
rank = 0
name = "Genivaldo"
budget = 5000.0
usage = 9.0

[[producers]]
id = 111
rank = 1
name = "Eólica"
trust_level = 0.8
unit_cost = 12.0
capacity = 1200.0
energy_type = "wind"
failure_prob = 0.2

[[producers]]
id = 222
rank = 1
name = "Solar"
trust_level = 0.75
unit_cost = 6.0
capacity = 600.0
energy_type = "solar"
failure_prob = 0.15

[[producers]]
id = 333
rank = 1
name = "Hidroelétrica"
trust_level = 0.9
unit_cost = 17.0
capacity = 1700.0
energy_type = "hydro"
failure_prob = 0.1
"#
    .to_string()
}
