//! Population Setup
//!
//! Registers the configured agents in a context and wires up a coordinator.

use std::collections::BTreeMap;

use crate::components::{AgentUid, Consumer, Producer};
use crate::config::{ConsumerSpec, MarketConfig, ProducerSpec};
use crate::context::AgentContext;
use crate::coordinator::TickCoordinator;
use crate::error::MarketError;

/// Summary of registered agents
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopulationSummary {
    pub consumers: usize,
    pub producers: usize,
    /// Agent count per rank
    pub by_rank: BTreeMap<u32, usize>,
}

impl PopulationSummary {
    pub fn total_agents(&self) -> usize {
        self.consumers + self.producers
    }
}

impl std::fmt::Display for PopulationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total agents: {}", self.total_agents())?;
        writeln!(f, "  Consumers: {}", self.consumers)?;
        writeln!(f, "  Producers: {}", self.producers)?;
        for (rank, count) in &self.by_rank {
            writeln!(f, "  Rank {}: {}", rank, count)?;
        }
        Ok(())
    }
}

impl ConsumerSpec {
    pub fn uid(&self) -> AgentUid {
        AgentUid::consumer(self.id, self.rank)
    }

    pub fn to_consumer(&self) -> Consumer {
        Consumer::new(self.name.clone(), self.budget, self.usage)
    }
}

impl ProducerSpec {
    pub fn uid(&self) -> AgentUid {
        AgentUid::producer(self.id, self.rank)
    }

    pub fn to_producer(&self) -> Producer {
        Producer::new(self.name.clone(), self.trust_level, self.unit_cost, self.capacity)
            .with_failure_prob(self.failure_prob)
            .with_energy_type(self.energy_type)
            .with_coefficients(self.alpha, self.beta)
    }
}

/// Registers every configured agent, consumers first.
///
/// The configuration is validated before anything is registered.
pub fn populate(context: &mut AgentContext, config: &MarketConfig) -> Result<PopulationSummary, MarketError> {
    config.validate()?;

    let mut summary = PopulationSummary::default();

    for spec in &config.consumers {
        context.add_consumer(spec.uid(), spec.to_consumer())?;
        summary.consumers += 1;
        *summary.by_rank.entry(spec.rank).or_insert(0) += 1;
    }

    for spec in &config.producers {
        context.add_producer(spec.uid(), spec.to_producer())?;
        summary.producers += 1;
        *summary.by_rank.entry(spec.rank).or_insert(0) += 1;
    }

    tracing::info!(
        consumers = summary.consumers,
        producers = summary.producers,
        "population registered"
    );

    Ok(summary)
}

/// Builds a ready-to-run coordinator from a configuration.
pub fn build_coordinator(config: &MarketConfig) -> Result<(TickCoordinator, PopulationSummary), MarketError> {
    let mut context = AgentContext::new();
    let summary = populate(&mut context, config)?;
    let coordinator = TickCoordinator::new(
        context,
        config.simulation.tick_settings(),
        config.simulation.seed,
    )?;
    Ok((coordinator, summary))
}
