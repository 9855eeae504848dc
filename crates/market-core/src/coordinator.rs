//! Tick Coordinator
//!
//! Owns the agent context and the schedule runner and moves through
//! `Initialized -> Running -> Stopped`. Each executed tick runs every
//! consumer's decision; nothing runs once stopped.

use std::collections::{BTreeSet, HashMap};

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use market_events::{ProducerSnapshot, RunSummary};

use crate::components::AgentUid;
use crate::context::AgentContext;
use crate::events::{EventLogger, PendingEvents, RunInfo};
use crate::rng::{RandomSource, SimRng};
use crate::schedule::{ScheduleError, ScheduleRunner, StepOutcome, TickClock};
use crate::systems::market::{handle_agents, write_events, MarketCoefficients, MarketLedger, MarketRandom};
use crate::systems::trust::{CoefficientProvider, StaticCoefficients};

/// Lifecycle of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    #[default]
    Initialized,
    Running,
    Stopped,
}

/// When decisions run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSettings {
    /// First tick on which decisions run
    pub start_tick: u64,
    /// Ticks between decision rounds
    pub interval: u64,
    /// Last tick executed
    pub stop_tick: u64,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            start_tick: 1,
            interval: 1,
            stop_tick: 20,
        }
    }
}

/// Errors raised by the coordinator itself
///
/// Decision outcomes never show up here.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("coordinator already stopped at tick {0}")]
    Stopped(u64),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Drives the market clock over a fixed population
pub struct TickCoordinator {
    context: AgentContext,
    runner: ScheduleRunner,
    state: CoordinatorState,
    settings: TickSettings,
    run: RunInfo,
}

impl TickCoordinator {
    /// Builds a coordinator whose failure trials draw from a `SmallRng`
    /// seeded with `seed`.
    pub fn new(mut context: AgentContext, settings: TickSettings, seed: u64) -> Result<Self, CoordinatorError> {
        let run = RunInfo {
            run_id: Uuid::new_v4(),
            seed,
        };

        let world = context.world_mut();
        world.insert_resource(run);
        world.insert_resource(TickClock::default());
        world.insert_resource(MarketRandom(Box::new(SimRng::from_seed(seed))));
        world.insert_resource(MarketCoefficients(Box::new(StaticCoefficients)));
        world.insert_resource(MarketLedger::new());
        world.insert_resource(PendingEvents::new());
        world.insert_resource(EventLogger::null());

        let mut decisions = Schedule::default();
        decisions.add_systems((handle_agents, write_events).chain());

        let mut runner = ScheduleRunner::new();
        runner.schedule_repeating_event(settings.start_tick, settings.interval, decisions)?;
        runner.schedule_stop(settings.stop_tick);

        Ok(Self {
            context,
            runner,
            state: CoordinatorState::Initialized,
            settings,
            run,
        })
    }

    /// Replaces the random source used for failure trials
    pub fn with_random_source(mut self, source: impl RandomSource + Send + Sync + 'static) -> Self {
        self.world_mut().insert_resource(MarketRandom(Box::new(source)));
        self
    }

    /// Replaces the learning-rate provider used for trust updates
    pub fn with_coefficients(mut self, provider: impl CoefficientProvider + Send + Sync + 'static) -> Self {
        self.world_mut().insert_resource(MarketCoefficients(Box::new(provider)));
        self
    }

    /// Sends market events to `logger` instead of discarding them
    pub fn with_event_logger(mut self, logger: EventLogger) -> Self {
        self.world_mut().insert_resource(logger);
        self
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn settings(&self) -> TickSettings {
        self.settings
    }

    pub fn current_tick(&self) -> u64 {
        self.runner.tick()
    }

    pub fn run_id(&self) -> Uuid {
        self.run.run_id
    }

    pub fn context(&self) -> &AgentContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut AgentContext {
        &mut self.context
    }

    pub fn ledger(&self) -> &MarketLedger {
        self.context.world().resource::<MarketLedger>()
    }

    /// Executes one tick.
    pub fn step(&mut self) -> Result<StepOutcome, CoordinatorError> {
        if self.state == CoordinatorState::Stopped {
            return Err(CoordinatorError::Stopped(self.runner.tick()));
        }

        let outcome = self.runner.step(self.context.world_mut());
        match outcome {
            StepOutcome::Ran { tick, fired } => {
                if self.state == CoordinatorState::Initialized {
                    tracing::info!(tick, "market running");
                    self.state = CoordinatorState::Running;
                }
                tracing::debug!(tick, fired, "tick executed");
            }
            StepOutcome::Stopped => {}
        }

        if self.runner.is_stopped() {
            self.stop();
        }
        Ok(outcome)
    }

    /// Executes ticks until the stop tick and returns the run summary.
    pub fn run(&mut self) -> Result<RunSummary, CoordinatorError> {
        if self.state == CoordinatorState::Stopped {
            return Err(CoordinatorError::Stopped(self.runner.tick()));
        }

        while self.state != CoordinatorState::Stopped {
            self.step()?;
        }
        Ok(self.summary())
    }

    /// Snapshot of the run so far
    pub fn summary(&mut self) -> RunSummary {
        let (decisions, unserved, decision_ticks, chosen) = {
            let ledger = self.ledger();
            let ticks: BTreeSet<u64> = ledger.entries().iter().map(|e| e.tick).collect();
            let mut chosen: HashMap<AgentUid, u64> = HashMap::new();
            for uid in ledger.entries().iter().filter_map(|e| e.producer) {
                *chosen.entry(uid).or_default() += 1;
            }
            (ledger.decisions(), ledger.unserved(), ticks.len() as u64, chosen)
        };

        let producers = self
            .context
            .producers()
            .into_iter()
            .map(|(uid, producer)| ProducerSnapshot {
                id: uid.id,
                name: producer.name().to_string(),
                rank: uid.rank,
                energy_type: producer.energy_type().as_str().to_string(),
                unit_cost: producer.unit_cost(),
                trust_level: producer.trust_level(),
                capacity: producer.capacity(),
                times_chosen: chosen.get(&uid).copied().unwrap_or(0),
            })
            .collect();

        RunSummary {
            run_id: self.run.run_id,
            seed: self.run.seed,
            decision_ticks,
            last_tick: self.runner.tick(),
            decisions,
            unserved,
            producers,
        }
    }

    fn stop(&mut self) {
        if self.state != CoordinatorState::Stopped {
            self.state = CoordinatorState::Stopped;
            if let Err(e) = self.world_mut().resource_mut::<EventLogger>().flush() {
                tracing::warn!("Could not flush event log: {}", e);
            }
            tracing::info!(tick = self.runner.tick(), "market stopped");
        }
    }

    fn world_mut(&mut self) -> &mut World {
        self.context.world_mut()
    }
}
