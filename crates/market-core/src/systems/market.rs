//! Market System
//!
//! Runs every consumer's decision against the visible producers once per
//! scheduled tick, then hands the resulting events to the logger.

use bevy_ecs::prelude::*;

use market_events::EventPayload;

use crate::components::{AgentUid, Consumer, LocalOrder, MarketEnv, Producer, Selection};
use crate::events::{EventLogger, PendingEvents, RunInfo};
use crate::rng::RandomSource;
use crate::schedule::TickClock;
use crate::systems::trust::CoefficientProvider;

/// Random source used for production failure trials
#[derive(Resource)]
pub struct MarketRandom(pub Box<dyn RandomSource + Send + Sync>);

/// Learning-rate provider used for trust updates
#[derive(Resource)]
pub struct MarketCoefficients(pub Box<dyn CoefficientProvider + Send + Sync>);

/// One consumer decision
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub tick: u64,
    pub consumer: AgentUid,
    pub selection: Selection,
    /// Identity of the chosen producer
    pub producer: Option<AgentUid>,
}

/// Every decision taken during the run, in execution order
#[derive(Resource, Debug, Default)]
pub struct MarketLedger {
    entries: Vec<LedgerEntry>,
}

impl MarketLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tick: u64, consumer: AgentUid, selection: Selection, producer: Option<AgentUid>) {
        self.entries.push(LedgerEntry {
            tick,
            consumer,
            selection,
            producer,
        });
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn decisions(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Decisions that ended without a producer
    pub fn unserved(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.selection == Selection::NoProducerAvailable)
            .count() as u64
    }

    pub fn times_chosen(&self, producer: &AgentUid) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.producer.as_ref() == Some(producer))
            .count() as u64
    }

    /// Selections made at `tick`
    pub fn at_tick(&self, tick: u64) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(move |e| e.tick == tick)
    }
}

/// System: every consumer decides against every visible producer
///
/// Consumers and producers are visited in registration order so a run is
/// reproducible from its random draws.
pub fn handle_agents(
    clock: Res<TickClock>,
    mut random: ResMut<MarketRandom>,
    coefficients: Res<MarketCoefficients>,
    mut ledger: ResMut<MarketLedger>,
    mut pending: ResMut<PendingEvents>,
    consumers: Query<(&AgentUid, &LocalOrder, &Consumer)>,
    mut producers: Query<(&AgentUid, &LocalOrder, &mut Producer)>,
) {
    let tick = clock.tick;

    let mut buyers: Vec<_> = consumers.iter().collect();
    buyers.sort_by_key(|(_, order, _)| **order);

    let mut visible: Vec<_> = producers.iter_mut().collect();
    visible.sort_by_key(|(_, order, _)| **order);
    let producer_uids: Vec<AgentUid> = visible.iter().map(|(uid, _, _)| **uid).collect();

    let mut env = MarketEnv::new(&mut *random.0, &*coefficients.0);

    for (uid, _, consumer) in &buyers {
        let decision = consumer.make_decision(
            visible.iter_mut().map(|(_, _, producer)| &mut **producer),
            &mut env,
        );

        for attempt in &decision.attempts {
            if let Some(report) = attempt.report() {
                let status = report.status(producer_uids[attempt.position].id, &attempt.producer);
                pending.push(tick, EventPayload::Production(status));
            }
        }

        tracing::info!(
            tick,
            consumer = %consumer.name,
            chosen = %decision.selection,
            candidates = decision.candidates().count(),
            "decision"
        );

        pending.push(tick, EventPayload::Decision(decision.to_record(uid.id, &consumer.name)));
        let chosen = decision.chosen_position().map(|position| producer_uids[position]);
        ledger.record(tick, **uid, decision.selection, chosen);
    }
}

/// System: write pending events to the event log
pub fn write_events(
    run: Res<RunInfo>,
    mut pending: ResMut<PendingEvents>,
    mut logger: ResMut<EventLogger>,
) {
    for (tick, payload) in pending.drain() {
        if let Err(e) = logger.record(&run, tick, payload) {
            tracing::warn!("Could not log event at tick {}: {}", tick, e);
        }
    }
}
