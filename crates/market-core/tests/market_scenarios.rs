//! End-to-end market runs over the configured population.

use market_core::config::{ConsumerSpec, ProducerSpec};
use market_core::{
    build_coordinator, AgentType, CoordinatorState, EnergyType, EventLogger, FixedSource,
    MarketConfig, ScriptedSource, Selection,
};
use market_events::{EventPayload, EventType, MarketEvent};
use std::io::BufRead;

/// Reference population with every failure probability zeroed
fn reliable_config() -> MarketConfig {
    let mut config = MarketConfig::default();
    for producer in &mut config.producers {
        producer.failure_prob = 0.0;
    }
    config
}

fn producer_spec(id: u64, name: &str, trust_level: f64, unit_cost: f64, capacity: f64) -> ProducerSpec {
    ProducerSpec {
        id,
        rank: 1,
        name: name.to_string(),
        trust_level,
        unit_cost,
        capacity,
        energy_type: EnergyType::Other,
        failure_prob: 0.0,
        alpha: 0.01,
        beta: 0.08,
    }
}

#[test]
fn test_first_tick_picks_eolica() {
    let config = MarketConfig {
        simulation: market_core::config::SimulationConfig {
            stop_tick: 1,
            ..Default::default()
        },
        ..reliable_config()
    };
    let (coordinator, _) = build_coordinator(&config).unwrap();
    let mut coordinator = coordinator.with_random_source(FixedSource::never_fail());

    coordinator.run().unwrap();

    let entries = coordinator.ledger().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].selection, Selection::Producer("Eólica".to_string()));
}

#[test]
fn test_twenty_reliable_ticks() {
    let (coordinator, _) = build_coordinator(&reliable_config()).unwrap();
    let mut coordinator = coordinator.with_random_source(FixedSource::never_fail());

    let mut previous: Vec<(String, f64, f64)> = coordinator
        .context_mut()
        .producers()
        .into_iter()
        .map(|(_, p)| (p.name().to_string(), p.trust_level(), p.capacity()))
        .collect();

    while coordinator.state() != CoordinatorState::Stopped {
        coordinator.step().unwrap();
        let tick = coordinator.current_tick();
        let chosen = coordinator
            .ledger()
            .at_tick(tick)
            .next()
            .and_then(|e| e.selection.producer().map(str::to_string))
            .expect("a producer is chosen every tick");

        let current: Vec<(String, f64, f64)> = coordinator
            .context_mut()
            .producers()
            .into_iter()
            .map(|(_, p)| (p.name().to_string(), p.trust_level(), p.capacity()))
            .collect();

        for ((name, old_trust, old_capacity), (_, trust, capacity)) in previous.iter().zip(&current) {
            // Every affordable, trusted producer delivers the full usage
            assert_eq!(*capacity, old_capacity - 9.0, "{} at tick {}", name, tick);
            if *name == chosen {
                assert!(*trust > *old_trust || *trust == 1.0);
            }
            assert!(*trust <= 1.0);
        }
        previous = current;
    }

    let summary = coordinator.summary();
    assert_eq!(summary.decisions, 20);
    assert_eq!(summary.unserved, 0);
    // Lower trust scores higher, so Solar overtakes Eólica as Eólica's trust climbs
    assert_eq!(summary.producer("Eólica").unwrap().times_chosen, 16);
    assert_eq!(summary.producer("Solar").unwrap().times_chosen, 4);
    assert_eq!(summary.producer("Hidroelétrica").unwrap().times_chosen, 0);
    assert_eq!(summary.producer("Hidroelétrica").unwrap().trust_level, 1.0);
    assert_eq!(summary.producer("Solar").unwrap().capacity, 600.0 - 20.0 * 9.0);
}

#[test]
fn test_untrusted_producer_never_chosen() {
    let config = MarketConfig {
        producers: vec![
            producer_spec(1, "bargain", 0.45, 100.0, 10_000.0),
            producer_spec(2, "utility", 0.9, 2.0, 10_000.0),
        ],
        ..reliable_config()
    };
    let (coordinator, _) = build_coordinator(&config).unwrap();
    let mut coordinator = coordinator.with_random_source(FixedSource::never_fail());

    let summary = coordinator.run().unwrap();

    assert_eq!(summary.producer("bargain").unwrap().times_chosen, 0);
    assert_eq!(summary.producer("bargain").unwrap().capacity, 10_000.0);
    assert_eq!(summary.producer("utility").unwrap().times_chosen, 20);
}

#[test]
fn test_over_budget_producer_never_chosen() {
    let config = MarketConfig {
        consumers: vec![ConsumerSpec {
            id: 7,
            rank: 0,
            name: "frugal".to_string(),
            budget: 100.0,
            usage: 10.0,
        }],
        producers: vec![
            producer_spec(1, "premium", 0.6, 10.5, 10_000.0),
            producer_spec(2, "basic", 0.99, 10.0, 10_000.0),
        ],
        ..reliable_config()
    };
    let (coordinator, _) = build_coordinator(&config).unwrap();
    let mut coordinator = coordinator.with_random_source(FixedSource::never_fail());

    let summary = coordinator.run().unwrap();

    assert_eq!(summary.producer("premium").unwrap().times_chosen, 0);
    assert_eq!(summary.producer("basic").unwrap().times_chosen, 20);
}

#[test]
fn test_shared_name_purchases_not_double_counted() {
    let mut upstream = producer_spec(3, "Solar", 0.75, 6.0, 600.0);
    upstream.rank = 2;
    let config = MarketConfig {
        producers: vec![producer_spec(2, "Solar", 0.75, 6.0, 600.0), upstream],
        ..reliable_config()
    };
    let (coordinator, _) = build_coordinator(&config).unwrap();
    let mut coordinator = coordinator.with_random_source(FixedSource::never_fail());

    let summary = coordinator.run().unwrap();

    let credited: u64 = summary.producers.iter().map(|p| p.times_chosen).sum();
    assert_eq!(credited, summary.decisions);
    assert_eq!(summary.producers[0].times_chosen, 20);
    assert_eq!(summary.producers[1].times_chosen, 0);
    let first = coordinator.ledger().entries()[0].producer;
    assert_eq!(first, Some(market_core::AgentUid::producer(2, 1)));
}

#[test]
fn test_no_producers_is_unserved_not_error() {
    let config = MarketConfig {
        producers: Vec::new(),
        ..reliable_config()
    };
    let (coordinator, population) = build_coordinator(&config).unwrap();
    let mut coordinator = coordinator.with_random_source(FixedSource::never_fail());
    assert_eq!(population.producers, 0);

    let summary = coordinator.run().unwrap();

    assert_eq!(summary.decisions, 20);
    assert_eq!(summary.unserved, 20);
    assert_eq!(summary.service_rate(), 0.0);
}

#[test]
fn test_exhausted_capacity_erodes_trust() {
    let config = MarketConfig {
        producers: vec![producer_spec(1, "tiny", 0.9, 1.0, 20.0)],
        ..reliable_config()
    };
    let (coordinator, _) = build_coordinator(&config).unwrap();
    let mut coordinator = coordinator.with_random_source(FixedSource::never_fail());

    let summary = coordinator.run().unwrap();
    let tiny = summary.producer("tiny").unwrap();

    // Two deliveries of 9 fit in 20 units, then every attempt fails
    assert_eq!(tiny.times_chosen, 2);
    assert_eq!(tiny.capacity, 2.0);
    assert!(tiny.trust_level < 0.5);
    // Once below the gate the producer is no longer asked, so trust stops falling
    assert_eq!(summary.unserved, 18);
}

#[test]
fn test_always_failing_source() {
    let (coordinator, _) = build_coordinator(&MarketConfig::default()).unwrap();
    let mut coordinator = coordinator.with_random_source(FixedSource::always_fail());

    let summary = coordinator.run().unwrap();

    assert_eq!(summary.unserved, 20);
    for producer in &summary.producers {
        assert_eq!(producer.times_chosen, 0);
        assert!(producer.trust_level < 0.5);
    }
}

#[test]
fn test_scripted_draws_are_reproducible() {
    let script = vec![0.05, 0.5, 0.95, 0.12, 0.3, 0.08, 0.7];

    let run = |draws: Vec<f64>| {
        let (coordinator, _) = build_coordinator(&MarketConfig::default()).unwrap();
        let mut coordinator = coordinator.with_random_source(ScriptedSource::new(draws));
        let summary = coordinator.run().unwrap();
        let picks: Vec<Selection> = coordinator
            .ledger()
            .entries()
            .iter()
            .map(|e| e.selection.clone())
            .collect();
        (picks, summary.producers)
    };

    assert_eq!(run(script.clone()), run(script));
}

#[test]
fn test_seeded_runs_match() {
    let run = |seed: u64| {
        let mut config = MarketConfig::default();
        config.simulation.seed = seed;
        let (mut coordinator, _) = build_coordinator(&config).unwrap();
        let summary = coordinator.run().unwrap();
        let picks: Vec<Selection> = coordinator
            .ledger()
            .entries()
            .iter()
            .map(|e| e.selection.clone())
            .collect();
        (picks, summary.producers, summary.unserved)
    };

    assert_eq!(run(42), run(42));
    assert_eq!(run(7), run(7));
}

#[test]
fn test_event_log_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");

    let config = MarketConfig {
        simulation: market_core::config::SimulationConfig {
            stop_tick: 3,
            ..Default::default()
        },
        ..reliable_config()
    };
    let (coordinator, _) = build_coordinator(&config).unwrap();
    let mut coordinator = coordinator
        .with_random_source(FixedSource::never_fail())
        .with_event_logger(EventLogger::new(&path).unwrap());
    let run_id = coordinator.run_id();

    coordinator.run().unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let events: Vec<MarketEvent> = std::io::BufReader::new(file)
        .lines()
        .map(|l| MarketEvent::from_jsonl(&l.unwrap()).unwrap())
        .collect();

    // Three production attempts and one decision per tick
    assert_eq!(events.len(), 12);
    assert!(events.iter().all(|e| e.run_id == run_id));
    assert_eq!(events[0].event_id, "evt_00000001");

    let decisions: Vec<&MarketEvent> = events
        .iter()
        .filter(|e| e.event_type() == EventType::Decision)
        .collect();
    assert_eq!(decisions.len(), 3);
    assert_eq!(
        decisions.iter().map(|e| e.tick).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    match &decisions[0].payload {
        EventPayload::Decision(record) => {
            assert_eq!(record.consumer_name, "Genivaldo");
            assert_eq!(record.chosen.as_deref(), Some("Eólica"));
            assert_eq!(record.candidates.len(), 3);
        }
        other => panic!("expected a decision, got {:?}", other),
    }
    match &events[1].payload {
        EventPayload::Production(status) => {
            assert_eq!(status.producer_id, 222);
            assert_eq!(status.capacity, 591.0);
            assert!(status.delivered);
        }
        other => panic!("expected a production status, got {:?}", other),
    }
}

#[test]
fn test_population_visible_by_type() {
    let (mut coordinator, _) = build_coordinator(&MarketConfig::default()).unwrap();
    let context = coordinator.context_mut();

    assert_eq!(context.agents(Some(AgentType::Consumer)).len(), 1);
    assert_eq!(context.agents(Some(AgentType::Producer)).len(), 3);
    assert_eq!(context.agents(None).len(), 4);
}
