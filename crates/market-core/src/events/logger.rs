//! Market event log
//!
//! Every production attempt and decision becomes one JSON line.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use bevy_ecs::prelude::*;
use uuid::Uuid;

use market_events::{generate_event_id, EventPayload, MarketEvent};

/// Identity of the current run, stamped on every logged event
#[derive(Resource, Debug, Clone, Copy)]
pub struct RunInfo {
    pub run_id: Uuid,
    pub seed: u64,
}

/// JSONL sink for market events
///
/// Ids are sequential per logger, starting at `evt_00000001`. A logger with
/// no sink still counts events and hands out ids.
#[derive(Resource)]
pub struct EventLogger {
    sink: Option<BufWriter<File>>,
    logged: u64,
    sequence: u64,
}

impl EventLogger {
    /// Truncates `path` and logs into it
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::with_sink(Some(BufWriter::new(file))))
    }

    /// Logger that discards every event
    pub fn null() -> Self {
        Self::with_sink(None)
    }

    fn with_sink(sink: Option<BufWriter<File>>) -> Self {
        Self {
            sink,
            logged: 0,
            sequence: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        self.sequence += 1;
        generate_event_id(self.sequence)
    }

    /// Events logged so far, including discarded ones
    pub fn event_count(&self) -> u64 {
        self.logged
    }

    pub fn log(&mut self, event: &MarketEvent) -> std::io::Result<()> {
        self.logged += 1;
        match self.sink.as_mut() {
            Some(sink) => writeln!(sink, "{}", serde_json::to_string(event)?),
            None => Ok(()),
        }
    }

    /// Stamps `payload` with the next id and the run identity, then logs it.
    pub fn record(&mut self, run: &RunInfo, tick: u64, payload: EventPayload) -> std::io::Result<MarketEvent> {
        let event = MarketEvent::new(self.next_id(), run.run_id, tick, payload);
        self.log(&event)?;
        Ok(event)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Event log lost buffered lines: {}", e);
        }
    }
}

/// Payloads produced during a tick, waiting for `write_events`
#[derive(Resource, Default)]
pub struct PendingEvents {
    queued: Vec<(u64, EventPayload)>,
}

impl PendingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tick: u64, payload: EventPayload) {
        self.queued.push((tick, payload));
    }

    /// Takes every queued payload in push order
    pub fn drain(&mut self) -> Vec<(u64, EventPayload)> {
        std::mem::take(&mut self.queued)
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }
}
