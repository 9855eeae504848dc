//! Schedule Runner
//!
//! Discrete tick clock. Repeating events fire on `start, start + interval, ...`
//! and the runner stops once the stop tick has executed.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;

/// Current tick, visible to systems
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickClock {
    pub tick: u64,
}

/// Errors raised while registering or executing scheduled events
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("repeating events must start at tick 1 or later (got {0})")]
    InvalidStart(u64),
    #[error("repeating event interval must be at least 1 tick")]
    ZeroInterval,
    #[error("no stop tick scheduled; execution would never end")]
    NoStop,
}

/// Result of advancing the clock by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The tick executed and `fired` events ran
    Ran { tick: u64, fired: usize },
    /// The stop tick had already been reached; nothing ran
    Stopped,
}

struct RepeatingEvent {
    start: u64,
    interval: u64,
    schedule: Schedule,
}

impl RepeatingEvent {
    fn is_due(&self, tick: u64) -> bool {
        tick >= self.start && (tick - self.start) % self.interval == 0
    }
}

/// Drives repeating schedules against a world, tick by tick
#[derive(Default)]
pub struct ScheduleRunner {
    tick: u64,
    stop_at: Option<u64>,
    stopped: bool,
    events: Vec<RepeatingEvent>,
}

impl ScheduleRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `schedule` to run at `start` and every `interval` ticks after.
    ///
    /// Systems in the schedule run one after another on the calling thread.
    pub fn schedule_repeating_event(
        &mut self,
        start: u64,
        interval: u64,
        mut schedule: Schedule,
    ) -> Result<(), ScheduleError> {
        if start == 0 {
            return Err(ScheduleError::InvalidStart(start));
        }
        if interval == 0 {
            return Err(ScheduleError::ZeroInterval);
        }
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        self.events.push(RepeatingEvent {
            start,
            interval,
            schedule,
        });
        Ok(())
    }

    /// Stops the clock after `tick` has executed.
    pub fn schedule_stop(&mut self, tick: u64) {
        self.stop_at = Some(tick);
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn stop_at(&self) -> Option<u64> {
        self.stop_at
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Advances one tick and runs every event due on it.
    pub fn step(&mut self, world: &mut World) -> StepOutcome {
        if self.stopped || self.stop_at.is_some_and(|stop| self.tick >= stop) {
            self.stopped = true;
            return StepOutcome::Stopped;
        }

        self.tick += 1;
        let tick = self.tick;
        world.insert_resource(TickClock { tick });

        let mut fired = 0;
        for event in self.events.iter_mut().filter(|event| event.is_due(tick)) {
            event.schedule.run(world);
            fired += 1;
        }

        if self.stop_at.is_some_and(|stop| tick >= stop) {
            self.stopped = true;
        }

        StepOutcome::Ran { tick, fired }
    }

    /// Runs ticks until the stop tick; returns how many ticks executed.
    pub fn execute(&mut self, world: &mut World) -> Result<u64, ScheduleError> {
        if self.stop_at.is_none() {
            return Err(ScheduleError::NoStop);
        }

        let mut executed = 0;
        while let StepOutcome::Ran { .. } = self.step(world) {
            executed += 1;
        }
        Ok(executed)
    }
}
