//! Look-ahead music scheduler
//!
//! The host calls [`Sequencer::schedule`] every [`LOOKAHEAD_MS`] with the audio
//! clock. Each call queues every step that falls inside the next
//! [`SCHEDULE_AHEAD`] seconds at its exact time, so timer jitter never reaches
//! the beat.

use super::AudioSink;
use super::pattern::{PATTERN_STEPS, schedule_step};

/// Interval between scheduler calls (ms)
pub const LOOKAHEAD_MS: u32 = 25;
/// How far ahead of the audio clock steps are queued (seconds)
pub const SCHEDULE_AHEAD: f64 = 0.12;
/// Gap before the first step after starting (seconds)
pub const START_DELAY: f64 = 0.06;
pub const DEFAULT_TEMPO: f32 = 124.0;

#[derive(Debug, Clone)]
pub struct Sequencer {
    tempo: f32,
    step: usize,
    next_time: f64,
    running: bool,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPO)
    }
}

impl Sequencer {
    pub fn new(tempo: f32) -> Self {
        Self {
            tempo: tempo.max(1.0),
            step: 0,
            next_time: 0.0,
            running: false,
        }
    }

    /// Sixteenth-note length (seconds)
    pub fn step_duration(&self) -> f64 {
        60.0 / self.tempo as f64 / 4.0
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Next step index to be queued
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn next_time(&self) -> f64 {
        self.next_time
    }

    /// Start from step 0 shortly after `now`. No-op while already running.
    pub fn start(&mut self, now: f64) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.step = 0;
        self.next_time = now + START_DELAY;
        log::info!("Music started at {:.0} bpm", self.tempo);
        true
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!("Music stopped");
        }
        self.running = false;
    }

    /// Queue all steps due before `now + SCHEDULE_AHEAD`, returning how many
    pub fn schedule(&mut self, now: f64, enabled: bool, sink: &mut dyn AudioSink) -> usize {
        if !self.running || !enabled {
            return 0;
        }

        let step_len = self.step_duration();
        let mut queued = 0;
        while self.next_time < now + SCHEDULE_AHEAD {
            schedule_step(self.step, self.next_time, sink);
            self.next_time += step_len;
            self.step = (self.step + 1) % PATTERN_STEPS;
            queued += 1;
        }
        queued
    }
}
