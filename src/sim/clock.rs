//! Frame-to-tick stepper
//!
//! Animation frames arrive at whatever rate the host manages. The stepper turns
//! the elapsed wall-clock time into a bounded number of fixed ticks and carries
//! the remainder forward.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

#[derive(Debug, Clone)]
pub struct FixedStepper {
    dt: f32,
    max_frame_dt: f32,
    max_ticks: u32,
    last_ms: Option<f64>,
    accumulator: f32,
}

impl Default for FixedStepper {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedStepper {
    pub fn new() -> Self {
        Self::with_limits(SIM_DT, MAX_FRAME_DT, MAX_SUBSTEPS)
    }

    pub fn with_limits(dt: f32, max_frame_dt: f32, max_ticks: u32) -> Self {
        Self {
            dt,
            max_frame_dt,
            max_ticks,
            last_ms: None,
            accumulator: 0.0,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Unconsumed time carried into the next frame (seconds)
    pub fn remainder(&self) -> f32 {
        self.accumulator
    }

    /// Forget the previous timestamp and remainder
    pub fn reset(&mut self) {
        self.last_ms = None;
        self.accumulator = 0.0;
    }

    /// Consume a frame timestamp (ms) and return how many ticks to run
    ///
    /// The first frame after a reset only records the timestamp.
    pub fn advance(&mut self, now_ms: f64) -> u32 {
        let Some(last_ms) = self.last_ms.replace(now_ms) else {
            return 0;
        };

        let elapsed = (((now_ms - last_ms) / 1000.0) as f32).clamp(0.0, self.max_frame_dt);
        self.accumulator += elapsed;

        let mut ticks = 0;
        while self.accumulator >= self.dt && ticks < self.max_ticks {
            self.accumulator -= self.dt;
            ticks += 1;
        }
        ticks
    }

    /// Like [`advance`](Self::advance), calling `on_tick(dt)` once per tick
    pub fn step(&mut self, now_ms: f64, mut on_tick: impl FnMut(f32)) -> u32 {
        let ticks = self.advance(now_ms);
        for _ in 0..ticks {
            on_tick(self.dt);
        }
        ticks
    }
}
