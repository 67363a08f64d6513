//! Platform abstraction layer
//!
//! Everything the core hands to the outside world goes through [`Host`]:
//! - Render frames (paddle/ball coordinates, score and stat text)
//! - Telemetry events
//! - Delayed navigation requests
//! - Sound cues and commentary lines
//!
//! Persistence goes through [`Storage`] (LocalStorage on web).

pub mod storage;

pub use storage::{MemoryStorage, Storage};
#[cfg(target_arch = "wasm32")]
pub use storage::WebStorage;

use glam::Vec2;

use crate::audio::Sfx;
use crate::commentary::Comment;
use crate::telemetry::TelemetryEvent;

/// Outbound side of the game. Every method defaults to a no-op.
pub trait Host {
    /// Draw the current positions and stat text
    fn render(&mut self, _frame: &RenderFrame) {}

    /// Fire-and-forget event stream
    fn telemetry(&mut self, _event: &TelemetryEvent) {}

    /// Go to the resolved return destination
    fn navigate(&mut self, _to: &str) {}

    /// Play a gameplay cue (only called while sound is enabled)
    fn play(&mut self, _sfx: Sfx) {}

    /// Show a personality line
    fn comment(&mut self, _comment: &Comment) {}
}

/// Headless host
impl Host for () {}

/// Everything a render sink needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// Top-left corners, court coordinates
    pub player: Vec2,
    pub opponent: Vec2,
    pub ball: Vec2,
    pub score_you: u32,
    pub score_opponent: u32,
    pub match_number: u32,
    /// Seconds since match start (0 when not running)
    pub elapsed_secs: f32,
    /// Max of all-time best and this match's best
    pub best_rally: u32,
    pub wins: u32,
    pub losses: u32,
    pub difficulty: &'static str,
}

impl RenderFrame {
    pub fn match_label(&self) -> String {
        format!("{:02}", self.match_number)
    }

    pub fn timer_label(&self) -> String {
        format!("{:.2}s", self.elapsed_secs)
    }

    pub fn record_label(&self) -> String {
        format!("{}W · {}L", self.wins, self.losses)
    }

    /// Center of the ball square
    pub fn ball_center(&self) -> Vec2 {
        self.ball + Vec2::splat(crate::consts::BALL_SIZE / 2.0)
    }
}

/// Max pupil travel for a decorative avatar that watches the ball
pub const GAZE_MAX_SHIFT: f32 = 4.0;

/// Offset for an eye centered at `anchor` (with half-extent `half`) looking at `target`
pub fn gaze_offset(target: Vec2, anchor: Vec2, half: Vec2) -> Vec2 {
    if half.x <= 0.0 || half.y <= 0.0 {
        return Vec2::ZERO;
    }
    let rel = ((target - anchor) / half).clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
    rel * GAZE_MAX_SHIFT
}
