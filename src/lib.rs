//! Control Room Tennis - single-player paddle-ball arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (stepper, physics, AI, game state)
//! - `session`: Match lifecycle, scoring, records and delayed side effects
//! - `tuning`: Data-driven difficulty levels and win-rate tiers
//! - `audio`: Look-ahead music sequencer and sound cues
//! - `platform`: Host seam and key/value storage
//! - `persistence`: JSON storage helpers and the visit-level counter
//! - `stats`, `settings`: Lifetime records and player preferences
//! - `commentary`, `telemetry`: Personality lines and the outbound event stream

pub mod audio;
pub mod commentary;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod stats;
pub mod telemetry;
pub mod tuning;

pub use session::{GameSession, MatchPhase};
pub use settings::Settings;
pub use stats::{MatchResult, Outcome, TennisStats};
pub use tuning::{DifficultyPolicy, LevelSpec, Tuning};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum ticks per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 10;
    /// Longest frame delta accepted before clamping (tab suspension)
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// Default court size used before the host reports a real one
    pub const DEFAULT_COURT_WIDTH: f32 = 720.0;
    pub const DEFAULT_COURT_HEIGHT: f32 = 420.0;

    /// Paddle geometry
    pub const PADDLE_WIDTH: f32 = 14.0;
    pub const PADDLE_HEIGHT: f32 = 86.0;
    /// Distance from the side wall to the paddle face while playing
    pub const PADDLE_INSET: f32 = 16.0;
    /// Vertical margin the paddles may not enter
    pub const PADDLE_MARGIN: f32 = 12.0;
    /// Horizontal gap around the net in the idle stance
    pub const IDLE_NET_GAP: f32 = 18.0;

    /// Ball is a square of this size (positions are its top-left corner)
    pub const BALL_SIZE: f32 = 16.0;
    /// Top wall bound for the ball's top edge
    pub const WALL_TOP: f32 = 10.0;
    /// Bottom wall bound is court height minus this
    pub const WALL_BOTTOM_INSET: f32 = 26.0;
    /// How far past a side the ball travels before a point is scored
    pub const OUT_OF_BOUNDS_MARGIN: f32 = 40.0;

    /// Player spin: vertical velocity added per px/s of paddle velocity
    pub const PLAYER_SPIN_GAIN: f32 = 0.18;
    pub const PLAYER_SPIN_MAX: f32 = 132.0;
    /// Opponent spin: vertical velocity added per px of off-center contact
    pub const OPPONENT_SPIN_GAIN: f32 = 1.8;
    pub const OPPONENT_SPIN_MAX: f32 = 156.0;
    /// Vertical speed-up on every return
    pub const BALL_ACCEL_Y: f32 = 1.01;
    /// Ball speed cap as a multiple of the serve speed
    pub const MAX_SPEED_OVER_SERVE: f32 = 2.4;

    /// AI prediction lookahead (seconds of vertical travel)
    pub const AI_LOOKAHEAD: f32 = 0.075;
    /// AI hesitation length in ticks (inclusive)
    pub const AI_LOCK_MIN_TICKS: u32 = 8;
    pub const AI_LOCK_MAX_TICKS: u32 = 18;

    /// Default winning score
    pub const TARGET_SCORE: u32 = 5;
    /// Pointer travel needed to start an armed match
    pub const START_MOVE_THRESHOLD: f32 = 2.0;
    /// Pointer velocity estimate is dropped after this much stillness
    pub const POINTER_STILL_MS: f64 = 80.0;

    /// Delayed navigation after the player's first point
    pub const FIRST_POINT_ROUTE_DELAY_MS: f64 = 650.0;
    /// Delayed navigation / reset after match end
    pub const MATCH_END_DELAY_MS: f64 = 1200.0;
}

/// Clamp a paddle's top edge into the playable band of a court of height `h`
#[inline]
pub fn clamp_paddle_y(y: f32, h: f32) -> f32 {
    let max = (h - consts::PADDLE_HEIGHT - consts::PADDLE_MARGIN).max(consts::PADDLE_MARGIN);
    y.clamp(consts::PADDLE_MARGIN, max)
}

/// Convert a MIDI note number to frequency in Hz
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}
