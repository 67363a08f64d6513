//! Data-driven game balance
//!
//! Two difficulty policies produce the [`Tuning`] bundle a match is played with:
//! - `VisitCycle`: a persisted visit counter picks one of six hand-tuned levels
//! - `WinRate`: the lifetime win/loss record picks a tier with a uniform factor

use serde::{Deserialize, Serialize};

use crate::consts::MAX_SPEED_OVER_SERVE;
use crate::persistence::advance_visit_level;
use crate::platform::Storage;
use crate::stats::TennisStats;

/// Which policy seeds the difficulty at match start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DifficultyPolicy {
    /// Tier from lifetime matches and win rate
    WinRate,
    /// Level cycles 1..=6, advancing once per session
    #[default]
    VisitCycle,
}

impl DifficultyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPolicy::WinRate => "win_rate",
            DifficultyPolicy::VisitCycle => "visit_cycle",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "win_rate" | "winrate" | "tier" => Some(DifficultyPolicy::WinRate),
            "visit_cycle" | "visit" | "cycle" | "level" => Some(DifficultyPolicy::VisitCycle),
            _ => None,
        }
    }
}

/// A hand-tuned difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelSpec {
    /// 1-based position in [`LEVELS`]
    pub index: u8,
    pub name: &'static str,
    /// Scales opponent spin
    pub factor: f32,
    /// AI proportional gain (1/s)
    pub ai_gain: f32,
    /// AI paddle speed limit (px/s)
    pub ai_max_speed: f32,
    /// How much of the ball's vertical travel the AI reads ahead
    pub prediction: f32,
    /// Per-tick probability of an AI hesitation
    pub lock_chance: f32,
    /// Base serve speed (px/s)
    pub serve_speed: f32,
    /// Horizontal speed multiplier applied on every return
    pub ball_accel: f32,
}

pub const LEVEL_COUNT: u8 = 6;

/// Levels in strictly increasing difficulty
pub const LEVELS: [LevelSpec; LEVEL_COUNT as usize] = [
    LevelSpec {
        index: 1,
        name: "Rookie",
        factor: 1.0,
        ai_gain: 6.5,
        ai_max_speed: 380.0,
        prediction: 0.80,
        lock_chance: 0.0060,
        serve_speed: 360.0,
        ball_accel: 1.035,
    },
    LevelSpec {
        index: 2,
        name: "Cadet",
        factor: 1.08,
        ai_gain: 7.4,
        ai_max_speed: 420.0,
        prediction: 0.86,
        lock_chance: 0.0052,
        serve_speed: 380.0,
        ball_accel: 1.040,
    },
    LevelSpec {
        index: 3,
        name: "Intermediate",
        factor: 1.16,
        ai_gain: 8.3,
        ai_max_speed: 460.0,
        prediction: 0.92,
        lock_chance: 0.0045,
        serve_speed: 400.0,
        ball_accel: 1.045,
    },
    LevelSpec {
        index: 4,
        name: "Advanced",
        factor: 1.26,
        ai_gain: 9.4,
        ai_max_speed: 505.0,
        prediction: 0.98,
        lock_chance: 0.0038,
        serve_speed: 420.0,
        ball_accel: 1.050,
    },
    LevelSpec {
        index: 5,
        name: "Expert",
        factor: 1.36,
        ai_gain: 10.6,
        ai_max_speed: 550.0,
        prediction: 1.04,
        lock_chance: 0.0031,
        serve_speed: 440.0,
        ball_accel: 1.056,
    },
    LevelSpec {
        index: 6,
        name: "Champion",
        factor: 1.48,
        ai_gain: 12.0,
        ai_max_speed: 600.0,
        prediction: 1.10,
        lock_chance: 0.0025,
        serve_speed: 465.0,
        ball_accel: 1.062,
    },
];

/// Look up a level by 1-based index, wrapping out-of-range values into 1..=6
pub fn level_spec(index: u8) -> &'static LevelSpec {
    let i = (index.max(1) - 1) % LEVEL_COUNT;
    &LEVELS[i as usize]
}

/// Win-rate tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Rookie,
    Intermediate,
    Advanced,
    Expert,
}

impl Tier {
    /// Pick a tier from the lifetime record
    pub fn from_record(matches: u32, wins: u32) -> Self {
        let rate = if matches > 0 {
            wins as f32 / matches as f32
        } else {
            0.0
        };

        if matches >= 18 && rate >= 0.62 {
            Tier::Expert
        } else if matches >= 10 && rate >= 0.52 {
            Tier::Advanced
        } else if matches >= 4 {
            Tier::Intermediate
        } else {
            Tier::Rookie
        }
    }

    pub fn factor(&self) -> f32 {
        match self {
            Tier::Rookie => 1.0,
            Tier::Intermediate => 1.12,
            Tier::Advanced => 1.26,
            Tier::Expert => 1.42,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Rookie => "Rookie",
            Tier::Intermediate => "Intermediate",
            Tier::Advanced => "Advanced",
            Tier::Expert => "Expert",
        }
    }
}

/// Resolved numbers a match is played with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    /// Display label (level or tier name)
    pub label: &'static str,
    /// Level index for the visit policy, 0 for win-rate tiers
    pub level: u8,
    pub factor: f32,
    pub ai_gain: f32,
    pub ai_max_speed: f32,
    pub prediction: f32,
    pub lock_chance: f32,
    pub serve_speed: f32,
    pub ball_accel: f32,
    /// Hard cap on ball speed magnitude (px/s)
    pub max_ball_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::from_level(&LEVELS[0])
    }
}

impl Tuning {
    pub fn from_level(spec: &LevelSpec) -> Self {
        Self {
            label: spec.name,
            level: spec.index,
            factor: spec.factor,
            ai_gain: spec.ai_gain,
            ai_max_speed: spec.ai_max_speed,
            prediction: spec.prediction,
            lock_chance: spec.lock_chance,
            serve_speed: spec.serve_speed,
            ball_accel: spec.ball_accel,
            max_ball_speed: spec.serve_speed * MAX_SPEED_OVER_SERVE,
        }
    }

    /// Scale the Rookie baseline uniformly by the tier factor
    pub fn from_tier(tier: Tier) -> Self {
        let base = &LEVELS[0];
        let f = tier.factor();
        let serve_speed = 372.0 * (0.92 + f * 0.12);
        Self {
            label: tier.as_str(),
            level: 0,
            factor: f,
            ai_gain: base.ai_gain * f,
            ai_max_speed: base.ai_max_speed * f,
            prediction: 0.65 + f * 0.15,
            lock_chance: 0.005 / f,
            serve_speed,
            ball_accel: 1.03 + f * 0.01,
            max_ball_speed: serve_speed * MAX_SPEED_OVER_SERVE,
        }
    }
}

/// Seeds the per-match tuning from persisted inputs
///
/// The visit counter is read and advanced on first use only; later calls in the
/// same session reuse that level.
pub struct DifficultyProvider {
    policy: DifficultyPolicy,
    visit_level: Option<u8>,
    fallback: Option<Box<dyn Storage>>,
}

impl DifficultyProvider {
    pub fn new(policy: DifficultyPolicy) -> Self {
        Self {
            policy,
            visit_level: None,
            fallback: None,
        }
    }

    /// Storage to try when the primary store cannot hold the level counter
    pub fn with_fallback(mut self, fallback: Box<dyn Storage>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn policy(&self) -> DifficultyPolicy {
        self.policy
    }

    /// Level chosen this session, if the visit counter has been consulted
    pub fn visit_level(&self) -> Option<u8> {
        self.visit_level
    }

    pub fn seed_difficulty(&mut self, stats: &TennisStats, storage: &mut dyn Storage) -> Tuning {
        match self.policy {
            DifficultyPolicy::WinRate => {
                Tuning::from_tier(Tier::from_record(stats.matches, stats.wins))
            }
            DifficultyPolicy::VisitCycle => {
                let level = match self.visit_level {
                    Some(level) => level,
                    None => {
                        let fallback = self
                            .fallback
                            .as_mut()
                            .map(|store| store.as_mut() as &mut dyn Storage);
                        let level = advance_visit_level(storage, fallback);
                        self.visit_level = Some(level);
                        level
                    }
                };
                Tuning::from_level(level_spec(level))
            }
        }
    }
}
