//! Game settings and preferences
//!
//! Persisted separately from the stats in the same key/value store. Query
//! parameters may override individual fields for one visit.

use serde::{Deserialize, Serialize};

use crate::audio::sequencer::DEFAULT_TEMPO;
use crate::consts::TARGET_SCORE;
use crate::persistence::{load_json, save_json};
use crate::platform::Storage;
use crate::tuning::DifficultyPolicy;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Sound starts off until the player opts in
    pub sound_enabled: bool,
    /// Master bus gain (0.0 - 1.0)
    pub master_volume: f32,
    /// Music tempo (bpm)
    pub music_tempo: f32,

    // === Match ===
    /// Points needed to win a match
    pub target_score: u32,
    pub difficulty_policy: DifficultyPolicy,

    // === Session ===
    /// Where to send the player after their first point or the match end
    pub return_route: Option<String>,
    /// Fixed rng seed, otherwise derived from the clock
    pub seed: Option<u64>,
    /// Quiet time before an idle hint (ms)
    pub idle_hint_ms: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Audio
            sound_enabled: false,
            master_volume: 0.22,
            music_tempo: DEFAULT_TEMPO,

            // Match
            target_score: TARGET_SCORE,
            difficulty_policy: DifficultyPolicy::VisitCycle,

            // Session
            return_route: None,
            seed: None,
            idle_hint_ms: 6000.0,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "control_room_tennis_settings";

    pub fn load(storage: &dyn Storage) -> Self {
        let settings: Self = load_json(storage, Self::STORAGE_KEY);
        settings.sanitized()
    }

    pub fn save(&self, storage: &mut dyn Storage) -> bool {
        let saved = save_json(storage, Self::STORAGE_KEY, self);
        if saved {
            log::info!("Settings saved");
        }
        saved
    }

    /// Clamp values a hand-edited payload could push out of range
    pub fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.music_tempo = self.music_tempo.clamp(40.0, 240.0);
        self.target_score = self.target_score.max(1);
        self.idle_hint_ms = self.idle_hint_ms.max(0.0);
        if self.return_route.as_deref().is_some_and(|r| r.trim().is_empty()) {
            self.return_route = None;
        }
        self
    }

    /// Apply one query-string override. Returns false for unknown keys or bad values.
    pub fn apply_override(&mut self, key: &str, value: &str) -> bool {
        let applied = match key {
            "to" | "restore" | "r" => {
                let route = value.trim();
                if route.is_empty() {
                    false
                } else {
                    self.return_route = Some(route.to_string());
                    true
                }
            }
            "seed" => value.parse().map(|seed| self.seed = Some(seed)).is_ok(),
            "difficulty" => DifficultyPolicy::from_str(value)
                .map(|policy| self.difficulty_policy = policy)
                .is_some(),
            "target" => value
                .parse::<u32>()
                .ok()
                .filter(|&t| t > 0)
                .map(|t| self.target_score = t)
                .is_some(),
            "sound" => match value {
                "1" | "on" | "true" => {
                    self.sound_enabled = true;
                    true
                }
                "0" | "off" | "false" => {
                    self.sound_enabled = false;
                    true
                }
                _ => false,
            },
            _ => false,
        };
        if applied {
            log::info!("Override {}={}", key, value);
        }
        applied
    }
}
