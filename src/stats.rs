//! Lifetime tennis statistics
//!
//! Persisted as one JSON object of named counters. Records are monotonic:
//! best rally only grows, fastest win only shrinks.

use serde::{Deserialize, Serialize};

use crate::persistence::{load_json, save_json};
use crate::platform::Storage;

/// How a match ended from the player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
}

/// Produced once when a match ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub outcome: Outcome,
    pub score_you: u32,
    pub score_opponent: u32,
    pub elapsed_ms: f64,
    pub best_rally_this_match: u32,
}

/// Which records a finished match broke
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordsBroken {
    pub best_rally: bool,
    pub fastest_win: bool,
}

/// Lifetime counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TennisStats {
    #[serde(rename = "tennisMatches")]
    pub matches: u32,
    #[serde(rename = "tennisWins")]
    pub wins: u32,
    #[serde(rename = "tennisLosses")]
    pub losses: u32,
    #[serde(rename = "tennisBestRally")]
    pub best_rally: u32,
    #[serde(rename = "tennisFastestWinMs")]
    pub fastest_win_ms: Option<f64>,
    #[serde(rename = "tennisLifetimePoints")]
    pub lifetime_points: u64,
}

impl TennisStats {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "control_room_tennis_stats";

    pub fn load(storage: &dyn Storage) -> Self {
        let stats: Self = load_json(storage, Self::STORAGE_KEY);
        log::info!(
            "Stats · matches: {} · wins: {} · losses: {}",
            stats.matches,
            stats.wins,
            stats.losses
        );
        stats
    }

    pub fn save(&self, storage: &mut dyn Storage) -> bool {
        save_json(storage, Self::STORAGE_KEY, self)
    }

    pub fn win_rate(&self) -> f32 {
        if self.matches == 0 {
            0.0
        } else {
            self.wins as f32 / self.matches as f32
        }
    }

    pub fn record_point(&mut self) {
        self.lifetime_points += 1;
    }

    /// Raise the best rally if `rally` beats it. Returns true on a new record.
    pub fn offer_best_rally(&mut self, rally: u32) -> bool {
        if rally > self.best_rally {
            self.best_rally = rally;
            true
        } else {
            false
        }
    }

    /// Fold a finished match into the counters and records
    pub fn record_match(&mut self, result: &MatchResult) -> RecordsBroken {
        self.matches += 1;
        let mut broken = RecordsBroken {
            best_rally: self.offer_best_rally(result.best_rally_this_match),
            fastest_win: false,
        };

        match result.outcome {
            Outcome::Win => {
                self.wins += 1;
                let faster = self
                    .fastest_win_ms
                    .map(|best| result.elapsed_ms < best)
                    .unwrap_or(true);
                if faster {
                    self.fastest_win_ms = Some(result.elapsed_ms);
                    broken.fastest_win = true;
                }
            }
            Outcome::Loss => self.losses += 1,
        }

        broken
    }
}
