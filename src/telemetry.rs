//! Observational event stream
//!
//! Events are fire-and-forget: the core never reads anything back.

use serde::Serialize;

use crate::sim::Side;
use crate::stats::Outcome;

/// Why a navigation to the return route was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreReason {
    ScoredOnce,
    MatchEnd,
}

/// Named events with structured payloads
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    Armed,
    MatchStart {
        match_number: u32,
        difficulty: &'static str,
        level: u8,
        wins: u32,
        losses: u32,
        best_rally: u32,
    },
    Point {
        winner: Side,
        you: u32,
        opponent: u32,
        rally: u32,
    },
    Return {
        who: Side,
        rally: u32,
    },
    RallyRecord {
        best_rally: u32,
    },
    MatchEnd {
        outcome: Outcome,
        score_you: u32,
        score_opponent: u32,
        elapsed_ms: f64,
    },
    RouteRestore {
        reason: RestoreReason,
        to: String,
    },
    SoundToggle {
        enabled: bool,
    },
    IdleHint {
        idle_ms: f64,
    },
    Insight {
        matches: u32,
        win_rate: f32,
    },
}

impl TelemetryEvent {
    /// Stable event name for sinks that key on strings
    pub fn name(&self) -> &'static str {
        match self {
            TelemetryEvent::Armed => "tennis_armed",
            TelemetryEvent::MatchStart { .. } => "tennis_match_start",
            TelemetryEvent::Point { .. } => "tennis_point",
            TelemetryEvent::Return { .. } => "tennis_return",
            TelemetryEvent::RallyRecord { .. } => "tennis_rally_record",
            TelemetryEvent::MatchEnd { .. } => "tennis_match_end",
            TelemetryEvent::RouteRestore { .. } => "tennis_route_restore",
            TelemetryEvent::SoundToggle { .. } => "tennis_sound_toggle",
            TelemetryEvent::IdleHint { .. } => "tennis_idle_hint",
            TelemetryEvent::Insight { .. } => "tennis_insight",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
