//! Simulation state and core types
//!
//! Everything the per-tick update reads or writes lives in [`SimulationState`].
//! It is rebuilt for every session and never persisted.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ai::AiController;
use crate::clamp_paddle_y;
use crate::consts::*;
use crate::tuning::Tuning;

/// One side of the court
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// The human, left paddle
    #[serde(rename = "you")]
    Player,
    /// The AI, right paddle
    #[serde(rename = "opponent")]
    Opponent,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }
}

/// Axis-aligned paddle rectangle (position is the top-left corner)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paddle {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Paddle {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT),
        }
    }

    pub fn center_y(&self) -> f32 {
        self.pos.y + self.size.y / 2.0
    }

    /// AABB overlap with a square of side `size` at `top_left`
    pub fn overlaps(&self, top_left: Vec2, size: f32) -> bool {
        top_left.x < self.pos.x + self.size.x
            && top_left.x + size > self.pos.x
            && top_left.y < self.pos.y + self.size.y
            && top_left.y + size > self.pos.y
    }
}

/// The ball (position is the top-left corner of its square)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ball {
    pub pos: Vec2,
    /// px/s
    pub vel: Vec2,
}

impl Ball {
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(BALL_SIZE / 2.0)
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// Complete simulation state for one session
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub width: f32,
    pub height: f32,
    pub player: Paddle,
    pub opponent: Paddle,
    pub ball: Ball,
    /// Numbers the current match is played with
    pub tuning: Tuning,
    pub ai: AiController,
    /// Recent player paddle velocity (px/s), source of return spin
    pub player_vel: f32,
    pub score_you: u32,
    pub score_opponent: u32,
    pub rally: u32,
    pub best_rally_this_match: u32,
    /// Ticks simulated since the match started
    pub time_ticks: u64,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new(DEFAULT_COURT_WIDTH, DEFAULT_COURT_HEIGHT)
    }
}

impl SimulationState {
    /// New state in the idle stance
    pub fn new(width: f32, height: f32) -> Self {
        let mut state = Self {
            width,
            height,
            player: Paddle::new(0.0, 0.0),
            opponent: Paddle::new(0.0, 0.0),
            ball: Ball::default(),
            tuning: Tuning::default(),
            ai: AiController::default(),
            player_vel: 0.0,
            score_you: 0,
            score_opponent: 0,
            rally: 0,
            best_rally_this_match: 0,
            time_ticks: 0,
        };
        state.set_idle_positions();
        state
    }

    /// Paddles side by side around the net, ball centered and still
    pub fn set_idle_positions(&mut self) {
        let center_x = self.width / 2.0 - PADDLE_WIDTH / 2.0;
        let center_y = self.height / 2.0 - PADDLE_HEIGHT / 2.0;

        self.player.pos = Vec2::new(center_x - IDLE_NET_GAP, center_y);
        self.opponent.pos = Vec2::new(center_x + IDLE_NET_GAP, center_y);
        self.ball.pos = self.court_center_ball();
        self.ball.vel = Vec2::ZERO;
    }

    /// Paddles at their playing positions on each side
    pub fn place_paddles_on_sides(&mut self) {
        self.player.pos.x = PADDLE_INSET;
        self.opponent.pos.x = self.width - PADDLE_INSET - PADDLE_WIDTH;
    }

    /// Apply a new court size
    pub fn resize(&mut self, width: f32, height: f32, running: bool) {
        self.width = width;
        self.height = height;
        self.player.pos.y = clamp_paddle_y(self.player.pos.y, height);
        self.opponent.pos.y = clamp_paddle_y(self.opponent.pos.y, height);

        if running {
            self.place_paddles_on_sides();
        } else {
            self.set_idle_positions();
        }
    }

    /// Clear score and rally bookkeeping for a new match
    pub fn reset_match(&mut self, tuning: Tuning) {
        self.tuning = tuning;
        self.ai = AiController::default();
        self.player_vel = 0.0;
        self.score_you = 0;
        self.score_opponent = 0;
        self.rally = 0;
        self.best_rally_this_match = 0;
        self.time_ticks = 0;
    }

    /// Reset positions and relaunch the ball toward `toward`
    pub fn serve<R: Rng + ?Sized>(&mut self, toward: Side, rng: &mut R) {
        self.place_paddles_on_sides();
        self.player.pos.y = clamp_paddle_y(self.player.pos.y, self.height);
        self.opponent.pos.y = clamp_paddle_y(self.height / 2.0 - PADDLE_HEIGHT / 2.0, self.height);
        self.ball.pos = self.court_center_ball();

        let dir = match toward {
            Side::Opponent => 1.0,
            Side::Player => -1.0,
        };
        let angle = rng.random::<f32>() * 0.9 - 0.45;
        let base = self.tuning.serve_speed;

        self.ball.vel = Vec2::new(
            dir * (base + rng.random::<f32>() * 48.0),
            angle * (base + rng.random::<f32>() * 36.0),
        )
        .clamp_length_max(self.tuning.max_ball_speed);

        self.rally = 0;
    }

    /// Move the player paddle, keeping it in bounds
    pub fn set_player_y(&mut self, y: f32) {
        self.player.pos.y = clamp_paddle_y(y, self.height);
    }

    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.score_you,
            Side::Opponent => self.score_opponent,
        }
    }

    /// Credit a point. The rally counter is cleared by the next serve.
    pub fn credit_point(&mut self, side: Side) {
        match side {
            Side::Player => self.score_you += 1,
            Side::Opponent => self.score_opponent += 1,
        }
    }

    /// Count a return toward the rally and this match's best
    pub fn count_return(&mut self) {
        self.rally += 1;
        self.best_rally_this_match = self.best_rally_this_match.max(self.rally);
    }

    fn court_center_ball(&self) -> Vec2 {
        Vec2::new(
            self.width / 2.0 - BALL_SIZE / 2.0,
            self.height / 2.0 - BALL_SIZE / 2.0,
        )
    }
}
