//! Ball integration and collision response
//!
//! Walls reflect elastically. Paddle hits reflect, add spin, speed the ball up and
//! re-apply the speed cap. Checks run in a fixed order each tick:
//! player paddle, opponent paddle, then out-of-bounds.

use super::state::{Side, SimulationState};
use crate::consts::*;

/// What happened to the ball during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BallEvents {
    pub wall_bounce: bool,
    /// Paddle that returned the ball this tick
    pub returned_by: Option<Side>,
    /// Side credited with a point this tick
    pub point_to: Option<Side>,
}

/// Advance the ball by `dt` seconds and resolve collisions
pub fn step_ball(state: &mut SimulationState, dt: f32) -> BallEvents {
    let mut events = BallEvents::default();

    // Integrate
    state.ball.pos += state.ball.vel * dt;

    // Walls
    let bottom = state.height - WALL_BOTTOM_INSET;
    if state.ball.pos.y <= WALL_TOP {
        state.ball.pos.y = WALL_TOP;
        state.ball.vel.y = state.ball.vel.y.abs();
        events.wall_bounce = true;
    }
    if state.ball.pos.y >= bottom {
        state.ball.pos.y = bottom;
        state.ball.vel.y = -state.ball.vel.y.abs();
        events.wall_bounce = true;
    }

    // Paddles, only when the ball is heading at them
    if state.ball.vel.x < 0.0 && state.player.overlaps(state.ball.pos, BALL_SIZE) {
        state.ball.pos.x = state.player.pos.x + state.player.size.x + 1.0;
        state.ball.vel.x = -state.ball.vel.x;

        let spin = (state.player_vel * PLAYER_SPIN_GAIN).clamp(-PLAYER_SPIN_MAX, PLAYER_SPIN_MAX);
        state.ball.vel.y += spin;

        speed_up(state);
        state.count_return();
        events.returned_by = Some(Side::Player);
    } else if state.ball.vel.x > 0.0 && state.opponent.overlaps(state.ball.pos, BALL_SIZE) {
        state.ball.pos.x = state.opponent.pos.x - BALL_SIZE - 1.0;
        state.ball.vel.x = -state.ball.vel.x;

        let offset = state.ball.center().y - state.opponent.center_y();
        let spin = (offset * OPPONENT_SPIN_GAIN * state.tuning.factor)
            .clamp(-OPPONENT_SPIN_MAX, OPPONENT_SPIN_MAX);
        state.ball.vel.y += spin;

        speed_up(state);
        state.count_return();
        events.returned_by = Some(Side::Opponent);
    }

    // A return puts the ball back on the court, so it never also scores
    if events.returned_by.is_none() {
        if state.ball.pos.x < -OUT_OF_BOUNDS_MARGIN {
            events.point_to = Some(Side::Opponent);
        } else if state.ball.pos.x > state.width + OUT_OF_BOUNDS_MARGIN {
            events.point_to = Some(Side::Player);
        }
    }

    events
}

/// Ramp intensity across a rally, then cap the magnitude (direction preserved)
fn speed_up(state: &mut SimulationState) {
    state.ball.vel.x *= state.tuning.ball_accel;
    state.ball.vel.y *= BALL_ACCEL_Y;
    state.ball.vel = state.ball.vel.clamp_length_max(state.tuning.max_ball_speed);
}
