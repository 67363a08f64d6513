//! Fixed timestep simulation tick
//!
//! One call advances the rally by exactly `dt`: player input, opponent AI, then
//! the ball. Scoring decisions are left to the caller, which sees them through
//! the returned [`BallEvents`].

use rand::Rng;

use super::physics::{BallEvents, step_ball};
use super::state::SimulationState;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Requested player paddle top (px), already mapped from the pointer
    pub player_y: Option<f32>,
    /// Recent player paddle velocity (px/s)
    pub player_vel: f32,
}

/// Advance the rally by one fixed timestep
pub fn tick<R: Rng + ?Sized>(
    state: &mut SimulationState,
    input: &TickInput,
    rng: &mut R,
    dt: f32,
) -> BallEvents {
    state.time_ticks += 1;

    if let Some(y) = input.player_y {
        state.set_player_y(y);
    }
    state.player_vel = input.player_vel;

    state.ai.update(
        &mut state.opponent,
        &state.ball,
        &state.tuning,
        state.height,
        rng,
        dt,
    );

    step_ball(state, dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::state::Side;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn served(seed: u64) -> (SimulationState, Pcg32) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut state = SimulationState::new(720.0, 420.0);
        state.serve(Side::Opponent, &mut rng);
        (state, rng)
    }

    #[test]
    fn test_tick_applies_player_input() {
        let (mut state, mut rng) = served(1);
        let input = TickInput {
            player_y: Some(500.0),
            player_vel: 240.0,
        };
        tick(&mut state, &input, &mut rng, SIM_DT);
        assert_eq!(state.player.pos.y, 420.0 - PADDLE_HEIGHT - PADDLE_MARGIN);
        assert_eq!(state.player_vel, 240.0);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_tick_without_pointer_keeps_paddle() {
        let (mut state, mut rng) = served(2);
        let before = state.player.pos.y;
        tick(&mut state, &TickInput::default(), &mut rng, SIM_DT);
        assert_eq!(state.player.pos.y, before);
    }

    #[test]
    fn test_tick_moves_ball_and_opponent() {
        let (mut state, mut rng) = served(3);
        state.opponent.pos.y = PADDLE_MARGIN;
        state.tuning.lock_chance = 0.0;
        let ball_before = state.ball.pos;

        tick(&mut state, &TickInput::default(), &mut rng, SIM_DT);
        assert_ne!(state.ball.pos, ball_before);
        assert!(state.opponent.pos.y > PADDLE_MARGIN);
    }

    #[test]
    fn test_tick_reports_point() {
        let (mut state, mut rng) = served(4);
        state.ball.pos = Vec2::new(720.0 + 38.0, 200.0);
        state.ball.vel = Vec2::new(400.0, 0.0);
        let events = tick(&mut state, &TickInput::default(), &mut rng, SIM_DT);
        assert_eq!(events.point_to, Some(Side::Player));
    }

    #[test]
    fn test_determinism() {
        // Two sessions with the same seed and inputs stay identical
        let (mut state1, mut rng1) = served(99999);
        let (mut state2, mut rng2) = served(99999);

        let inputs = [
            TickInput {
                player_y: Some(120.0),
                player_vel: 0.0,
            },
            TickInput {
                player_y: Some(140.0),
                player_vel: 2400.0,
            },
            TickInput::default(),
        ];

        for _ in 0..200 {
            for input in &inputs {
                tick(&mut state1, input, &mut rng1, SIM_DT);
                tick(&mut state2, input, &mut rng2, SIM_DT);
            }
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.ball, state2.ball);
        assert_eq!(state1.opponent, state2.opponent);
        assert_eq!(state1.ai, state2.ai);
    }
}
