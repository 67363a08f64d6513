//! Opponent paddle controller
//!
//! Proportional tracking with bounded speed, a velocity-based read of where the
//! ball is heading, and random hesitation windows that keep it beatable.

use rand::Rng;

use super::state::{Ball, Paddle};
use crate::clamp_paddle_y;
use crate::consts::*;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AiController {
    /// Ticks left in the current hesitation
    pub lock: u32,
    /// Velocity commanded on the last moving tick (px/s)
    pub velocity: f32,
}

impl AiController {
    /// Advance the controller by one tick, moving `paddle` toward the ball
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        paddle: &mut Paddle,
        ball: &Ball,
        tuning: &Tuning,
        court_height: f32,
        rng: &mut R,
        dt: f32,
    ) {
        if self.lock > 0 {
            self.lock -= 1;
            self.velocity = 0.0;
            return;
        }

        let mut target = ball.center().y - paddle.size.y / 2.0;
        if ball.vel.x > 0.0 {
            // Read the bounce ahead of time
            target += ball.vel.y * AI_LOOKAHEAD * tuning.prediction;
        }
        let target = clamp_paddle_y(target, court_height);

        let desired = ((target - paddle.pos.y) * tuning.ai_gain)
            .clamp(-tuning.ai_max_speed, tuning.ai_max_speed);
        paddle.pos.y = clamp_paddle_y(paddle.pos.y + desired * dt, court_height);
        self.velocity = desired;

        if rng.random::<f32>() < tuning.lock_chance {
            self.lock = rng.random_range(AI_LOCK_MIN_TICKS..=AI_LOCK_MAX_TICKS);
            log::debug!("AI hesitates for {} ticks", self.lock);
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn no_hesitation() -> Tuning {
        Tuning {
            lock_chance: 0.0,
            ..Tuning::default()
        }
    }

    #[test]
    fn test_locked_ai_does_not_move() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut ai = AiController {
            lock: 3,
            velocity: 0.0,
        };
        let mut paddle = Paddle::new(690.0, 100.0);
        let ball = Ball {
            pos: Vec2::new(400.0, 380.0),
            vel: Vec2::new(300.0, 0.0),
        };

        ai.update(&mut paddle, &ball, &Tuning::default(), 420.0, &mut rng, SIM_DT);
        assert_eq!(paddle.pos.y, 100.0);
        assert_eq!(ai.lock, 2);
    }

    #[test]
    fn test_tracks_toward_ball() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut ai = AiController::default();
        let mut paddle = Paddle::new(690.0, 100.0);
        let ball = Ball {
            pos: Vec2::new(400.0, 300.0),
            vel: Vec2::new(-300.0, 0.0),
        };

        ai.update(&mut paddle, &ball, &no_hesitation(), 420.0, &mut rng, SIM_DT);
        assert!(paddle.pos.y > 100.0);
        assert!(ai.velocity > 0.0);
    }

    #[test]
    fn test_speed_is_bounded() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut ai = AiController::default();
        let tuning = Tuning {
            ai_gain: 1000.0,
            ..no_hesitation()
        };
        let mut paddle = Paddle::new(690.0, 12.0);
        let ball = Ball {
            pos: Vec2::new(400.0, 390.0),
            vel: Vec2::new(-300.0, 0.0),
        };

        ai.update(&mut paddle, &ball, &tuning, 420.0, &mut rng, SIM_DT);
        assert!((paddle.pos.y - (12.0 + tuning.ai_max_speed * SIM_DT)).abs() < 1e-3);
    }

    #[test]
    fn test_prediction_only_when_approaching() {
        let mut rng = Pcg32::seed_from_u64(1);
        let tuning = no_hesitation();
        let approaching = Ball {
            pos: Vec2::new(400.0, 200.0),
            vel: Vec2::new(300.0, 400.0),
        };
        let leaving = Ball {
            vel: Vec2::new(-300.0, 400.0),
            ..approaching
        };

        let mut a = Paddle::new(690.0, 167.0);
        let mut b = a;
        AiController::default().update(&mut a, &approaching, &tuning, 420.0, &mut rng, SIM_DT);
        AiController::default().update(&mut b, &leaving, &tuning, 420.0, &mut rng, SIM_DT);
        assert!(a.pos.y > b.pos.y);
    }

    #[test]
    fn test_hesitation_arms_lock() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut ai = AiController::default();
        let tuning = Tuning {
            lock_chance: 1.0,
            ..Tuning::default()
        };
        let mut paddle = Paddle::new(690.0, 100.0);
        let ball = Ball::default();

        ai.update(&mut paddle, &ball, &tuning, 420.0, &mut rng, SIM_DT);
        assert!((AI_LOCK_MIN_TICKS..=AI_LOCK_MAX_TICKS).contains(&ai.lock));
        assert!(ai.is_locked());
    }

    proptest! {
        #[test]
        fn prop_ai_paddle_stays_in_bounds(
            seed in any::<u64>(),
            start_y in -100.0f32..600.0,
            ball_y in -200.0f32..800.0,
            vel_y in -900.0f32..900.0,
            height in 150.0f32..900.0,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut ai = AiController::default();
            let mut paddle = Paddle::new(690.0, start_y);
            let ball = Ball { pos: Vec2::new(400.0, ball_y), vel: Vec2::new(400.0, vel_y) };
            let tuning = Tuning::from_level(&crate::tuning::LEVELS[5]);

            for _ in 0..50 {
                ai.update(&mut paddle, &ball, &tuning, height, &mut rng, SIM_DT);
                prop_assert!(paddle.pos.y >= PADDLE_MARGIN);
                prop_assert!(paddle.pos.y <= (height - PADDLE_HEIGHT - PADDLE_MARGIN).max(PADDLE_MARGIN));
            }
        }
    }
}
