//! Deterministic simulation module
//!
//! The rally itself lives here. This module must stay pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, passed in by the caller
//! - No rendering, audio, storage or platform dependencies

pub mod ai;
pub mod clock;
pub mod physics;
pub mod state;
pub mod tick;

pub use ai::AiController;
pub use clock::FixedStepper;
pub use physics::{BallEvents, step_ball};
pub use state::{Ball, Paddle, Side, SimulationState};
pub use tick::{TickInput, tick};
