//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - One step per rendered frame, no sub-stepping
//! - Seeded RNG only
//! - No rendering, audio, network or platform dependencies

pub mod ai;
pub mod collision;
pub mod difficulty;
pub mod state;
pub mod tick;

pub use ai::opponent_delta;
pub use collision::{deflect_dx, hit_position};
pub use difficulty::{Difficulty, DifficultyProfile};
pub use state::{Ball, Bounds, Paddle, PlayMode, Score, Side, SimState};
pub use tick::{SimEvent, TickInput, step, tick};
