//! Pong Pro - a two-paddle ball game for the browser
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, opponent AI)
//! - `session`: Mode lifecycle (menu, play, pause, game over)
//! - `net`: Host-authoritative room protocol over a shared key-value store
//! - `app`: Frame-loop context tying the pieces together
//! - `render` / `audio`: Thin adapters driven by simulation state and events

pub mod app;
pub mod audio;
pub mod highscores;
pub mod net;
pub mod render;
pub mod session;
pub mod settings;
pub mod sim;

pub use app::App;
pub use highscores::HighScores;
pub use session::{Notice, Phase, Session};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Ball radius in pixels
    pub const BALL_RADIUS: f32 = 8.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 100.0;
    pub const PADDLE_HEIGHT: f32 = 15.0;
    /// Distance from the bottom edge to the top of the player's paddle
    pub const PADDLE_BOTTOM_OFFSET: f32 = 30.0;
    /// Y of the opponent paddle
    pub const PADDLE_TOP_Y: f32 = 15.0;

    /// Horizontal speed range produced by a paddle hit: dx = (hit - 0.5) * this
    pub const PADDLE_DEFLECTION: f32 = 10.0;

    /// Opponent ignores offsets smaller than this (pixels)
    pub const AI_DEAD_ZONE: f32 = 5.0;

    /// Serve speed after every point in vs-AI and networked matches (pixels/frame)
    pub const COMPETITIVE_SERVE_SPEED: f32 = 4.0;

    /// First side to reach this wins a competitive match
    pub const WIN_SCORE: u32 = 10;

    pub const STARTING_LIVES: u32 = 3;
    /// A bonus life is granted whenever the new level is a multiple of this
    pub const BONUS_LIFE_EVERY: u32 = 5;

    /// Fallback playfield when no surface has been measured yet
    pub const DEFAULT_CANVAS_WIDTH: f32 = 600.0;
    pub const DEFAULT_CANVAS_HEIGHT: f32 = 600.0;
}
