//! Game state and core simulation types
//!
//! Everything the authority needs to advance a frame lives in [`SimState`].

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::DifficultyProfile;
use crate::consts::*;

/// One side of the table. Player 1 owns the bottom paddle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    /// Player number as shown to users (1 or 2)
    pub fn number(self) -> u8 {
        match self {
            Side::Player1 => 1,
            Side::Player2 => 2,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Player1 => Side::Player2,
            Side::Player2 => Side::Player1,
        }
    }
}

/// Which game is being simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    /// Single paddle, lives and levels, ceiling bounces
    Solo,
    /// Player versus scripted opponent
    VsAi,
    /// Two clients sharing a room
    Multiplayer,
}

impl PlayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayMode::Solo => "solo",
            PlayMode::VsAi => "vs-ai",
            PlayMode::Multiplayer => "multiplayer",
        }
    }

    /// Solo games bounce off the top wall instead of scoring
    pub fn has_ceiling(&self) -> bool {
        matches!(self, PlayMode::Solo)
    }

    /// Whether a top paddle takes part
    pub fn has_opponent(&self) -> bool {
        !self.has_ceiling()
    }
}

/// Playfield size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Degenerate surfaces (not yet laid out) can't host a game
    pub fn is_usable(&self) -> bool {
        self.width > PADDLE_WIDTH && self.height > PADDLE_BOTTOM_OFFSET * 2.0
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

/// The ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    /// Velocity in pixels per frame
    pub vel: Vec2,
    pub radius: f32,
}

impl Ball {
    /// A resting ball in the middle of the field
    pub fn centered(bounds: Bounds) -> Self {
        Self {
            pos: bounds.center(),
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
        }
    }

    pub fn top(&self) -> f32 {
        self.pos.y - self.radius
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.radius
    }
}

/// A paddle. `y` never changes after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Paddle {
    /// Player 1 paddle, centered near the bottom edge
    pub fn bottom(bounds: Bounds) -> Self {
        Self {
            x: bounds.width / 2.0 - PADDLE_WIDTH / 2.0,
            y: bounds.height - PADDLE_BOTTOM_OFFSET,
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
        }
    }

    /// Player 2 paddle, centered near the top edge
    pub fn top(bounds: Bounds) -> Self {
        Self {
            x: bounds.width / 2.0 - PADDLE_WIDTH / 2.0,
            y: PADDLE_TOP_Y,
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
        }
    }

    pub fn max_x(&self, canvas_width: f32) -> f32 {
        (canvas_width - self.width).max(0.0)
    }

    /// Move to `x`, clamped to `[0, canvas_width - width]`
    pub fn set_x(&mut self, x: f32, canvas_width: f32) {
        let x = if x.is_finite() { x } else { self.x };
        self.x = x.clamp(0.0, self.max_x(canvas_width));
    }

    /// Center the paddle under a pointer position
    pub fn follow_pointer(&mut self, pointer_x: f32, canvas_width: f32) {
        self.set_x(pointer_x - self.width / 2.0, canvas_width);
    }

    pub fn center(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Strictly inside the paddle's horizontal span
    pub fn spans(&self, x: f32) -> bool {
        x > self.x && x < self.x + self.width
    }
}

/// Points per side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub player1: u32,
    pub player2: u32,
}

impl Score {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Player1 => self.player1,
            Side::Player2 => self.player2,
        }
    }

    /// Add one point, returns the new total for that side
    pub fn award(&mut self, side: Side) -> u32 {
        let slot = match side {
            Side::Player1 => &mut self.player1,
            Side::Player2 => &mut self.player2,
        };
        *slot = slot.saturating_add(1);
        *slot
    }

    /// First side at or past `target`, player 1 checked first
    pub fn winner(&self, target: u32) -> Option<Side> {
        if self.player1 >= target {
            Some(Side::Player1)
        } else if self.player2 >= target {
            Some(Side::Player2)
        } else {
            None
        }
    }
}

/// Complete simulation state for one game (owned by the authority)
#[derive(Debug, Clone)]
pub struct SimState {
    pub mode: PlayMode,
    pub profile: DifficultyProfile,
    pub bounds: Bounds,
    pub ball: Ball,
    /// Bottom paddle (local player / host)
    pub paddle1: Paddle,
    /// Top paddle (AI or remote guest)
    pub paddle2: Paddle,
    pub score: Score,
    /// Remaining lives (solo only)
    pub lives: u32,
    /// Current level, starting at 1 (solo only)
    pub level: u32,
    pub game_over: bool,
    pub winner: Option<Side>,
    /// Frames simulated so far
    pub frames: u64,
    rng: Pcg32,
}

impl SimState {
    /// Fresh game with the ball served toward the bottom player's half
    pub fn new(mode: PlayMode, profile: DifficultyProfile, bounds: Bounds, seed: u64) -> Self {
        let mut state = Self {
            mode,
            profile,
            bounds,
            ball: Ball::centered(bounds),
            paddle1: Paddle::bottom(bounds),
            paddle2: Paddle::top(bounds),
            score: Score::default(),
            lives: STARTING_LIVES,
            level: 1,
            game_over: false,
            winner: None,
            frames: 0,
            rng: Pcg32::seed_from_u64(seed),
        };
        match mode {
            PlayMode::Multiplayer => {
                // Rooms always open with the same seed velocity
                state.ball.vel = Vec2::new(COMPETITIVE_SERVE_SPEED, -COMPETITIVE_SERVE_SPEED);
            }
            PlayMode::Solo => state.serve(-1.0),
            // Only the opening serve uses the difficulty's ball speed
            PlayMode::VsAi => state.serve_at(profile.ball_speed, -1.0),
        }
        state
    }

    /// Speed of a serve after a point, for the current mode and level
    pub fn serve_speed(&self) -> f32 {
        match self.mode {
            PlayMode::Solo => self.profile.level_speed(self.level),
            PlayMode::VsAi | PlayMode::Multiplayer => COMPETITIVE_SERVE_SPEED,
        }
    }

    /// Re-center the ball with a random horizontal sign.
    /// `vertical` is -1.0 (upward) or 1.0 (downward).
    pub fn serve(&mut self, vertical: f32) {
        self.serve_at(self.serve_speed(), vertical);
    }

    fn serve_at(&mut self, speed: f32, vertical: f32) {
        let horizontal = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        self.ball.pos = self.bounds.center();
        self.ball.vel = Vec2::new(speed * horizontal, speed * vertical.signum());
    }

    /// Move the local paddle under the pointer
    pub fn move_paddle1(&mut self, pointer_x: f32) {
        self.paddle1.follow_pointer(pointer_x, self.bounds.width);
    }

    /// Place the top paddle at an absolute x (remote peer position)
    pub fn set_paddle2_x(&mut self, x: f32) {
        self.paddle2.set_x(x, self.bounds.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Difficulty;

    #[test]
    fn test_new_solo_serves_upward() {
        let state = SimState::new(
            PlayMode::Solo,
            Difficulty::Hard.profile(),
            Bounds::new(600.0, 600.0),
            7,
        );
        assert_eq!(state.ball.pos, Vec2::new(300.0, 300.0));
        assert_eq!(state.ball.vel.x.abs(), 5.0);
        assert_eq!(state.ball.vel.y, -5.0);
        assert_eq!(state.lives, STARTING_LIVES);
        assert_eq!(state.level, 1);
    }

    #[test]
    fn test_multiplayer_seed_velocity() {
        let state = SimState::new(
            PlayMode::Multiplayer,
            Difficulty::Easy.profile(),
            Bounds::new(500.0, 600.0),
            1,
        );
        assert_eq!(state.ball.vel, Vec2::new(4.0, -4.0));
    }

    #[test]
    fn test_paddle_layout() {
        let bounds = Bounds::new(600.0, 720.0);
        let bottom = Paddle::bottom(bounds);
        let top = Paddle::top(bounds);
        assert_eq!(bottom.x, 250.0);
        assert_eq!(bottom.y, 690.0);
        assert_eq!(top.y, 15.0);
    }

    #[test]
    fn test_follow_pointer_clamps() {
        let mut paddle = Paddle::bottom(Bounds::default());
        paddle.follow_pointer(-500.0, 600.0);
        assert_eq!(paddle.x, 0.0);
        paddle.follow_pointer(10_000.0, 600.0);
        assert_eq!(paddle.x, 500.0);
        paddle.follow_pointer(f32::NAN, 600.0);
        assert_eq!(paddle.x, 500.0);
    }

    #[test]
    fn test_score_winner_prefers_player1() {
        let score = Score {
            player1: 10,
            player2: 10,
        };
        assert_eq!(score.winner(10), Some(Side::Player1));
        assert_eq!(Score::default().winner(10), None);
    }

    #[test]
    fn test_same_seed_same_serve() {
        let a = SimState::new(PlayMode::VsAi, Difficulty::Medium.profile(), Bounds::default(), 42);
        let b = SimState::new(PlayMode::VsAi, Difficulty::Medium.profile(), Bounds::default(), 42);
        assert_eq!(a.ball.vel, b.ball.vel);
    }
}
