//! Difficulty presets
//!
//! A profile is chosen once per solo/AI session and never mutated.

use serde::{Deserialize, Serialize};

/// Difficulty levels offered on the select screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                ball_speed: 3.0,
                ai_speed: 2.0,
                speed_increase: 1.05,
                points_per_level: 10,
            },
            Difficulty::Medium => DifficultyProfile {
                ball_speed: 4.0,
                ai_speed: 3.0,
                speed_increase: 1.1,
                points_per_level: 7,
            },
            Difficulty::Hard => DifficultyProfile {
                ball_speed: 5.0,
                ai_speed: 4.0,
                speed_increase: 1.15,
                points_per_level: 5,
            },
        }
    }
}

/// Tuning values for one difficulty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Serve speed at level 1 (pixels/frame, per axis)
    pub ball_speed: f32,
    /// Opponent paddle speed (pixels/frame)
    pub ai_speed: f32,
    /// Velocity multiplier applied on each level-up
    pub speed_increase: f32,
    /// Points needed per level
    pub points_per_level: u32,
}

impl DifficultyProfile {
    /// Serve speed for a given level: `ball_speed * speed_increase^(level - 1)`
    pub fn level_speed(&self, level: u32) -> f32 {
        let exponent = level.saturating_sub(1) as i32;
        self.ball_speed * self.speed_increase.powi(exponent)
    }

    /// True when `score` just completed a level
    pub fn is_level_threshold(&self, score: u32) -> bool {
        self.points_per_level > 0 && score > 0 && score % self.points_per_level == 0
    }
}
