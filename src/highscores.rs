//! Solo leaderboard
//!
//! Persisted to LocalStorage, keeps the best 10 solo runs.

use serde::{Deserialize, Serialize};

use crate::sim::Difficulty;

pub const MAX_HIGH_SCORES: usize = 10;

/// One finished solo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u32,
    /// Level reached
    pub level: u32,
    pub difficulty: Difficulty,
    /// Unix timestamp (ms)
    pub timestamp: f64,
}

impl HighScoreEntry {
    /// Single line for the leaderboard panel
    pub fn summary(&self, rank: usize) -> String {
        format!(
            "{rank}. {} pts - level {} ({})",
            self.score,
            self.level,
            self.difficulty.as_str()
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    const STORAGE_KEY: &'static str = "pong_pro_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Zero never qualifies; otherwise a free slot or beating the last entry
    pub fn qualifies(&self, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Record a run. Returns the 1-indexed rank, or `None` if it didn't place.
    pub fn add_score(
        &mut self,
        score: u32,
        level: u32,
        difficulty: Difficulty,
        timestamp: f64,
    ) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            level,
            difficulty,
            timestamp,
        };

        // Sorted descending; ties keep the older run first
        let rank = match self.entries.iter().position(|e| score > e.score) {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }

    /// Load high scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(scores) = serde_json::from_str::<HighScores>(&json) {
                    log::info!("Loaded {} high scores", scores.entries.len());
                    return scores;
                }
            }
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    /// Save high scores to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("High scores saved ({} entries)", self.entries.len());
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_never_qualifies() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(0, 1, Difficulty::Easy, 0.0), None);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_sorted_and_capped() {
        let mut scores = HighScores::new();
        for score in 1..=12 {
            scores.add_score(score, 1, Difficulty::Medium, score as f64);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(12));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(3));

        assert!(!scores.qualifies(3));
        assert_eq!(scores.add_score(7, 2, Difficulty::Hard, 99.0), Some(7));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(4));
    }

    #[test]
    fn test_summary_line() {
        let entry = HighScoreEntry {
            score: 14,
            level: 3,
            difficulty: Difficulty::Hard,
            timestamp: 0.0,
        };
        assert_eq!(entry.summary(1), "1. 14 pts - level 3 (hard)");
    }
}
