//! Game settings and preferences
//!
//! Persisted in LocalStorage next to the leaderboard.

use serde::{Deserialize, Serialize};

use crate::sim::{Bounds, Difficulty};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Layout ===
    /// Upper bound for the canvas width in pixels
    pub max_canvas_width: f32,
    /// Canvas height as a fraction of the window height
    pub height_fraction: f32,
    /// Canvas height never exceeds width times this
    pub max_aspect: f32,
    /// Horizontal space left around the canvas
    pub horizontal_margin: f32,

    /// Preselected in the difficulty picker
    pub last_difficulty: Difficulty,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            max_canvas_width: 600.0,
            height_fraction: 0.6,
            max_aspect: 1.2,
            horizontal_margin: 40.0,

            last_difficulty: Difficulty::default(),
        }
    }
}

impl Settings {
    /// Volume handed to the audio sink
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Canvas size for a window of the given inner size
    pub fn canvas_size(&self, window_width: f32, window_height: f32) -> Bounds {
        let width = (window_width - self.horizontal_margin)
            .min(self.max_canvas_width)
            .max(0.0);
        let height = (window_height * self.height_fraction)
            .min(width * self.max_aspect)
            .max(0.0);
        Bounds::new(width.floor(), height.floor())
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "pong_pro_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(err) => log::warn!("Ignoring unreadable settings: {}", err),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
