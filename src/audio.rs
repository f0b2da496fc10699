//! Audio cues
//!
//! Procedurally generated sound effects, no asset files. Simulation events
//! map to [`SoundEffect`]s, each of which is a short sequence of
//! [`ToneCue`]s handed to an [`AudioSink`].

use crate::sim::{Side, SimEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One oscillator note with an exponential fade-out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneCue {
    /// Hz
    pub frequency: f32,
    /// Seconds
    pub duration: f64,
    /// Seconds after the effect starts
    pub delay: f64,
    pub waveform: Waveform,
    /// Relative loudness before volume settings are applied
    pub gain: f32,
}

impl ToneCue {
    const fn new(frequency: f32, duration: f64, waveform: Waveform, gain: f32) -> Self {
        Self {
            frequency,
            duration,
            delay: 0.0,
            waveform,
            gain,
        }
    }

    const fn after(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Ball hits a paddle
    PaddleHit,
    /// Ball hits a side wall or the ceiling
    WallBounce,
    /// Local player scored
    Score,
    /// Opponent scored or a life was lost
    LifeLost,
    LevelUp,
    GameOver,
}

impl SoundEffect {
    /// Effect for a simulation event. `local` is the side the listener plays.
    pub fn for_event(event: &SimEvent, local: Side) -> Option<Self> {
        match event {
            SimEvent::PaddleHit { .. } => Some(SoundEffect::PaddleHit),
            SimEvent::WallBounce => Some(SoundEffect::WallBounce),
            SimEvent::PointScored { side, .. } if *side == local => Some(SoundEffect::Score),
            SimEvent::PointScored { .. } | SimEvent::LifeLost { .. } => {
                Some(SoundEffect::LifeLost)
            }
            SimEvent::LevelUp { .. } => Some(SoundEffect::LevelUp),
            SimEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            SimEvent::BonusLife { .. } | SimEvent::BallReset => None,
        }
    }

    pub fn cues(self) -> &'static [ToneCue] {
        match self {
            SoundEffect::PaddleHit => PADDLE_HIT,
            SoundEffect::WallBounce => WALL_BOUNCE,
            SoundEffect::Score => SCORE,
            SoundEffect::LifeLost => LIFE_LOST,
            SoundEffect::LevelUp => LEVEL_UP,
            SoundEffect::GameOver => GAME_OVER,
        }
    }
}

/// Solid thump
const PADDLE_HIT: &[ToneCue] = &[ToneCue::new(220.0, 0.1, Waveform::Square, 0.5)];
/// Higher ping
const WALL_BOUNCE: &[ToneCue] = &[ToneCue::new(400.0, 0.08, Waveform::Sine, 0.3)];
const SCORE: &[ToneCue] = &[
    ToneCue::new(600.0, 0.12, Waveform::Triangle, 0.3),
    ToneCue::new(800.0, 0.15, Waveform::Triangle, 0.3).after(0.08),
];
const LIFE_LOST: &[ToneCue] = &[ToneCue::new(110.0, 0.3, Waveform::Sawtooth, 0.4)];
/// Rising fanfare
const LEVEL_UP: &[ToneCue] = &[
    ToneCue::new(400.0, 0.15, Waveform::Triangle, 0.3),
    ToneCue::new(500.0, 0.15, Waveform::Triangle, 0.3).after(0.1),
    ToneCue::new(600.0, 0.15, Waveform::Triangle, 0.3).after(0.2),
    ToneCue::new(800.0, 0.3, Waveform::Triangle, 0.3).after(0.3),
];
/// Sad descending
const GAME_OVER: &[ToneCue] = &[
    ToneCue::new(400.0, 0.3, Waveform::Sine, 0.3),
    ToneCue::new(350.0, 0.3, Waveform::Sine, 0.3).after(0.2),
    ToneCue::new(300.0, 0.3, Waveform::Sine, 0.3).after(0.4),
    ToneCue::new(200.0, 0.4, Waveform::Sine, 0.3).after(0.6),
];

/// Anything that can play tones. Fire-and-forget.
pub trait AudioSink {
    fn play(&mut self, cue: &ToneCue, volume: f32);

    fn play_effect(&mut self, effect: SoundEffect, volume: f32) {
        if volume <= 0.0 {
            return;
        }
        for cue in effect.cues() {
            self.play(cue, volume);
        }
    }
}

/// Sink for headless runs. Counts what would have played.
#[derive(Debug, Default)]
pub struct SilentAudio {
    pub played: Vec<ToneCue>,
}

impl AudioSink for SilentAudio {
    fn play(&mut self, cue: &ToneCue, _volume: f32) {
        self.played.push(*cue);
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, ToneCue, Waveform};

    /// Web Audio backed sink
    pub struct AudioManager {
        ctx: Option<AudioContext>,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Not available outside secure contexts
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }
    }

    fn oscillator_type(waveform: Waveform) -> OscillatorType {
        match waveform {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Square => OscillatorType::Square,
            Waveform::Triangle => OscillatorType::Triangle,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
        }
    }

    impl AudioSink for AudioManager {
        fn play(&mut self, cue: &ToneCue, volume: f32) {
            let Some(ctx) = &self.ctx else { return };

            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let Some((osc, gain)) =
                Self::create_osc(ctx, cue.frequency, oscillator_type(cue.waveform))
            else {
                return;
            };
            let t = ctx.current_time() + cue.delay;

            gain.gain().set_value_at_time(volume * cue.gain, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + cue.duration)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + cue.duration + 0.05).ok();
        }
    }
}
