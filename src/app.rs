//! Frame-loop context
//!
//! [`App`] owns everything a running client needs. The platform shell calls
//! the UI actions from its event handlers and [`App::frame`] once per display
//! refresh; there is no other global state.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::audio::{AudioSink, SoundEffect};
use crate::highscores::HighScores;
use crate::net::{JoinError, Role, RoomStatus, RoomStore, create_room, join_room};
use crate::render::{DrawCmd, FrameView, Surface, compose, BACKGROUND};
use crate::session::{Notice, Phase, Session};
use crate::settings::Settings;
use crate::sim::{Bounds, Difficulty, PlayMode, Side, SimEvent, TickInput};

pub struct App<S: RoomStore> {
    session: Session,
    store: S,
    role: Option<Role>,
    settings: Settings,
    highscores: HighScores,
    rng: Pcg32,
    /// Pointer x in surface pixels
    pointer_x: Option<f32>,
    /// Last usable surface size
    surface: Bounds,
    /// Rank of the last recorded solo run
    last_rank: Option<usize>,
}

impl<S: RoomStore> App<S> {
    pub fn new(store: S, settings: Settings, highscores: HighScores, seed: u64) -> Self {
        Self {
            session: Session::new(),
            store,
            role: None,
            settings,
            highscores,
            rng: Pcg32::seed_from_u64(seed),
            pointer_x: None,
            surface: Bounds::default(),
            last_rank: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn highscores(&self) -> &HighScores {
        &self.highscores
    }

    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    /// Pointer moved; `x` is relative to the surface's left edge
    pub fn set_pointer(&mut self, x: f32) {
        self.pointer_x = Some(x);
    }

    /// Update the drawable size, e.g. after a window resize
    pub fn resize(&mut self, bounds: Bounds) {
        if bounds.is_usable() {
            self.surface = bounds;
        }
    }

    // === UI actions ===

    /// Main menu choice
    pub fn choose_mode(&mut self, mode: PlayMode) -> bool {
        match mode {
            PlayMode::Multiplayer => self.session.open_multiplayer_menu(),
            PlayMode::Solo | PlayMode::VsAi => self.session.open_difficulty_select(mode),
        }
    }

    pub fn pick_difficulty(&mut self, difficulty: Difficulty) -> bool {
        let seed = self.rng.random();
        if !self.session.start(difficulty, self.surface, seed) {
            return false;
        }
        self.last_rank = None;
        if self.settings.last_difficulty != difficulty {
            self.settings.last_difficulty = difficulty;
            self.settings.save();
        }
        true
    }

    /// Open a room and wait for an opponent
    pub fn create_room(&mut self) -> bool {
        if self.session.phase() != Phase::MultiplayerMenu {
            return false;
        }
        self.leave_room();
        match create_room(&self.store, self.surface, &mut self.rng) {
            Ok(host) => {
                self.role = Some(Role::Host(host));
                self.session.await_opponent()
            }
            Err(err) => {
                log::warn!("Room creation failed: {}", err);
                self.session.post_notice(Notice::StoreFailure(err.to_string()));
                false
            }
        }
    }

    /// Join a room by the code the host shared
    pub fn join_room(&mut self, code: &str) -> bool {
        if self.session.phase() != Phase::MultiplayerMenu {
            return false;
        }
        self.leave_room();
        match join_room(&self.store, code) {
            Ok(guest) => {
                self.role = Some(Role::Guest(guest));
                self.session.begin_multiplayer()
            }
            Err(JoinError::Store(err)) => {
                log::warn!("Join failed: {}", err);
                self.session.post_notice(Notice::StoreFailure(err.to_string()));
                false
            }
            Err(err) => {
                log::info!("Join rejected: {}", err);
                self.session.post_notice(Notice::JoinRejected(err.to_string()));
                false
            }
        }
    }

    /// Menu back button; cancelling the waiting screen deletes the room
    pub fn back(&mut self) -> bool {
        let waiting = self.session.phase() == Phase::WaitingForOpponent;
        if !self.session.back() {
            return false;
        }
        if waiting {
            self.leave_room();
        }
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.session.toggle_pause()
    }

    /// Back to the main menu from anywhere, abandoning the game
    pub fn return_to_menu(&mut self) {
        self.leave_room();
        self.session.reset();
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.session.dismiss_notice()
    }

    /// Unsubscribe and delete the current room, if any
    pub fn leave_room(&mut self) {
        if let Some(role) = self.role.take() {
            role.leave(&self.store);
        }
    }

    // === Frame ===

    /// Run one display frame. Returns the simulation events it produced.
    pub fn frame(&mut self, surface: &mut dyn Surface, audio: &mut dyn AudioSink) -> Vec<SimEvent> {
        let Some(size) = surface.size().filter(Bounds::is_usable) else {
            return Vec::new();
        };
        self.surface = size;

        let mut events = self.ingest();
        events.extend(self.simulate());

        let volume = self.settings.effective_volume();
        let local = self.local_side();
        for event in &events {
            if let Some(effect) = SoundEffect::for_event(event, local) {
                audio.play_effect(effect, volume);
            }
        }

        if self.session.phase() == Phase::GameOver(PlayMode::Solo)
            && events.iter().any(|e| matches!(e, SimEvent::GameOver { .. }))
        {
            self.record_solo_run();
        }

        let commands = match self.frame_view() {
            Some(view) => compose(&view, size),
            None => vec![DrawCmd::Clear { color: BACKGROUND }],
        };
        surface.draw(&commands);
        events
    }

    /// Drain the room mailbox. Paused games leave it untouched so the latest
    /// snapshot is applied on resume. Returns what a guest saw happen.
    fn ingest(&mut self) -> Vec<SimEvent> {
        let phase = self.session.phase();
        if !matches!(
            phase,
            Phase::WaitingForOpponent | Phase::Playing(PlayMode::Multiplayer)
        ) {
            return Vec::new();
        }
        let Some(status) = self.role.as_mut().and_then(Role::ingest) else {
            return Vec::new();
        };
        let events = match self.role.as_mut() {
            Some(Role::Guest(guest)) => guest.take_events(),
            _ => Vec::new(),
        };
        match status {
            RoomStatus::Waiting => {}
            RoomStatus::Active => {
                if phase == Phase::WaitingForOpponent {
                    self.session.begin_multiplayer();
                }
            }
            RoomStatus::Won(winner) => {
                self.session.finish_multiplayer(winner);
            }
            RoomStatus::Closed => {
                log::info!("Room closed by the other player");
                self.leave_room();
                self.session.opponent_left();
            }
        }
        events
    }

    fn simulate(&mut self) -> Vec<SimEvent> {
        match self.session.phase() {
            Phase::Playing(PlayMode::Multiplayer) => {
                let store = &self.store;
                match self.role.as_mut() {
                    Some(Role::Host(host)) => {
                        let input = TickInput {
                            pointer_x: field_x(self.pointer_x, self.surface, host.sim().bounds),
                        };
                        host.advance(store, &input)
                    }
                    Some(Role::Guest(guest)) => {
                        if let Some(x) = field_x(self.pointer_x, self.surface, guest.view().bounds)
                        {
                            guest.move_paddle(x);
                        }
                        guest.publish(store);
                        Vec::new()
                    }
                    None => Vec::new(),
                }
            }
            Phase::Playing(_) => {
                let bounds = self.session.game().map(|g| g.bounds).unwrap_or(self.surface);
                let input = TickInput {
                    pointer_x: field_x(self.pointer_x, self.surface, bounds),
                };
                self.session.advance(&input)
            }
            _ => Vec::new(),
        }
    }

    fn record_solo_run(&mut self) {
        let Some(game) = self.session.game() else {
            return;
        };
        let (score, level) = (game.score.player1, game.level);
        self.last_rank =
            self.highscores
                .add_score(score, level, self.session.difficulty(), now_ms());
        if let Some(rank) = self.last_rank {
            log::info!("Solo run placed #{} with {} points", rank, score);
            self.highscores.save();
        }
    }

    fn local_side(&self) -> Side {
        self.role.as_ref().map_or(Side::Player1, Role::local_side)
    }

    fn frame_view(&self) -> Option<FrameView> {
        match self.session.phase().mode()? {
            PlayMode::Multiplayer => self.role.as_ref().map(Role::frame_view),
            PlayMode::Solo | PlayMode::VsAi => self.session.game().map(FrameView::of_sim),
        }
    }

    /// Status line for the HUD, from the local player's point of view
    pub fn hud(&self) -> String {
        let phase = self.session.phase();
        if phase == Phase::WaitingForOpponent {
            return match &self.role {
                Some(role) => format!("Room code: {} - waiting for opponent...", role.code()),
                None => "Waiting for opponent...".to_string(),
            };
        }
        let Some(mode) = phase.mode() else {
            return String::new();
        };

        let line = match mode {
            PlayMode::Solo => match self.session.game() {
                Some(game) => format!(
                    "Points: {} | Level: {} | Lives: {}",
                    game.score.player1, game.level, game.lives
                ),
                None => String::new(),
            },
            PlayMode::VsAi => match self.session.game() {
                Some(game) => format!("You: {} | AI: {}", game.score.player1, game.score.player2),
                None => String::new(),
            },
            PlayMode::Multiplayer => match &self.role {
                Some(role) => {
                    let local = role.local_side();
                    let score = role.score();
                    format!(
                        "You: {} | Opponent: {}",
                        score.get(local),
                        score.get(local.opponent())
                    )
                }
                None => String::new(),
            },
        };

        match phase {
            Phase::Paused(_) => format!("{line} | Paused"),
            Phase::GameOver(_) => format!("{line} | {}", self.game_over_text(mode)),
            _ => line,
        }
    }

    fn game_over_text(&self, mode: PlayMode) -> String {
        let local = self.local_side();
        match (mode, self.session.winner()) {
            (PlayMode::Solo, _) => match self.last_rank {
                Some(rank) => format!("Game over! New high score #{rank}"),
                None => "Game over!".to_string(),
            },
            (_, Some(winner)) if winner == local => "You win!".to_string(),
            (PlayMode::VsAi, Some(_)) => "AI wins!".to_string(),
            (_, Some(_)) => "Opponent wins!".to_string(),
            (_, None) => "Game over!".to_string(),
        }
    }
}

impl<S: RoomStore> Drop for App<S> {
    fn drop(&mut self) {
        self.leave_room();
    }
}

/// Map a surface-pixel pointer onto a playfield of size `field`
fn field_x(pointer_x: Option<f32>, surface: Bounds, field: Bounds) -> Option<f32> {
    pointer_x.map(|x| x * field.width / surface.width.max(1.0))
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
