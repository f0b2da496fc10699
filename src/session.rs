//! Session state machine
//!
//! The session decides whether a frame simulates anything. Local games
//! (solo and vs-AI) own their [`SimState`] here; networked games keep their
//! state in the room role held by the app, the session only tracks the phase.

use crate::sim::{Bounds, Difficulty, PlayMode, Side, SimEvent, SimState, TickInput, tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Menu,
    /// Choosing a difficulty for a local mode
    SelectDifficulty(PlayMode),
    MultiplayerMenu,
    /// Host sitting in a fresh room
    WaitingForOpponent,
    Playing(PlayMode),
    Paused(PlayMode),
    GameOver(PlayMode),
}

impl Phase {
    /// Mode of the game in progress or just finished
    pub fn mode(&self) -> Option<PlayMode> {
        match *self {
            Phase::Playing(mode) | Phase::Paused(mode) | Phase::GameOver(mode) => Some(mode),
            _ => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Phase::Playing(_))
    }

    /// A networked match is open (waiting, running, paused or just over)
    pub fn in_room(&self) -> bool {
        matches!(self, Phase::WaitingForOpponent) || self.mode() == Some(PlayMode::Multiplayer)
    }
}

/// Message shown to the user until dismissed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    JoinRejected(String),
    StoreFailure(String),
    OpponentLeft,
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::JoinRejected(reason) => format!("Could not join room: {reason}"),
            Notice::StoreFailure(reason) => format!("Connection problem: {reason}"),
            Notice::OpponentLeft => "Your opponent left the game".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    phase: Phase,
    difficulty: Difficulty,
    game: Option<SimState>,
    winner: Option<Side>,
    notice: Option<Notice>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Menu,
            difficulty: Difficulty::default(),
            game: None,
            winner: None,
            notice: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Locally simulated game, if any
    pub fn game(&self) -> Option<&SimState> {
        self.game.as_ref()
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn post_notice(&mut self, notice: Notice) {
        log::info!("Notice: {}", notice.message());
        self.notice = Some(notice);
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Menu -> difficulty picker for a local mode
    pub fn open_difficulty_select(&mut self, mode: PlayMode) -> bool {
        if self.phase != Phase::Menu || mode == PlayMode::Multiplayer {
            return false;
        }
        self.phase = Phase::SelectDifficulty(mode);
        true
    }

    pub fn open_multiplayer_menu(&mut self) -> bool {
        if self.phase != Phase::Menu {
            return false;
        }
        self.phase = Phase::MultiplayerMenu;
        true
    }

    /// One step back through the menus. Leaving the waiting screen lands on
    /// the multiplayer menu; the caller deletes the room.
    pub fn back(&mut self) -> bool {
        self.phase = match self.phase {
            Phase::SelectDifficulty(_) | Phase::MultiplayerMenu => Phase::Menu,
            Phase::WaitingForOpponent => Phase::MultiplayerMenu,
            _ => return false,
        };
        true
    }

    /// Start a fresh local game from the difficulty picker
    pub fn start(&mut self, difficulty: Difficulty, bounds: Bounds, seed: u64) -> bool {
        let Phase::SelectDifficulty(mode) = self.phase else {
            return false;
        };
        self.difficulty = difficulty;
        self.game = Some(SimState::new(mode, difficulty.profile(), bounds, seed));
        self.winner = None;
        self.phase = Phase::Playing(mode);
        log::info!("Started {} game on {}", mode.as_str(), difficulty.as_str());
        true
    }

    /// Room created, wait for the second player
    pub fn await_opponent(&mut self) -> bool {
        if self.phase != Phase::MultiplayerMenu {
            return false;
        }
        self.phase = Phase::WaitingForOpponent;
        true
    }

    /// Both players present: the host from the waiting screen, the guest
    /// straight from the multiplayer menu
    pub fn begin_multiplayer(&mut self) -> bool {
        if !matches!(
            self.phase,
            Phase::WaitingForOpponent | Phase::MultiplayerMenu
        ) {
            return false;
        }
        self.game = None;
        self.winner = None;
        self.phase = Phase::Playing(PlayMode::Multiplayer);
        log::info!("Multiplayer match started");
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.phase = match self.phase {
            Phase::Playing(mode) => Phase::Paused(mode),
            Phase::Paused(mode) => Phase::Playing(mode),
            _ => return false,
        };
        true
    }

    /// Advance the local game by one frame. Does nothing unless a local mode
    /// is playing.
    pub fn advance(&mut self, input: &TickInput) -> Vec<SimEvent> {
        let Phase::Playing(mode) = self.phase else {
            return Vec::new();
        };
        let Some(game) = self.game.as_mut() else {
            return Vec::new();
        };
        let events = tick(game, input);
        if game.game_over {
            self.winner = game.winner;
            self.phase = Phase::GameOver(mode);
        }
        events
    }

    /// Shared score reached the target
    pub fn finish_multiplayer(&mut self, winner: Side) -> bool {
        if !matches!(
            self.phase,
            Phase::Playing(PlayMode::Multiplayer) | Phase::Paused(PlayMode::Multiplayer)
        ) {
            return false;
        }
        self.winner = Some(winner);
        self.phase = Phase::GameOver(PlayMode::Multiplayer);
        log::info!("Multiplayer match over, player {} wins", winner.number());
        true
    }

    /// The room vanished. A finished match keeps its result on screen.
    pub fn opponent_left(&mut self) -> bool {
        if !self.phase.in_room() || matches!(self.phase, Phase::GameOver(_)) {
            return false;
        }
        self.phase = Phase::MultiplayerMenu;
        self.winner = None;
        self.post_notice(Notice::OpponentLeft);
        true
    }

    /// Back to the main menu, discarding any game in progress
    pub fn reset(&mut self) {
        self.phase = Phase::Menu;
        self.game = None;
        self.winner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn playing(mode: PlayMode) -> Session {
        let mut session = Session::new();
        assert!(session.open_difficulty_select(mode));
        assert!(session.start(Difficulty::Medium, Bounds::default(), 1));
        session
    }

    #[test]
    fn test_menu_navigation() {
        let mut session = Session::new();
        assert_eq!(session.phase(), Phase::Menu);
        assert!(!session.open_difficulty_select(PlayMode::Multiplayer));
        assert!(session.open_difficulty_select(PlayMode::VsAi));
        assert_eq!(session.phase(), Phase::SelectDifficulty(PlayMode::VsAi));
        assert!(session.back());
        assert!(session.open_multiplayer_menu());
        assert!(session.await_opponent());
        assert!(session.back());
        assert_eq!(session.phase(), Phase::MultiplayerMenu);
        assert!(session.back());
        assert_eq!(session.phase(), Phase::Menu);
        assert!(!session.back());
    }

    #[test]
    fn test_start_requires_picker() {
        let mut session = Session::new();
        assert!(!session.start(Difficulty::Hard, Bounds::default(), 1));
        let session = playing(PlayMode::Solo);
        assert_eq!(session.phase(), Phase::Playing(PlayMode::Solo));
        assert_eq!(session.game().map(|g| g.level), Some(1));
    }

    #[test]
    fn test_pause_stops_simulation() {
        let mut session = playing(PlayMode::VsAi);
        assert!(session.toggle_pause());
        let before = session.game().unwrap().ball;
        assert!(session.advance(&TickInput::default()).is_empty());
        assert_eq!(session.game().unwrap().ball, before);

        assert!(session.toggle_pause());
        session.advance(&TickInput::default());
        assert_ne!(session.game().unwrap().ball.pos, before.pos);
    }

    #[test]
    fn test_solo_game_over_after_last_life() {
        let mut session = playing(PlayMode::Solo);
        session.game.as_mut().unwrap().lives = 1;
        let game = session.game.as_mut().unwrap();
        game.ball.pos = Vec2::new(20.0, game.bounds.height + 20.0);
        game.ball.vel = Vec2::new(0.0, 1.0);

        let events = session.advance(&TickInput::default());
        assert!(events.iter().any(|e| matches!(e, SimEvent::GameOver { .. })));
        assert_eq!(session.phase(), Phase::GameOver(PlayMode::Solo));
        assert!(!session.toggle_pause());

        session.reset();
        assert_eq!(session.phase(), Phase::Menu);
        assert!(session.game().is_none());
    }

    #[test]
    fn test_multiplayer_flow() {
        let mut session = Session::new();
        session.open_multiplayer_menu();
        assert!(session.begin_multiplayer());
        assert!(session.phase().in_room());
        assert!(session.toggle_pause());
        assert!(session.finish_multiplayer(Side::Player2));
        assert_eq!(session.winner(), Some(Side::Player2));
        // Opponent leaving after the result doesn't wipe it
        assert!(!session.opponent_left());
        assert_eq!(session.phase(), Phase::GameOver(PlayMode::Multiplayer));
    }

    #[test]
    fn test_opponent_left_mid_game() {
        let mut session = Session::new();
        session.open_multiplayer_menu();
        session.await_opponent();
        session.begin_multiplayer();
        assert!(session.opponent_left());
        assert_eq!(session.phase(), Phase::MultiplayerMenu);
        assert_eq!(session.dismiss_notice(), Some(Notice::OpponentLeft));
        assert!(session.notice().is_none());
    }
}
