//! Room identifiers and the shared room record

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::WIN_SCORE;
use crate::sim::{Ball, Bounds, Score, Side, SimState};

pub const ROOM_CODE_LEN: usize = 6;
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Six uppercase alphanumeric characters identifying a room
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomCode(String);

impl RoomCode {
    /// Random code drawn uniformly from the alphabet
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let alphabet = ROOM_CODE_ALPHABET.as_bytes();
        let code = (0..ROOM_CODE_LEN)
            .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
            .collect();
        Self(code)
    }

    /// Parse user input. Surrounding whitespace is ignored and letters are
    /// upper-cased before validation.
    pub fn parse(value: &str) -> Result<Self, RoomCodeError> {
        let normalized = value.trim().to_uppercase();
        let found = normalized.chars().count();
        if found != ROOM_CODE_LEN {
            return Err(RoomCodeError::InvalidLength {
                expected: ROOM_CODE_LEN,
                found,
            });
        }
        for (index, ch) in normalized.chars().enumerate() {
            if !ROOM_CODE_ALPHABET.contains(ch) {
                return Err(RoomCodeError::InvalidCharacter { ch, index });
            }
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the record in the shared store
    pub fn storage_key(&self) -> String {
        format!("rooms/{}", self.0)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RoomCode {
    type Err = RoomCodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomCodeError {
    #[error("room code must be {expected} characters, got {found}")]
    InvalidLength { expected: usize, found: usize },
    #[error("invalid character '{ch}' at position {index}")]
    InvalidCharacter { ch: char, index: usize },
}

/// Score slot addressed by an atomic increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreField {
    Score1,
    Score2,
}

impl From<Side> for ScoreField {
    fn from(side: Side) -> Self {
        match side {
            Side::Player1 => ScoreField::Score1,
            Side::Player2 => ScoreField::Score2,
        }
    }
}

/// Record fields by their shared names. `players` comes last: stores that
/// keep one entry per field write it last and delete it first, so its
/// presence marks a complete room.
pub const RECORD_FIELDS: [&str; 12] = [
    "paddle1X",
    "paddle2X",
    "ballX",
    "ballY",
    "ballDx",
    "ballDy",
    "score1",
    "score2",
    "gameStarted",
    "canvasWidth",
    "canvasHeight",
    "players",
];

/// One field of a record as JSON text
pub type FieldEntry = (&'static str, String);

/// The shared record both clients read and write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub paddle1_x: f32,
    pub paddle2_x: f32,
    pub ball_x: f32,
    pub ball_y: f32,
    pub ball_dx: f32,
    pub ball_dy: f32,
    pub score1: u32,
    pub score2: u32,
    pub players: u8,
    pub game_started: bool,
    pub canvas_width: f32,
    pub canvas_height: f32,
}

impl RoomRecord {
    /// Initial record written by the room creator
    pub fn open(sim: &SimState) -> Self {
        Self {
            paddle1_x: sim.paddle1.x,
            paddle2_x: sim.paddle2.x,
            ball_x: sim.ball.pos.x,
            ball_y: sim.ball.pos.y,
            ball_dx: sim.ball.vel.x,
            ball_dy: sim.ball.vel.y,
            score1: 0,
            score2: 0,
            players: 1,
            game_started: false,
            canvas_width: sim.bounds.width,
            canvas_height: sim.bounds.height,
        }
    }

    /// A second client may claim this room
    pub fn is_joinable(&self) -> bool {
        self.players == 1 && !self.game_started
    }

    pub fn has_opponent(&self) -> bool {
        self.players >= 2
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.canvas_width, self.canvas_height)
    }

    pub fn score(&self) -> Score {
        Score {
            player1: self.score1,
            player2: self.score2,
        }
    }

    pub fn score_field(&self, field: ScoreField) -> u32 {
        match field {
            ScoreField::Score1 => self.score1,
            ScoreField::Score2 => self.score2,
        }
    }

    pub fn score_field_mut(&mut self, field: ScoreField) -> &mut u32 {
        match field {
            ScoreField::Score1 => &mut self.score1,
            ScoreField::Score2 => &mut self.score2,
        }
    }

    /// Winner by shared score, if either side reached the target
    pub fn winner(&self) -> Option<Side> {
        self.score().winner(WIN_SCORE)
    }

    /// Every field as JSON text, in [`RECORD_FIELDS`] order
    pub fn to_fields(&self) -> Result<Vec<FieldEntry>, serde_json::Error> {
        let value = serde_json::to_value(self)?;
        Ok(RECORD_FIELDS
            .iter()
            .filter_map(|name| value.get(*name).map(|field| (*name, field.to_string())))
            .collect())
    }

    /// Fields whose value differs from `before`
    pub fn changed_fields(&self, before: &RoomRecord) -> Result<Vec<FieldEntry>, serde_json::Error> {
        let old = before.to_fields()?;
        Ok(self
            .to_fields()?
            .into_iter()
            .zip(old)
            .filter(|(new, old)| new.1 != old.1)
            .map(|(new, _)| new)
            .collect())
    }

    /// Rebuild a record from per-field JSON text
    pub fn from_fields<'a, I>(fields: I) -> Result<Self, serde_json::Error>
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut object = serde_json::Map::new();
        for (name, json) in fields {
            object.insert(name.to_string(), serde_json::from_str(&json)?);
        }
        serde_json::from_value(serde_json::Value::Object(object))
    }
}

/// Partial update of a room record. Scores are deliberately absent: they only
/// change through atomic increments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomPatch {
    pub paddle1_x: Option<f32>,
    pub paddle2_x: Option<f32>,
    pub ball: Option<Ball>,
    pub players: Option<u8>,
    pub game_started: Option<bool>,
}

impl RoomPatch {
    /// Host publication after a physics step
    pub fn host_frame(sim: &SimState) -> Self {
        Self {
            paddle1_x: Some(sim.paddle1.x),
            ball: Some(sim.ball),
            ..Default::default()
        }
    }

    /// Guest publication: its own paddle only
    pub fn guest_paddle(x: f32) -> Self {
        Self {
            paddle2_x: Some(x),
            ..Default::default()
        }
    }

    pub fn apply(&self, record: &mut RoomRecord) {
        if let Some(x) = self.paddle1_x {
            record.paddle1_x = x;
        }
        if let Some(x) = self.paddle2_x {
            record.paddle2_x = x;
        }
        if let Some(ball) = self.ball {
            record.ball_x = ball.pos.x;
            record.ball_y = ball.pos.y;
            record.ball_dx = ball.vel.x;
            record.ball_dy = ball.vel.y;
        }
        if let Some(players) = self.players {
            record.players = players;
        }
        if let Some(started) = self.game_started {
            record.game_started = started;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Difficulty, PlayMode};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_generated_codes_are_valid() {
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..200 {
            let code = RoomCode::generate(&mut rng);
            assert_eq!(RoomCode::parse(code.as_str()), Ok(code));
        }
    }

    #[test]
    fn test_parse_normalizes_case() {
        let code = RoomCode::parse(" ab12cd ").unwrap();
        assert_eq!(code.as_str(), "AB12CD");
        assert_eq!(code.storage_key(), "rooms/AB12CD");
    }

    #[test]
    fn test_parse_rejects_bad_codes() {
        assert_eq!(
            RoomCode::parse("ABC"),
            Err(RoomCodeError::InvalidLength {
                expected: 6,
                found: 3
            })
        );
        assert_eq!(
            RoomCode::parse("AB-12C"),
            Err(RoomCodeError::InvalidCharacter { ch: '-', index: 2 })
        );
    }

    #[test]
    fn test_record_uses_shared_field_names() {
        let sim = SimState::new(
            PlayMode::Multiplayer,
            Difficulty::Medium.profile(),
            Bounds::new(600.0, 600.0),
            1,
        );
        let json = serde_json::to_value(RoomRecord::open(&sim)).unwrap();
        for key in [
            "paddle1X",
            "paddle2X",
            "ballX",
            "ballY",
            "ballDx",
            "ballDy",
            "score1",
            "score2",
            "players",
            "gameStarted",
            "canvasWidth",
            "canvasHeight",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["players"], 1);
        assert_eq!(json["gameStarted"], false);
    }

    fn open_record() -> RoomRecord {
        RoomRecord::open(&SimState::new(
            PlayMode::Multiplayer,
            Difficulty::Medium.profile(),
            Bounds::new(600.0, 600.0),
            1,
        ))
    }

    #[test]
    fn test_fields_cover_the_record() {
        let mut record = open_record();
        record.score2 = 7;
        let fields = record.to_fields().unwrap();
        assert_eq!(fields.len(), RECORD_FIELDS.len());
        assert_eq!(fields.last().map(|f| f.0), Some("players"));

        let rebuilt = RoomRecord::from_fields(fields.iter().map(|(n, j)| (*n, j.clone()))).unwrap();
        assert_eq!(rebuilt, record);
    }

    #[test]
    fn test_paddle_publish_only_changes_its_field() {
        // A guest working from a copy that predates the host's last point
        let stale = open_record();
        let mut current = stale.clone();
        current.score1 = 4;

        let mut draft = stale.clone();
        RoomPatch::guest_paddle(42.0).apply(&mut draft);
        let changed = draft.changed_fields(&stale).unwrap();
        assert_eq!(changed, vec![("paddle2X", "42.0".to_string())]);

        // Writing just those fields keeps the newer score
        let mut fields = current.to_fields().unwrap();
        for (name, json) in changed {
            if let Some(slot) = fields.iter_mut().find(|f| f.0 == name) {
                slot.1 = json;
            }
        }
        let merged = RoomRecord::from_fields(fields).unwrap();
        assert_eq!(merged.score1, 4);
        assert_eq!(merged.paddle2_x, 42.0);
    }

    #[test]
    fn test_increment_only_changes_its_score() {
        let before = open_record();
        let mut after = before.clone();
        *after.score_field_mut(ScoreField::Score2) += 1;
        let names: Vec<&str> = after
            .changed_fields(&before)
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["score2"]);
    }

    #[test]
    fn test_patch_leaves_other_fields() {
        let sim = SimState::new(
            PlayMode::Multiplayer,
            Difficulty::Medium.profile(),
            Bounds::new(600.0, 600.0),
            1,
        );
        let mut record = RoomRecord::open(&sim);
        record.score1 = 3;
        RoomPatch::guest_paddle(42.0).apply(&mut record);
        assert_eq!(record.paddle2_x, 42.0);
        assert_eq!(record.paddle1_x, sim.paddle1.x);
        assert_eq!(record.score1, 3);
    }
}
