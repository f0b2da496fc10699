//! Host-authoritative room protocol
//!
//! The room creator is the host: it owns the only [`SimState`] of the match,
//! advances physics, publishes the ball and its paddle every frame and turns
//! scored points into atomic increments. The guest owns a [`RemoteView`]
//! that can only be overwritten from snapshots; it has no way to run physics.
//!
//! Store notifications never touch game state directly. They land in a
//! [`Mailbox`] holding the latest snapshot, which the frame loop drains at the
//! start of its next frame.

use std::cell::RefCell;
use std::rc::Rc;

use rand::Rng;

use super::room::{RoomCode, RoomCodeError, RoomPatch, RoomRecord, ScoreField};
use super::store::{RoomCallback, RoomStore, StoreError, Subscription};
use crate::render::FrameView;
use crate::sim::{
    Ball, Bounds, Difficulty, Paddle, PlayMode, Score, Side, SimEvent, SimState, TickInput, tick,
};

/// Attempts at finding an unused room code before giving up
const CREATE_ATTEMPTS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("invalid room code: {0}")]
    InvalidCode(#[from] RoomCodeError),
    #[error("room not found")]
    NotFound,
    #[error("room is full")]
    RoomFull,
    #[error("game already in progress")]
    AlreadyStarted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the latest snapshot means for the local client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    /// Host alone in the room
    Waiting,
    /// Both players present, no winner yet
    Active,
    /// Shared score reached the target
    Won(Side),
    /// Record deleted (the other client left)
    Closed,
}

/// Latest-snapshot slot between a subscription and the frame loop
#[derive(Clone, Default)]
pub struct Mailbox {
    slot: Rc<RefCell<Option<Option<RoomRecord>>>>,
}

impl Mailbox {
    fn post(&self, record: Option<&RoomRecord>) {
        *self.slot.borrow_mut() = Some(record.cloned());
    }

    /// Take the newest delivery. `Some(None)` means the room was deleted.
    pub fn take(&self) -> Option<Option<RoomRecord>> {
        self.slot.borrow_mut().take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.borrow().is_none()
    }
}

/// A room subscription feeding a mailbox
struct RoomLink {
    code: RoomCode,
    mailbox: Mailbox,
    subscription: Option<Subscription>,
}

impl RoomLink {
    fn open<S: RoomStore + ?Sized>(store: &S, code: RoomCode) -> Result<Self, StoreError> {
        let mailbox = Mailbox::default();
        let sink = mailbox.clone();
        let callback: RoomCallback = Rc::new(move |record: Option<&RoomRecord>| sink.post(record));
        let subscription = store.subscribe(&code, callback)?;
        Ok(Self {
            code,
            mailbox,
            subscription: Some(subscription),
        })
    }

    /// Drop the subscription, then delete the room
    fn close<S: RoomStore + ?Sized>(mut self, store: &S) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.mailbox.take();
        match store.remove(&self.code) {
            Ok(()) => log::info!("Left room {}", self.code),
            Err(err) => log::warn!("Failed to delete room {}: {}", self.code, err),
        }
    }
}

/// Create a room and become its host
pub fn create_room<S, R>(store: &S, bounds: Bounds, rng: &mut R) -> Result<HostLink, StoreError>
where
    S: RoomStore + ?Sized,
    R: Rng + ?Sized,
{
    let code = free_code(store, rng)?;
    let sim = SimState::new(
        PlayMode::Multiplayer,
        Difficulty::Medium.profile(),
        bounds,
        rng.random(),
    );
    store.write(&code, &RoomRecord::open(&sim))?;
    let link = RoomLink::open(store, code)?;
    log::info!("Created room {}", link.code);
    Ok(HostLink {
        link,
        sim,
        opponent_joined: false,
        unsent_points: Vec::new(),
    })
}

/// Draw codes until one is not in use
fn free_code<S, R>(store: &S, rng: &mut R) -> Result<RoomCode, StoreError>
where
    S: RoomStore + ?Sized,
    R: Rng + ?Sized,
{
    for _ in 0..CREATE_ATTEMPTS {
        let code = RoomCode::generate(rng);
        if store.read_once(&code)?.is_none() {
            return Ok(code);
        }
    }
    Err(StoreError::Unavailable("no free room code".to_string()))
}

/// Join an existing room as the guest
pub fn join_room<S: RoomStore + ?Sized>(store: &S, raw_code: &str) -> Result<GuestLink, JoinError> {
    let code = RoomCode::parse(raw_code)?;
    let record = store.read_once(&code)?.ok_or(JoinError::NotFound)?;
    check_joinable(&record)?;

    // Re-check inside the transaction so a racing third client loses
    let claimed = store.transact(&code, &mut |room: &mut RoomRecord| {
        if !room.is_joinable() {
            return false;
        }
        room.players = 2;
        room.game_started = true;
        true
    })?;
    let record = match claimed {
        Some(record) => record,
        None => {
            let current = store.read_once(&code)?.ok_or(JoinError::NotFound)?;
            check_joinable(&current)?;
            return Err(JoinError::RoomFull);
        }
    };

    let link = RoomLink::open(store, code)?;
    log::info!("Joined room {} as player 2", link.code);
    Ok(GuestLink {
        link,
        view: RemoteView::from_record(&record),
        events: Vec::new(),
    })
}

fn check_joinable(record: &RoomRecord) -> Result<(), JoinError> {
    if record.players >= 2 {
        Err(JoinError::RoomFull)
    } else if record.game_started {
        Err(JoinError::AlreadyStarted)
    } else if record.players != 1 {
        Err(JoinError::NotFound)
    } else {
        Ok(())
    }
}

/// The host side of a match: sole simulation authority
pub struct HostLink {
    link: RoomLink,
    sim: SimState,
    opponent_joined: bool,
    /// Points scored locally but not yet committed to the room
    unsent_points: Vec<ScoreField>,
}

impl HostLink {
    pub fn code(&self) -> &RoomCode {
        &self.link.code
    }

    pub fn sim(&self) -> &SimState {
        &self.sim
    }

    pub fn opponent_joined(&self) -> bool {
        self.opponent_joined
    }

    /// Apply the newest snapshot, if one arrived since the last call
    pub fn ingest(&mut self) -> Option<RoomStatus> {
        let delivery = self.link.mailbox.take()?;
        let Some(record) = delivery else {
            return Some(RoomStatus::Closed);
        };

        self.sim.set_paddle2_x(record.paddle2_x);
        self.sim.score = merge_scores(self.sim.score, record.score());
        if record.has_opponent() {
            self.opponent_joined = true;
        }

        if let Some(winner) = record.winner() {
            self.sim.game_over = true;
            self.sim.winner = Some(winner);
            Some(RoomStatus::Won(winner))
        } else if self.opponent_joined {
            Some(RoomStatus::Active)
        } else {
            Some(RoomStatus::Waiting)
        }
    }

    /// Run one physics frame and publish the result.
    ///
    /// A failed frame publication is logged and dropped, the next frame
    /// overwrites it anyway. Failed score increments are kept and retried on
    /// the following frames, in order.
    pub fn advance<S: RoomStore + ?Sized>(&mut self, store: &S, input: &TickInput) -> Vec<SimEvent> {
        if !self.opponent_joined || self.sim.game_over {
            return Vec::new();
        }
        let events = tick(&mut self.sim, input);

        self.unsent_points
            .extend(events.iter().filter_map(|event| match event {
                SimEvent::PointScored { side, .. } => Some(ScoreField::from(*side)),
                _ => None,
            }));
        self.send_points(store);

        if let Err(err) = store.update(&self.link.code, &RoomPatch::host_frame(&self.sim)) {
            log::debug!("Dropped frame publish for room {}: {}", self.link.code, err);
        }
        events
    }

    /// Points still waiting for a successful increment
    pub fn unsent_points(&self) -> usize {
        self.unsent_points.len()
    }

    fn send_points<S: RoomStore + ?Sized>(&mut self, store: &S) {
        while let Some(&field) = self.unsent_points.first() {
            match store.atomic_increment(&self.link.code, field, 1) {
                Ok(_) => {
                    self.unsent_points.remove(0);
                }
                Err(err) => {
                    log::warn!(
                        "Score increment for room {} failed, {} pending: {}",
                        self.link.code,
                        self.unsent_points.len(),
                        err
                    );
                    break;
                }
            }
        }
    }

    pub fn frame_view(&self) -> FrameView {
        FrameView::new(
            self.sim.bounds,
            self.sim.ball,
            self.sim.paddle1,
            Some(self.sim.paddle2),
        )
    }

    pub fn leave<S: RoomStore + ?Sized>(self, store: &S) {
        self.link.close(store);
    }
}

/// Everything a guest knows about the match, as last received
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteView {
    pub bounds: Bounds,
    pub ball: Ball,
    /// Host paddle
    pub paddle1: Paddle,
    /// Own paddle, driven locally
    pub paddle2: Paddle,
    pub score: Score,
    pub winner: Option<Side>,
}

impl RemoteView {
    fn from_record(record: &RoomRecord) -> Self {
        let bounds = record.bounds();
        let mut view = Self {
            bounds,
            ball: Ball::centered(bounds),
            paddle1: Paddle::bottom(bounds),
            paddle2: Paddle::top(bounds),
            score: Score::default(),
            winner: None,
        };
        view.paddle2.set_x(record.paddle2_x, bounds.width);
        view.apply(record);
        view
    }

    fn apply(&mut self, record: &RoomRecord) {
        self.ball.pos.x = record.ball_x;
        self.ball.pos.y = record.ball_y;
        self.ball.vel.x = record.ball_dx;
        self.ball.vel.y = record.ball_dy;
        self.paddle1.set_x(record.paddle1_x, self.bounds.width);
        self.score = merge_scores(self.score, record.score());
        self.winner = record.winner();
    }
}

/// The guest side of a match: renders snapshots, publishes its paddle
pub struct GuestLink {
    link: RoomLink,
    view: RemoteView,
    /// Events read off snapshots since the last [`GuestLink::take_events`]
    events: Vec<SimEvent>,
}

impl GuestLink {
    pub fn code(&self) -> &RoomCode {
        &self.link.code
    }

    pub fn view(&self) -> &RemoteView {
        &self.view
    }

    /// Apply the newest snapshot, if one arrived since the last call
    pub fn ingest(&mut self) -> Option<RoomStatus> {
        let delivery = self.link.mailbox.take()?;
        let Some(record) = delivery else {
            return Some(RoomStatus::Closed);
        };
        let before = self.view.clone();
        self.view.apply(&record);
        self.events.extend(snapshot_events(&before, &self.view));
        Some(match self.view.winner {
            Some(winner) => RoomStatus::Won(winner),
            None => RoomStatus::Active,
        })
    }

    /// Drain the events inferred from snapshots
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Move the own paddle; pointer x is in room coordinates
    pub fn move_paddle(&mut self, pointer_x: f32) {
        let width = self.view.bounds.width;
        self.view.paddle2.follow_pointer(pointer_x, width);
    }

    pub fn publish<S: RoomStore + ?Sized>(&self, store: &S) {
        let patch = RoomPatch::guest_paddle(self.view.paddle2.x);
        if let Err(err) = store.update(&self.link.code, &patch) {
            log::debug!("Dropped paddle publish for room {}: {}", self.link.code, err);
        }
    }

    /// Mirrored so the guest's paddle sits at the bottom of its screen
    pub fn frame_view(&self) -> FrameView {
        FrameView::mirrored(
            self.view.bounds,
            self.view.ball,
            self.view.paddle2,
            self.view.paddle1,
        )
    }

    pub fn leave<S: RoomStore + ?Sized>(self, store: &S) {
        self.link.close(store);
    }
}

/// Which side of a room this client plays, carrying the side's capabilities
pub enum Role {
    Host(HostLink),
    Guest(GuestLink),
}

impl Role {
    pub fn code(&self) -> &RoomCode {
        match self {
            Role::Host(host) => host.code(),
            Role::Guest(guest) => guest.code(),
        }
    }

    pub fn local_side(&self) -> Side {
        match self {
            Role::Host(_) => Side::Player1,
            Role::Guest(_) => Side::Player2,
        }
    }

    pub fn ingest(&mut self) -> Option<RoomStatus> {
        match self {
            Role::Host(host) => host.ingest(),
            Role::Guest(guest) => guest.ingest(),
        }
    }

    /// Shared score as last seen locally
    pub fn score(&self) -> Score {
        match self {
            Role::Host(host) => host.sim().score,
            Role::Guest(guest) => guest.view().score,
        }
    }

    pub fn frame_view(&self) -> FrameView {
        match self {
            Role::Host(host) => host.frame_view(),
            Role::Guest(guest) => guest.frame_view(),
        }
    }

    pub fn leave<S: RoomStore + ?Sized>(self, store: &S) {
        match self {
            Role::Host(host) => host.leave(store),
            Role::Guest(guest) => guest.leave(store),
        }
    }
}

/// Reconstruct what happened between two snapshots.
///
/// A serve puts the ball back at the center, so a velocity flip anywhere
/// else is a bounce: vertical off a paddle, horizontal off a wall.
fn snapshot_events(before: &RemoteView, after: &RemoteView) -> Vec<SimEvent> {
    let mut events = Vec::new();
    let served = after.ball.pos == after.bounds.center();
    if !served {
        if before.ball.vel.x * after.ball.vel.x < 0.0 {
            events.push(SimEvent::WallBounce);
        }
        if before.ball.vel.y * after.ball.vel.y < 0.0 {
            // Heading up again means the bottom (host) paddle returned it
            let side = if after.ball.vel.y < 0.0 {
                Side::Player1
            } else {
                Side::Player2
            };
            events.push(SimEvent::PaddleHit { side });
        }
    }

    for side in [Side::Player1, Side::Player2] {
        let (old, new) = (before.score.get(side), after.score.get(side));
        if new > old {
            events.push(SimEvent::PointScored { side, total: new });
        }
    }

    if before.winner.is_none() && after.winner.is_some() {
        events.push(SimEvent::GameOver {
            winner: after.winner,
        });
    }
    events
}

/// Scores never go backwards within a match
fn merge_scores(local: Score, remote: Score) -> Score {
    Score {
        player1: local.player1.max(remote.player1),
        player2: local.player2.max(remote.player2),
    }
}
