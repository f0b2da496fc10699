//! Per-frame simulation step
//!
//! Advances the ball by one frame of Euler integration and resolves
//! collisions in a fixed order. Velocities are pixels per frame, so the game
//! speed follows the display refresh rate.

use super::ai::opponent_delta;
use super::collision::{
    exited_bottom, exited_top, hits_bottom_paddle, hits_top_paddle, reflect_off_paddle,
    reflect_off_wall, side_wall_contact, touches_ceiling,
};
use super::state::{PlayMode, Side, SimState};
use crate::consts::{BONUS_LIFE_EVERY, WIN_SCORE};

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer x relative to the playfield; the bottom paddle centers on it
    pub pointer_x: Option<f32>,
}

/// Discrete things that happened during a frame.
///
/// The caller turns these into sounds, network writes and UI updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    /// Side wall or (solo) ceiling bounce
    WallBounce,
    PaddleHit { side: Side },
    /// A side gained a point; `total` is its new local count
    PointScored { side: Side, total: u32 },
    LevelUp { level: u32 },
    BonusLife { lives: u32 },
    LifeLost { lives: u32 },
    /// Ball returned to center after a score
    BallReset,
    GameOver { winner: Option<Side> },
}

/// Advance the game state by one frame
pub fn tick(state: &mut SimState, input: &TickInput) -> Vec<SimEvent> {
    let mut events = Vec::new();
    if state.game_over {
        return events;
    }

    if let Some(pointer_x) = input.pointer_x {
        state.move_paddle1(pointer_x);
    }

    state.frames += 1;
    state.ball.pos += state.ball.vel;

    if let Some(wall) = side_wall_contact(&state.ball, state.bounds.width) {
        reflect_off_wall(&mut state.ball, wall);
        events.push(SimEvent::WallBounce);
    }

    if state.mode.has_ceiling() && touches_ceiling(&state.ball) {
        state.ball.vel.y = state.ball.vel.y.abs();
        events.push(SimEvent::WallBounce);
    }

    if hits_bottom_paddle(&state.ball, &state.paddle1) {
        let paddle = state.paddle1;
        reflect_off_paddle(&mut state.ball, &paddle, true);
        events.push(SimEvent::PaddleHit {
            side: Side::Player1,
        });
        let total = score_point(state, Side::Player1, &mut events);
        if state.mode == PlayMode::Solo {
            check_level_up(state, total, &mut events);
        }
    }

    if state.mode.has_opponent() && hits_top_paddle(&state.ball, &state.paddle2) {
        let paddle = state.paddle2;
        reflect_off_paddle(&mut state.ball, &paddle, false);
        events.push(SimEvent::PaddleHit {
            side: Side::Player2,
        });
        score_point(state, Side::Player2, &mut events);
    }

    if exited_bottom(&state.ball, state.bounds.height) {
        if state.mode == PlayMode::Solo {
            lose_life(state, &mut events);
        } else {
            score_point(state, Side::Player2, &mut events);
            state.serve(-1.0);
            events.push(SimEvent::BallReset);
        }
    }

    if state.mode.has_opponent() && exited_top(&state.ball) {
        score_point(state, Side::Player1, &mut events);
        state.serve(1.0);
        events.push(SimEvent::BallReset);
    }

    if state.mode == PlayMode::VsAi {
        let delta = opponent_delta(
            state.ball.pos.x,
            &state.paddle2,
            state.profile.ai_speed,
            state.bounds.width,
        );
        state.paddle2.x += delta;

        if let Some(winner) = state.score.winner(WIN_SCORE) {
            finish(state, Some(winner), &mut events);
        }
    }

    events
}

/// Pure form of [`tick`]: returns the next state alongside the events
pub fn step(state: &SimState, input: &TickInput) -> (SimState, Vec<SimEvent>) {
    let mut next = state.clone();
    let events = tick(&mut next, input);
    (next, events)
}

fn score_point(state: &mut SimState, side: Side, events: &mut Vec<SimEvent>) -> u32 {
    let total = state.score.award(side);
    events.push(SimEvent::PointScored { side, total });
    total
}

/// Level-up runs on the hit that reaches the threshold, so each crossing
/// scales the ball exactly once.
fn check_level_up(state: &mut SimState, total: u32, events: &mut Vec<SimEvent>) {
    if !state.profile.is_level_threshold(total) {
        return;
    }
    state.level += 1;
    state.ball.vel *= state.profile.speed_increase;
    events.push(SimEvent::LevelUp { level: state.level });
    log::debug!("Level {} reached at {} points", state.level, total);

    if state.level.is_multiple_of(BONUS_LIFE_EVERY) {
        state.lives += 1;
        events.push(SimEvent::BonusLife { lives: state.lives });
    }
}

fn lose_life(state: &mut SimState, events: &mut Vec<SimEvent>) {
    state.lives = state.lives.saturating_sub(1);
    events.push(SimEvent::LifeLost { lives: state.lives });
    if state.lives == 0 {
        finish(state, None, events);
    } else {
        // Serve speed is recomputed from the level so a miss never lowers the tier
        state.serve(-1.0);
        events.push(SimEvent::BallReset);
    }
}

fn finish(state: &mut SimState, winner: Option<Side>, events: &mut Vec<SimEvent>) {
    state.game_over = true;
    state.winner = winner;
    events.push(SimEvent::GameOver { winner });
    log::info!(
        "{} game over: score {}-{}, level {}",
        state.mode.as_str(),
        state.score.player1,
        state.score.player2,
        state.level
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::COMPETITIVE_SERVE_SPEED;
    use crate::sim::state::Bounds;
    use crate::sim::Difficulty;
    use glam::Vec2;

    fn solo(difficulty: Difficulty) -> SimState {
        SimState::new(
            PlayMode::Solo,
            difficulty.profile(),
            Bounds::new(600.0, 600.0),
            12345,
        )
    }

    /// Put the ball one frame above the bottom paddle center, falling
    fn line_up_paddle_hit(state: &mut SimState) {
        let speed = state.ball.vel.y.abs();
        state.ball.pos = Vec2::new(state.paddle1.center(), state.paddle1.y - state.ball.radius);
        state.ball.vel = Vec2::new(0.0, speed);
    }

    fn line_up_miss(state: &mut SimState) {
        state.ball.pos = Vec2::new(5.0 + state.ball.radius, state.bounds.height + 20.0);
        state.ball.vel = Vec2::new(0.0, 1.0);
        state.paddle1.x = state.bounds.width - state.paddle1.width;
    }

    #[test]
    fn test_ball_moves_by_velocity() {
        let mut state = solo(Difficulty::Easy);
        state.ball.vel = Vec2::new(2.0, -1.0);
        let start = state.ball.pos;
        let events = tick(&mut state, &TickInput::default());
        assert!(events.is_empty());
        assert_eq!(state.ball.pos, start + Vec2::new(2.0, -1.0));
        assert_eq!(state.frames, 1);
    }

    #[test]
    fn test_solo_ceiling_bounce() {
        let mut state = solo(Difficulty::Easy);
        state.ball.pos = Vec2::new(300.0, 9.0);
        state.ball.vel = Vec2::new(0.0, -3.0);
        let events = tick(&mut state, &TickInput::default());
        assert_eq!(events, vec![SimEvent::WallBounce]);
        assert_eq!(state.ball.vel.y, 3.0);
    }

    #[test]
    fn test_level_up_once_per_threshold() {
        let mut state = solo(Difficulty::Easy);
        state.score.player1 = 9;
        line_up_paddle_hit(&mut state);
        let events = tick(&mut state, &TickInput::default());
        assert!(events.contains(&SimEvent::LevelUp { level: 2 }));
        assert_eq!(state.level, 2);
        assert!((state.ball.vel.y + 3.0 * 1.05).abs() < 1e-5);

        // Following frames on the same score do nothing further
        for _ in 0..5 {
            let events = tick(&mut state, &TickInput::default());
            assert!(!events.iter().any(|e| matches!(e, SimEvent::LevelUp { .. })));
        }
        assert_eq!(state.level, 2);
    }

    #[test]
    fn test_bonus_life_every_fifth_level() {
        let mut state = solo(Difficulty::Hard);
        state.level = 4;
        state.score.player1 = 19;
        line_up_paddle_hit(&mut state);
        let events = tick(&mut state, &TickInput::default());
        assert!(events.contains(&SimEvent::LevelUp { level: 5 }));
        assert!(events.contains(&SimEvent::BonusLife { lives: 4 }));
        assert_eq!(state.lives, 4);
    }

    #[test]
    fn test_reset_after_miss_keeps_level_speed() {
        let mut state = solo(Difficulty::Easy);
        state.level = 3;
        line_up_miss(&mut state);
        let events = tick(&mut state, &TickInput::default());
        assert!(events.contains(&SimEvent::LifeLost { lives: 2 }));
        assert!(events.contains(&SimEvent::BallReset));
        assert!((state.ball.vel.x.abs() - 3.3075).abs() < 1e-4);
        assert!((state.ball.vel.y + 3.3075).abs() < 1e-4);
        assert_eq!(state.ball.pos, state.bounds.center());
    }

    #[test]
    fn test_last_life_ends_game_and_halts() {
        let mut state = solo(Difficulty::Medium);
        state.lives = 1;
        line_up_miss(&mut state);
        let events = tick(&mut state, &TickInput::default());
        assert!(events.contains(&SimEvent::GameOver { winner: None }));
        assert!(state.game_over);
        assert_eq!(state.lives, 0);

        let frozen = state.ball.pos;
        assert!(tick(&mut state, &TickInput::default()).is_empty());
        assert_eq!(state.ball.pos, frozen);
    }

    #[test]
    fn test_pointer_moves_paddle() {
        let mut state = solo(Difficulty::Medium);
        tick(
            &mut state,
            &TickInput {
                pointer_x: Some(1_000.0),
            },
        );
        assert_eq!(state.paddle1.x, 500.0);
    }

    #[test]
    fn test_vs_ai_top_exit_scores_player1() {
        let mut state = SimState::new(
            PlayMode::VsAi,
            Difficulty::Medium.profile(),
            Bounds::new(600.0, 600.0),
            3,
        );
        state.ball.pos = Vec2::new(590.0 - 8.0, -5.0);
        state.ball.vel = Vec2::new(0.0, -4.0);
        state.paddle2.x = 0.0;
        let events = tick(&mut state, &TickInput::default());
        assert!(events.contains(&SimEvent::PointScored {
            side: Side::Player1,
            total: 1
        }));
        assert_eq!(state.ball.vel.y, 4.0);
    }

    #[test]
    fn test_vs_ai_resets_at_competitive_speed_for_every_difficulty() {
        for difficulty in Difficulty::ALL {
            let mut state = SimState::new(
                PlayMode::VsAi,
                difficulty.profile(),
                Bounds::new(600.0, 600.0),
                8,
            );
            // Opening serve still follows the difficulty
            assert_eq!(state.ball.vel.y, -difficulty.profile().ball_speed);

            state.ball.pos = Vec2::new(300.0, -20.0);
            state.ball.vel = Vec2::new(0.0, -3.0);
            state.paddle2.x = 0.0;
            tick(&mut state, &TickInput::default());
            assert_eq!(state.ball.vel.x.abs(), COMPETITIVE_SERVE_SPEED);
            assert_eq!(state.ball.vel.y, COMPETITIVE_SERVE_SPEED);

            state.ball.pos = Vec2::new(20.0, 640.0);
            state.ball.vel = Vec2::new(0.0, 1.0);
            state.paddle1.x = 400.0;
            tick(&mut state, &TickInput::default());
            assert_eq!(state.ball.vel.x.abs(), COMPETITIVE_SERVE_SPEED);
            assert_eq!(state.ball.vel.y, -COMPETITIVE_SERVE_SPEED);
        }
    }

    #[test]
    fn test_vs_ai_reaching_win_score() {
        let mut state = SimState::new(
            PlayMode::VsAi,
            Difficulty::Easy.profile(),
            Bounds::new(600.0, 600.0),
            3,
        );
        state.score.player2 = 9;
        state.ball.pos = Vec2::new(20.0, 640.0);
        state.ball.vel = Vec2::new(0.0, 1.0);
        state.paddle1.x = 400.0;
        let events = tick(&mut state, &TickInput::default());
        assert!(events.contains(&SimEvent::GameOver {
            winner: Some(Side::Player2)
        }));
        assert_eq!(state.winner, Some(Side::Player2));
    }

    #[test]
    fn test_multiplayer_tick_leaves_win_detection_to_room() {
        let mut state = SimState::new(
            PlayMode::Multiplayer,
            Difficulty::Medium.profile(),
            Bounds::new(600.0, 600.0),
            3,
        );
        state.score.player1 = 9;
        state.ball.pos = Vec2::new(20.0, -20.0);
        state.ball.vel = Vec2::new(0.0, -1.0);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.score.player1, 10);
        assert!(!state.game_over);
    }

    #[test]
    fn test_step_is_pure() {
        let state = solo(Difficulty::Medium);
        let (next, _) = step(&state, &TickInput::default());
        assert_eq!(state.frames, 0);
        assert_eq!(next.frames, 1);
    }

    #[test]
    fn test_determinism() {
        let mut a = SimState::new(PlayMode::VsAi, Difficulty::Hard.profile(), Bounds::default(), 99);
        let mut b = SimState::new(PlayMode::VsAi, Difficulty::Hard.profile(), Bounds::default(), 99);
        for frame in 0..2_000 {
            let input = TickInput {
                pointer_x: Some((frame % 600) as f32),
            };
            tick(&mut a, &input);
            tick(&mut b, &input);
        }
        assert_eq!(a.ball.pos, b.ball.pos);
        assert_eq!(a.score, b.score);
        assert_eq!(a.paddle2.x, b.paddle2.x);
    }
}
