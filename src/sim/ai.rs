//! Scripted opponent for the vs-AI mode
//!
//! Purely reactive: no prediction, no memory between frames.

use super::state::Paddle;
use crate::consts::AI_DEAD_ZONE;

/// Horizontal movement for the opponent paddle this frame.
///
/// Moves exactly `ai_speed` toward the ball when the ball is more than the
/// dead-zone away from the paddle center; the result never pushes the paddle
/// outside `[0, canvas_width - width]`.
pub fn opponent_delta(ball_x: f32, paddle: &Paddle, ai_speed: f32, canvas_width: f32) -> f32 {
    let offset = ball_x - paddle.center();
    if offset.abs() <= AI_DEAD_ZONE {
        return 0.0;
    }
    let step = if offset > 0.0 { ai_speed } else { -ai_speed };
    let target = (paddle.x + step).clamp(0.0, paddle.max_x(canvas_width));
    target - paddle.x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Bounds;

    fn paddle_at(x: f32) -> Paddle {
        let mut p = Paddle::top(Bounds::new(600.0, 600.0));
        p.x = x;
        p
    }

    #[test]
    fn test_dead_zone_holds_still() {
        let p = paddle_at(250.0);
        assert_eq!(opponent_delta(300.0, &p, 3.0, 600.0), 0.0);
        assert_eq!(opponent_delta(305.0, &p, 3.0, 600.0), 0.0);
        assert_eq!(opponent_delta(295.0, &p, 3.0, 600.0), 0.0);
    }

    #[test]
    fn test_moves_toward_ball_at_ai_speed() {
        let p = paddle_at(250.0);
        assert_eq!(opponent_delta(400.0, &p, 3.0, 600.0), 3.0);
        assert_eq!(opponent_delta(100.0, &p, 4.0, 600.0), -4.0);
    }

    #[test]
    fn test_clamped_at_edges() {
        let p = paddle_at(1.0);
        assert_eq!(opponent_delta(0.0, &p, 3.0, 600.0), -1.0);
        let p = paddle_at(499.0);
        assert_eq!(opponent_delta(600.0, &p, 3.0, 600.0), 1.0);
    }

    #[test]
    fn test_reproducible() {
        let p = paddle_at(123.0);
        let a = opponent_delta(321.0, &p, 2.0, 600.0);
        let b = opponent_delta(321.0, &p, 2.0, 600.0);
        assert_eq!(a, b);
    }
}
