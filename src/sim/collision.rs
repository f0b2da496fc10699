//! Collision detection and response
//!
//! Axis-aligned checks between the ball, the playfield edges and the paddles.
//! Everything here is a pure function of its arguments.

use super::state::{Ball, Paddle};
use crate::consts::PADDLE_DEFLECTION;

/// Which side wall the ball touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Left,
    Right,
}

/// Where along the paddle the ball struck, 0.0 = left edge, 1.0 = right edge
pub fn hit_position(ball_x: f32, paddle: &Paddle) -> f32 {
    if paddle.width <= 0.0 {
        return 0.5;
    }
    ((ball_x - paddle.x) / paddle.width).clamp(0.0, 1.0)
}

/// Outgoing horizontal velocity for a hit position.
/// Independent of the incoming `dx`: the paddle alone picks the angle.
pub fn deflect_dx(hit_position: f32) -> f32 {
    (hit_position - 0.5) * PADDLE_DEFLECTION
}

/// Side wall the ball overlaps, if any
pub fn side_wall_contact(ball: &Ball, canvas_width: f32) -> Option<Wall> {
    if ball.pos.x - ball.radius < 0.0 {
        Some(Wall::Left)
    } else if ball.pos.x + ball.radius > canvas_width {
        Some(Wall::Right)
    } else {
        None
    }
}

/// Ball overlaps the top edge (only meaningful in solo)
pub fn touches_ceiling(ball: &Ball) -> bool {
    ball.top() < 0.0
}

/// Ball is descending onto the bottom paddle
pub fn hits_bottom_paddle(ball: &Ball, paddle: &Paddle) -> bool {
    ball.bottom() > paddle.y && paddle.spans(ball.pos.x) && ball.vel.y > 0.0
}

/// Ball is rising into the top paddle
pub fn hits_top_paddle(ball: &Ball, paddle: &Paddle) -> bool {
    ball.top() < paddle.y + paddle.height && paddle.spans(ball.pos.x) && ball.vel.y < 0.0
}

/// Ball fully left through the bottom edge
pub fn exited_bottom(ball: &Ball, canvas_height: f32) -> bool {
    ball.top() > canvas_height
}

/// Ball fully left through the top edge
pub fn exited_top(ball: &Ball) -> bool {
    ball.bottom() < 0.0
}

/// Bounce off a side wall, always pointing back into the field
pub fn reflect_off_wall(ball: &mut Ball, wall: Wall) {
    ball.vel.x = match wall {
        Wall::Left => ball.vel.x.abs(),
        Wall::Right => -ball.vel.x.abs(),
    };
}

/// Send the ball back from a paddle. `upward` is true for the bottom paddle.
pub fn reflect_off_paddle(ball: &mut Ball, paddle: &Paddle, upward: bool) {
    let speed_y = ball.vel.y.abs();
    ball.vel.y = if upward { -speed_y } else { speed_y };
    ball.vel.x = deflect_dx(hit_position(ball.pos.x, paddle));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Bounds;
    use glam::Vec2;
    use proptest::prelude::*;

    fn ball_at(x: f32, y: f32, dx: f32, dy: f32) -> Ball {
        Ball {
            pos: Vec2::new(x, y),
            vel: Vec2::new(dx, dy),
            radius: 8.0,
        }
    }

    fn paddle() -> Paddle {
        Paddle::bottom(Bounds::new(600.0, 600.0))
    }

    #[test]
    fn test_deflection_extremes() {
        let p = paddle();
        assert_eq!(deflect_dx(hit_position(p.center(), &p)), 0.0);
        assert_eq!(deflect_dx(hit_position(p.x, &p)), -5.0);
        assert_eq!(deflect_dx(hit_position(p.x + p.width, &p)), 5.0);
    }

    #[test]
    fn test_bottom_paddle_needs_downward_motion() {
        let p = paddle();
        let descending = ball_at(p.center(), p.y - 4.0, 0.0, 3.0);
        let rising = ball_at(p.center(), p.y - 4.0, 0.0, -3.0);
        assert!(hits_bottom_paddle(&descending, &p));
        assert!(!hits_bottom_paddle(&rising, &p));
    }

    #[test]
    fn test_bottom_paddle_outside_span_misses() {
        let p = paddle();
        let ball = ball_at(p.x - 1.0, p.y, 0.0, 3.0);
        assert!(!hits_bottom_paddle(&ball, &p));
    }

    #[test]
    fn test_top_paddle_needs_upward_motion() {
        let p = Paddle::top(Bounds::new(600.0, 600.0));
        let rising = ball_at(p.center(), p.y + p.height + 4.0, 1.0, -3.0);
        assert!(hits_top_paddle(&rising, &p));
        let falling = ball_at(p.center(), p.y + p.height + 4.0, 1.0, 3.0);
        assert!(!hits_top_paddle(&falling, &p));
    }

    #[test]
    fn test_reflect_off_paddle_ignores_incoming_dx() {
        let p = paddle();
        let mut ball = ball_at(p.center(), p.y, 9.0, 4.0);
        reflect_off_paddle(&mut ball, &p, true);
        assert_eq!(ball.vel, Vec2::new(0.0, -4.0));
    }

    #[test]
    fn test_wall_reflection_points_inward() {
        let mut ball = ball_at(2.0, 100.0, -3.0, 1.0);
        let wall = side_wall_contact(&ball, 600.0);
        assert_eq!(wall, Some(Wall::Left));
        reflect_off_wall(&mut ball, Wall::Left);
        assert_eq!(ball.vel.x, 3.0);

        // Already heading back in: stays heading in
        reflect_off_wall(&mut ball, Wall::Left);
        assert_eq!(ball.vel.x, 3.0);
    }

    #[test]
    fn test_exits() {
        assert!(exited_bottom(&ball_at(10.0, 609.0, 0.0, 1.0), 600.0));
        assert!(!exited_bottom(&ball_at(10.0, 607.0, 0.0, 1.0), 600.0));
        assert!(exited_top(&ball_at(10.0, -9.0, 0.0, -1.0)));
        assert!(!exited_top(&ball_at(10.0, -7.0, 0.0, -1.0)));
    }

    proptest! {
        #[test]
        fn prop_deflection_bounded(ball_x in -1000.0f32..2000.0, paddle_x in 0.0f32..500.0) {
            let mut p = paddle();
            p.x = paddle_x;
            let hit = hit_position(ball_x, &p);
            prop_assert!((0.0..=1.0).contains(&hit));
            let dx = deflect_dx(hit);
            prop_assert!((-5.0..=5.0).contains(&dx));
        }

        #[test]
        fn prop_paddle_clamped(pointer_x in -5000.0f32..5000.0, width in 100.0f32..3000.0) {
            let mut p = paddle();
            p.follow_pointer(pointer_x, width);
            prop_assert!(p.x >= 0.0);
            prop_assert!(p.x + p.width <= width + 1e-3);

            p.set_x(pointer_x, width);
            prop_assert!(p.x >= 0.0);
            prop_assert!(p.x + p.width <= width + 1e-3);

            let before = p.x;
            p.set_x(f32::NAN, width);
            prop_assert_eq!(p.x, before);
        }
    }
}
