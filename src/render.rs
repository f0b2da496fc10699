//! Rendering adapter
//!
//! [`compose`] turns a [`FrameView`] into a flat list of draw commands in
//! surface pixels. A [`Surface`] only has to fill rectangles and circles and
//! stroke lines; the browser shell backs it with a 2D canvas.

use glam::Vec2;

use crate::sim::{Ball, Bounds, Paddle, SimState};

/// RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex notation, e.g. `#0f3460`
    pub fn to_css(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const BACKGROUND: Color = Color::rgb(0x0f, 0x34, 0x60);
pub const PLAYER_COLOR: Color = Color::rgb(0x00, 0xff, 0xff);
pub const OPPONENT_COLOR: Color = Color::rgb(0xff, 0x6b, 0x6b);
pub const BALL_COLOR: Color = Color::rgb(0xff, 0xff, 0x00);
pub const NET_COLOR: Color = Color::rgb(0x53, 0x6d, 0x8e);

/// A single drawing primitive, in surface pixels
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear {
        color: Color,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Color,
    },
}

/// Something that can display a frame
pub trait Surface {
    /// Current drawable size, `None` while the surface is unavailable
    fn size(&self) -> Option<Bounds>;

    fn draw(&mut self, commands: &[DrawCmd]);
}

/// What to draw, in playfield coordinates. The local player is always the
/// bottom paddle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub bounds: Bounds,
    pub ball: Ball,
    pub bottom: Paddle,
    pub top: Option<Paddle>,
}

impl FrameView {
    pub fn new(bounds: Bounds, ball: Ball, bottom: Paddle, top: Option<Paddle>) -> Self {
        Self {
            bounds,
            ball,
            bottom,
            top,
        }
    }

    /// View of a locally simulated game
    pub fn of_sim(sim: &SimState) -> Self {
        let top = sim.mode.has_opponent().then_some(sim.paddle2);
        Self::new(sim.bounds, sim.ball, sim.paddle1, top)
    }

    /// Flip the field vertically so a top-side player sees itself at the
    /// bottom. `own` and `opponent` are in room coordinates.
    pub fn mirrored(bounds: Bounds, ball: Ball, own: Paddle, opponent: Paddle) -> Self {
        let mut ball = ball;
        ball.pos.y = bounds.height - ball.pos.y;
        ball.vel.y = -ball.vel.y;
        Self::new(
            bounds,
            ball,
            mirror_paddle(own, bounds),
            Some(mirror_paddle(opponent, bounds)),
        )
    }
}

fn mirror_paddle(paddle: Paddle, bounds: Bounds) -> Paddle {
    Paddle {
        y: bounds.height - paddle.y - paddle.height,
        ..paddle
    }
}

/// Build the draw list for `view` scaled onto a surface of size `target`
pub fn compose(view: &FrameView, target: Bounds) -> Vec<DrawCmd> {
    let scale = Vec2::new(
        target.width / view.bounds.width.max(1.0),
        target.height / view.bounds.height.max(1.0),
    );
    let radius_scale = scale.x.min(scale.y);

    let mut commands = Vec::with_capacity(6);
    commands.push(DrawCmd::Clear { color: BACKGROUND });

    if view.top.is_some() {
        let mid = target.height / 2.0;
        commands.push(DrawCmd::Line {
            from: Vec2::new(0.0, mid),
            to: Vec2::new(target.width, mid),
            width: 2.0,
            color: NET_COLOR,
        });
    }

    commands.push(paddle_rect(&view.bottom, scale, PLAYER_COLOR));
    if let Some(top) = &view.top {
        commands.push(paddle_rect(top, scale, OPPONENT_COLOR));
    }

    commands.push(DrawCmd::Circle {
        center: view.ball.pos * scale,
        radius: view.ball.radius * radius_scale,
        color: BALL_COLOR,
    });
    commands
}

fn paddle_rect(paddle: &Paddle, scale: Vec2, color: Color) -> DrawCmd {
    DrawCmd::Rect {
        x: paddle.x * scale.x,
        y: paddle.y * scale.y,
        width: paddle.width * scale.x,
        height: paddle.height * scale.y,
        color,
    }
}

/// Surface that keeps the last frame in memory. Used by the native demo and
/// tests.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    pub bounds: Option<Bounds>,
    pub last_frame: Vec<DrawCmd>,
    pub frames_drawn: u64,
}

impl HeadlessSurface {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds: Some(bounds),
            ..Default::default()
        }
    }
}

impl Surface for HeadlessSurface {
    fn size(&self) -> Option<Bounds> {
        self.bounds
    }

    fn draw(&mut self, commands: &[DrawCmd]) {
        self.last_frame = commands.to_vec();
        self.frames_drawn += 1;
    }
}
