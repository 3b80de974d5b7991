use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;

/// Pitch is kept strictly inside the poles so `cross(front, up)` never degenerates.
pub const PITCH_LIMIT: f32 = 89.0;

const MIN_FIELD_OF_VIEW: f32 = 1.0;
const MAX_FIELD_OF_VIEW: f32 = 45.0;

/// Direction of a single camera displacement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    Forward,
    Backward,
    Up,
    Down,
    StrafeLeft,
    StrafeRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

impl ProjectionMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Perspective => Self::Orthographic,
            Self::Orthographic => Self::Perspective,
        }
    }
}

/// What a scroll wheel tick changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollMode {
    /// Scroll adjusts the movement speed (observed reference behavior).
    #[default]
    MovementSpeed,
    /// Scroll narrows or widens the perspective field of view.
    FieldOfView,
}

/// Framebuffer dimensions in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height.max(1.0)
    }
}

/// Free-flying camera driven by keyboard, cursor and scroll input.
///
/// `front` is always rebuilt from `yaw`/`pitch`; it is never integrated.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
    field_of_view: f32,
    near: f32,
    far: f32,
    projection: ProjectionMode,
    movement_speed: f32,
    sensitivity: f32,
    scroll_step: f32,
    scroll_mode: ScrollMode,
    last_cursor: Option<Vec2>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        let pitch = config.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        Self {
            position: config.position,
            front: front_from_angles(config.yaw, pitch),
            up: Vec3::Y,
            yaw: config.yaw,
            pitch,
            field_of_view: config.field_of_view,
            near: config.near,
            far: config.far,
            projection: ProjectionMode::Perspective,
            movement_speed: config.movement_speed.max(0.0),
            sensitivity: config.mouse_sensitivity,
            scroll_step: config.scroll_step,
            scroll_mode: config.scroll_mode,
            last_cursor: None,
        }
    }

    /// Re-arms the first-look latch so the next cursor sample is only a reference.
    pub fn activate(&mut self) {
        self.last_cursor = None;
    }

    pub fn apply_movement(&mut self, direction: Movement, speed: f32, dt: f32) {
        let step = speed.max(0.0) * dt;
        let right = self.front.cross(self.up).normalize();
        let offset = match direction {
            Movement::Forward => self.front,
            Movement::Backward => -self.front,
            Movement::Up => self.up,
            Movement::Down => -self.up,
            Movement::StrafeLeft => -right,
            Movement::StrafeRight => right,
        };
        self.position += offset * step;
    }

    /// Feeds an absolute cursor position.
    pub fn apply_look(&mut self, cursor: Vec2) {
        let Some(last) = self.last_cursor.replace(cursor) else {
            return;
        };

        // Screen y grows downward.
        let dx = (cursor.x - last.x) * self.sensitivity;
        let dy = (last.y - cursor.y) * self.sensitivity;

        self.yaw += dx;
        self.pitch = (self.pitch + dy).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.front = front_from_angles(self.yaw, self.pitch);
    }

    pub fn apply_zoom(&mut self, scroll_delta: f32) {
        match self.scroll_mode {
            ScrollMode::MovementSpeed => {
                self.movement_speed = (self.movement_speed + scroll_delta * self.scroll_step).max(0.0);
            }
            ScrollMode::FieldOfView => {
                self.field_of_view = (self.field_of_view - scroll_delta)
                    .clamp(MIN_FIELD_OF_VIEW, MAX_FIELD_OF_VIEW);
            }
        }
    }

    pub fn toggle_projection(&mut self) {
        self.projection = self.projection.toggled();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn projection_matrix(&self, viewport: Viewport) -> Mat4 {
        match self.projection {
            ProjectionMode::Perspective => Mat4::perspective_rh(
                self.field_of_view.to_radians(),
                viewport.aspect_ratio(),
                self.near,
                self.far,
            ),
            ProjectionMode::Orthographic => Mat4::orthographic_rh(
                0.0,
                viewport.width,
                0.0,
                viewport.height,
                self.near,
                self.far,
            ),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    pub fn movement_speed(&self) -> f32 {
        self.movement_speed
    }

    pub fn projection_mode(&self) -> ProjectionMode {
        self.projection
    }
}

fn front_from_angles(yaw: f32, pitch: f32) -> Vec3 {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    Vec3::new(
        yaw.cos() * pitch.cos(),
        pitch.sin(),
        yaw.sin() * pitch.cos(),
    )
    .normalize()
}
