use std::time::{Duration, Instant};

use log::debug;

use crate::camera::{Camera, Movement};
use crate::config::{KeyBindings, ViewerConfig};
use crate::input::{InputFrame, InputState, KeyCode};

const MIN_FRAME_DELTA: Duration = Duration::from_micros(100);

/// Wall-clock delta between frame starts, clamped to `[0.1 ms, max]`.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new(dt_max: Duration) -> Self {
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_max: dt_max.max(MIN_FRAME_DELTA),
        }
    }

    /// Resets the baseline, e.g. after the window regains focus.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(MIN_FRAME_DELTA, self.dt_max);
        self.last = now;
        self.frame_index = self.frame_index.wrapping_add(1);
        dt.as_secs_f32()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    Continue,
    Exit,
}

/// Platform-independent viewer state: input in, camera out.
#[derive(Debug)]
pub struct Viewer {
    camera: Camera,
    input: InputState,
    bindings: KeyBindings,
}

impl Viewer {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            camera: Camera::new(&config.camera),
            input: InputState::new(),
            bindings: config.bindings,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn focus_changed(&mut self, focused: bool) {
        if focused {
            self.camera.activate();
        } else {
            self.input.clear();
        }
    }

    /// Applies one frame of input to the camera.
    pub fn update(&mut self, dt: f32) -> ControlRequest {
        let frame = self.input.take_frame();
        if frame.was_pressed(self.bindings.exit) || self.input.is_key_down(self.bindings.exit) {
            return ControlRequest::Exit;
        }

        let speed = self.camera.movement_speed();
        for (key, movement) in self.movement_keys() {
            if self.input.is_key_down(key) {
                self.camera.apply_movement(movement, speed, dt);
            }
        }

        if frame.was_pressed(self.bindings.toggle_projection) {
            self.camera.toggle_projection();
            debug!("projection: {:?}", self.camera.projection_mode());
        }

        self.apply_pointer(&frame);
        ControlRequest::Continue
    }

    fn apply_pointer(&mut self, frame: &InputFrame) {
        for cursor in &frame.cursor {
            self.camera.apply_look(*cursor);
        }
        if frame.scroll != 0.0 {
            self.camera.apply_zoom(frame.scroll);
        }
    }

    fn movement_keys(&self) -> [(KeyCode, Movement); 6] {
        let b = &self.bindings;
        [
            (b.forward, Movement::Forward),
            (b.backward, Movement::Backward),
            (b.strafe_left, Movement::StrafeLeft),
            (b.strafe_right, Movement::StrafeRight),
            (b.up, Movement::Up),
            (b.down, Movement::Down),
        ]
    }
}
