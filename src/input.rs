use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
    Function(u8),
}

impl KeyCode {
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if ch.is_ascii_alphabetic() {
                return Some(Self::Character(ch.to_ascii_uppercase()));
            }
            if ch.is_ascii_digit() {
                return Some(Self::Digit(ch as u8 - b'0'));
            }
        }
        if let Some(function) = name.strip_prefix('F').or_else(|| name.strip_prefix('f')) {
            if let Ok(index) = function.parse::<u8>() {
                if (1..=25).contains(&index) {
                    return Some(Self::Function(index));
                }
            }
        }
        None
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Space" => Space,
        "Enter" | "Return" => Enter,
        "Tab" => Tab,
        "Left" => Left,
        "Right" => Right,
        "Up" => Up,
        "Down" => Down,
        "Escape" | "Esc" => Escape,
        "Backspace" => Backspace,
        "Home" => Home,
        "End" => End,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "LeftShift" | "LShift" => LeftShift,
        "RightShift" | "RShift" => RightShift,
        "LeftCtrl" | "LControl" => LeftCtrl,
        "RightCtrl" | "RControl" => RightCtrl,
        "LeftAlt" | "LAlt" => LeftAlt,
        "RightAlt" | "RAlt" => RightAlt,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Friendly names for the non-printable keys a binding may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Backspace,
    Home,
    End,
    PageUp,
    PageDown,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,
}

/// Keyboard, cursor and scroll state accumulated between two frames.
///
/// Held keys persist across frames; presses, cursor samples and scroll are
/// drained by [`InputState::take_frame`].
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    pressed: HashSet<KeyCode>,
    cursor: Vec<Vec2>,
    scroll: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key going down. Auto-repeat events do not count as presses.
    pub fn set_key_down(&mut self, key: KeyCode) {
        if self.held.insert(key) {
            self.pressed.insert(key);
        }
    }

    pub fn set_key_up(&mut self, key: KeyCode) {
        self.held.remove(&key);
    }

    pub fn push_cursor(&mut self, position: Vec2) {
        self.cursor.push(position);
    }

    pub fn add_scroll(&mut self, lines: f32) {
        self.scroll += lines;
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Drains the per-frame edges, leaving held keys untouched.
    pub fn take_frame(&mut self) -> InputFrame {
        InputFrame {
            pressed: std::mem::take(&mut self.pressed),
            cursor: std::mem::take(&mut self.cursor),
            scroll: std::mem::take(&mut self.scroll),
        }
    }

    /// Forgets everything, used when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
        self.pressed.clear();
        self.cursor.clear();
        self.scroll = 0.0;
    }
}

/// Unbounded cursor position built from raw pointer motion.
///
/// Absolute window positions pass through until the first raw motion
/// arrives; from then on only accumulated deltas move the cursor, so a
/// locked or confined pointer keeps feeding look input.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct VirtualCursor {
    position: Vec2,
    raw_motion: bool,
}

impl VirtualCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn motion(&mut self, delta: Vec2) -> Vec2 {
        self.raw_motion = true;
        self.position += delta;
        self.position
    }

    /// Returns the position to report, or `None` once raw motion took over.
    pub fn moved(&mut self, position: Vec2) -> Option<Vec2> {
        if self.raw_motion {
            return None;
        }
        self.position = position;
        Some(position)
    }
}

/// Edge-triggered input gathered for one frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputFrame {
    pub pressed: HashSet<KeyCode>,
    pub cursor: Vec<Vec2>,
    pub scroll: f32,
}

impl InputFrame {
    pub fn was_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_character_keys() {
        assert_eq!(
            KeyCode::from_name("Space"),
            Some(KeyCode::Named(NamedKey::Space))
        );
        assert_eq!(KeyCode::from_name("w"), Some(KeyCode::Character('W')));
        assert_eq!(KeyCode::from_name("7"), Some(KeyCode::Digit(7)));
        assert_eq!(KeyCode::from_name("F12"), Some(KeyCode::Function(12)));
        assert_eq!(KeyCode::from_name("F26"), None);
        assert_eq!(KeyCode::from_name("é"), None);
    }

    #[test]
    fn virtual_cursor_accumulates_past_window_bounds() {
        let mut cursor = VirtualCursor::new();
        assert_eq!(cursor.moved(Vec2::new(400.0, 300.0)), Some(Vec2::new(400.0, 300.0)));

        for _ in 0..10 {
            cursor.motion(Vec2::new(500.0, 0.0));
        }
        assert_eq!(cursor.motion(Vec2::new(0.0, -20.0)), Vec2::new(5400.0, 280.0));
        // A locked pointer keeps reporting the same window position.
        assert_eq!(cursor.moved(Vec2::new(400.0, 300.0)), None);
    }

    #[test]
    fn input_state_tracks_held_keys() {
        let mut state = InputState::new();
        state.set_key_down(KeyCode::Named(NamedKey::Escape));
        assert!(state.is_key_down(KeyCode::from_name("Esc").unwrap()));
        state.set_key_up(KeyCode::Named(NamedKey::Escape));
        assert!(!state.is_key_down(KeyCode::Named(NamedKey::Escape)));
    }

    #[test]
    fn repeats_do_not_produce_new_presses() {
        let mut state = InputState::new();
        let p = KeyCode::Character('P');
        state.set_key_down(p);
        state.set_key_down(p);
        assert!(state.take_frame().was_pressed(p));

        state.set_key_down(p);
        let frame = state.take_frame();
        assert!(!frame.was_pressed(p));
        assert!(state.is_key_down(p));

        state.set_key_up(p);
        state.set_key_down(p);
        assert!(state.take_frame().was_pressed(p));
    }

    #[test]
    fn take_frame_drains_cursor_and_scroll() {
        let mut state = InputState::new();
        state.push_cursor(Vec2::new(1.0, 2.0));
        state.push_cursor(Vec2::new(3.0, 4.0));
        state.add_scroll(1.0);
        state.add_scroll(0.5);

        let frame = state.take_frame();
        assert_eq!(frame.cursor, vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)]);
        assert_eq!(frame.scroll, 1.5);
        assert_eq!(state.take_frame(), InputFrame::default());
    }

    #[test]
    fn clear_releases_held_keys() {
        let mut state = InputState::new();
        state.set_key_down(KeyCode::Character('W'));
        state.clear();
        assert!(!state.is_key_down(KeyCode::Character('W')));
    }
}
