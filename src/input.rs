//! Per-frame input snapshot.
//!
//! The playground never polls the OS. The platform layer feeds events into an
//! [`InputSnapshot`], and at the start of each frame
//! [`begin_frame`](InputSnapshot::begin_frame) clears the per-frame parts
//! (transition counts, mouse delta, scroll, widget events). Snapshots are
//! serializable so a session can be recorded and replayed.
//!
//! Each button tracks whether it is down and how many times it changed
//! state this frame, so a press and release inside one frame is not lost.
//!
//! ```
//! use particle_playground::{InputSnapshot, Key};
//!
//! let mut input = InputSnapshot::new();
//! input.set_key(Key::P, true);
//! input.set_key(Key::P, false);
//!
//! assert!(input.key_pressed(Key::P));
//! assert!(!input.key(Key::P).is_down);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::gui::UiEvent;

/// Wheel units per notch.
pub const WHEEL_NOTCH: f32 = 120.0;

/// Level and edge state of one button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonState {
    pub is_down: bool,
    /// State changes since the start of the frame.
    pub transitions: u32,
}

impl ButtonState {
    /// Went down at least once this frame.
    pub fn pressed(&self) -> bool {
        self.transitions > 1 || (self.transitions == 1 && self.is_down)
    }

    /// Went up at least once this frame.
    pub fn released(&self) -> bool {
        self.transitions > 1 || (self.transitions == 1 && !self.is_down)
    }

    fn set(&mut self, down: bool) {
        if self.is_down != down {
            self.is_down = down;
            self.transitions += 1;
        }
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub const ALL: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];
}

/// Keys the playground reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    R,
    P,
    Space,
    Left,
    Right,
    Up,
    Down,
    Escape,
}

impl Key {
    pub const ALL: [Key; 16] = [
        Key::Digit1,
        Key::Digit2,
        Key::Digit3,
        Key::Digit4,
        Key::Digit5,
        Key::Digit6,
        Key::Digit7,
        Key::Digit8,
        Key::R,
        Key::P,
        Key::Space,
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::Escape,
    ];

    /// Digit keys in order, for preset shortcuts.
    pub const DIGITS: [Key; 8] = [
        Key::Digit1,
        Key::Digit2,
        Key::Digit3,
        Key::Digit4,
        Key::Digit5,
        Key::Digit6,
        Key::Digit7,
        Key::Digit8,
    ];
}

/// Everything the app reads from the platform in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    mouse: [ButtonState; 3],
    keys: [ButtonState; 16],
    /// Cursor position in window pixels, origin top-left.
    pub mouse_pos: Vec2,
    /// Cursor movement this frame.
    pub mouse_delta: Vec2,
    /// Wheel movement this frame, [`WHEEL_NOTCH`] per notch, positive away from the user.
    pub scroll: f32,
    /// Widget clicks reported by the host UI this frame.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ui_events: Vec<UiEvent>,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self {
            mouse: [ButtonState::default(); 3],
            keys: [ButtonState::default(); 16],
            mouse_pos: Vec2::ZERO,
            mouse_delta: Vec2::ZERO,
            scroll: 0.0,
            ui_events: Vec::new(),
        }
    }

    /// Clear per-frame state; held buttons stay held.
    pub fn begin_frame(&mut self) {
        for b in self.mouse.iter_mut().chain(self.keys.iter_mut()) {
            b.transitions = 0;
        }
        self.mouse_delta = Vec2::ZERO;
        self.scroll = 0.0;
        self.ui_events.clear();
    }

    pub fn key(&self, key: Key) -> ButtonState {
        self.keys[key as usize]
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.key(key).pressed()
    }

    pub fn mouse(&self, button: MouseButton) -> ButtonState {
        self.mouse[button as usize]
    }

    pub fn set_key(&mut self, key: Key, down: bool) {
        self.keys[key as usize].set(down);
    }

    pub fn set_mouse(&mut self, button: MouseButton, down: bool) {
        self.mouse[button as usize].set(down);
    }

    /// Move the cursor to `pos`, accumulating the delta.
    pub fn move_mouse(&mut self, pos: Vec2) {
        self.mouse_delta += pos - self.mouse_pos;
        self.mouse_pos = pos;
    }

    pub fn add_scroll(&mut self, amount: f32) {
        self.scroll += amount;
    }

    pub fn push_ui_event(&mut self, event: UiEvent) {
        self.ui_events.push(event);
    }
}

#[cfg(feature = "viewer")]
mod winit_events {
    use super::*;
    use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
    use winit::keyboard::{KeyCode, PhysicalKey};

    impl MouseButton {
        fn from_winit(button: WinitMouseButton) -> Option<Self> {
            match button {
                WinitMouseButton::Left => Some(MouseButton::Left),
                WinitMouseButton::Right => Some(MouseButton::Right),
                WinitMouseButton::Middle => Some(MouseButton::Middle),
                _ => None,
            }
        }
    }

    impl Key {
        fn from_winit(code: KeyCode) -> Option<Self> {
            Some(match code {
                KeyCode::Digit1 => Key::Digit1,
                KeyCode::Digit2 => Key::Digit2,
                KeyCode::Digit3 => Key::Digit3,
                KeyCode::Digit4 => Key::Digit4,
                KeyCode::Digit5 => Key::Digit5,
                KeyCode::Digit6 => Key::Digit6,
                KeyCode::Digit7 => Key::Digit7,
                KeyCode::Digit8 => Key::Digit8,
                KeyCode::KeyR => Key::R,
                KeyCode::KeyP => Key::P,
                KeyCode::Space => Key::Space,
                KeyCode::ArrowLeft => Key::Left,
                KeyCode::ArrowRight => Key::Right,
                KeyCode::ArrowUp => Key::Up,
                KeyCode::ArrowDown => Key::Down,
                KeyCode::Escape => Key::Escape,
                _ => return None,
            })
        }
    }

    impl InputSnapshot {
        /// Fold a winit window event into the snapshot.
        pub fn handle_event(&mut self, event: &WindowEvent) {
            match event {
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.repeat {
                        return;
                    }
                    if let PhysicalKey::Code(code) = event.physical_key {
                        if let Some(key) = Key::from_winit(code) {
                            self.set_key(key, event.state == ElementState::Pressed);
                        }
                    }
                }

                WindowEvent::MouseInput { state, button, .. } => {
                    if let Some(button) = MouseButton::from_winit(*button) {
                        self.set_mouse(button, *state == ElementState::Pressed);
                    }
                }

                WindowEvent::CursorMoved { position, .. } => {
                    self.move_mouse(Vec2::new(position.x as f32, position.y as f32));
                }

                WindowEvent::MouseWheel { delta, .. } => {
                    self.add_scroll(match delta {
                        MouseScrollDelta::LineDelta(_, y) => *y * WHEEL_NOTCH,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                    });
                }

                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut input = InputSnapshot::new();

        assert!(!input.key(Key::Space).is_down);
        assert!(!input.key_pressed(Key::Space));

        input.set_key(Key::Space, true);
        assert!(input.key(Key::Space).is_down);
        assert!(input.key_pressed(Key::Space));

        // After begin_frame, pressed is cleared but held remains
        input.begin_frame();
        assert!(input.key(Key::Space).is_down);
        assert!(!input.key_pressed(Key::Space));
    }

    #[test]
    fn test_repeated_down_is_one_transition() {
        let mut input = InputSnapshot::new();
        input.set_mouse(MouseButton::Left, true);
        input.set_mouse(MouseButton::Left, true);
        assert_eq!(input.mouse(MouseButton::Left).transitions, 1);
    }

    #[test]
    fn test_click_within_one_frame() {
        let mut input = InputSnapshot::new();
        input.set_mouse(MouseButton::Left, true);
        input.set_mouse(MouseButton::Left, false);

        let left = input.mouse(MouseButton::Left);
        assert!(!left.is_down);
        assert!(left.pressed());
        assert!(left.released());
    }

    #[test]
    fn test_mouse_delta_accumulates() {
        let mut input = InputSnapshot::new();
        input.move_mouse(Vec2::new(10.0, 10.0));
        input.begin_frame();
        input.move_mouse(Vec2::new(12.0, 9.0));
        input.move_mouse(Vec2::new(15.0, 5.0));
        input.add_scroll(120.0);

        assert_eq!(input.mouse_delta, Vec2::new(5.0, -5.0));
        assert_eq!(input.scroll, 120.0);

        input.begin_frame();
        assert_eq!(input.mouse_delta, Vec2::ZERO);
        assert_eq!(input.scroll, 0.0);
        assert_eq!(input.mouse_pos, Vec2::new(15.0, 5.0));
    }

    #[test]
    fn test_ui_events_last_one_frame() {
        let mut input = InputSnapshot::new();
        input.push_ui_event(UiEvent::ReloadMesh);

        let json = serde_json::to_string(&input).unwrap();
        let restored: InputSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.ui_events, vec![UiEvent::ReloadMesh]);

        input.begin_frame();
        assert!(input.ui_events.is_empty());
    }

    #[test]
    fn test_key_table_matches_discriminants() {
        for (i, key) in Key::ALL.iter().enumerate() {
            assert_eq!(*key as usize, i);
        }
    }
}
