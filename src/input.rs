//! Per-frame input snapshot.
//!
//! The window handler feeds events in as they arrive; the viewer reads the
//! snapshot once per frame and then calls [`InputState::end_frame`], which
//! clears everything edge-triggered.

use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Escape,
    Tab,
    F5,
    F11,
    /// Printable key, lower-cased.
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

#[derive(Debug, Default)]
pub struct InputState {
    keys_pressed: HashSet<Key>,
    buttons_down: HashSet<Button>,
    buttons_pressed: HashSet<Button>,
    pub modifiers: Modifiers,
    pub cursor: (i32, i32),
    previous_cursor: (i32, i32),
    /// Accumulated wheel movement this frame, in lines. Positive is up/right.
    pub scroll: (f32, f32),
    pub dropped: Vec<PathBuf>,
    pub resized: bool,
    pub close_requested: bool,
}

impl InputState {
    /// Only fresh presses count; releases and auto-repeat are ignored.
    pub fn key_event(&mut self, key: Key, pressed: bool, repeat: bool) {
        if pressed && !repeat {
            self.keys_pressed.insert(key);
        }
    }

    pub fn button_event(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons_pressed.insert(button);
            self.buttons_down.insert(button);
        } else {
            self.buttons_down.remove(&button);
        }
    }

    pub fn cursor_moved(&mut self, position: (i32, i32)) {
        self.cursor = position;
    }

    pub fn scrolled(&mut self, dx: f32, dy: f32) {
        self.scroll.0 += dx;
        self.scroll.1 += dy;
    }

    /// Forget held buttons, e.g. when focus is lost mid-drag.
    pub fn release_all(&mut self) {
        self.buttons_down.clear();
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn char_pressed(&self, c: char) -> bool {
        self.key_pressed(Key::Char(c))
    }

    pub fn ctrl_pressed(&self, c: char) -> bool {
        self.modifiers.ctrl && self.char_pressed(c)
    }

    pub fn any_button_down(&self) -> bool {
        !self.buttons_down.is_empty()
    }

    pub fn button_pressed(&self, button: Button) -> bool {
        self.buttons_pressed.contains(&button)
    }

    /// Pointer movement since last frame, as previous minus current.
    pub fn mouse_delta(&self) -> (i32, i32) {
        (
            self.previous_cursor.0 - self.cursor.0,
            self.previous_cursor.1 - self.cursor.1,
        )
    }

    pub fn mouse_moved(&self) -> bool {
        self.mouse_delta() != (0, 0)
    }

    /// Whole wheel notches this frame, vertical. Positive is up.
    pub fn scroll_steps(&self) -> i32 {
        self.scroll.1.trunc() as i32
    }

    pub fn horizontal_scroll_steps(&self) -> i32 {
        self.scroll.0.trunc() as i32
    }

    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.buttons_pressed.clear();
        self.previous_cursor = self.cursor;
        self.scroll.0 -= self.scroll.0.trunc();
        self.scroll.1 -= self.scroll.1.trunc();
        self.dropped.clear();
        self.resized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presses_are_edge_triggered() {
        let mut input = InputState::default();
        input.key_event(Key::Right, true, false);
        assert!(input.key_pressed(Key::Right));

        input.end_frame();
        assert!(!input.key_pressed(Key::Right));

        // Auto-repeat does not count as a new press.
        input.key_event(Key::Right, true, true);
        assert!(!input.key_pressed(Key::Right));

        input.key_event(Key::Right, false, false);
        assert!(!input.key_pressed(Key::Right));
    }

    #[test]
    fn buttons_track_press_and_release() {
        let mut input = InputState::default();
        input.button_event(Button::Primary, true);
        assert!(input.button_pressed(Button::Primary));
        assert!(input.any_button_down());
        input.end_frame();

        assert!(!input.button_pressed(Button::Primary));
        assert!(input.any_button_down());

        input.button_event(Button::Primary, false);
        assert!(!input.any_button_down());
    }

    #[test]
    fn losing_focus_drops_held_buttons() {
        let mut input = InputState::default();
        input.button_event(Button::Secondary, true);
        input.button_event(Button::Middle, true);
        input.release_all();
        assert!(!input.any_button_down());
    }

    #[test]
    fn delta_is_previous_minus_current() {
        let mut input = InputState::default();
        input.cursor_moved((100, 100));
        input.end_frame();
        input.cursor_moved((110, 95));
        assert_eq!(input.mouse_delta(), (-10, 5));
        input.end_frame();
        assert_eq!(input.mouse_delta(), (0, 0));
        assert!(!input.mouse_moved());
    }

    #[test]
    fn fractional_scroll_carries_over() {
        let mut input = InputState::default();
        input.scrolled(0.0, 0.6);
        assert_eq!(input.scroll_steps(), 0);
        input.end_frame();
        input.scrolled(0.0, 0.6);
        assert_eq!(input.scroll_steps(), 1);
        input.end_frame();
        input.scrolled(0.0, -2.0);
        assert_eq!(input.scroll_steps(), -1);
    }

    #[test]
    fn frame_end_clears_drops_and_resize() {
        let mut input = InputState::default();
        input.dropped.push(PathBuf::from("a.png"));
        input.resized = true;
        input.end_frame();
        assert!(input.dropped.is_empty());
        assert!(!input.resized);
    }

    #[test]
    fn ctrl_combinations() {
        let mut input = InputState::default();
        input.key_event(Key::Char('o'), true, false);
        assert!(!input.ctrl_pressed('o'));
        input.modifiers.ctrl = true;
        assert!(input.ctrl_pressed('o'));
    }
}
