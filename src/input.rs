use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    W,
    A,
    S,
    D,
    Space,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Descend,
    Ascend,
    Release,
    SteerLeft,
    SteerRight,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyPressed(Key),
    KeyReleased(Key),
}

pub struct ActionMap {
    descend_keys: Vec<Key>,
    ascend_keys: Vec<Key>,
    release_keys: Vec<Key>,
    steer_left_keys: Vec<Key>,
    steer_right_keys: Vec<Key>,
    exit_keys: Vec<Key>,
}

impl Default for ActionMap {
    fn default() -> Self {
        Self {
            descend_keys: vec![Key::Down, Key::S],
            ascend_keys: vec![Key::Up, Key::W],
            release_keys: vec![Key::Space],
            steer_left_keys: vec![Key::Left, Key::A],
            steer_right_keys: vec![Key::Right, Key::D],
            exit_keys: vec![Key::Escape],
        }
    }
}

impl ActionMap {
    fn keys(&self, action: Action) -> &[Key] {
        match action {
            Action::Descend => &self.descend_keys,
            Action::Ascend => &self.ascend_keys,
            Action::Release => &self.release_keys,
            Action::SteerLeft => &self.steer_left_keys,
            Action::SteerRight => &self.steer_right_keys,
            Action::Exit => &self.exit_keys,
        }
    }

    pub fn just_pressed(&self, action: Action, input: &InputState) -> bool {
        self.keys(action)
            .iter()
            .any(|key| input.was_key_just_pressed(*key))
    }

    pub fn is_held(&self, action: Action, input: &InputState) -> bool {
        self.keys(action).iter().any(|key| input.is_key_down(*key))
    }

    /// Horizontal steer in `[-1, 1]`; opposing keys cancel out.
    pub fn steer_axis(&self, input: &InputState) -> f32 {
        let mut axis = 0.0;
        if self.is_held(Action::SteerLeft, input) {
            axis -= 1.0;
        }
        if self.is_held(Action::SteerRight, input) {
            axis += 1.0;
        }
        axis
    }
}

#[derive(Default)]
pub struct InputState {
    pressed_keys: HashSet<Key>,
    just_pressed_keys: HashSet<Key>,
    just_released_keys: HashSet<Key>,
}

impl InputState {
    pub fn on_event(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::KeyPressed(key) => {
                // "just pressed" only on first press (ignore key repeat).
                if self.pressed_keys.insert(key) {
                    self.just_pressed_keys.insert(key);
                    return true;
                }
                false
            }
            InputEvent::KeyReleased(key) => {
                if self.pressed_keys.remove(&key) {
                    self.just_released_keys.insert(key);
                    return true;
                }
                false
            }
        }
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn was_key_just_pressed(&self, key: Key) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    pub fn was_key_just_released(&self, key: Key) -> bool {
        self.just_released_keys.contains(&key)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.just_released_keys.clear();
    }
}
