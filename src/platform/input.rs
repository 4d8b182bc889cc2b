//! Keyboard state and edge-triggered key bindings
//!
//! One `InputState` is owned by the composition root and passed to the game each
//! frame. Bindings are an observer list keyed by (phase, key); firing a binding
//! yields an [`Action`] for the game to handle.

use std::collections::HashSet;

use crate::tuning::Tunable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Enter,
    Escape,
    KeyA,
    KeyC,
    KeyD,
    KeyE,
    KeyK,
    KeyQ,
    KeyS,
    KeyW,
    KeyX,
    KeyZ,
}

impl Key {
    /// Parse a `KeyboardEvent.code`
    pub fn from_code(code: &str) -> Option<Self> {
        let key = match code {
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "Space" => Key::Space,
            "Enter" | "NumpadEnter" => Key::Enter,
            "Escape" => Key::Escape,
            "KeyA" => Key::KeyA,
            "KeyC" => Key::KeyC,
            "KeyD" => Key::KeyD,
            "KeyE" => Key::KeyE,
            "KeyK" => Key::KeyK,
            "KeyQ" => Key::KeyQ,
            "KeyS" => Key::KeyS,
            "KeyW" => Key::KeyW,
            "KeyX" => Key::KeyX,
            "KeyZ" => Key::KeyZ,
            _ => return None,
        };
        Some(key)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Key::ArrowUp => "ArrowUp",
            Key::ArrowDown => "ArrowDown",
            Key::ArrowLeft => "ArrowLeft",
            Key::ArrowRight => "ArrowRight",
            Key::Space => "Space",
            Key::Enter => "Enter",
            Key::Escape => "Escape",
            Key::KeyA => "KeyA",
            Key::KeyC => "KeyC",
            Key::KeyD => "KeyD",
            Key::KeyE => "KeyE",
            Key::KeyK => "KeyK",
            Key::KeyQ => "KeyQ",
            Key::KeyS => "KeyS",
            Key::KeyW => "KeyW",
            Key::KeyX => "KeyX",
            Key::KeyZ => "KeyZ",
        }
    }
}

/// Logical key assignments
pub mod keys {
    use super::Key;

    pub const PAUSE: Key = Key::Space;
    pub const SHOOT: Key = Key::KeyS;
    pub const STOP_CAMERA: Key = Key::KeyA;
    pub const TOGGLE_CONTROLS: Key = Key::KeyC;
    pub const MOVE_FORWARD: Key = Key::ArrowUp;
    pub const MOVE_BACKWARD: Key = Key::ArrowDown;
    pub const TURN_RIGHT: Key = Key::ArrowRight;
    pub const TURN_LEFT: Key = Key::ArrowLeft;
    pub const YOU_LOSE: Key = Key::KeyK;
    pub const EXIT: Key = Key::Escape;
    pub const CAMERA_ZOOM_UP: Key = Key::KeyE;
    pub const CAMERA_ZOOM_DOWN: Key = Key::KeyD;
    pub const CAMERA_HEIGHT_UP: Key = Key::KeyQ;
    pub const CAMERA_HEIGHT_DOWN: Key = Key::KeyZ;
    pub const CAMERA_DISTANCE_UP: Key = Key::KeyW;
    pub const CAMERA_DISTANCE_DOWN: Key = Key::KeyX;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPhase {
    Down,
    Up,
}

/// What a fired binding asks the game to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    AdjustControl(Tunable, f32),
    ToggleControls,
    TogglePause,
    Exit,
    ForceGameOver,
    DetachCamera,
    AttachCamera,
    /// A `wait_for_key` completed
    Continue(Key),
}

#[derive(Debug, Clone)]
struct Binding {
    phase: KeyPhase,
    key: Key,
    action: Action,
    once: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    pressed: HashSet<Key>,
    bindings: Vec<Binding>,
    /// While set, only bindings for this key fire
    awaiting: Option<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn bind(&mut self, phase: KeyPhase, key: Key, action: Action) {
        self.bindings.push(Binding {
            phase,
            key,
            action,
            once: false,
        });
    }

    /// Binding removed after it fires
    pub fn bind_once(&mut self, phase: KeyPhase, key: Key, action: Action) {
        self.bindings.push(Binding {
            phase,
            key,
            action,
            once: true,
        });
    }

    /// Suspend every other binding until `key` is released; the release yields
    /// [`Action::Continue`].
    pub fn wait_for_key(&mut self, key: Key) {
        self.awaiting = Some(key);
        self.bind_once(KeyPhase::Up, key, Action::Continue(key));
    }

    pub fn awaiting(&self) -> Option<Key> {
        self.awaiting
    }

    /// Key pressed. Bindings fire only on the transition, not on auto-repeat.
    pub fn key_down(&mut self, key: Key) -> Vec<Action> {
        let fresh = self.pressed.insert(key);
        if fresh {
            self.fire(KeyPhase::Down, key)
        } else {
            Vec::new()
        }
    }

    pub fn key_up(&mut self, key: Key) -> Vec<Action> {
        let was_pressed = self.pressed.remove(&key);
        if was_pressed {
            self.fire(KeyPhase::Up, key)
        } else {
            Vec::new()
        }
    }

    /// Forget held keys, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        self.pressed.clear();
    }

    fn fire(&mut self, phase: KeyPhase, key: Key) -> Vec<Action> {
        if self.awaiting.is_some_and(|awaited| awaited != key) {
            return Vec::new();
        }
        let mut actions = Vec::new();
        self.bindings.retain(|binding| {
            if binding.phase != phase || binding.key != key {
                return true;
            }
            log::debug!("Key {:?} {:?} -> {:?}", phase, key, binding.action);
            actions.push(binding.action);
            !binding.once
        });
        if actions.iter().any(|a| matches!(a, Action::Continue(_))) {
            self.awaiting = None;
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_codes_round_trip() {
        for code in ["ArrowUp", "Space", "KeyK", "Enter", "Escape"] {
            let key = Key::from_code(code).expect("known key");
            assert_eq!(key.code(), code);
        }
        assert_eq!(Key::from_code("F13"), None);
    }

    #[test]
    fn test_bindings_fire_on_edges_only() {
        let mut input = InputState::new();
        input.bind(KeyPhase::Down, Key::KeyC, Action::ToggleControls);
        assert_eq!(input.key_down(Key::KeyC), vec![Action::ToggleControls]);
        // Auto-repeat
        assert!(input.key_down(Key::KeyC).is_empty());
        assert!(input.is_pressed(Key::KeyC));
        assert!(input.key_up(Key::KeyC).is_empty());
        assert!(!input.is_pressed(Key::KeyC));
        assert_eq!(input.key_down(Key::KeyC), vec![Action::ToggleControls]);
    }

    #[test]
    fn test_one_shot_binding_removed() {
        let mut input = InputState::new();
        input.bind_once(KeyPhase::Up, Key::KeyA, Action::AttachCamera);
        input.key_down(Key::KeyA);
        assert_eq!(input.key_up(Key::KeyA), vec![Action::AttachCamera]);
        input.key_down(Key::KeyA);
        assert!(input.key_up(Key::KeyA).is_empty());
    }

    #[test]
    fn test_wait_for_key_blocks_other_bindings() {
        let mut input = InputState::new();
        input.bind(KeyPhase::Down, Key::Space, Action::TogglePause);
        input.wait_for_key(Key::Enter);
        assert!(input.key_down(Key::Space).is_empty());
        // Pressed state is still tracked
        assert!(input.is_pressed(Key::Space));
        input.key_up(Key::Space);

        input.key_down(Key::Enter);
        assert_eq!(input.key_up(Key::Enter), vec![Action::Continue(Key::Enter)]);
        assert_eq!(input.awaiting(), None);
        assert_eq!(input.key_down(Key::Space), vec![Action::TogglePause]);
    }
}
