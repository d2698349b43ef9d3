//! Keyboard dispatch for host toggles and the joypad
//!
//! Key-down events go through the press table (one-shot actions) and then the
//! hold table; key-up events go through the hold table only. Hold actions see
//! the key level, so a binding can follow the key (`NoSync`) or react to the
//! release edge (`Fullscreen`).

use crate::config::{HostConfig, SOUND_CHANNELS};
use crate::emulator::JoypadButtons;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Platform-independent key identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Num1,
    Num2,
    Num3,
    Num4,
    B,
    N,
    O,
    W,
    X,
    Z,
    F6,
    F9,
    F11,
    Space,
    Escape,
    Tab,
    Return,
    Backspace,
    Up,
    Down,
    Left,
    Right,
}

/// Input delivered by the platform's event pump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Window closed or the platform asked to exit
    Quit,
}

/// One-shot actions fired on key-down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressAction {
    /// Mute or unmute a sound channel
    ToggleChannel(usize),
    ToggleBg,
    ToggleWindow,
    ToggleObj,
    WriteState,
    ReadState,
    /// Advance one pass then pause
    Step,
    TogglePause,
    Quit,
}

/// Level actions evaluated on both key-down and key-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldAction {
    /// Disable sync while held
    NoSync,
    /// Toggle fullscreen on release
    Fullscreen,
}

/// Side requests produced while dispatching input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Quit,
    WriteState,
    ReadState,
}

/// Joypad button a key drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

/// Press and hold dispatch tables
#[derive(Debug, Clone)]
pub struct KeyBindings {
    press: HashMap<Key, PressAction>,
    hold: HashMap<Key, HoldAction>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let press = HashMap::from([
            (Key::Num1, PressAction::ToggleChannel(0)),
            (Key::Num2, PressAction::ToggleChannel(1)),
            (Key::Num3, PressAction::ToggleChannel(2)),
            (Key::Num4, PressAction::ToggleChannel(3)),
            (Key::B, PressAction::ToggleBg),
            (Key::W, PressAction::ToggleWindow),
            (Key::O, PressAction::ToggleObj),
            (Key::F6, PressAction::WriteState),
            (Key::F9, PressAction::ReadState),
            (Key::N, PressAction::Step),
            (Key::Space, PressAction::TogglePause),
            (Key::Escape, PressAction::Quit),
        ]);
        let hold = HashMap::from([
            (Key::Tab, HoldAction::NoSync),
            (Key::F11, HoldAction::Fullscreen),
        ]);
        Self { press, hold }
    }
}

impl KeyBindings {
    /// Bind `key` to a press action, replacing any previous binding
    pub fn bind_press(&mut self, key: Key, action: PressAction) {
        self.press.insert(key, action);
    }

    /// Bind `key` to a hold action, replacing any previous binding
    pub fn bind_hold(&mut self, key: Key, action: HoldAction) {
        self.hold.insert(key, action);
    }

    /// Apply one event to `config`, collecting side requests
    pub fn dispatch(&self, event: InputEvent, config: &mut HostConfig, requests: &mut Vec<Request>) {
        let (key, down) = match event {
            InputEvent::KeyDown(key) => (key, true),
            InputEvent::KeyUp(key) => (key, false),
            InputEvent::Quit => {
                requests.push(Request::Quit);
                return;
            }
        };

        if down {
            if let Some(&action) = self.press.get(&key) {
                apply_press(action, config, requests);
            }
        }

        if let Some(&action) = self.hold.get(&key) {
            apply_hold(action, down, config);
        }
    }
}

fn apply_press(action: PressAction, config: &mut HostConfig, requests: &mut Vec<Request>) {
    match action {
        PressAction::ToggleChannel(channel) if channel < SOUND_CHANNELS => {
            config.disable_channel[channel] ^= true;
        }
        PressAction::ToggleChannel(channel) => {
            debug!("Ignoring toggle for unknown sound channel {}", channel);
        }
        PressAction::ToggleBg => config.disable_bg ^= true,
        PressAction::ToggleWindow => config.disable_window ^= true,
        PressAction::ToggleObj => config.disable_obj ^= true,
        PressAction::WriteState => requests.push(Request::WriteState),
        PressAction::ReadState => requests.push(Request::ReadState),
        PressAction::Step => {
            config.step = true;
            config.paused = false;
        }
        PressAction::TogglePause => config.paused ^= true,
        PressAction::Quit => requests.push(Request::Quit),
    }
}

fn apply_hold(action: HoldAction, down: bool, config: &mut HostConfig) {
    match action {
        HoldAction::NoSync => config.no_sync = down,
        HoldAction::Fullscreen => {
            if !down {
                config.fullscreen ^= true;
            }
        }
    }
}

/// Keys currently held, shared with the joypad callback
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    held: Arc<Mutex<HashSet<Key>>>,
}

impl KeyState {
    /// Track the key level carried by `event`
    pub fn update(&self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                self.held.lock().insert(key);
            }
            InputEvent::KeyUp(key) => {
                self.held.lock().remove(&key);
            }
            InputEvent::Quit => {}
        }
    }

    /// Whether `key` is held
    pub fn is_down(&self, key: Key) -> bool {
        self.held.lock().contains(&key)
    }
}

/// Keyboard to joypad mapping
#[derive(Debug, Clone)]
pub struct JoypadMap {
    keys: Vec<(Key, Button)>,
}

impl Default for JoypadMap {
    fn default() -> Self {
        Self {
            keys: vec![
                (Key::Up, Button::Up),
                (Key::Down, Button::Down),
                (Key::Left, Button::Left),
                (Key::Right, Button::Right),
                (Key::Z, Button::B),
                (Key::X, Button::A),
                (Key::Return, Button::Start),
                (Key::Backspace, Button::Select),
            ],
        }
    }
}

impl JoypadMap {
    /// Fill `buttons` from the held keys
    pub fn read(&self, state: &KeyState, buttons: &mut JoypadButtons) {
        *buttons = JoypadButtons::default();
        let held = state.held.lock();
        for &(key, button) in &self.keys {
            if !held.contains(&key) {
                continue;
            }
            match button {
                Button::Up => buttons.up = true,
                Button::Down => buttons.down = true,
                Button::Left => buttons.left = true,
                Button::Right => buttons.right = true,
                Button::A => buttons.a = true,
                Button::B => buttons.b = true,
                Button::Start => buttons.start = true,
                Button::Select => buttons.select = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(events: &[InputEvent], config: &mut HostConfig) -> Vec<Request> {
        let bindings = KeyBindings::default();
        let mut requests = Vec::new();
        for &event in events {
            bindings.dispatch(event, config, &mut requests);
        }
        requests
    }

    #[test]
    fn test_press_toggles() {
        let mut config = HostConfig::default();
        run(
            &[
                InputEvent::KeyDown(Key::Num2),
                InputEvent::KeyDown(Key::B),
                InputEvent::KeyDown(Key::Space),
            ],
            &mut config,
        );
        assert_eq!(config.disable_channel, [false, true, false, false]);
        assert!(config.disable_bg);
        assert!(config.paused);

        // Key-up does not fire press actions.
        run(&[InputEvent::KeyUp(Key::Space)], &mut config);
        assert!(config.paused);
    }

    #[test]
    fn test_step_unpauses() {
        let mut config = HostConfig {
            paused: true,
            ..HostConfig::default()
        };
        run(&[InputEvent::KeyDown(Key::N)], &mut config);
        assert!(config.step);
        assert!(!config.paused);
    }

    #[test]
    fn test_no_sync_follows_key_level() {
        let mut config = HostConfig::default();
        run(&[InputEvent::KeyDown(Key::Tab)], &mut config);
        assert!(config.no_sync);
        run(&[InputEvent::KeyUp(Key::Tab)], &mut config);
        assert!(!config.no_sync);
    }

    #[test]
    fn test_fullscreen_toggles_on_release() {
        let mut config = HostConfig::default();
        run(&[InputEvent::KeyDown(Key::F11)], &mut config);
        assert!(!config.fullscreen);
        run(&[InputEvent::KeyUp(Key::F11)], &mut config);
        assert!(config.fullscreen);
    }

    #[test]
    fn test_requests() {
        let mut config = HostConfig::default();
        let requests = run(
            &[
                InputEvent::KeyDown(Key::F6),
                InputEvent::KeyDown(Key::F9),
                InputEvent::KeyDown(Key::Escape),
                InputEvent::Quit,
            ],
            &mut config,
        );
        assert_eq!(
            requests,
            vec![
                Request::WriteState,
                Request::ReadState,
                Request::Quit,
                Request::Quit
            ]
        );
    }

    #[test]
    fn test_rebinding() {
        let mut bindings = KeyBindings::default();
        bindings.bind_press(Key::Tab, PressAction::TogglePause);
        bindings.bind_hold(Key::Space, HoldAction::NoSync);

        let mut config = HostConfig::default();
        let mut requests = Vec::new();
        bindings.dispatch(InputEvent::KeyDown(Key::Tab), &mut config, &mut requests);
        // Tab still carries its hold binding as well.
        assert!(config.paused);
        assert!(config.no_sync);

        bindings.dispatch(InputEvent::KeyDown(Key::Space), &mut config, &mut requests);
        assert!(!config.paused);
    }

    #[test]
    fn test_joypad_reads_held_keys() {
        let state = KeyState::default();
        let map = JoypadMap::default();
        state.update(InputEvent::KeyDown(Key::X));
        state.update(InputEvent::KeyDown(Key::Left));
        state.update(InputEvent::KeyDown(Key::Return));
        state.update(InputEvent::KeyUp(Key::Return));

        let mut buttons = JoypadButtons {
            select: true,
            ..JoypadButtons::default()
        };
        map.read(&state, &mut buttons);

        assert_eq!(
            buttons,
            JoypadButtons {
                a: true,
                left: true,
                ..JoypadButtons::default()
            }
        );
        assert!(state.is_down(Key::X));
        assert!(!state.is_down(Key::Return));
    }
}
