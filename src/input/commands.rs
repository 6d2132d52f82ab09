//! # Command Definitions
//!
//! Discrete input tokens and the key table that produces them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One discrete input event from the keyboard source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputToken {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PickUp,
    Drop,
    OpenInventory,
    Descend,
    Quit,
    NoAction,
}

impl InputToken {
    /// Whether the token needs an inventory selection before it becomes an
    /// action.
    pub fn opens_menu(self) -> bool {
        matches!(self, InputToken::Drop | InputToken::OpenInventory)
    }
}

impl fmt::Display for InputToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            InputToken::MoveUp => "move up",
            InputToken::MoveDown => "move down",
            InputToken::MoveLeft => "move left",
            InputToken::MoveRight => "move right",
            InputToken::PickUp => "pick up",
            InputToken::Drop => "drop",
            InputToken::OpenInventory => "inventory",
            InputToken::Descend => "descend",
            InputToken::Quit => "quit",
            InputToken::NoAction => "wait",
        };
        write!(f, "{}", label)
    }
}

/// Key to token table.
///
/// WASD movement is always bound; hjkl is added when vi keys are enabled.
/// Unbound keys map to [`InputToken::NoAction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    bindings: HashMap<char, InputToken>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new(true)
    }
}

impl KeyBindings {
    pub fn new(vi_keys_enabled: bool) -> Self {
        let mut bindings = HashMap::new();

        bindings.insert('w', InputToken::MoveUp);
        bindings.insert('s', InputToken::MoveDown);
        bindings.insert('a', InputToken::MoveLeft);
        bindings.insert('d', InputToken::MoveRight);

        if vi_keys_enabled {
            bindings.insert('k', InputToken::MoveUp);
            bindings.insert('j', InputToken::MoveDown);
            bindings.insert('h', InputToken::MoveLeft);
            bindings.insert('l', InputToken::MoveRight);
        }

        bindings.insert('g', InputToken::PickUp);
        bindings.insert(',', InputToken::PickUp);
        bindings.insert('x', InputToken::Drop);
        bindings.insert('i', InputToken::OpenInventory);
        bindings.insert('>', InputToken::Descend);
        bindings.insert('q', InputToken::Quit);
        bindings.insert('.', InputToken::NoAction);

        Self { bindings }
    }

    /// Rebinds `key`, replacing any previous token.
    pub fn bind(&mut self, key: char, token: InputToken) {
        self.bindings.insert(key.to_ascii_lowercase(), token);
    }

    pub fn token_for(&self, key: char) -> InputToken {
        self.bindings
            .get(&key.to_ascii_lowercase())
            .copied()
            .unwrap_or(InputToken::NoAction)
    }

    /// Keys bound to `token`, sorted.
    pub fn keys_for(&self, token: InputToken) -> Vec<char> {
        let mut keys: Vec<char> = self
            .bindings
            .iter()
            .filter(|(_, bound)| **bound == token)
            .map(|(key, _)| *key)
            .collect();
        keys.sort_unstable();
        keys
    }
}

/// Maps an inventory menu letter to an index: `a` is the first item.
///
/// Returns `None` for letters past the end of the menu and for anything that
/// is not a letter, which the caller treats as a cancelled menu.
pub fn menu_selection(key: char, menu_len: usize) -> Option<usize> {
    if !key.is_ascii_lowercase() {
        return None;
    }
    let index = (key as u8 - b'a') as usize;
    (index < menu_len).then_some(index)
}

/// Letter shown beside the menu entry at `index`.
pub fn menu_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| (b'a' + i) as char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasd_and_vi_keys() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.token_for('w'), InputToken::MoveUp);
        assert_eq!(bindings.token_for('K'), InputToken::MoveUp);
        assert_eq!(bindings.token_for('h'), InputToken::MoveLeft);
        assert_eq!(bindings.keys_for(InputToken::MoveRight), vec!['d', 'l']);
    }

    #[test]
    fn test_vi_keys_disabled() {
        let bindings = KeyBindings::new(false);
        assert_eq!(bindings.token_for('j'), InputToken::NoAction);
        assert_eq!(bindings.token_for('s'), InputToken::MoveDown);
    }

    #[test]
    fn test_rebind() {
        let mut bindings = KeyBindings::default();
        bindings.bind('P', InputToken::PickUp);
        assert_eq!(bindings.token_for('p'), InputToken::PickUp);
        assert_eq!(bindings.token_for('z'), InputToken::NoAction);
    }

    #[test]
    fn test_menu_letters() {
        assert_eq!(menu_selection('a', 3), Some(0));
        assert_eq!(menu_selection('c', 3), Some(2));
        assert_eq!(menu_selection('d', 3), None);
        assert_eq!(menu_selection('1', 3), None);
        assert_eq!(menu_letter(1), Some('b'));
        assert_eq!(menu_letter(26), None);
    }
}
