//! # Input Module
//!
//! Turns keys into [`InputToken`]s and tokens into [`PlayerAction`]s.

pub mod commands;

pub use commands::*;

use crate::game::{Direction, PlayerAction};

/// Input handler for processing player commands.
///
/// The handler is stateless apart from its key table: menu tokens need the
/// caller to collect an inventory selection first, and a missing selection is
/// a cancelled menu.
#[derive(Debug, Clone)]
pub struct InputHandler {
    /// Whether to enable Vi-style movement keys (hjkl)
    pub vi_keys_enabled: bool,
    bindings: KeyBindings,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    /// Creates a new input handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{InputHandler, InputToken, PlayerAction};
    ///
    /// let input_handler = InputHandler::new();
    /// let token = input_handler.token_for_key('w');
    /// assert_eq!(token, InputToken::MoveUp);
    /// assert_eq!(
    ///     input_handler.token_to_action(token, None),
    ///     PlayerAction::Move { dx: 0, dy: -1 }
    /// );
    /// ```
    pub fn new() -> Self {
        Self::with_vi_keys(true)
    }

    pub fn with_vi_keys(vi_keys_enabled: bool) -> Self {
        Self {
            vi_keys_enabled,
            bindings: KeyBindings::new(vi_keys_enabled),
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Key table for rebinding.
    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.bindings
    }

    pub fn token_for_key(&self, key: char) -> InputToken {
        self.bindings.token_for(key)
    }

    /// Reads the first non-blank character of a line as a key.
    ///
    /// An empty line is a no-op.
    pub fn token_for_line(&self, line: &str) -> InputToken {
        line.trim()
            .chars()
            .next()
            .map_or(InputToken::NoAction, |key| self.token_for_key(key))
    }

    /// Converts a token to the action it requests.
    ///
    /// `selection` is the inventory index chosen in the menu opened by
    /// [`InputToken::Drop`] or [`InputToken::OpenInventory`]; other tokens
    /// ignore it.
    pub fn token_to_action(&self, token: InputToken, selection: Option<usize>) -> PlayerAction {
        match token {
            InputToken::MoveUp => PlayerAction::step(Direction::North),
            InputToken::MoveDown => PlayerAction::step(Direction::South),
            InputToken::MoveLeft => PlayerAction::step(Direction::West),
            InputToken::MoveRight => PlayerAction::step(Direction::East),
            InputToken::PickUp => PlayerAction::PickUp,
            InputToken::Drop => selection.map_or(PlayerAction::NoAction, PlayerAction::Drop),
            InputToken::OpenInventory => {
                selection.map_or(PlayerAction::NoAction, PlayerAction::Use)
            }
            InputToken::Descend => PlayerAction::Descend,
            InputToken::Quit => PlayerAction::Quit,
            InputToken::NoAction => PlayerAction::NoAction,
        }
    }

    /// One-line key reference for the status area.
    pub fn help_text(&self) -> String {
        let tokens = [
            InputToken::MoveUp,
            InputToken::MoveDown,
            InputToken::MoveLeft,
            InputToken::MoveRight,
            InputToken::PickUp,
            InputToken::Drop,
            InputToken::OpenInventory,
            InputToken::Descend,
            InputToken::Quit,
        ];
        tokens
            .iter()
            .map(|token| {
                let keys: String = self.bindings.keys_for(*token).into_iter().collect();
                format!("{}={}", keys, token)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
