//! # Display Management
//!
//! Plain-text snapshot renderer for terminals.

use crate::game::{GameState, Position, Severity};
use crate::input::menu_letter;
use crate::visibility::CellView;

const ANSI_RESET: &str = "\x1b[0m";
const ANSI_DIM: &str = "\x1b[90m";
const ANSI_RED: &str = "\x1b[31m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_YELLOW: &str = "\x1b[33m";

/// Draws a [`GameState`] as lines of text.
///
/// Cells in view are drawn normally, remembered cells are dimmed (when color
/// is on) and unexplored cells are blank. Entities are only drawn where the
/// player can see them; later entities in the list draw over earlier ones.
#[derive(Debug, Clone)]
pub struct TextDisplay {
    /// Emit ANSI color codes
    pub color: bool,
    /// Lines of the message log shown under the map
    pub message_lines: usize,
}

impl Default for TextDisplay {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TextDisplay {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            message_lines: 5,
        }
    }

    /// Glyph at `pos` without any color codes, or a space if the cell has
    /// never been seen.
    pub fn glyph_at(&self, state: &GameState, pos: Position) -> char {
        match state.cell_view(pos) {
            CellView::Unexplored => ' ',
            CellView::Remembered => Self::tile_glyph(state, pos),
            CellView::Visible => state
                .entities
                .iter()
                .rev()
                .find(|e| e.is_at(pos))
                .map_or_else(|| Self::tile_glyph(state, pos), |e| e.glyph),
        }
    }

    fn tile_glyph(state: &GameState, pos: Position) -> char {
        if state.grid.has_stairs(pos) {
            '>'
        } else if state.grid.is_blocked(pos) {
            '#'
        } else {
            '.'
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.color && !code.is_empty() {
            format!("{}{}{}", code, text, ANSI_RESET)
        } else {
            text.to_string()
        }
    }

    /// Map rows, one string per grid row.
    pub fn render_map(&self, state: &GameState) -> Vec<String> {
        let mut rows = Vec::with_capacity(state.grid.height() as usize);
        for y in 0..state.grid.height() as i32 {
            let mut row = String::new();
            for x in 0..state.grid.width() as i32 {
                let pos = Position::new(x, y);
                let glyph = self.glyph_at(state, pos).to_string();
                let code = match state.cell_view(pos) {
                    CellView::Remembered => ANSI_DIM,
                    CellView::Visible if state.player_position() == Some(pos) => ANSI_YELLOW,
                    _ => "",
                };
                row.push_str(&self.paint(&glyph, code));
            }
            rows.push(row.trim_end().to_string());
        }
        rows
    }

    pub fn render_status(&self, state: &GameState) -> String {
        let hp = state
            .player()
            .and_then(|p| p.combatant.as_ref())
            .map_or("HP: -".to_string(), |c| format!("HP: {}/{}", c.hp, c.max_hp));
        format!(
            "{}  Depth: {}  Turn: {}",
            hp, state.depth, state.turn_number
        )
    }

    pub fn render_messages(&self, state: &GameState) -> Vec<String> {
        state
            .recent_messages(self.message_lines)
            .iter()
            .map(|message| {
                let code = match message.severity {
                    Severity::Info => "",
                    Severity::Combat => ANSI_RED,
                    Severity::Death => ANSI_DIM,
                    Severity::Success => ANSI_GREEN,
                };
                self.paint(&message.text, code)
            })
            .collect()
    }

    /// Lettered inventory menu, or `None` when the player carries nothing.
    pub fn render_inventory(&self, state: &GameState) -> Option<String> {
        let inventory = state.player()?.inventory.as_ref()?;
        if inventory.is_empty() {
            return None;
        }
        let lines: Vec<String> = inventory
            .items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                menu_letter(index).map(|letter| format!("({}) {}", letter, item.display_name()))
            })
            .collect();
        Some(lines.join("\n"))
    }

    /// Full screen: map, status line, then the message log.
    pub fn render(&self, state: &GameState) -> String {
        let mut lines = self.render_map(state);
        lines.push(String::new());
        lines.push(self.render_status(state));
        lines.extend(self.render_messages(state));
        lines.join("\n")
    }
}
