//! # Rendering Module
//!
//! Text rendering of a read-only game snapshot.

pub mod display;

pub use display::*;

use crate::game::GameState;

/// Anything that can turn a game snapshot into screen output.
pub trait Renderer {
    fn draw(&mut self, state: &GameState) -> std::io::Result<()>;
}

/// Renders to any writer, typically stdout.
pub struct WriterRenderer<W: std::io::Write> {
    pub display: TextDisplay,
    writer: W,
}

impl<W: std::io::Write> WriterRenderer<W> {
    pub fn new(display: TextDisplay, writer: W) -> Self {
        Self { display, writer }
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: std::io::Write> Renderer for WriterRenderer<W> {
    fn draw(&mut self, state: &GameState) -> std::io::Result<()> {
        writeln!(self.writer, "{}", self.display.render(state))?;
        self.writer.flush()
    }
}
