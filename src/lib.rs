//! # Delve
//!
//! A turn-based dungeon-crawl simulation engine.
//!
//! ## Architecture Overview
//!
//! The engine is built from four tightly coupled subsystems plus the session
//! that glues them together:
//!
//! - **Dungeon Generation**: rooms-and-corridors carving on a tile grid
//! - **Visibility**: transparency index, field of view and fog-of-war memory
//! - **Entity System**: plain entities carrying optional capability components
//! - **Action Resolution**: one player action per turn, then one AI action per
//!   AI-controlled entity
//! - **Game State**: the session object owning the grid, rooms, entities and
//!   message log
//!
//! Rendering, raw input and save files sit at the edges. The library exposes
//! read-only views for a renderer, a token-based input mapper, and JSON
//! persistence on [`GameState`].

pub mod config;
pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;
pub mod visibility;

// Core module re-exports
pub use config::GameConfig;
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;
pub use visibility::*;

use std::path::PathBuf;

/// Core error type for the Delve engine.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Configuration values are outside the supported domain
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No save file exists at the given path
    #[error("No save file at {}", .0.display())]
    SaveNotFound(PathBuf),

    /// A save file exists but could not be restored
    #[error("Corrupt save file {}: {reason}", .path.display())]
    CorruptSave { path: PathBuf, reason: String },
}

impl DelveError {
    /// Returns true for failures of the persistence layer.
    ///
    /// Callers use this to fall back to a fresh game instead of aborting.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            DelveError::SaveNotFound(_) | DelveError::CorruptSave { .. }
        )
    }
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
