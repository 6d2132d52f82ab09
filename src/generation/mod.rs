//! # Generation Module
//!
//! Procedural content generation for levels: the room-and-corridor carver and
//! the population passes that place monsters and floor items.
//!
//! Every generator implements [`Generator`] and draws all of its randomness
//! from the `StdRng` it is handed, so a seed fully determines a level.

pub mod dungeon;
pub mod encounters;
pub mod items;

pub use dungeon::*;
pub use encounters::*;
pub use items::*;

use crate::config::{
    DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH, DEFAULT_MAX_GENERATION_ATTEMPTS, DEFAULT_MAX_ROOMS,
    DEFAULT_ROOM_MAX_SIZE, DEFAULT_ROOM_MIN_SIZE,
};
use crate::{DelveError, DelveResult, Grid, Position};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Configuration for level generation.
///
/// Room sizes are the `w`/`h` handed to [`Room::new`]; the carved interior is
/// two cells smaller in each dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Grid width in cells
    pub width: u32,
    /// Grid height in cells
    pub height: u32,
    /// Number of room placement attempts; rejected candidates are not retried
    pub max_rooms: u32,
    /// Minimum room size
    pub room_min_size: u32,
    /// Maximum room size
    pub room_max_size: u32,
    /// How many times the session regenerates a level that came out empty
    pub max_generation_attempts: u32,
}

impl GenerationConfig {
    /// Creates a configuration for a `width × height` map with default room
    /// parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(40, 30);
    /// assert_eq!(config.width, 40);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            max_rooms: DEFAULT_MAX_ROOMS,
            room_min_size: DEFAULT_ROOM_MIN_SIZE,
            room_max_size: DEFAULT_ROOM_MAX_SIZE,
            max_generation_attempts: DEFAULT_MAX_GENERATION_ATTEMPTS,
        }
    }

    /// Creates a configuration for testing with a larger, denser map.
    pub fn for_testing() -> Self {
        Self {
            width: 40,
            height: 30,
            max_rooms: 12,
            room_min_size: 4,
            room_max_size: 8,
            max_generation_attempts: 20,
        }
    }

    /// Rejects values outside the domain the carver supports.
    pub fn validate(&self) -> DelveResult<()> {
        let smaller_side = self.width.min(self.height);
        if self.room_min_size < 2 {
            return Err(DelveError::InvalidConfig(format!(
                "room_min_size must be at least 2, got {}",
                self.room_min_size
            )));
        }
        if self.room_min_size > self.room_max_size {
            return Err(DelveError::InvalidConfig(format!(
                "room_min_size {} exceeds room_max_size {}",
                self.room_min_size, self.room_max_size
            )));
        }
        if self.room_max_size >= smaller_side {
            return Err(DelveError::InvalidConfig(format!(
                "room_max_size {} does not fit a {}x{} map",
                self.room_max_size, self.width, self.height
            )));
        }
        if self.max_rooms == 0 {
            return Err(DelveError::InvalidConfig(
                "max_rooms must be at least 1".to_string(),
            ));
        }
        if self.max_generation_attempts == 0 {
            return Err(DelveError::InvalidConfig(
                "max_generation_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAP_WIDTH, DEFAULT_MAP_HEIGHT)
    }
}

/// Axis-aligned room rectangle.
///
/// The border cells (`x1`, `x2`, `y1`, `y2`) stay solid; only the interior
/// is carved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Room {
    /// Creates a room from its top-left corner and size.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Position, Room};
    ///
    /// let room = Room::new(2, 3, 5, 4);
    /// assert_eq!((room.x2, room.y2), (7, 7));
    /// assert_eq!(room.center(), Position::new(4, 5));
    /// ```
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    /// Center cell, rounded towards the top-left.
    pub fn center(&self) -> Position {
        Position::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    /// Inclusive intersection test: rooms that share a border intersect.
    pub fn intersects(&self, other: &Room) -> bool {
        self.x1 <= other.x2 && self.x2 >= other.x1 && self.y1 <= other.y2 && self.y2 >= other.y1
    }

    /// Whether `pos` is one of the carved interior cells.
    pub fn contains_interior(&self, pos: Position) -> bool {
        pos.x > self.x1 && pos.x < self.x2 && pos.y > self.y1 && pos.y < self.y2
    }

    /// Carved interior cells, row by row.
    pub fn interior_positions(&self) -> Vec<Position> {
        ((self.y1 + 1)..self.y2)
            .flat_map(|y| ((self.x1 + 1)..self.x2).map(move |x| Position::new(x, y)))
            .collect()
    }

    /// Whether the whole rectangle, border included, lies on a grid of the
    /// given size.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x1 >= 0 && self.y1 >= 0 && self.x2 < width as i32 && self.y2 < height as i32
    }
}

/// A freshly generated level: the carved grid and its rooms in acceptance
/// order. The first room is the spawn room, the last holds the stairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dungeon {
    pub grid: Grid,
    pub rooms: Vec<Room>,
}

impl Dungeon {
    /// Spawn point: the first room's center.
    pub fn spawn_point(&self) -> Option<Position> {
        self.rooms.first().map(Room::center)
    }
}

/// Trait for procedural generators.
///
/// All generation systems implement this trait, giving level construction a
/// uniform interface for generating, checking and logging content.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> DelveResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions shared by the generators.
pub mod utils {
    use super::*;

    /// Unblocked cells not in `occupied`, in row-major order.
    pub fn free_positions(grid: &Grid, occupied: &[Position]) -> Vec<Position> {
        grid.floor_positions()
            .into_iter()
            .filter(|pos| !occupied.contains(pos))
            .collect()
    }

    /// Picks a uniformly random free cell, if any is left.
    pub fn random_free_position(
        grid: &Grid,
        occupied: &[Position],
        rng: &mut StdRng,
    ) -> Option<Position> {
        free_positions(grid, occupied).choose(rng).copied()
    }
}
