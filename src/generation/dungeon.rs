//! # Dungeon Generation
//!
//! Room-and-corridor level layout.
//!
//! The carver makes a fixed number of placement attempts. Each candidate that
//! does not touch an accepted room is carved and joined to the previously
//! accepted room with one L-shaped corridor, so the rooms form a chain and
//! every floor cell is reachable from the first room.

use crate::{DelveError, DelveResult, Dungeon, GenerationConfig, Generator, Grid, Position, Room};
use rand::{rngs::StdRng, Rng};

/// Primary dungeon generator using the room-and-corridor algorithm.
///
/// This generator creates dungeons by:
/// 1. Attempting `max_rooms` random room placements, skipping overlaps
/// 2. Chaining each accepted room to the previous one with an L corridor
/// 3. Putting the stairs in the center of the last accepted room
#[derive(Debug, Clone)]
pub struct RoomCorridorGenerator {
    /// Whether to verify floor connectivity before returning a level
    pub ensure_connectivity: bool,
}

impl RoomCorridorGenerator {
    /// Creates a new dungeon generator with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{GenerationConfig, Generator, RoomCorridorGenerator};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let generator = RoomCorridorGenerator::new();
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let dungeon = generator.generate(&GenerationConfig::default(), &mut rng).unwrap();
    /// assert!(!dungeon.rooms.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            ensure_connectivity: true,
        }
    }

    /// Rolls a room candidate that fits on the map.
    fn candidate_room(&self, config: &GenerationConfig, rng: &mut StdRng) -> Room {
        let w = rng.gen_range(config.room_min_size..=config.room_max_size) as i32;
        let h = rng.gen_range(config.room_min_size..=config.room_max_size) as i32;
        let x = rng.gen_range(0..=config.width as i32 - w - 1);
        let y = rng.gen_range(0..=config.height as i32 - h - 1);
        Room::new(x, y, w, h)
    }

    fn carve_room(&self, grid: &mut Grid, room: &Room) -> DelveResult<()> {
        for pos in room.interior_positions() {
            grid.set_blocked(pos, false)?;
        }
        Ok(())
    }

    /// Horizontal run along `y`, both ends included.
    fn carve_h_tunnel(&self, grid: &mut Grid, x1: i32, x2: i32, y: i32) -> DelveResult<()> {
        for x in x1.min(x2)..=x1.max(x2) {
            grid.set_blocked(Position::new(x, y), false)?;
        }
        Ok(())
    }

    /// Vertical run along `x`, both ends included.
    fn carve_v_tunnel(&self, grid: &mut Grid, y1: i32, y2: i32, x: i32) -> DelveResult<()> {
        for y in y1.min(y2)..=y1.max(y2) {
            grid.set_blocked(Position::new(x, y), false)?;
        }
        Ok(())
    }

    /// Joins two room centers with an L-shaped corridor. A coin flip picks
    /// which leg comes first.
    fn carve_l_corridor(
        &self,
        grid: &mut Grid,
        from: Position,
        to: Position,
        rng: &mut StdRng,
    ) -> DelveResult<()> {
        if rng.gen_bool(0.5) {
            self.carve_h_tunnel(grid, from.x, to.x, from.y)?;
            self.carve_v_tunnel(grid, from.y, to.y, to.x)?;
        } else {
            self.carve_v_tunnel(grid, from.y, to.y, from.x)?;
            self.carve_h_tunnel(grid, from.x, to.x, to.y)?;
        }
        Ok(())
    }

    /// Checks that every floor cell is reachable from the spawn room.
    fn validate_connectivity(&self, grid: &Grid, rooms: &[Room]) -> DelveResult<()> {
        let Some(first) = rooms.first() else {
            return Err(DelveError::GenerationFailed("Level has no rooms".to_string()));
        };
        let start = first.center();
        if !grid.is_connected_from(start) {
            return Err(DelveError::GenerationFailed(format!(
                "Floor is not connected to the spawn room at {}",
                start
            )));
        }
        Ok(())
    }
}

impl Default for RoomCorridorGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator<Dungeon> for RoomCorridorGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<Dungeon> {
        config.validate()?;

        let mut grid = Grid::new(config.width, config.height);
        let mut rooms: Vec<Room> = Vec::new();

        for _ in 0..config.max_rooms {
            let room = self.candidate_room(config, rng);
            if rooms.iter().any(|other| room.intersects(other)) {
                continue;
            }

            self.carve_room(&mut grid, &room)?;
            if let Some(previous) = rooms.last() {
                self.carve_l_corridor(&mut grid, previous.center(), room.center(), rng)?;
            }
            rooms.push(room);
        }

        let Some(last) = rooms.last() else {
            return Err(DelveError::GenerationFailed(
                "Failed to place any rooms".to_string(),
            ));
        };
        grid.set_stairs(last.center())?;

        if self.ensure_connectivity {
            self.validate_connectivity(&grid, &rooms)?;
        }

        log::debug!(
            "{} carved {} of {} rooms on a {}x{} grid",
            self.generator_type(),
            rooms.len(),
            config.max_rooms,
            config.width,
            config.height
        );

        Ok(Dungeon { grid, rooms })
    }

    fn validate(&self, dungeon: &Dungeon, config: &GenerationConfig) -> DelveResult<()> {
        let Dungeon { grid, rooms } = dungeon;
        if grid.width() != config.width || grid.height() != config.height {
            return Err(DelveError::GenerationFailed(format!(
                "Grid is {}x{}, expected {}x{}",
                grid.width(),
                grid.height(),
                config.width,
                config.height
            )));
        }

        for (i, room) in rooms.iter().enumerate() {
            if !room.fits_within(config.width, config.height) {
                return Err(DelveError::GenerationFailed(format!(
                    "Room {} extends past the map edge",
                    i
                )));
            }
            if let Some(j) = rooms[i + 1..].iter().position(|other| room.intersects(other)) {
                return Err(DelveError::GenerationFailed(format!(
                    "Rooms {} and {} overlap",
                    i,
                    i + 1 + j
                )));
            }
        }

        self.validate_connectivity(grid, rooms)?;

        let expected_stairs = rooms.last().map(Room::center);
        if grid.stairs_position() != expected_stairs {
            return Err(DelveError::GenerationFailed(
                "Stairs are not in the last room".to_string(),
            ));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "RoomCorridorGenerator"
    }
}

/// Runs `generator` until it succeeds, retrying on `GenerationFailed` up to
/// `config.max_generation_attempts` times. Other errors surface immediately.
pub fn generate_with_retry<T, G: Generator<T>>(
    generator: &G,
    config: &GenerationConfig,
    rng: &mut StdRng,
) -> DelveResult<T> {
    let mut last_error = None;
    for attempt in 1..=config.max_generation_attempts {
        match generator.generate(config, rng) {
            Ok(content) => return Ok(content),
            Err(DelveError::GenerationFailed(reason)) => {
                log::warn!(
                    "{} attempt {}/{} failed: {}",
                    generator.generator_type(),
                    attempt,
                    config.max_generation_attempts,
                    reason
                );
                last_error = Some(DelveError::GenerationFailed(reason));
            }
            Err(other) => return Err(other),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        DelveError::GenerationFailed(format!(
            "{} was given no attempts",
            generator.generator_type()
        ))
    }))
}
