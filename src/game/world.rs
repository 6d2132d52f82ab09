//! # Grid Model
//!
//! Tiles and the fixed-size grid they live in. Pure data: carving is done
//! by the generator, exploration by the visibility engine.

use crate::{DelveError, DelveResult, Position};
use pathfinding::prelude::bfs_reach;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Blocks movement and, by the same flag, sight
    pub blocks_movement: bool,
    /// Has been inside the field of view at least once
    pub explored: bool,
    /// Stairs down to the next level
    pub has_stairs: bool,
}

impl Tile {
    /// An unexplored solid cell.
    pub fn wall() -> Self {
        Self {
            blocks_movement: true,
            explored: false,
            has_stairs: false,
        }
    }

    /// An unexplored open cell.
    pub fn floor() -> Self {
        Self {
            blocks_movement: false,
            ..Self::wall()
        }
    }

    /// Opacity mirrors the movement flag.
    pub fn is_transparent(&self) -> bool {
        !self.blocks_movement
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::wall()
    }
}

/// Fixed-size tile matrix, stored row-major.
///
/// # Examples
///
/// ```
/// use delve::{Grid, Position};
///
/// let mut grid = Grid::new(10, 8);
/// assert!(grid.is_blocked(Position::new(3, 3)));
/// grid.set_blocked(Position::new(3, 3), false).unwrap();
/// assert!(!grid.is_blocked(Position::new(3, 3)));
/// assert!(grid.is_blocked(Position::new(-1, 0)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

/// Unchecked grid as read from a save.
#[derive(Deserialize)]
struct RawGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = DelveError;

    fn try_from(raw: RawGrid) -> DelveResult<Self> {
        let expected = (raw.width as usize).checked_mul(raw.height as usize);
        if expected != Some(raw.tiles.len()) {
            return Err(DelveError::InvalidState(format!(
                "{}x{} grid has {} tiles",
                raw.width,
                raw.height,
                raw.tiles.len()
            )));
        }
        Ok(Self {
            width: raw.width,
            height: raw.height,
            tiles: raw.tiles,
        })
    }
}

impl Grid {
    /// Creates a grid with every cell blocked.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::wall(); (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Checks whether a position lies on the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// Gets the tile at a position.
    pub fn get(&self, pos: Position) -> Option<&Tile> {
        self.index(pos).map(|idx| &self.tiles[idx])
    }

    /// Gets the tile at a position mutably.
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        self.index(pos).map(move |idx| &mut self.tiles[idx])
    }

    fn tile_mut_or_err(&mut self, pos: Position) -> DelveResult<&mut Tile> {
        self.get_mut(pos)
            .ok_or_else(|| DelveError::InvalidState(format!("Position {} is off the grid", pos)))
    }

    /// Out-of-bounds cells count as blocked.
    pub fn is_blocked(&self, pos: Position) -> bool {
        self.get(pos).map_or(true, |tile| tile.blocks_movement)
    }

    pub fn set_blocked(&mut self, pos: Position, blocked: bool) -> DelveResult<()> {
        self.tile_mut_or_err(pos)?.blocks_movement = blocked;
        Ok(())
    }

    pub fn set_stairs(&mut self, pos: Position) -> DelveResult<()> {
        self.tile_mut_or_err(pos)?.has_stairs = true;
        Ok(())
    }

    pub fn has_stairs(&self, pos: Position) -> bool {
        self.get(pos).map_or(false, |tile| tile.has_stairs)
    }

    pub fn is_explored(&self, pos: Position) -> bool {
        self.get(pos).map_or(false, |tile| tile.explored)
    }

    /// Marks a cell explored. Off-grid positions are ignored.
    pub fn mark_explored(&mut self, pos: Position) {
        if let Some(tile) = self.get_mut(pos) {
            tile.explored = true;
        }
    }

    /// All in-bounds positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| Position::new(x, y)))
    }

    /// Every unblocked cell, in row-major order.
    pub fn floor_positions(&self) -> Vec<Position> {
        self.positions().filter(|&pos| !self.is_blocked(pos)).collect()
    }

    /// Location of the stairs, if the level has any.
    pub fn stairs_position(&self) -> Option<Position> {
        self.positions().find(|&pos| self.has_stairs(pos))
    }

    /// Unblocked cells reachable from `start` with 4-directional steps.
    pub fn reachable_from(&self, start: Position) -> HashSet<Position> {
        if self.is_blocked(start) {
            return HashSet::new();
        }
        bfs_reach(start, |&pos| {
            pos.cardinal_adjacent_positions()
                .into_iter()
                .filter(|&next| !self.is_blocked(next))
                .collect::<Vec<_>>()
        })
        .collect()
    }

    /// True when every floor cell can be reached from `start`.
    pub fn is_connected_from(&self, start: Position) -> bool {
        let reachable = self.reachable_from(start);
        self.positions()
            .filter(|&pos| !self.is_blocked(pos))
            .all(|pos| reachable.contains(&pos))
    }
}
