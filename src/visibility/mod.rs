//! # Visibility Module
//!
//! Field of view and fog of war.
//!
//! A [`VisibilityIndex`] is built once per grid from the tiles' movement
//! flags (open cells are transparent). [`compute`] turns an observer position
//! into the set of visible cells with the configured algorithm, and
//! [`FieldOfView`] caches that set behind a dirty flag so it is only
//! recomputed after the observer moves or the grid is replaced. Every
//! recompute marks the visible cells explored on the grid.

pub mod raycast;
pub mod shadowcast;

use crate::{Grid, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Available field-of-view algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FovAlgorithm {
    /// Bresenham rays to the edge of the view square. Cheap, not symmetric.
    Basic,
    /// Symmetric shadowcasting: if A sees B, B sees A.
    SymmetricShadowcast,
}

impl Default for FovAlgorithm {
    fn default() -> Self {
        FovAlgorithm::SymmetricShadowcast
    }
}

/// Field-of-view parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FovConfig {
    /// Euclidean sight radius in cells
    pub radius: u32,
    /// Whether opaque cells bordering the view are themselves visible
    pub light_walls: bool,
    pub algorithm: FovAlgorithm,
}

impl Default for FovConfig {
    fn default() -> Self {
        Self {
            radius: crate::config::DEFAULT_FOV_RADIUS,
            light_walls: crate::config::DEFAULT_FOV_LIGHT_WALLS,
            algorithm: FovAlgorithm::default(),
        }
    }
}

/// Per-cell transparency, derived from a grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityIndex {
    width: u32,
    height: u32,
    transparent: Vec<bool>,
}

impl VisibilityIndex {
    /// Builds the index: a cell is transparent exactly when it does not block
    /// movement.
    pub fn build(grid: &Grid) -> Self {
        let transparent = grid
            .positions()
            .map(|pos| !grid.is_blocked(pos))
            .collect();
        Self {
            width: grid.width(),
            height: grid.height(),
            transparent,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Off-grid cells are opaque.
    pub fn is_transparent(&self, pos: Position) -> bool {
        self.in_bounds(pos)
            && self.transparent[pos.y as usize * self.width as usize + pos.x as usize]
    }
}

/// Whether `pos` lies within the Euclidean radius around `origin`.
pub(crate) fn within_radius(origin: Position, pos: Position, radius: u32) -> bool {
    let dx = (pos.x - origin.x) as i64;
    let dy = (pos.y - origin.y) as i64;
    let r = radius as i64;
    dx * dx + dy * dy <= r * r
}

/// Computes the cells visible from `origin`.
///
/// # Examples
///
/// ```
/// use delve::{compute, FovAlgorithm, Grid, Position, VisibilityIndex};
///
/// let mut grid = Grid::new(9, 9);
/// for pos in grid.positions().collect::<Vec<_>>() {
///     if pos.x > 0 && pos.y > 0 && pos.x < 8 && pos.y < 8 {
///         grid.set_blocked(pos, false).unwrap();
///     }
/// }
/// let index = VisibilityIndex::build(&grid);
/// let visible = compute(&index, Position::new(4, 4), 2, true, FovAlgorithm::SymmetricShadowcast);
/// assert!(visible.contains(&Position::new(4, 2)));
/// assert!(!visible.contains(&Position::new(4, 1)));
/// ```
pub fn compute(
    index: &VisibilityIndex,
    origin: Position,
    radius: u32,
    light_walls: bool,
    algorithm: FovAlgorithm,
) -> HashSet<Position> {
    match algorithm {
        FovAlgorithm::Basic => raycast::compute(index, origin, radius, light_walls),
        FovAlgorithm::SymmetricShadowcast => {
            shadowcast::compute(index, origin, radius, light_walls)
        }
    }
}

/// How the renderer should present a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    /// In view right now: full color
    Visible,
    /// Seen before but not now: dimmed
    Remembered,
    /// Never seen: not drawn
    Unexplored,
}

/// Cached field of view with a recompute-on-demand dirty flag.
#[derive(Debug, Clone, Default)]
pub struct FieldOfView {
    config: FovConfig,
    index: VisibilityIndex,
    visible: HashSet<Position>,
    dirty: bool,
}

impl FieldOfView {
    /// Creates a field of view for `grid`. It starts dirty.
    pub fn new(grid: &Grid, config: FovConfig) -> Self {
        Self {
            config,
            index: VisibilityIndex::build(grid),
            visible: HashSet::new(),
            dirty: true,
        }
    }

    /// Rebuilds the transparency index after the grid was replaced.
    pub fn rebuild(&mut self, grid: &Grid) {
        self.index = VisibilityIndex::build(grid);
        self.visible.clear();
        self.dirty = true;
    }

    pub fn config(&self) -> &FovConfig {
        &self.config
    }

    pub fn index(&self) -> &VisibilityIndex {
        &self.index
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Recomputes from `origin` if the dirty flag is set and marks the result
    /// explored on `grid`. Returns whether a recompute happened.
    pub fn recompute_if_dirty(&mut self, grid: &mut Grid, origin: Position) -> bool {
        if !self.dirty {
            return false;
        }
        self.visible = compute(
            &self.index,
            origin,
            self.config.radius,
            self.config.light_walls,
            self.config.algorithm,
        );
        for &pos in &self.visible {
            grid.mark_explored(pos);
        }
        self.dirty = false;
        log::debug!(
            "Recomputed field of view from {}: {} cells visible",
            origin,
            self.visible.len()
        );
        true
    }

    pub fn is_visible(&self, pos: Position) -> bool {
        self.visible.contains(&pos)
    }

    pub fn visible(&self) -> &HashSet<Position> {
        &self.visible
    }

    /// Three-state presentation of a cell.
    pub fn cell_view(&self, grid: &Grid, pos: Position) -> CellView {
        if self.is_visible(pos) {
            CellView::Visible
        } else if grid.is_explored(pos) {
            CellView::Remembered
        } else {
            CellView::Unexplored
        }
    }
}
