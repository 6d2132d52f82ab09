//! Symmetric shadowcasting.
//!
//! Scans the four quadrants around the observer row by row, narrowing the
//! visible slope range whenever an opaque cell is met. Floor cells are only
//! revealed when their centre lies inside the range, which is what makes the
//! result symmetric between any two transparent cells.
//!
//! Slopes are kept as exact fractions so the symmetry test never depends on
//! floating-point rounding.

use super::{within_radius, VisibilityIndex};
use crate::Position;
use std::collections::HashSet;

/// Computes the visible set with symmetric shadowcasting.
pub fn compute(
    index: &VisibilityIndex,
    origin: Position,
    radius: u32,
    light_walls: bool,
) -> HashSet<Position> {
    let mut scanner = Scanner {
        index,
        origin,
        radius,
        light_walls,
        visible: HashSet::new(),
    };
    if index.in_bounds(origin) {
        scanner.visible.insert(origin);
    }
    for quadrant in [
        Quadrant::North,
        Quadrant::East,
        Quadrant::South,
        Quadrant::West,
    ] {
        scanner.scan(
            quadrant,
            Row {
                depth: 1,
                start: Slope::new(-1, 1),
                end: Slope::new(1, 1),
            },
        );
    }
    scanner.visible
}

/// `num / den`, with `den > 0`.
#[derive(Debug, Clone, Copy)]
struct Slope {
    num: i64,
    den: i64,
}

impl Slope {
    fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }

    /// Slope through the left edge of the cell at (`depth`, `col`).
    fn of_cell(depth: i64, col: i64) -> Self {
        Self::new(2 * col - 1, 2 * depth)
    }
}

#[derive(Debug, Clone, Copy)]
enum Quadrant {
    North,
    East,
    South,
    West,
}

impl Quadrant {
    fn transform(self, origin: Position, depth: i64, col: i64) -> Position {
        let (depth, col) = (depth as i32, col as i32);
        match self {
            Quadrant::North => Position::new(origin.x + col, origin.y - depth),
            Quadrant::South => Position::new(origin.x + col, origin.y + depth),
            Quadrant::East => Position::new(origin.x + depth, origin.y + col),
            Quadrant::West => Position::new(origin.x - depth, origin.y + col),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Row {
    depth: i64,
    start: Slope,
    end: Slope,
}

impl Row {
    /// `round_ties_up(depth * start)`
    fn min_col(&self) -> i64 {
        (2 * self.depth * self.start.num + self.start.den).div_euclid(2 * self.start.den)
    }

    /// `round_ties_down(depth * end)`
    fn max_col(&self) -> i64 {
        let numerator = 2 * self.depth * self.end.num - self.end.den;
        -((-numerator).div_euclid(2 * self.end.den))
    }

    fn next(&self) -> Row {
        Row {
            depth: self.depth + 1,
            ..*self
        }
    }

    /// Whether the cell centre lies within `[start, end]`.
    fn is_symmetric(&self, col: i64) -> bool {
        col * self.start.den >= self.depth * self.start.num
            && col * self.end.den <= self.depth * self.end.num
    }
}

struct Scanner<'a> {
    index: &'a VisibilityIndex,
    origin: Position,
    radius: u32,
    light_walls: bool,
    visible: HashSet<Position>,
}

impl Scanner<'_> {
    fn is_wall(&self, pos: Position) -> bool {
        !self.index.is_transparent(pos)
    }

    fn reveal(&mut self, pos: Position, wall: bool) {
        if !self.index.in_bounds(pos) || !within_radius(self.origin, pos, self.radius) {
            return;
        }
        if wall && !self.light_walls {
            return;
        }
        self.visible.insert(pos);
    }

    fn scan(&mut self, quadrant: Quadrant, mut row: Row) {
        if row.depth > self.radius as i64 {
            return;
        }
        let mut previous_wall: Option<bool> = None;
        for col in row.min_col()..=row.max_col() {
            let pos = quadrant.transform(self.origin, row.depth, col);
            let wall = self.is_wall(pos);
            if wall || row.is_symmetric(col) {
                self.reveal(pos, wall);
            }
            if previous_wall == Some(true) && !wall {
                row.start = Slope::of_cell(row.depth, col);
            }
            if previous_wall == Some(false) && wall {
                let mut next = row.next();
                next.end = Slope::of_cell(row.depth, col);
                self.scan(quadrant, next);
            }
            previous_wall = Some(wall);
        }
        if previous_wall == Some(false) {
            self.scan(quadrant, row.next());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::test_support::grid_from_ascii;

    #[test]
    fn test_open_room_sees_everything_in_radius() {
        let grid = grid_from_ascii(&[
            "###########",
            "#.........#",
            "#.........#",
            "#.........#",
            "#.........#",
            "#.........#",
            "###########",
        ]);
        let index = VisibilityIndex::build(&grid);
        let origin = Position::new(5, 3);
        let visible = compute(&index, origin, 3, true);

        for pos in grid.positions() {
            let expected = within_radius(origin, pos, 3);
            assert_eq!(visible.contains(&pos), expected, "mismatch at {}", pos);
        }
    }

    #[test]
    fn test_pillar_casts_shadow() {
        let grid = grid_from_ascii(&[
            "#########",
            "#.......#",
            "#.......#",
            "#...#...#",
            "#.......#",
            "#.......#",
            "#########",
        ]);
        let index = VisibilityIndex::build(&grid);
        let visible = compute(&index, Position::new(4, 5), 6, true);

        assert!(visible.contains(&Position::new(4, 3)), "pillar itself is lit");
        assert!(!visible.contains(&Position::new(4, 2)));
        assert!(!visible.contains(&Position::new(4, 1)));
        assert!(visible.contains(&Position::new(1, 1)));
    }

    #[test]
    fn test_light_walls_off_hides_walls() {
        let grid = grid_from_ascii(&["#####", "#...#", "#####"]);
        let index = VisibilityIndex::build(&grid);

        let lit = compute(&index, Position::new(2, 1), 3, true);
        let unlit = compute(&index, Position::new(2, 1), 3, false);

        assert!(lit.contains(&Position::new(2, 0)));
        assert!(!unlit.contains(&Position::new(2, 0)));
        assert!(unlit.contains(&Position::new(1, 1)));
        assert!(unlit.iter().all(|&pos| index.is_transparent(pos)));
    }

    #[test]
    fn test_zero_radius_sees_only_origin() {
        let grid = grid_from_ascii(&["###", "#.#", "###"]);
        let index = VisibilityIndex::build(&grid);
        let visible = compute(&index, Position::new(1, 1), 0, true);
        assert_eq!(visible.len(), 1);
        assert!(visible.contains(&Position::new(1, 1)));
    }

    #[test]
    fn test_corridor_symmetry() {
        let grid = grid_from_ascii(&[
            "##########",
            "#....#...#",
            "#.##.#.#.#",
            "#........#",
            "##########",
        ]);
        let index = VisibilityIndex::build(&grid);
        let floors = grid.floor_positions();
        for &a in &floors {
            let from_a = compute(&index, a, 8, true);
            for &b in &floors {
                if from_a.contains(&b) {
                    let from_b = compute(&index, b, 8, true);
                    assert!(from_b.contains(&a), "{} sees {} but not back", a, b);
                }
            }
        }
    }
}
