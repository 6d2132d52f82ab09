//! Basic ray casting: one Bresenham line from the observer to every cell on
//! the perimeter of the view square, stopping at the first opaque cell.

use super::{within_radius, VisibilityIndex};
use crate::Position;
use std::collections::HashSet;

/// Computes the visible set by casting rays.
pub fn compute(
    index: &VisibilityIndex,
    origin: Position,
    radius: u32,
    light_walls: bool,
) -> HashSet<Position> {
    let mut visible = HashSet::new();
    if !index.in_bounds(origin) {
        return visible;
    }
    visible.insert(origin);

    let r = radius as i32;
    for target in perimeter(origin, r) {
        for pos in line(origin, target).into_iter().skip(1) {
            if !index.in_bounds(pos) || !within_radius(origin, pos, radius) {
                break;
            }
            if !index.is_transparent(pos) {
                if light_walls {
                    visible.insert(pos);
                }
                break;
            }
            visible.insert(pos);
        }
    }
    visible
}

/// Cells on the border of the square of half-width `r` around `center`.
fn perimeter(center: Position, r: i32) -> Vec<Position> {
    if r == 0 {
        return Vec::new();
    }
    let mut cells = Vec::with_capacity(8 * r as usize);
    for d in -r..=r {
        cells.push(center.offset(d, -r));
        cells.push(center.offset(d, r));
    }
    for d in (-r + 1)..r {
        cells.push(center.offset(-r, d));
        cells.push(center.offset(r, d));
    }
    cells
}

/// Bresenham line from `from` to `to`, both ends included.
pub fn line(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);
    let mut points = Vec::with_capacity((dx - dy) as usize + 1);

    loop {
        points.push(Position::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}
