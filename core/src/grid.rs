//! Tile geometry shared by the infrastructure simulators and pathfinders.

use crate::types::Tile;

pub const NEIGHBORS_4: [Tile; 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

pub const NEIGHBORS_8: [Tile; 8] = [
    (1, 0), (-1, 0), (0, 1), (0, -1),
    (1, 1), (1, -1), (-1, 1), (-1, -1),
];

/// Rectangular set of tiles occupied by a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub x:      i32,
    pub y:      i32,
    pub width:  u32,
    pub height: u32,
}

impl Footprint {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width: width.max(1), height: height.max(1) }
    }

    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        let (x0, y0) = (self.x, self.y);
        let (w, h) = (self.width as i32, self.height as i32);
        (0..h).flat_map(move |dy| (0..w).map(move |dx| (x0 + dx, y0 + dy)))
    }

    pub fn contains(&self, (x, y): Tile) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x + self.width as i32
            && y < self.y + self.height as i32
    }

    /// Tiles in the one-tile ring around the footprint (8-adjacent, excluding
    /// the footprint itself).
    pub fn ring(&self) -> impl Iterator<Item = Tile> + '_ {
        let (x0, y0) = (self.x - 1, self.y - 1);
        let (x1, y1) = (self.x + self.width as i32, self.y + self.height as i32);
        (y0..=y1)
            .flat_map(move |y| (x0..=x1).map(move |x| (x, y)))
            .filter(move |t| !self.contains(*t))
    }

    /// Tiles 4-adjacent to the footprint (the ring without its corners).
    pub fn edge_neighbors(&self) -> impl Iterator<Item = Tile> + '_ {
        self.ring().filter(move |&(x, y)| {
            let outside_x = x < self.x || x >= self.x + self.width as i32;
            let outside_y = y < self.y || y >= self.y + self.height as i32;
            !(outside_x && outside_y)
        })
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + (self.width as f64 - 1.0) / 2.0,
            self.y as f64 + (self.height as f64 - 1.0) / 2.0,
        )
    }
}

pub fn neighbors8((x, y): Tile) -> impl Iterator<Item = Tile> {
    NEIGHBORS_8.iter().map(move |(dx, dy)| (x + dx, y + dy))
}

pub fn neighbors4((x, y): Tile) -> impl Iterator<Item = Tile> {
    NEIGHBORS_4.iter().map(move |(dx, dy)| (x + dx, y + dy))
}

/// Every tile on the line from `a` to `b`, inclusive of both ends.
///
/// Bresenham with a connectivity fix-up: whenever the line steps diagonally
/// the horizontal intermediate cell is also emitted, so consecutive tiles are
/// always 4-connected and a line never "jumps" a corner.
pub fn line_tiles(a: Tile, b: Tile) -> Vec<Tile> {
    let (mut x, mut y) = a;
    let dx = (b.0 - a.0).abs();
    let dy = -(b.1 - a.1).abs();
    let sx = if a.0 < b.0 { 1 } else { -1 };
    let sy = if a.1 < b.1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut tiles = vec![(x, y)];

    while (x, y) != b {
        let e2 = 2 * err;
        let step_x = e2 >= dy;
        let step_y = e2 <= dx;
        if step_x {
            err += dy;
            x += sx;
        }
        if step_y {
            err += dx;
            if step_x {
                tiles.push((x, y));
            }
            y += sy;
        }
        tiles.push((x, y));
    }
    tiles
}

pub fn is_adjacent8(a: Tile, b: Tile) -> bool {
    a != b && (a.0 - b.0).abs() <= 1 && (a.1 - b.1).abs() <= 1
}

/// Chebyshev distance between two tiles.
pub fn chebyshev(a: Tile, b: Tile) -> u32 {
    (a.0 - b.0).unsigned_abs().max((a.1 - b.1).unsigned_abs())
}

pub fn in_bounds((x, y): Tile, width: u32, height: u32) -> bool {
    x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height
}
