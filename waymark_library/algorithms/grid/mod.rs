//! 2D Grid Model
//!
//! Bounded integer lattice shared by the grid planners.
//!
//! # Features
//!
//! - Bounds checking and 4-/8-connected neighbor enumeration
//! - Binary blocked/free cells for planners that own their map
//! - Bresenham line rasterization for drawing walls
//!
//! Neighbor order is fixed (up, down, left, right, then diagonals) so
//! searches that break ties by iteration order are reproducible.
//!
//! # Example
//!
//! ```rust
//! use waymark_library::algorithms::grid::Grid;
//!
//! let mut grid = Grid::new(10, 10);
//!
//! // Draw a wall
//! grid.block_line((5, 0), (5, 8));
//!
//! assert!(grid.is_blocked(5, 3));
//! assert_eq!(grid.neighbors4(0, 0).len(), 2);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer cell coordinate, `(0, 0)` is a valid cell
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridPoint {
    pub x: usize,
    pub y: usize,
}

impl GridPoint {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Manhattan distance, the 4-connected unit-cost heuristic
    pub fn manhattan(&self, other: &GridPoint) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(usize, usize)> for GridPoint {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl From<GridPoint> for (usize, usize) {
    fn from(p: GridPoint) -> Self {
        (p.x, p.y)
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Outcome of a grid planning query
///
/// `success == false` is a normal outcome (unreachable or blocked goal), not
/// an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResult {
    /// Cells from start to goal inclusive; empty on failure
    pub path: Vec<GridPoint>,
    /// Path cost in unit steps; `+inf` on failure
    pub cost: f64,
    pub success: bool,
    /// Cells expanded by the search that produced this result
    pub nodes_explored: usize,
}

impl PlanResult {
    pub fn found(path: Vec<GridPoint>, cost: f64, nodes_explored: usize) -> Self {
        Self {
            path,
            cost,
            success: true,
            nodes_explored,
        }
    }

    pub fn failed(nodes_explored: usize) -> Self {
        Self {
            path: Vec::new(),
            cost: f64::INFINITY,
            success: false,
            nodes_explored,
        }
    }

    /// Path as `(x, y)` tuples
    pub fn waypoints(&self) -> Vec<(usize, usize)> {
        self.path.iter().map(|p| (p.x, p.y)).collect()
    }
}

const OFFSETS_4: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
const OFFSETS_DIAGONAL: [(isize, isize); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// True when `(x, y)` lies in `[0, width) x [0, height)`
pub fn in_bounds(width: usize, height: usize, x: usize, y: usize) -> bool {
    x < width && y < height
}

/// Up, down, left, right neighbors of `(x, y)` that lie inside the grid
pub fn neighbors4(width: usize, height: usize, x: usize, y: usize) -> Vec<GridPoint> {
    offset_neighbors(width, height, x, y, &OFFSETS_4)
}

fn offset_neighbors(
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    offsets: &[(isize, isize)],
) -> Vec<GridPoint> {
    let mut out = Vec::with_capacity(offsets.len());
    for (dx, dy) in offsets {
        let (Some(nx), Some(ny)) = (x.checked_add_signed(*dx), y.checked_add_signed(*dy)) else {
            continue;
        };
        if in_bounds(width, height, nx, ny) {
            out.push(GridPoint::new(nx, ny));
        }
    }
    out
}

/// Binary occupancy grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    blocked: Vec<bool>, // row-major, true = blocked
}

impl Grid {
    /// Create an all-free grid
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            blocked: vec![false; width * height],
        }
    }

    /// Create a grid with the given cells blocked; out-of-range cells are
    /// ignored
    pub fn from_obstacles<I, P>(width: usize, height: usize, obstacles: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<GridPoint>,
    {
        let mut grid = Self::new(width, height);
        for p in obstacles {
            let p = p.into();
            grid.set_blocked(p.x, p.y);
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        in_bounds(self.width, self.height, x, y)
    }

    /// Mark cell as blocked
    pub fn set_blocked(&mut self, x: usize, y: usize) {
        if self.in_bounds(x, y) {
            self.blocked[y * self.width + x] = true;
        }
    }

    /// Mark cell as free
    pub fn set_free(&mut self, x: usize, y: usize) {
        if self.in_bounds(x, y) {
            self.blocked[y * self.width + x] = false;
        }
    }

    /// Check if cell is blocked; out of bounds counts as blocked
    pub fn is_blocked(&self, x: usize, y: usize) -> bool {
        !self.in_bounds(x, y) || self.blocked[y * self.width + x]
    }

    /// Free every cell
    pub fn clear(&mut self) {
        self.blocked.fill(false);
    }

    /// Blocked cells in row-major order
    pub fn blocked_cells(&self) -> impl Iterator<Item = GridPoint> + '_ {
        self.blocked
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(i, _)| GridPoint::new(i % self.width, i / self.width))
    }

    /// Up, down, left, right neighbors inside the grid (blocked or not)
    pub fn neighbors4(&self, x: usize, y: usize) -> Vec<GridPoint> {
        neighbors4(self.width, self.height, x, y)
    }

    /// 4-connected neighbors followed by the diagonal ones
    pub fn neighbors8(&self, x: usize, y: usize) -> Vec<GridPoint> {
        let mut out = neighbors4(self.width, self.height, x, y);
        out.extend(offset_neighbors(
            self.width,
            self.height,
            x,
            y,
            &OFFSETS_DIAGONAL,
        ));
        out
    }

    /// Block every cell on the Bresenham line between two cells
    pub fn block_line(&mut self, from: (usize, usize), to: (usize, usize)) {
        for p in line(from.into(), to.into()) {
            self.set_blocked(p.x, p.y);
        }
    }
}

/// Bresenham's line algorithm, endpoints included
pub fn line(from: GridPoint, to: GridPoint) -> Vec<GridPoint> {
    let (x0, y0) = (from.x as i64, from.y as i64);
    let (x1, y1) = (to.x as i64, to.y as i64);

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    let (mut x, mut y) = (x0, y0);
    let mut cells = Vec::with_capacity((dx.max(dy) + 1) as usize);

    loop {
        cells.push(GridPoint::new(x as usize, y as usize));

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }

    cells
}
