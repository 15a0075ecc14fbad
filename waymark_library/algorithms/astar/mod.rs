//! A* Grid Pathfinding
//!
//! Optimal from-scratch search on a binary occupancy [`Grid`].
//!
//! # Features
//!
//! - 4- or 8-connected movement (diagonal steps cost `sqrt(2)`)
//! - Manhattan, Euclidean and diagonal (octile) heuristics
//! - Weighted A* for faster, bounded-suboptimal plans
//! - Diagonal steps never cut between two blocked cells
//!
//! # Example
//!
//! ```rust
//! use waymark_library::algorithms::astar::{AStar, Heuristic};
//!
//! let mut astar = AStar::new(20, 20);
//! astar.set_start(2, 2);
//! astar.set_goal(17, 17);
//! astar.set_heuristic(Heuristic::Euclidean);
//!
//! if let Some(path) = astar.plan() {
//!     println!("{} waypoints, {:.2} units", path.len(), AStar::path_length(&path));
//! }
//! ```


use crate::algorithms::grid::{Grid, GridPoint, PlanResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::f64::consts::SQRT_2;
use tracing::debug;

/// Distance estimate from a cell to the goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    Manhattan,
    #[default]
    Euclidean,
    /// Octile distance, exact for 8-connected unit grids
    Diagonal,
}

impl Heuristic {
    fn estimate(self, a: GridPoint, b: GridPoint) -> f64 {
        let dx = a.x.abs_diff(b.x) as f64;
        let dy = a.y.abs_diff(b.y) as f64;
        match self {
            Heuristic::Manhattan => dx + dy,
            Heuristic::Euclidean => dx.hypot(dy),
            Heuristic::Diagonal => dx.max(dy) + (SQRT_2 - 1.0) * dx.min(dy),
        }
    }
}

/// Open-list entry, ordered so `BinaryHeap` pops the lowest `f` first
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f: f64,
    g: f64,
    point: GridPoint,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            // Deeper nodes first on equal f
            .then_with(|| self.g.total_cmp(&other.g))
            .then_with(|| other.point.cmp(&self.point))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

/// A* planner
#[derive(Debug, Clone)]
pub struct AStar {
    grid: Grid,
    start: GridPoint,
    goal: GridPoint,
    heuristic: Heuristic,
    heuristic_weight: f64,
    allow_diagonal: bool,
}

impl AStar {
    /// Create planner for an all-free `width x height` grid
    ///
    /// Defaults: Euclidean heuristic, weight 1.0, diagonal moves allowed.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_grid(Grid::new(width, height))
    }

    /// Create planner on an existing grid
    pub fn with_grid(grid: Grid) -> Self {
        Self {
            grid,
            start: GridPoint::default(),
            goal: GridPoint::default(),
            heuristic: Heuristic::default(),
            heuristic_weight: 1.0,
            allow_diagonal: true,
        }
    }

    pub fn set_start(&mut self, x: usize, y: usize) {
        self.start = GridPoint::new(x, y);
    }

    pub fn set_goal(&mut self, x: usize, y: usize) {
        self.goal = GridPoint::new(x, y);
    }

    pub fn set_obstacle(&mut self, x: usize, y: usize) {
        self.grid.set_blocked(x, y);
    }

    pub fn clear_obstacle(&mut self, x: usize, y: usize) {
        self.grid.set_free(x, y);
    }

    pub fn clear_obstacles(&mut self) {
        self.grid.clear();
    }

    /// Replace the map with `grid[y][x]` occupancy (`true` = blocked)
    ///
    /// Width is taken from the first row; short rows are padded free.
    pub fn set_grid(&mut self, grid: Vec<Vec<bool>>) {
        let height = grid.len();
        let width = grid.first().map_or(0, Vec::len);
        let mut new_grid = Grid::new(width, height);
        for (y, row) in grid.iter().enumerate() {
            for (x, _) in row.iter().enumerate().filter(|(_, blocked)| **blocked) {
                new_grid.set_blocked(x, y);
            }
        }
        self.grid = new_grid;
    }

    pub fn set_heuristic(&mut self, heuristic: Heuristic) {
        self.heuristic = heuristic;
    }

    /// Weight on the heuristic term; values above 1 trade optimality for
    /// fewer expansions. Clamped to at least 0.
    pub fn set_heuristic_weight(&mut self, weight: f64) {
        self.heuristic_weight = weight.max(0.0);
    }

    pub fn set_allow_diagonal(&mut self, allow: bool) {
        self.allow_diagonal = allow;
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Plan a path from start to goal, endpoints included
    ///
    /// Returns `None` if the start or goal is blocked or outside the grid,
    /// or if no path exists.
    pub fn plan(&self) -> Option<Vec<(usize, usize)>> {
        let result = self.plan_result();
        result.success.then(|| result.waypoints())
    }

    /// Plan and report cost and expansion count
    pub fn plan_result(&self) -> PlanResult {
        let (start, goal) = (self.start, self.goal);
        if self.grid.is_blocked(start.x, start.y) || self.grid.is_blocked(goal.x, goal.y) {
            debug!(start = %start, goal = %goal, "a* start or goal blocked");
            return PlanResult::failed(0);
        }

        let mut open = BinaryHeap::new();
        let mut closed = HashSet::new();
        let mut g_score: HashMap<GridPoint, f64> = HashMap::new();
        let mut came_from: HashMap<GridPoint, GridPoint> = HashMap::new();

        g_score.insert(start, 0.0);
        open.push(OpenNode {
            f: self.weighted_h(start),
            g: 0.0,
            point: start,
        });

        while let Some(OpenNode { g, point, .. }) = open.pop() {
            // Stale entry superseded by a cheaper push
            if !closed.insert(point) {
                continue;
            }

            if point == goal {
                let path = reconstruct_path(&came_from, goal);
                debug!(
                    nodes_explored = closed.len(),
                    cost = g,
                    waypoints = path.len(),
                    "a* path found"
                );
                return PlanResult::found(path, g, closed.len());
            }

            for (next, step) in self.successors(point) {
                if closed.contains(&next) {
                    continue;
                }
                let tentative = g + step;
                if g_score.get(&next).map_or(true, |&known| tentative < known) {
                    g_score.insert(next, tentative);
                    came_from.insert(next, point);
                    open.push(OpenNode {
                        f: tentative + self.weighted_h(next),
                        g: tentative,
                        point: next,
                    });
                }
            }
        }

        debug!(nodes_explored = closed.len(), "a* found no path");
        PlanResult::failed(closed.len())
    }

    /// Sum of Euclidean segment lengths
    pub fn path_length(path: &[(usize, usize)]) -> f64 {
        path.windows(2)
            .map(|w| {
                let dx = w[0].0.abs_diff(w[1].0) as f64;
                let dy = w[0].1.abs_diff(w[1].1) as f64;
                dx.hypot(dy)
            })
            .sum()
    }

    fn weighted_h(&self, p: GridPoint) -> f64 {
        self.heuristic_weight * self.heuristic.estimate(p, self.goal)
    }

    /// Free neighbors with their step cost
    fn successors(&self, p: GridPoint) -> Vec<(GridPoint, f64)> {
        let mut out: Vec<(GridPoint, f64)> = self
            .grid
            .neighbors4(p.x, p.y)
            .into_iter()
            .filter(|n| !self.grid.is_blocked(n.x, n.y))
            .map(|n| (n, 1.0))
            .collect();

        if self.allow_diagonal {
            for n in self.grid.neighbors8(p.x, p.y) {
                if n.x == p.x || n.y == p.y || self.grid.is_blocked(n.x, n.y) {
                    continue;
                }
                if self.grid.is_blocked(n.x, p.y) || self.grid.is_blocked(p.x, n.y) {
                    continue;
                }
                out.push((n, SQRT_2));
            }
        }
        out
    }
}

fn reconstruct_path(came_from: &HashMap<GridPoint, GridPoint>, goal: GridPoint) -> Vec<GridPoint> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
