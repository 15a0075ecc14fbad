//! D* Lite Incremental Replanning
//!
//! Backward search from the goal on a 4-connected, unit-cost grid that
//! repairs its cost field in place when cells become blocked or free, or
//! when the robot moves, instead of searching again from scratch.
//!
//! # Features
//!
//! - `g` (cost-to-goal estimate) and `rhs` (one-step lookahead) per cell
//! - Lexicographic queue keys biased by the `km` accumulator on robot motion
//! - Incremental repair for both cost decreases and cost increases
//! - Greedy path extraction on the converged `g` field
//! - Iteration caps on both the search and the extraction
//!
//! # Example
//!
//! ```rust
//! use waymark_library::algorithms::dstar_lite::DStarLite;
//! use waymark_library::algorithms::grid::GridPoint;
//!
//! let mut planner = DStarLite::new(
//!     10,
//!     10,
//!     GridPoint::new(0, 0),
//!     GridPoint::new(9, 9),
//!     &[],
//! )
//! .unwrap();
//!
//! let result = planner.plan();
//! assert!(result.success);
//! assert_eq!(result.cost, 18.0);
//!
//! // A wall appears and the robot has taken one step
//! let result = planner
//!     .replan(&[GridPoint::new(5, 5)], &[], Some(GridPoint::new(1, 0)))
//!     .unwrap();
//! assert_eq!(result.path[0], GridPoint::new(1, 0));
//! ```
//!
//! A planner is a single-owner, mutable object: every query takes
//! `&mut self`, so sharing one across threads needs a `Mutex`.

mod queue;


pub use queue::Key;

use crate::algorithms::grid::{in_bounds, neighbors4, GridPoint, PlanResult};
use queue::PriorityQueue;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, trace, warn};
use waymark_core::{PlannerConfig, WaymarkError};

/// Planner input errors
///
/// These are caller-contract violations detected before any state changes.
/// An unreachable goal is not an error; see [`PlanResult::success`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    #[error("Grid must be non-empty, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    #[error("{role} {point} is outside the {width}x{height} grid")]
    OutOfBounds {
        role: &'static str,
        point: GridPoint,
        width: usize,
        height: usize,
    },

    #[error("Invalid planner config: {0}")]
    InvalidConfig(String),
}

impl From<PlannerError> for WaymarkError {
    fn from(e: PlannerError) -> Self {
        WaymarkError::Planner(e.to_string())
    }
}

/// Result type for planner construction and updates
pub type PlannerResult<T> = Result<T, PlannerError>;

const EDGE_COST: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct CellCosts {
    g: f64,
    rhs: f64,
}

impl CellCosts {
    const UNSEEN: Self = Self {
        g: f64::INFINITY,
        rhs: f64::INFINITY,
    };
}

/// D* Lite planner state
#[derive(Debug, Clone)]
pub struct DStarLite {
    width: usize,
    height: usize,
    start: GridPoint,
    goal: GridPoint,
    cells: Vec<CellCosts>,
    queue: PriorityQueue,
    blocked: HashSet<GridPoint>,
    km: f64,
    config: PlannerConfig,
}

impl DStarLite {
    /// Create a planner with the default search caps
    pub fn new(
        width: usize,
        height: usize,
        start: GridPoint,
        goal: GridPoint,
        obstacles: &[GridPoint],
    ) -> PlannerResult<Self> {
        Self::with_config(width, height, start, goal, obstacles, PlannerConfig::default())
    }

    /// Create a planner
    ///
    /// Seeds `rhs(goal) = 0` and queues the goal; every other cell starts
    /// unseen. Fails if the grid is empty or any coordinate is outside it.
    pub fn with_config(
        width: usize,
        height: usize,
        start: GridPoint,
        goal: GridPoint,
        obstacles: &[GridPoint],
        config: PlannerConfig,
    ) -> PlannerResult<Self> {
        if width == 0 || height == 0 {
            return Err(PlannerError::EmptyGrid { width, height });
        }
        config
            .validate()
            .map_err(|e| PlannerError::InvalidConfig(e.to_string()))?;

        let mut planner = Self {
            width,
            height,
            start,
            goal,
            cells: vec![CellCosts::UNSEEN; width * height],
            queue: PriorityQueue::new(width * height),
            blocked: HashSet::with_capacity(obstacles.len()),
            km: 0.0,
            config,
        };

        planner.check_bounds("start", start)?;
        planner.check_bounds("goal", goal)?;
        for p in obstacles {
            planner.check_bounds("obstacle", *p)?;
        }
        planner.blocked.extend(obstacles.iter().copied());

        let goal_index = planner.index(goal);
        planner.cells[goal_index].rhs = 0.0;
        let key = planner.calc_key(goal);
        planner.queue.insert(goal_index, goal, key);

        debug!(
            width,
            height,
            start = %start,
            goal = %goal,
            obstacles = planner.blocked.len(),
            "d* lite initialized"
        );
        Ok(planner)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn start(&self) -> GridPoint {
        self.start
    }

    pub fn goal(&self) -> GridPoint {
        self.goal
    }

    /// Key modifier accumulated over robot moves
    pub fn km(&self) -> f64 {
        self.km
    }

    /// Number of inconsistent cells waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn is_blocked(&self, p: GridPoint) -> bool {
        self.blocked.contains(&p)
    }

    /// Blocked cells in no particular order
    pub fn blocked_cells(&self) -> impl Iterator<Item = GridPoint> + '_ {
        self.blocked.iter().copied()
    }

    /// Cost-to-goal estimate; `+inf` for unseen cells
    ///
    /// # Panics
    /// If `p` is outside the grid.
    pub fn g(&self, p: GridPoint) -> f64 {
        self.cells[self.index(p)].g
    }

    /// One-step lookahead estimate; `+inf` for unseen cells
    ///
    /// # Panics
    /// If `p` is outside the grid.
    pub fn rhs(&self, p: GridPoint) -> f64 {
        self.cells[self.index(p)].rhs
    }

    /// `g == rhs`, which also means the cell is not queued
    pub fn is_consistent(&self, p: GridPoint) -> bool {
        let index = self.index(p);
        let cell = self.cells[index];
        debug_assert_eq!(cell.g != cell.rhs, self.queue.contains(index));
        cell.g == cell.rhs
    }

    /// Priority of a cell under the current start and `km`
    pub fn calc_key(&self, p: GridPoint) -> Key {
        let cell = self.cells[self.index(p)];
        let min = cell.g.min(cell.rhs);
        Key(min + heuristic(p, self.start) + self.km, min)
    }

    /// Recompute `rhs` for `p` and requeue it if it is inconsistent
    ///
    /// The goal keeps `rhs = 0`; a blocked cell gets `+inf`. Any queued
    /// entry is removed first so a cell never appears twice.
    pub fn update_vertex(&mut self, p: GridPoint) {
        let index = self.index(p);

        if p != self.goal {
            let rhs = if self.blocked.contains(&p) {
                f64::INFINITY
            } else {
                neighbors4(self.width, self.height, p.x, p.y)
                    .into_iter()
                    .filter(|n| !self.blocked.contains(n))
                    .map(|n| self.g(n) + EDGE_COST)
                    .fold(f64::INFINITY, f64::min)
            };
            self.cells[index].rhs = rhs;
        }

        self.queue.remove(index, p);

        let cell = self.cells[index];
        if cell.g != cell.rhs {
            let key = self.calc_key(p);
            self.queue.insert(index, p, key);
        }
    }

    /// Drain the queue until the start cell is locally consistent and no
    /// queued key is below the start's key
    ///
    /// Returns the number of cells popped.
    pub fn compute_shortest_path(&mut self) -> usize {
        let cap = self.config.search_cap(self.width, self.height);
        let start_index = self.index(self.start);
        let mut explored = 0;

        while let Some(top) = self.queue.top_key() {
            let start_cell = self.cells[start_index];
            if top >= self.calc_key(self.start) && start_cell.rhs == start_cell.g {
                break;
            }
            if explored >= cap {
                warn!(
                    cap,
                    queued = self.queue.len(),
                    "d* lite iteration cap reached before convergence"
                );
                break;
            }

            let width = self.width;
            let Some((u, key)) = self.queue.pop(|p| p.y * width + p.x) else {
                break;
            };
            explored += 1;

            let index = self.index(u);
            let cell = self.cells[index];
            trace!(x = u.x, y = u.y, k1 = key.0, k2 = key.1, g = cell.g, rhs = cell.rhs, "pop");

            let neighbors = neighbors4(self.width, self.height, u.x, u.y);
            if cell.g > cell.rhs {
                self.cells[index].g = cell.rhs;
            } else {
                self.cells[index].g = f64::INFINITY;
                self.update_vertex(u);
            }
            for n in neighbors {
                self.update_vertex(n);
            }
        }

        debug!(explored, queued = self.queue.len(), "compute_shortest_path done");
        explored
    }

    /// Run the search and extract a path from the start
    pub fn plan(&mut self) -> PlanResult {
        let explored = self.compute_shortest_path();
        self.extract_path(explored)
    }

    /// Apply world changes and plan again, reusing previous search effort
    ///
    /// `new_start` moves the robot; `added` cells become blocked and
    /// `removed` cells become free. All coordinates are checked before any
    /// state changes.
    pub fn replan(
        &mut self,
        added: &[GridPoint],
        removed: &[GridPoint],
        new_start: Option<GridPoint>,
    ) -> PlannerResult<PlanResult> {
        if let Some(s) = new_start {
            self.check_bounds("start", s)?;
        }
        for p in added.iter().chain(removed) {
            self.check_bounds("obstacle", *p)?;
        }

        if let Some(s) = new_start {
            self.km += heuristic(self.start, s);
            self.start = s;
        }

        for p in added {
            self.blocked.insert(*p);
            self.update_cell_and_neighbors(*p);
        }
        for p in removed {
            self.blocked.remove(p);
            self.update_cell_and_neighbors(*p);
        }

        debug!(
            added = added.len(),
            removed = removed.len(),
            moved = new_start.is_some(),
            km = self.km,
            "d* lite replanning"
        );
        Ok(self.plan())
    }

    fn update_cell_and_neighbors(&mut self, p: GridPoint) {
        self.update_vertex(p);
        for n in neighbors4(self.width, self.height, p.x, p.y) {
            self.update_vertex(n);
        }
    }

    /// Greedy descent on `g` from the start
    ///
    /// Moves to the unblocked neighbor with the strictly smallest `g`, ties
    /// going to the first in neighbor order. Stops at the goal, when no
    /// neighbor improves on the current cell, or at the step cap.
    fn extract_path(&self, explored: usize) -> PlanResult {
        if self.blocked.contains(&self.start) || self.blocked.contains(&self.goal) {
            debug!("start or goal blocked, no path");
            return PlanResult::failed(explored);
        }

        let cost = self.g(self.start);
        if cost.is_infinite() {
            debug!(start = %self.start, "start unreachable");
            return PlanResult::failed(explored);
        }

        let cap = self.config.path_cap(self.width, self.height);
        let mut path = vec![self.start];
        let mut current = self.start;

        for _ in 0..cap {
            if current == self.goal {
                break;
            }

            let mut best: Option<(GridPoint, f64)> = None;
            for n in neighbors4(self.width, self.height, current.x, current.y) {
                if self.blocked.contains(&n) {
                    continue;
                }
                let g = self.g(n);
                if best.map_or(true, |(_, best_g)| g < best_g) {
                    best = Some((n, g));
                }
            }

            match best {
                Some((next, best_g)) if best_g < self.g(current) => {
                    path.push(next);
                    current = next;
                }
                _ => {
                    warn!(at = %current, "path extraction stuck on inconsistent g field");
                    return PlanResult::failed(explored);
                }
            }
        }

        if current != self.goal {
            warn!(cap, "path extraction step cap reached");
            return PlanResult::failed(explored);
        }

        PlanResult::found(path, cost, explored)
    }

    fn check_bounds(&self, role: &'static str, p: GridPoint) -> PlannerResult<()> {
        if in_bounds(self.width, self.height, p.x, p.y) {
            Ok(())
        } else {
            Err(PlannerError::OutOfBounds {
                role,
                point: p,
                width: self.width,
                height: self.height,
            })
        }
    }

    fn index(&self, p: GridPoint) -> usize {
        assert!(
            in_bounds(self.width, self.height, p.x, p.y),
            "{p} outside {}x{} grid",
            self.width,
            self.height
        );
        p.y * self.width + p.x
    }
}

/// Manhattan distance as `f64`
fn heuristic(a: GridPoint, b: GridPoint) -> f64 {
    a.manhattan(&b) as f64
}
