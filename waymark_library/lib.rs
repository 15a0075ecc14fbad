//! # Waymark Library
//!
//! Planning and linear-algebra algorithms for Waymark.
//!
//! ## Structure
//!
//! ```text
//! waymark_library/
//! ── algorithms/
//!    ── grid/         # Grid coordinates, neighbors, occupancy
//!    ── dstar_lite/   # Incremental replanner
//!    ── astar/        # From-scratch grid search
//!    ── matrix/       # Dense matrix substrate
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use waymark_library::{DStarLite, GridPoint, Matrix};
//!
//! let mut planner = DStarLite::new(8, 8, GridPoint::new(0, 0), GridPoint::new(7, 7), &[]).unwrap();
//! assert_eq!(planner.plan().cost, 14.0);
//!
//! let a = Matrix::from_rows(&[[2.0, 1.0], [1.0, 3.0]]).unwrap();
//! assert!((a.determinant().unwrap() - 5.0).abs() < 1e-12);
//! ```

pub mod algorithms;

pub use algorithms::astar::{AStar, Heuristic};
pub use algorithms::dstar_lite::{DStarLite, PlannerError, PlannerResult};
pub use algorithms::grid::{Grid, GridPoint, PlanResult};
pub use algorithms::matrix::{Matrix, MatrixError, MatrixResult, Svd, SymmetricEigen};
