//! # Waymark
//!
//! Incremental grid planning and dense linear algebra for robotics.
//!
//! ## Quick Start
//!
//! ```rust
//! use waymark::prelude::*;
//!
//! fn run() -> AnyResult<()> {
//!     let mut planner = DStarLite::new(10, 10, GridPoint::new(0, 0), GridPoint::new(9, 9), &[])?;
//!     let first = planner.plan();
//!     ensure!(first.success, "open grid must be solvable");
//!
//!     // A cell on the path turns out to be blocked
//!     let blocked = first.path[5];
//!     let second = planner.replan(&[blocked], &[], None)?;
//!     ensure!(!second.path.contains(&blocked));
//!     Ok(())
//! }
//!
//! run().unwrap();
//! ```
//!
//! ## Features
//!
//! - **D\* Lite** replanning that reuses previous search effort
//! - **A\*** baseline search on the same grid model
//! - **Immutable matrices** with inverse, LU, Cholesky, eigen and SVD
//! - **TOML configuration** and `tracing` logging shared by every crate

// Re-export core components
pub use waymark_core::{self, *};

// Re-export algorithms with alias
pub use waymark_library as library;

/// The Waymark prelude - everything you need to get started
pub mod prelude {
    // Planning
    pub use waymark_library::algorithms::astar::{AStar, Heuristic};
    pub use waymark_library::algorithms::dstar_lite::{DStarLite, PlannerError};
    pub use waymark_library::algorithms::grid::{Grid, GridPoint, PlanResult};

    // Linear algebra
    pub use waymark_library::algorithms::matrix::{Matrix, MatrixError};

    // Configuration and logging
    pub use waymark_core::{init_logging, PlannerConfig, ScenarioFile};

    // Error types
    pub use waymark_core::error::{WaymarkError, WaymarkResult};
    pub type Result<T> = WaymarkResult<T>;

    // Common traits
    pub use serde::{Deserialize, Serialize};

    // Re-export anyhow for error handling
    pub use anyhow::{anyhow, bail, ensure, Context, Result as AnyResult};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get Waymark version
pub fn version() -> &'static str {
    VERSION
}
