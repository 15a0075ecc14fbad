//! # Waymark Core
//!
//! Foundation shared by every Waymark crate:
//!
//! - **Errors**: the crate-wide [`WaymarkError`] and [`WaymarkResult`]
//! - **Logging**: `tracing` subscriber bootstrap for binaries and tests
//! - **Configuration**: typed planner settings and TOML scenario files
//!
//! The algorithms themselves live in `waymark_library`; this crate has no
//! knowledge of them beyond the settings it hands over.
//!
//! ## Quick Start
//!
//! ```rust
//! use waymark_core::{PlannerConfig, WaymarkResult};
//!
//! fn load() -> WaymarkResult<PlannerConfig> {
//!     PlannerConfig::from_toml_str("search_iteration_factor = 4")
//! }
//!
//! let config = load().unwrap();
//! assert_eq!(config.search_iteration_factor, 4);
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{PlannerConfig, ScenarioFile, ScenarioReplan};
pub use error::{WaymarkError, WaymarkResult};
pub use logging::init_logging;
