//! Configuration for Waymark planners
//!
//! Typed settings with presets, loadable from TOML. The planner crate reads
//! these values; nothing here depends on the algorithms.

use crate::error::{WaymarkError, WaymarkResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Search bounds for the incremental planner
///
/// Both caps scale with the grid area so one config works for any map size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Maximum queue pops per shortest-path computation, as a multiple of
    /// `width * height`
    ///
    /// Default: 2
    pub search_iteration_factor: usize,

    /// Maximum steps when walking the extracted path, as a multiple of
    /// `width * height`
    ///
    /// Default: 1
    pub path_step_factor: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::strict()
    }
}

impl PlannerConfig {
    /// Tight caps: every cell popped at most twice per search
    pub fn strict() -> Self {
        Self {
            search_iteration_factor: 2,
            path_step_factor: 1,
        }
    }

    /// Generous caps for maps that change heavily between replans
    pub fn relaxed() -> Self {
        Self {
            search_iteration_factor: 8,
            path_step_factor: 2,
        }
    }

    /// Iteration cap for a `width x height` grid
    pub fn search_cap(&self, width: usize, height: usize) -> usize {
        self.search_iteration_factor
            .saturating_mul(width)
            .saturating_mul(height)
    }

    /// Path extraction step cap for a `width x height` grid
    pub fn path_cap(&self, width: usize, height: usize) -> usize {
        self.path_step_factor
            .saturating_mul(width)
            .saturating_mul(height)
    }

    /// Reject factors that would stop a search before it can start
    pub fn validate(&self) -> WaymarkResult<()> {
        if self.search_iteration_factor == 0 {
            return Err(WaymarkError::Config(
                "search_iteration_factor must be at least 1".into(),
            ));
        }
        if self.path_step_factor == 0 {
            return Err(WaymarkError::Config(
                "path_step_factor must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate from a TOML document
    pub fn from_toml_str(text: &str) -> WaymarkResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> WaymarkResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading planner config");
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> WaymarkResult<String> {
        Ok(toml::to_string(self)?)
    }
}

/// One world change applied after the initial plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioReplan {
    /// Cells that became blocked
    pub added: Vec<[usize; 2]>,
    /// Cells that became free
    pub removed: Vec<[usize; 2]>,
    /// New robot position, if it moved
    pub move_to: Option<[usize; 2]>,
}

/// A planning scenario on disk
///
/// ```toml
/// width = 10
/// height = 10
/// start = [0, 0]
/// goal = [9, 9]
/// obstacles = [[4, 4], [4, 5]]
///
/// [planner]
/// search_iteration_factor = 4
///
/// [[replans]]
/// added = [[5, 5]]
/// move_to = [1, 0]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub width: usize,
    pub height: usize,
    pub start: [usize; 2],
    pub goal: [usize; 2],
    #[serde(default)]
    pub obstacles: Vec<[usize; 2]>,
    #[serde(default)]
    pub replans: Vec<ScenarioReplan>,
    #[serde(default)]
    pub planner: PlannerConfig,
}

impl ScenarioFile {
    /// Parse and validate from a TOML document
    pub fn from_toml_str(text: &str) -> WaymarkResult<Self> {
        let scenario: Self = toml::from_str(text)?;
        scenario.planner.validate()?;
        if scenario.width == 0 || scenario.height == 0 {
            return Err(WaymarkError::Config(format!(
                "scenario grid must be non-empty, got {}x{}",
                scenario.width, scenario.height
            )));
        }
        Ok(scenario)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> WaymarkResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading scenario");
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
