//! Configuration surface.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use daneel_tree::SchedulerSettings;

/// Environment-agnostic knobs, loadable from TOML. Per-goal knobs travel
/// inside the goal's JSON parameter blob instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tree tick rate in Hz.
    pub tree_tick_rate: f64,
    /// Fallback joint velocity limit (rad/s or m/s).
    pub default_joint_vel_limit: f64,
    /// Fallback joint cost weight.
    pub default_joint_weight: f64,
    /// Maximum ticks inside one planning universe.
    pub planning_tick_cap: u64,
    /// Wall-clock budget per motion, in seconds.
    pub wall_timeout_secs: f64,
    /// Commanded-speed threshold below which the goal counts as reached.
    pub goal_velocity_threshold: f64,
    /// Planning universes may nest up to this depth.
    pub universe_nesting_cap: usize,
    /// Compiled-evaluator cache directory; `None` disables the cache.
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tree_tick_rate: 50.0,
            default_joint_vel_limit: 1.0,
            default_joint_weight: 0.001,
            planning_tick_cap: 10_000,
            wall_timeout_secs: 60.0,
            goal_velocity_threshold: 1e-3,
            universe_nesting_cap: 1,
            cache_dir: None,
        }
    }
}

impl Config {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, crate::MotionError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| crate::MotionError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&text)
            .map_err(|e| crate::MotionError::Config(format!("{}: {e}", path.display())))
    }

    /// Load from a TOML file, falling back to defaults if it is absent.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    pub(crate) fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            tick_rate: self.tree_tick_rate,
            planning_tick_cap: self.planning_tick_cap,
            wall_timeout: Duration::from_secs_f64(self.wall_timeout_secs),
            goal_velocity_threshold: self.goal_velocity_threshold,
            universe_nesting_cap: self.universe_nesting_cap,
            ..SchedulerSettings::default()
        }
    }
}
