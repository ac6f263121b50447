//! Robot description file (TOML).
//!
//! Stands in for URDF ingestion: the chain spec carries the controlled
//! joints, their limits, and the per-link collision proxies.

use std::path::Path;

use serde::{Deserialize, Serialize};

use daneel_expr::ChainSpec;

/// On-disk robot description.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RobotFile {
    pub chain: ChainSpec,
}

impl RobotFile {
    pub fn load(path: &Path) -> Result<Self, crate::MotionError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| crate::MotionError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&text)
            .map_err(|e| crate::MotionError::Config(format!("{}: {e}", path.display())))
    }
}
