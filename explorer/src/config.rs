use crate::error::ConfigError;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_MAX_STALE_ATTEMPTS: usize = 10;
pub const DEFAULT_MAX_PULL_DEPTH: usize = 100;
pub const DEFAULT_MAX_NODES: usize = 1000;
pub const DEFAULT_ROW_HEIGHT_PX: u32 = 24;

/// Bounds and batch sizes for the expansion algorithms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Nodes fetched concurrently per viewport-fill batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Consecutive batches without a change in visible rows before the
    /// viewport fill gives up.
    #[serde(default = "default_max_stale_attempts")]
    pub max_stale_attempts: usize,

    /// Upper bound on chained pull-up fetches for one parent.
    #[serde(default = "default_max_pull_depth")]
    pub max_pull_depth: usize,

    /// Nodes fetched concurrently per expand-to-leaf batch.
    #[serde(default = "default_batch_size")]
    pub leaf_batch_size: usize,

    /// Hard cap on nodes fetched by a single expand-to-leaf call.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    /// Height of one rendered row, used to turn a viewport height into a
    /// row target.
    #[serde(default = "default_row_height_px")]
    pub row_height_px: u32,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_stale_attempts() -> usize {
    DEFAULT_MAX_STALE_ATTEMPTS
}

fn default_max_pull_depth() -> usize {
    DEFAULT_MAX_PULL_DEPTH
}

fn default_max_nodes() -> usize {
    DEFAULT_MAX_NODES
}

fn default_row_height_px() -> u32 {
    DEFAULT_ROW_HEIGHT_PX
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_stale_attempts: default_max_stale_attempts(),
            max_pull_depth: default_max_pull_depth(),
            leaf_batch_size: default_batch_size(),
            max_nodes: default_max_nodes(),
            row_height_px: default_row_height_px(),
        }
    }
}

impl ExplorerConfig {
    /// Load a config from a TOML file containing the fields at top level.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ExplorerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be > 0".to_string()));
        }
        if self.leaf_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "leaf_batch_size must be > 0".to_string(),
            ));
        }
        if self.max_stale_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_stale_attempts must be > 0".to_string(),
            ));
        }
        if self.max_nodes == 0 {
            return Err(ConfigError::Invalid("max_nodes must be > 0".to_string()));
        }
        if self.row_height_px == 0 {
            return Err(ConfigError::Invalid(
                "row_height_px must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Rows needed to cover a viewport of `viewport_height_px` pixels.
    pub fn target_rows(&self, viewport_height_px: u32) -> usize {
        viewport_height_px.div_ceil(self.row_height_px.max(1)) as usize
    }
}
