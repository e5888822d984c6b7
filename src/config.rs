//! Aggregator configuration.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::tracker::{CompletenessPolicy, EvictionPolicy, GLOVES, HELMET, VEST};

/// What the pipeline does when the person tracker or PPE classifier fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return the error and stop processing the stream
    #[default]
    Abort,
    /// Drop the frame without touching registry state and keep going
    SkipFrame,
}

/// Configuration for the track registry and pipeline.
///
/// Every field has a default, so a YAML file only needs to list the values
/// it overrides:
///
/// ```yaml
/// window_size: 15
/// max_track_age: 60
/// required_equipment: [helmet, vest]
/// failure_policy: skip_frame
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PpeConfig {
    /// Labels that must all be observed within a window
    pub required_equipment: BTreeSet<String>,
    /// Frames per evaluation window
    pub window_size: u32,
    /// Frames a track may go unseen before eviction
    pub max_track_age: u64,
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("window_size must be at least 1")]
    ZeroWindow,
    #[error("required_equipment must name at least one label")]
    EmptyRequiredSet,
}

impl Default for PpeConfig {
    fn default() -> Self {
        Self {
            required_equipment: [HELMET, VEST, GLOVES].into_iter().map(String::from).collect(),
            window_size: 10,
            max_track_age: 30,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl PpeConfig {
    /// Read and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: PpeConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.required_equipment.is_empty() {
            return Err(ConfigError::EmptyRequiredSet);
        }
        Ok(())
    }

    pub fn with_window_size(mut self, window_size: u32) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_max_track_age(mut self, max_track_age: u64) -> Self {
        self.max_track_age = max_track_age;
        self
    }

    pub fn with_required_equipment<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_equipment = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn completeness_policy(&self) -> CompletenessPolicy {
        CompletenessPolicy::new(self.required_equipment.iter().cloned())
    }

    pub fn eviction_policy(&self) -> EvictionPolicy {
        EvictionPolicy::new(self.max_track_age)
    }
}
