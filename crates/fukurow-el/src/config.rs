//! 推論エンジン設定

use crate::error::ElError;
use crate::trace::TracingMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Reasoner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    pub saturation: SaturationConfig,
    pub tracing: TracingConfig,
}

/// Saturation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturationConfig {
    /// Number of worker threads; 1 runs on the calling thread
    pub num_workers: usize,

    /// Idle wait between quiescence checks, in milliseconds
    pub poll_interval_ms: u64,
}

impl SaturationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }
}

impl Default for SaturationConfig {
    fn default() -> Self {
        Self {
            num_workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            poll_interval_ms: 5,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Maximum number of replayed contexts kept in the trace cache
    pub cache_capacity: usize,

    /// Mode used by explanation queries that do not specify one
    pub default_mode: TracingMode,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
            default_mode: TracingMode::Recursive,
        }
    }
}

impl ReasonerConfig {
    pub fn from_json_str(input: &str) -> Result<Self, ElError> {
        let config: Self = serde_json::from_str(input).map_err(|e| ElError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ElError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ElError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&input)
    }

    pub fn validate(&self) -> Result<(), ElError> {
        if self.saturation.num_workers == 0 {
            return Err(ElError::Config("num_workers must be at least 1".to_string()));
        }
        if self.saturation.poll_interval_ms == 0 {
            return Err(ElError::Config("poll_interval_ms must be positive".to_string()));
        }
        if self.tracing.cache_capacity == 0 {
            return Err(ElError::Config("cache_capacity must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ReasonerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.saturation.num_workers >= 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ReasonerConfig::from_json_str(r#"{"saturation": {"num_workers": 3}}"#).unwrap();
        assert_eq!(config.saturation.num_workers, 3);
        assert_eq!(config.saturation.poll_interval_ms, 5);
        assert_eq!(config.tracing, TracingConfig::default());
    }

    #[test]
    fn test_tracing_mode_from_json() {
        let config = ReasonerConfig::from_json_str(r#"{"tracing": {"default_mode": "NonRecursive"}}"#).unwrap();
        assert_eq!(config.tracing.default_mode, TracingMode::NonRecursive);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = ReasonerConfig::from_json_str(r#"{"saturation": {"num_workers": 0}}"#);
        assert!(matches!(result, Err(ElError::Config(_))));
    }
}
