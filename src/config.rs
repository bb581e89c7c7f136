//! Coordinator configuration.
//!
//! The layer reads no environment variables and persists nothing; the
//! embedding host passes a `CoordinatorConfig` (or its JSON form) when the
//! module is initialized.

use crate::error::OcrError;
use serde::{Deserialize, Serialize};

/// Threads in the background-work pool when not configured.
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Jobs allowed in flight before dispatch is refused.
pub const DEFAULT_MAX_PENDING_JOBS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoordinatorConfig {
    /// Upper bound on concurrently running Worker callbacks.
    pub worker_threads: usize,
    /// Dispatched-but-not-completed jobs tolerated before the queue refuses.
    pub max_pending_jobs: usize,
    /// Run a throwaway recognition at init to avoid the cold-start penalty.
    pub warm_up: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
            max_pending_jobs: DEFAULT_MAX_PENDING_JOBS,
            warm_up: true,
        }
    }
}

impl CoordinatorConfig {
    pub fn from_json(raw: &str) -> Result<Self, OcrError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| OcrError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OcrError> {
        if self.worker_threads == 0 {
            return Err(OcrError::Config("workerThreads must be at least 1".to_string()));
        }
        if self.max_pending_jobs == 0 {
            return Err(OcrError::Config("maxPendingJobs must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config = CoordinatorConfig::from_json("{}").unwrap();
        assert_eq!(config, CoordinatorConfig::default());
    }

    #[test]
    fn camel_case_fields_parse() {
        let config =
            CoordinatorConfig::from_json(r#"{"workerThreads": 2, "warmUp": false}"#).unwrap();
        assert_eq!(config.worker_threads, 2);
        assert!(!config.warm_up);
        assert_eq!(config.max_pending_jobs, DEFAULT_MAX_PENDING_JOBS);
    }

    #[test]
    fn zero_workers_rejected() {
        let err = CoordinatorConfig::from_json(r#"{"workerThreads": 0}"#).unwrap_err();
        assert!(matches!(err, OcrError::Config(ref m) if m.contains("workerThreads")));
    }

    #[test]
    fn malformed_json_is_config_error() {
        assert!(matches!(
            CoordinatorConfig::from_json("not json"),
            Err(OcrError::Config(_))
        ));
    }
}
