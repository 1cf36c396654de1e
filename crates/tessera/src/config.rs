//! Decode configuration (strict YAML).

use std::fs;

use serde::Deserialize;

use crate::{Result, TesseraError};

/// Limits and logging behaviour for batch decoding.
///
/// Unknown keys are rejected so a typo doesn't silently fall back to a
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecodeConfig {
    /// Most events accepted in one batch. `0` means unlimited.
    #[serde(default = "default_max_batch_events")]
    pub max_batch_events: usize,

    /// Emit a `warn` for every event dropped from a batch.
    #[serde(default = "default_log_dropped_events")]
    pub log_dropped_events: bool,
}

fn default_max_batch_events() -> usize {
    10_000
}

fn default_log_dropped_events() -> bool {
    true
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_batch_events: default_max_batch_events(),
            log_dropped_events: default_log_dropped_events(),
        }
    }
}

impl DecodeConfig {
    /// Returns an error if a batch of `len` events is over the limit.
    pub fn check_batch_len(&self, len: usize) -> Result<()> {
        if self.max_batch_events != 0 && len > self.max_batch_events {
            return Err(TesseraError::BatchTooLarge {
                len,
                max: self.max_batch_events,
            });
        }
        Ok(())
    }
}

/// Reads and parses a config file.
pub fn load_from_file(path: &str) -> Result<DecodeConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| TesseraError::Config(format!("read {path} failed: {e}")))?;
    load_from_str(&s)
}

/// Parses a config from YAML. An empty document yields the defaults.
pub fn load_from_str(s: &str) -> Result<DecodeConfig> {
    if s.trim().is_empty() {
        return Ok(DecodeConfig::default());
    }
    serde_yaml::from_str(s).map_err(|e| TesseraError::Config(format!("invalid yaml: {e}")))
}
