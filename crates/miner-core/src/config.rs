//! Search configuration and tuning constants.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::HashScheme;

/// Nonces probed per batch before the loop yields to its scheduler.
pub const DEFAULT_BATCH_SIZE: u32 = 5_000;

/// Probes between two progress events.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// Random start nonces are drawn from `[0, RANDOM_START_BOUND)`.
pub const RANDOM_START_BOUND: u64 = 1_000_000;

/// Where a fresh search begins probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StartNonce {
    /// Always start at 0.
    Zero,
    /// Start at a random value below `RANDOM_START_BOUND`.
    #[default]
    Random,
    /// Start at the given value.
    Fixed(u64),
}

impl StartNonce {
    /// Pick the first nonce for a new search.
    pub fn resolve(&self) -> Result<u64> {
        match self {
            StartNonce::Zero => Ok(0),
            StartNonce::Fixed(nonce) => Ok(*nonce),
            StartNonce::Random => {
                let mut seed = [0u8; 8];
                getrandom::getrandom(&mut seed).map_err(|e| Error::Entropy(e.to_string()))?;
                Ok(u64::from_le_bytes(seed) % RANDOM_START_BOUND)
            }
        }
    }
}

/// Settings for one search loop.
///
/// No `Default`: the hash scheme must match the verifying contract and is
/// always chosen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    /// How challenge fields and nonce are hashed.
    pub scheme: HashScheme,
    /// Probes per batch (the cancellation latency bound).
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Probes between progress events; 0 disables progress.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
    /// Initial nonce policy.
    #[serde(default)]
    pub start_nonce: StartNonce,
}

fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

impl SearchConfig {
    /// Config with the given scheme and default tuning.
    pub fn new(scheme: HashScheme) -> Self {
        SearchConfig {
            scheme,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            start_nonce: StartNonce::default(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress_interval(mut self, progress_interval: u64) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    pub fn with_start_nonce(mut self, start_nonce: StartNonce) -> Self {
        self.start_nonce = start_nonce;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_start_in_range() {
        for _ in 0..32 {
            let nonce = StartNonce::Random.resolve().unwrap();
            assert!(nonce < RANDOM_START_BOUND);
        }
    }

    #[test]
    fn test_fixed_and_zero_start() {
        assert_eq!(StartNonce::Zero.resolve().unwrap(), 0);
        assert_eq!(StartNonce::Fixed(42).resolve().unwrap(), 42);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: SearchConfig = serde_json::from_str(r#"{"scheme": "two-stage"}"#).unwrap();
        assert_eq!(config, SearchConfig::new(HashScheme::TwoStage));
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.start_nonce, StartNonce::Random);
    }

    #[test]
    fn test_deserialize_full() {
        let config: SearchConfig = serde_json::from_str(
            r#"{"scheme": "packed", "batchSize": 64, "progressInterval": 0, "startNonce": {"fixed": 7}}"#,
        )
        .unwrap();
        assert_eq!(config.scheme, HashScheme::Packed);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.progress_interval, 0);
        assert_eq!(config.start_nonce, StartNonce::Fixed(7));
    }

    #[test]
    fn test_scheme_is_required() {
        assert!(serde_json::from_str::<SearchConfig>(r#"{"batchSize": 64}"#).is_err());
    }

    #[test]
    fn test_batch_size_never_zero() {
        let config = SearchConfig::new(HashScheme::Packed).with_batch_size(0);
        assert_eq!(config.batch_size, 1);
    }
}
