//! Search statistics and JS-facing result types.

use miner_core::difficulty::{expected_hashes, format_hashes};
use miner_core::SearchEvent;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Mining statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiningStats {
    /// Total hashes computed.
    pub total_hashes: u64,
    /// Current hash rate (hashes per second).
    pub hash_rate: f64,
    /// Progress events emitted so far.
    pub progress_events: u32,
    /// Whether a solution was found.
    pub solution_found: bool,
    /// Next nonce to probe.
    pub current_nonce: u64,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: f64,
    /// Digest of the most recent progress sample.
    pub last_digest: Option<String>,
}

impl MiningStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update hash rate based on elapsed time.
    pub fn update_hash_rate(&mut self) {
        if self.elapsed_ms > 0.0 {
            self.hash_rate = (self.total_hashes as f64) / (self.elapsed_ms / 1000.0);
        }
    }

    /// Fold an emitted event into the stats.
    pub fn record(&mut self, event: &SearchEvent) {
        match event {
            SearchEvent::Progress { digest, .. } => {
                self.progress_events += 1;
                self.last_digest = Some(miner_core::hash::digest_to_hex(digest));
            }
            SearchEvent::Solution { .. } => self.solution_found = true,
            SearchEvent::Error { .. } => {}
        }
    }

    /// Format hash rate for display.
    pub fn format_hash_rate(&self) -> String {
        if self.hash_rate >= 1_000_000_000.0 {
            format!("{:.2} GH/s", self.hash_rate / 1_000_000_000.0)
        } else if self.hash_rate >= 1_000_000.0 {
            format!("{:.2} MH/s", self.hash_rate / 1_000_000.0)
        } else if self.hash_rate >= 1_000.0 {
            format!("{:.2} KH/s", self.hash_rate / 1_000.0)
        } else {
            format!("{:.2} H/s", self.hash_rate)
        }
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

/// Search parameters echoed back to the host on start.
#[derive(Debug, Clone, Serialize)]
pub struct SearchInfo {
    /// Hash scheme name.
    pub scheme: String,
    /// Required leading zero bytes.
    pub difficulty: usize,
    /// First nonce probed.
    pub start_nonce: u64,
    /// Average hashes needed for a solution.
    pub expected_hashes: f64,
    /// Formatted expected hashes.
    pub expected_hashes_display: String,
    /// Claimant address as `0x` hex.
    pub claimant_address: String,
}

impl SearchInfo {
    pub fn new(scheme: &str, difficulty: usize, start_nonce: u64, claimant: &[u8]) -> Self {
        let expected = expected_hashes(difficulty);
        SearchInfo {
            scheme: scheme.to_string(),
            difficulty,
            start_nonce,
            expected_hashes: expected,
            expected_hashes_display: format_hashes(expected),
            claimant_address: format!("0x{}", hex::encode(claimant)),
        }
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

/// Result of one `mine_batch` call.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Events generated during the batch, in order.
    pub events: Vec<SearchEvent>,
    /// Hashes computed in this batch.
    pub hashes_computed: u64,
    /// Whether the search continues.
    pub running: bool,
    /// Next nonce to probe.
    pub nonce: u64,
}

impl BatchReport {
    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

/// Outcome of re-verifying a nonce.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyInfo {
    pub valid: bool,
    pub digest: String,
}

impl VerifyInfo {
    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
}
