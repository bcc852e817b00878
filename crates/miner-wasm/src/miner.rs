//! Search controller for the WASM miner.
//!
//! The Web Worker owns one `Miner` and calls `mine_batch` once per event
//! loop turn (`setTimeout(step, 0)`), so `stop` and new `start` messages
//! are handled between batches.

use miner_core::challenge::UintValue;
use miner_core::hash::digest_to_hex;
use miner_core::{
    verify_solution, ChallengeDescriptor, HashScheme, KeccakHasher, Search, SearchConfig,
    StartNonce, StartSearch,
};
use wasm_bindgen::prelude::*;

use crate::console_log;
use crate::state::{BatchReport, MiningStats, SearchInfo, VerifyInfo};

/// The main mining controller.
#[wasm_bindgen]
pub struct Miner {
    /// Scheme, batch size, cadence and start policy.
    config: SearchConfig,
    /// The active search, if any.
    search: Option<Search<KeccakHasher>>,
    /// Descriptor of the most recent search.
    descriptor: Option<ChallengeDescriptor>,
    /// Difficulty of the most recent search.
    difficulty: usize,
    /// Mining statistics.
    stats: MiningStats,
    /// Start time of mining.
    start_time: f64,
}

#[wasm_bindgen]
impl Miner {
    /// Create a new miner for the given hash scheme.
    ///
    /// # Arguments
    /// * `scheme` - `"packed"` or `"two-stage"`, matching the verifying contract
    #[wasm_bindgen(constructor)]
    pub fn new(scheme: &str) -> Result<Miner, JsValue> {
        let scheme = parse_scheme(scheme)?;
        Ok(Miner::with_config(SearchConfig::new(scheme)))
    }

    /// Create a miner from a config object
    /// (`{ scheme, batchSize?, progressInterval?, startNonce? }`).
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(config: JsValue) -> Result<Miner, JsValue> {
        let config: SearchConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
        Ok(Miner::with_config(config))
    }

    /// Set probes between progress events (0 disables progress).
    #[wasm_bindgen]
    pub fn set_progress_interval(&mut self, interval: u32) {
        self.config.progress_interval = interval as u64;
    }

    /// Always start new searches at the given nonce instead of a random one.
    #[wasm_bindgen]
    pub fn set_start_nonce(&mut self, nonce: f64) -> Result<(), JsValue> {
        let nonce = UintValue::Float(nonce).to_u64().map_err(to_js_error)?;
        self.config.start_nonce = StartNonce::Fixed(nonce);
        Ok(())
    }

    /// Start a search from a `StartSearch` command object.
    ///
    /// A search already running is stopped first; it emits nothing further.
    ///
    /// # Returns
    /// Search info (scheme, difficulty, start nonce, expected work).
    #[wasm_bindgen]
    pub fn start(&mut self, command: JsValue) -> Result<JsValue, JsValue> {
        let command: StartSearch = serde_wasm_bindgen::from_value(command)
            .map_err(|e| JsValue::from_str(&format!("Invalid start command: {}", e)))?;
        let (descriptor, difficulty) = command.parse().map_err(to_js_error)?;

        self.stop();

        let search = Search::start(&descriptor, difficulty, &self.config).map_err(to_js_error)?;
        let start_nonce = search.state().nonce;

        let info = SearchInfo::new(
            self.config.scheme.name(),
            difficulty,
            start_nonce,
            &descriptor.claimant_address,
        );

        self.search = Some(search);
        self.descriptor = Some(descriptor);
        self.difficulty = difficulty;
        self.stats = MiningStats::new();
        self.stats.current_nonce = start_nonce;
        self.start_time = js_sys::Date::now();

        console_log(&format!(
            "Search started: difficulty {}, nonce {}, ~{} hashes",
            difficulty, start_nonce, info.expected_hashes_display
        ));
        info.to_js()
    }

    /// Stop the current search. Idempotent.
    #[wasm_bindgen]
    pub fn stop(&mut self) {
        if let Some(mut search) = self.search.take() {
            if search.is_running() {
                console_log(&format!("Search stopped at nonce {}", search.state().nonce));
            }
            search.stop();
        }
    }

    /// Probe one batch of nonces.
    ///
    /// # Arguments
    /// * `batch_size` - Nonces to try, or the configured batch size if omitted
    ///
    /// # Returns
    /// `{ events, hashes_computed, running, nonce }`. A stopped miner
    /// returns an empty report.
    #[wasm_bindgen]
    pub fn mine_batch(&mut self, batch_size: Option<u32>) -> Result<JsValue, JsValue> {
        let batch_size = batch_size.unwrap_or(self.config.batch_size);

        let Some(search) = self.search.as_mut() else {
            return BatchReport {
                events: Vec::new(),
                hashes_computed: 0,
                running: false,
                nonce: self.stats.current_nonce,
            }
            .to_js();
        };

        let mut events = Vec::new();
        let outcome = search.run_batch(batch_size, |event| events.push(event));
        let nonce = search.state().nonce;

        self.stats.total_hashes += outcome.hashes_computed;
        self.stats.current_nonce = nonce;
        for event in &events {
            self.stats.record(event);
        }

        if self.start_time > 0.0 {
            self.stats.elapsed_ms = js_sys::Date::now() - self.start_time;
            self.stats.update_hash_rate();
        }

        if !outcome.running {
            self.search = None;
        }

        BatchReport {
            events,
            hashes_computed: outcome.hashes_computed,
            running: outcome.running,
            nonce,
        }
        .to_js()
    }

    /// Re-check a nonce against the current challenge.
    ///
    /// # Returns
    /// `{ valid, digest }`
    #[wasm_bindgen]
    pub fn verify(&self, nonce: f64) -> Result<JsValue, JsValue> {
        let descriptor = self
            .descriptor
            .as_ref()
            .ok_or_else(|| JsValue::from_str("No search started"))?;
        let nonce = UintValue::Float(nonce).to_u64().map_err(to_js_error)?;
        let (valid, digest) =
            verify_solution(descriptor, self.config.scheme, nonce, self.difficulty).map_err(to_js_error)?;

        VerifyInfo {
            valid,
            digest: digest_to_hex(&digest),
        }
        .to_js()
    }

    /// Check if a search is active.
    #[wasm_bindgen(getter)]
    pub fn is_mining(&self) -> bool {
        self.search.as_ref().map_or(false, |s| s.is_running())
    }

    /// Get the hash scheme name.
    #[wasm_bindgen(getter)]
    pub fn scheme(&self) -> String {
        self.config.scheme.name().to_string()
    }

    /// Get current mining statistics.
    #[wasm_bindgen]
    pub fn get_stats(&self) -> Result<JsValue, JsValue> {
        self.stats.to_js()
    }

    /// Get the formatted hash rate.
    #[wasm_bindgen]
    pub fn get_hash_rate_display(&self) -> String {
        self.stats.format_hash_rate()
    }
}

impl Miner {
    fn with_config(config: SearchConfig) -> Miner {
        Miner {
            config,
            search: None,
            descriptor: None,
            difficulty: 0,
            stats: MiningStats::new(),
            start_time: 0.0,
        }
    }
}

fn parse_scheme(scheme: &str) -> Result<HashScheme, JsValue> {
    HashScheme::from_str(scheme)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown hash scheme: {}", scheme)))
}

fn to_js_error<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Verify a nonce for a `StartSearch` command without a running miner.
///
/// # Returns
/// `{ valid, digest }`
#[wasm_bindgen]
pub fn verify_nonce(command: JsValue, scheme: &str, nonce: f64) -> Result<JsValue, JsValue> {
    let command: StartSearch = serde_wasm_bindgen::from_value(command)
        .map_err(|e| JsValue::from_str(&format!("Invalid command: {}", e)))?;
    let (descriptor, difficulty) = command.parse().map_err(to_js_error)?;
    let scheme = parse_scheme(scheme)?;
    let nonce = UintValue::Float(nonce).to_u64().map_err(to_js_error)?;
    let (valid, digest) = verify_solution(&descriptor, scheme, nonce, difficulty).map_err(to_js_error)?;

    VerifyInfo {
        valid,
        digest: digest_to_hex(&digest),
    }
    .to_js()
}
