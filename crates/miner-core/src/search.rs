//! The nonce search loop.
//!
//! A [`Search`] owns its state and never runs unbounded: the host calls
//! [`Search::run_batch`] from whatever scheduler it has (a worker thread,
//! a `setTimeout` loop in a Web Worker) and gets control back after at most
//! one batch. Cancellation goes through a [`CancelToken`], checked before
//! every probe.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::challenge::ChallengeDescriptor;
use crate::config::SearchConfig;
use crate::difficulty::{is_attainable, meets_difficulty};
use crate::encoding::EncodingError;
use crate::error::Result;
use crate::hash::{challenge_digest, digest_to_hex, Digest, HashScheme, Hasher, KeccakHasher};

/// Mutable state of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchState {
    /// Next nonce to probe.
    pub nonce: u64,
    /// Whether the search is still probing.
    pub running: bool,
}

/// Events emitted to the host, in generation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchEvent {
    /// Periodic sample of the probe that just ran.
    Progress {
        nonce: u64,
        #[serde(serialize_with = "serialize_digest")]
        digest: Digest,
    },
    /// First digest meeting the difficulty. Terminal.
    Solution {
        nonce: u64,
        #[serde(serialize_with = "serialize_digest")]
        digest: Digest,
    },
    /// The search failed and has stopped. Terminal.
    Error { message: String },
}

impl SearchEvent {
    /// Whether this event ends its search.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchEvent::Progress { .. })
    }
}

fn serialize_digest<S: serde::Serializer>(digest: &Digest, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&digest_to_hex(digest))
}

/// Shared stop flag for a search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of one call to [`Search::run_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Digests computed in this batch.
    pub hashes_computed: u64,
    /// Whether the search continues after this batch.
    pub running: bool,
}

/// A single search for a nonce meeting `difficulty`.
pub struct Search<H> {
    hasher: H,
    difficulty: usize,
    progress_interval: u64,
    state: SearchState,
    probes: u64,
    cancel: CancelToken,
}

impl Search<KeccakHasher> {
    /// Start a contract-compatible search as described by `config`.
    pub fn start(
        descriptor: &ChallengeDescriptor,
        difficulty: usize,
        config: &SearchConfig,
    ) -> Result<Self> {
        let hasher = KeccakHasher::new(descriptor, config.scheme)?;
        Search::with_config(hasher, difficulty, config)
    }
}

impl<H: Hasher> Search<H> {
    /// Create a running search with an explicit start nonce.
    pub fn new(hasher: H, difficulty: usize, start_nonce: u64, progress_interval: u64) -> Self {
        Search {
            hasher,
            difficulty,
            progress_interval,
            state: SearchState {
                nonce: start_nonce,
                running: true,
            },
            probes: 0,
            cancel: CancelToken::new(),
        }
    }

    /// Create a running search using the start nonce and cadence in `config`.
    pub fn with_config(hasher: H, difficulty: usize, config: &SearchConfig) -> Result<Self> {
        let start_nonce = config.start_nonce.resolve()?;
        if !is_attainable(difficulty) {
            warn!("difficulty {} exceeds the digest length and cannot be met", difficulty);
        }
        debug!(
            "starting {} search at nonce {} with difficulty {}",
            config.scheme.name(),
            start_nonce,
            difficulty
        );
        Ok(Search::new(hasher, difficulty, start_nonce, config.progress_interval))
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// A token that stops this search from anywhere.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Probes run so far.
    pub fn probes(&self) -> u64 {
        self.probes
    }

    pub fn is_running(&self) -> bool {
        self.state.running && !self.cancel.is_cancelled()
    }

    /// Stop the search. Idempotent.
    pub fn stop(&mut self) {
        if self.state.running {
            debug!("search stopped at nonce {}", self.state.nonce);
        }
        self.cancel.cancel();
        self.state.running = false;
    }

    /// Probe up to `batch_size` nonces, passing events to `emit`.
    ///
    /// Returns early on a solution, an error or cancellation. A stopped
    /// search computes nothing and emits nothing.
    pub fn run_batch<F>(&mut self, batch_size: u32, mut emit: F) -> BatchOutcome
    where
        F: FnMut(SearchEvent),
    {
        let mut hashes_computed = 0u64;

        for _ in 0..batch_size.max(1) {
            if !self.is_running() {
                self.state.running = false;
                break;
            }

            let nonce = self.state.nonce;
            let digest = match self.hasher.hash_nonce(nonce) {
                Ok(digest) => digest,
                Err(e) => {
                    self.fail(e, &mut emit);
                    break;
                }
            };
            hashes_computed += 1;
            self.probes += 1;

            if meets_difficulty(&digest, self.difficulty) {
                info!(
                    "solution found after {} probes: nonce {} hash {}",
                    self.probes,
                    nonce,
                    digest_to_hex(&digest)
                );
                self.state.running = false;
                emit(SearchEvent::Solution { nonce, digest });
                break;
            }

            if self.progress_interval > 0 && self.probes % self.progress_interval == 0 {
                emit(SearchEvent::Progress { nonce, digest });
            }

            self.state.nonce = nonce.wrapping_add(1);
        }

        BatchOutcome {
            hashes_computed,
            running: self.state.running,
        }
    }

    fn fail<F: FnMut(SearchEvent)>(&mut self, error: EncodingError, emit: &mut F) {
        warn!("search failed at nonce {}: {}", self.state.nonce, error);
        self.state.running = false;
        emit(SearchEvent::Error {
            message: error.to_string(),
        });
    }
}

/// Recompute the digest for `nonce` and check it against `difficulty`.
///
/// Mirrors the contract's `verifySolution(miner, nonce)` view.
pub fn verify_solution(
    descriptor: &ChallengeDescriptor,
    scheme: HashScheme,
    nonce: u64,
    difficulty: usize,
) -> std::result::Result<(bool, Digest), EncodingError> {
    let digest = challenge_digest(descriptor, scheme, nonce)?;
    Ok((meets_difficulty(&digest, difficulty), digest))
}
