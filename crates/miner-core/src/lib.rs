//! Proof-of-work nonce search for on-chain Keccak challenges.
//!
//! This crate provides pure Rust implementations of:
//! - Solidity `abi.encodePacked` field encoding
//! - Keccak-256 challenge hashing (single-pass and two-stage schemes)
//! - Leading-zero-byte difficulty checks
//! - A cooperative, cancellable search loop
//! - A threaded worker that drives the loop behind a command/event channel

pub mod challenge;
pub mod config;
pub mod difficulty;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod search;
#[cfg(feature = "thread-worker")]
pub mod worker;

pub use challenge::{ChallengeDescriptor, StartSearch};
pub use config::{SearchConfig, StartNonce};
pub use difficulty::meets_difficulty;
pub use encoding::{encode_packed, EncodingError, Field};
pub use error::{Error, Result};
pub use hash::{keccak256_packed, Digest, HashScheme, Hasher, KeccakHasher};
pub use search::{verify_solution, BatchOutcome, CancelToken, Search, SearchEvent, SearchState};
#[cfg(feature = "thread-worker")]
pub use worker::{Worker, WorkerEvent};
