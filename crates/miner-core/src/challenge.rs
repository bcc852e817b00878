//! Challenge descriptors and the inbound `StartSearch` command.

use serde::Deserialize;

use crate::encoding::{parse_address, parse_uint256, u64_to_word, EncodingError, ADDRESS_LEN, WORD_LEN};

/// The fixed on-chain fields hashed together with every nonce.
///
/// Integers are stored as big-endian `uint256` words so any value the
/// contract can hold round-trips without loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeDescriptor {
    /// `currentChallengeID` of the contract.
    pub challenge_id: [u8; WORD_LEN],
    /// The address that will submit the solution (`msg.sender`).
    pub claimant_address: [u8; ADDRESS_LEN],
    /// `lastBlockTimestamp` of the contract.
    pub reference_timestamp: [u8; WORD_LEN],
    /// `block.chainid` of the target network.
    pub chain_id: [u8; WORD_LEN],
}

impl ChallengeDescriptor {
    /// Build a descriptor from native integers.
    pub fn new(
        challenge_id: u64,
        claimant_address: [u8; ADDRESS_LEN],
        reference_timestamp: u64,
        chain_id: u64,
    ) -> Self {
        ChallengeDescriptor {
            challenge_id: u64_to_word(challenge_id),
            claimant_address,
            reference_timestamp: u64_to_word(reference_timestamp),
            chain_id: u64_to_word(chain_id),
        }
    }
}

/// An integer as the host sends it: a JS number or a decimal/hex string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UintValue {
    Number(u64),
    Float(f64),
    Text(String),
}

impl UintValue {
    /// Parse into a big-endian `uint256` word.
    pub fn to_word(&self) -> Result<[u8; WORD_LEN], EncodingError> {
        match self {
            UintValue::Number(n) => Ok(u64_to_word(*n)),
            UintValue::Float(f) => float_to_u64(*f).map(u64_to_word),
            UintValue::Text(s) => parse_uint256(s),
        }
    }

    /// Parse into a `u64`, for nonces.
    pub fn to_u64(&self) -> Result<u64, EncodingError> {
        let word = self.to_word()?;
        let (high, low) = word.split_at(WORD_LEN - 8);
        if high.iter().any(|b| *b != 0) {
            return Err(EncodingError::IntegerOverflow { bits: 64 });
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(low);
        Ok(u64::from_be_bytes(bytes))
    }

    /// Parse into a `usize`, for small values such as a difficulty.
    pub fn to_usize(&self) -> Result<usize, EncodingError> {
        usize::try_from(self.to_u64()?)
            .map_err(|_| EncodingError::IntegerOverflow { bits: usize::BITS as u16 })
    }
}

fn float_to_u64(f: f64) -> Result<u64, EncodingError> {
    // JS numbers are only exact up to 2^53
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if f.fract() != 0.0 || !(0.0..=MAX_SAFE_INTEGER).contains(&f) {
        return Err(EncodingError::InvalidDecimal(format!("{}", f)));
    }
    Ok(f as u64)
}

/// Host request to begin a search.
///
/// Field names follow the host's JS conventions; the names the browser
/// front end historically posted (`challengeID`, `address`,
/// `lastBlockTimestamp`) are accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSearch {
    #[serde(alias = "challengeID")]
    pub challenge_id: UintValue,
    #[serde(alias = "address")]
    pub claimant_address: String,
    #[serde(alias = "lastBlockTimestamp")]
    pub reference_timestamp: UintValue,
    pub chain_id: UintValue,
    pub difficulty: UintValue,
}

impl StartSearch {
    /// Validate every field and split into descriptor and difficulty.
    pub fn parse(&self) -> Result<(ChallengeDescriptor, usize), EncodingError> {
        let descriptor = ChallengeDescriptor {
            challenge_id: self.challenge_id.to_word()?,
            claimant_address: parse_address(&self.claimant_address)?,
            reference_timestamp: self.reference_timestamp.to_word()?,
            chain_id: self.chain_id.to_word()?,
        };
        Ok((descriptor, self.difficulty.to_usize()?))
    }
}
