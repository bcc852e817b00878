//! Keccak-256 hashing of challenge fields and nonces.
//!
//! This is the original Keccak padding used by the EVM `keccak256` opcode,
//! not NIST SHA3-256.

use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher as _, Keccak};

use crate::challenge::ChallengeDescriptor;
use crate::encoding::{encode_packed, u64_to_word, EncodingError, Field};

/// Length of every digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// A Keccak-256 digest.
pub type Digest = [u8; DIGEST_LEN];

/// Keccak-256 of raw bytes.
#[inline]
pub fn keccak256(data: &[u8]) -> Digest {
    let mut keccak = Keccak::v256();
    keccak.update(data);
    let mut out = [0u8; DIGEST_LEN];
    keccak.finalize(&mut out);
    out
}

/// Keccak-256 of the packed encoding of `fields`.
///
/// Equivalent to `keccak256(abi.encodePacked(...))` in Solidity.
pub fn keccak256_packed(fields: &[Field<'_>]) -> Result<Digest, EncodingError> {
    Ok(keccak256(&encode_packed(fields)?))
}

/// How challenge fields and the nonce are combined into a digest.
///
/// The two schemes produce different digests for the same inputs; pick the
/// one the verifying contract uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashScheme {
    /// `keccak256(abi.encodePacked(challengeId, claimant, timestamp, chainId, nonce))`
    Packed,
    /// `keccak256(abi.encodePacked(keccak256(abi.encodePacked(challengeId, claimant, timestamp, chainId)), nonce))`
    TwoStage,
}

impl HashScheme {
    /// Parse a scheme name as used in host configuration.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "packed" | "single-pass" => Some(HashScheme::Packed),
            "two-stage" | "twostage" => Some(HashScheme::TwoStage),
            _ => None,
        }
    }

    /// Get the configuration name for this scheme.
    pub fn name(&self) -> &'static str {
        match self {
            HashScheme::Packed => "packed",
            HashScheme::TwoStage => "two-stage",
        }
    }
}

/// Produces the digest probed for a nonce.
///
/// A hasher is bound to one challenge; the search loop only varies the nonce.
pub trait Hasher {
    fn hash_nonce(&self, nonce: u64) -> Result<Digest, EncodingError>;
}

/// Contract-compatible hasher for one challenge descriptor.
///
/// The fixed prefix is absorbed once; each probe clones the sponge and
/// absorbs only the 32-byte nonce word.
#[derive(Clone)]
pub struct KeccakHasher {
    prefix: Keccak,
    scheme: HashScheme,
}

impl KeccakHasher {
    pub fn new(descriptor: &ChallengeDescriptor, scheme: HashScheme) -> Result<Self, EncodingError> {
        let fields = challenge_fields(descriptor);
        let mut prefix = Keccak::v256();
        match scheme {
            HashScheme::Packed => prefix.update(&encode_packed(&fields)?),
            HashScheme::TwoStage => prefix.update(&keccak256_packed(&fields)?),
        }
        Ok(KeccakHasher { prefix, scheme })
    }

    pub fn scheme(&self) -> HashScheme {
        self.scheme
    }
}

impl Hasher for KeccakHasher {
    #[inline]
    fn hash_nonce(&self, nonce: u64) -> Result<Digest, EncodingError> {
        let mut keccak = self.prefix.clone();
        keccak.update(&u64_to_word(nonce));
        let mut out = [0u8; DIGEST_LEN];
        keccak.finalize(&mut out);
        Ok(out)
    }
}

fn challenge_fields(descriptor: &ChallengeDescriptor) -> [Field<'_>; 4] {
    [
        Field::uint256(&descriptor.challenge_id),
        Field::Address(&descriptor.claimant_address),
        Field::uint256(&descriptor.reference_timestamp),
        Field::uint256(&descriptor.chain_id),
    ]
}

/// Digest of `(descriptor, nonce)` under `scheme`, computed from scratch.
pub fn challenge_digest(
    descriptor: &ChallengeDescriptor,
    scheme: HashScheme,
    nonce: u64,
) -> Result<Digest, EncodingError> {
    let nonce_word = u64_to_word(nonce);
    let [id, claimant, timestamp, chain] = challenge_fields(descriptor);
    match scheme {
        HashScheme::Packed => {
            keccak256_packed(&[id, claimant, timestamp, chain, Field::uint256(&nonce_word)])
        }
        HashScheme::TwoStage => {
            let intermediate = keccak256_packed(&[id, claimant, timestamp, chain])?;
            keccak256_packed(&[Field::Bytes(&intermediate), Field::uint256(&nonce_word)])
        }
    }
}

/// `0x`-prefixed lowercase hex, the format ethers.js uses for `bytes32`.
pub fn digest_to_hex(digest: &Digest) -> String {
    format!("0x{}", hex::encode(digest))
}
