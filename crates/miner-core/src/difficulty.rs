//! Leading-zero-byte difficulty checks.
//!
//! A digest meets difficulty `d` when its first `d` bytes are all zero,
//! the same loop the contract runs:
//! `for (i = 0; i < difficulty; i++) if (uint8(hash[i]) != 0) return false;`

use crate::hash::{Digest, DIGEST_LEN};

/// Check if a digest meets the difficulty.
///
/// A difficulty larger than the digest can never be met.
#[inline]
pub fn meets_difficulty(digest: &Digest, difficulty: usize) -> bool {
    match digest.get(..difficulty) {
        Some(prefix) => prefix.iter().all(|b| *b == 0),
        None => false,
    }
}

/// Count leading zero bytes (the highest difficulty this digest meets).
pub fn leading_zero_bytes(digest: &Digest) -> usize {
    digest.iter().take_while(|b| **b == 0).count()
}

/// Whether a difficulty can be met by any digest at all.
pub fn is_attainable(difficulty: usize) -> bool {
    difficulty <= DIGEST_LEN
}

/// Average number of hashes needed to meet a difficulty (256^d).
pub fn expected_hashes(difficulty: usize) -> f64 {
    256f64.powi(difficulty.min(i32::MAX as usize) as i32)
}

/// Format a hash count for display (e.g., "4.29G").
pub fn format_hashes(hashes: f64) -> String {
    if hashes >= 1e15 {
        format!("{:.2}P", hashes / 1e15)
    } else if hashes >= 1e12 {
        format!("{:.2}T", hashes / 1e12)
    } else if hashes >= 1e9 {
        format!("{:.2}G", hashes / 1e9)
    } else if hashes >= 1e6 {
        format!("{:.2}M", hashes / 1e6)
    } else if hashes >= 1e3 {
        format!("{:.2}K", hashes / 1e3)
    } else {
        format!("{:.0}", hashes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meets_difficulty() {
        let mut digest = [0xFFu8; 32];
        digest[0] = 0x00;
        digest[1] = 0x00;

        assert!(meets_difficulty(&digest, 1));
        assert!(meets_difficulty(&digest, 2));
        assert!(!meets_difficulty(&digest, 3));
    }

    #[test]
    fn test_difficulty_zero_always_met() {
        assert!(meets_difficulty(&[0xFF; 32], 0));
        assert!(meets_difficulty(&[0x00; 32], 0));
    }

    #[test]
    fn test_full_width_only_for_zero_digest() {
        assert!(meets_difficulty(&[0x00; 32], 32));

        let mut almost = [0x00; 32];
        almost[31] = 0x01;
        assert!(!meets_difficulty(&almost, 32));
    }

    #[test]
    fn test_unattainable_difficulty() {
        assert!(!meets_difficulty(&[0x00; 32], 33));
        assert!(!meets_difficulty(&[0x00; 32], usize::MAX));
        assert!(is_attainable(32));
        assert!(!is_attainable(33));
    }

    #[test]
    fn test_monotonicity() {
        let digests = [
            [0x00; 32],
            {
                let mut d = [0x00; 32];
                d[3] = 0x10;
                d
            },
            {
                let mut d = [0x7F; 32];
                d[0] = 0x00;
                d
            },
            [0x01; 32],
        ];

        for digest in &digests {
            for d in 0..=33 {
                if meets_difficulty(digest, d) {
                    for lower in 0..d {
                        assert!(meets_difficulty(digest, lower), "d={} lower={}", d, lower);
                    }
                }
            }
        }
    }

    #[test]
    fn test_leading_zero_bytes() {
        assert_eq!(leading_zero_bytes(&[0x00; 32]), 32);
        assert_eq!(leading_zero_bytes(&[0x01; 32]), 0);

        let mut digest = [0xFF; 32];
        digest[0] = 0;
        digest[1] = 0;
        digest[2] = 0x0F;
        assert_eq!(leading_zero_bytes(&digest), 2);
        assert!(meets_difficulty(&digest, leading_zero_bytes(&digest)));
    }

    #[test]
    fn test_expected_hashes() {
        assert_eq!(expected_hashes(0), 1.0);
        assert_eq!(expected_hashes(1), 256.0);
        assert_eq!(expected_hashes(4), 4_294_967_296.0);
        assert_eq!(format_hashes(expected_hashes(4)), "4.29G");
        assert_eq!(format_hashes(256.0), "256");
    }
}
