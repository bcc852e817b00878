//! Packed (`abi.encodePacked`) field encoding.
//!
//! Every field is written at its fixed width with no separators and no
//! length prefixes:
//! - `uintN` - big-endian, left-padded with zeros to N/8 bytes
//! - `address` - big-endian, left-padded with zeros to 20 bytes
//! - `bytes` - copied as-is

use thiserror::Error;

/// Width of an encoded address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Width of an encoded `uint256` in bytes.
pub const WORD_LEN: usize = 32;

/// Field encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Integer needs more bytes than its declared width
    #[error("integer does not fit in uint{bits}")]
    IntegerOverflow { bits: u16 },
    /// Declared integer width is not a whole number of bytes in 8..=256
    #[error("invalid integer width: {0} bits")]
    InvalidWidth(u16),
    /// Address wider than 20 bytes
    #[error("address is {0} bytes wide, expected at most 20")]
    AddressTooWide(usize),
    /// Malformed hex string
    #[error("invalid hex value: {0}")]
    InvalidHex(String),
    /// Malformed decimal string
    #[error("invalid decimal value: {0}")]
    InvalidDecimal(String),
}

/// A single field in a packed encoding.
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    /// Unsigned integer of `bits` width given as big-endian magnitude bytes.
    Uint { bits: u16, value: &'a [u8] },
    /// 20-byte address given as big-endian bytes.
    Address(&'a [u8]),
    /// Raw bytes, no padding.
    Bytes(&'a [u8]),
}

impl<'a> Field<'a> {
    /// A `uint256` field.
    pub fn uint256(value: &'a [u8]) -> Self {
        Field::Uint { bits: 256, value }
    }

    /// Number of bytes this field occupies once encoded.
    pub fn encoded_len(&self) -> usize {
        match self {
            Field::Uint { bits, .. } => (*bits / 8) as usize,
            Field::Address(_) => ADDRESS_LEN,
            Field::Bytes(b) => b.len(),
        }
    }

    /// Append the packed encoding of this field to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodingError> {
        match *self {
            Field::Uint { bits, value } => {
                if bits == 0 || bits > 256 || bits % 8 != 0 {
                    return Err(EncodingError::InvalidWidth(bits));
                }
                let width = (bits / 8) as usize;
                let significant = strip_leading_zeros(value);
                if significant.len() > width {
                    return Err(EncodingError::IntegerOverflow { bits });
                }
                out.resize(out.len() + width - significant.len(), 0);
                out.extend_from_slice(significant);
            }
            Field::Address(value) => {
                if value.len() > ADDRESS_LEN {
                    return Err(EncodingError::AddressTooWide(value.len()));
                }
                out.resize(out.len() + ADDRESS_LEN - value.len(), 0);
                out.extend_from_slice(value);
            }
            Field::Bytes(value) => out.extend_from_slice(value),
        }
        Ok(())
    }
}

/// Encode fields back to back.
pub fn encode_packed(fields: &[Field<'_>]) -> Result<Vec<u8>, EncodingError> {
    let mut out = Vec::with_capacity(fields.iter().map(Field::encoded_len).sum());
    for field in fields {
        field.encode_into(&mut out)?;
    }
    Ok(out)
}

fn strip_leading_zeros(value: &[u8]) -> &[u8] {
    let first = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    &value[first..]
}

/// Parse an unsigned integer into a big-endian 32-byte word.
///
/// Accepts decimal (`"1000"`) or `0x`-prefixed hex (`"0x3e8"`).
pub fn parse_uint256(input: &str) -> Result<[u8; WORD_LEN], EncodingError> {
    let trimmed = input.trim();
    if let Some(digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        let bytes = decode_hex_digits(digits)?;
        let significant = strip_leading_zeros(&bytes);
        if significant.len() > WORD_LEN {
            return Err(EncodingError::IntegerOverflow { bits: 256 });
        }
        let mut word = [0u8; WORD_LEN];
        word[WORD_LEN - significant.len()..].copy_from_slice(significant);
        return Ok(word);
    }
    parse_decimal_word(trimmed)
}

/// Big-endian 32-byte word of a `u64`.
pub fn u64_to_word(value: u64) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[WORD_LEN - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Parse a `0x`-prefixed hex address, left-padding short values to 20 bytes.
pub fn parse_address(input: &str) -> Result<[u8; ADDRESS_LEN], EncodingError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = decode_hex_digits(digits)?;
    if bytes.len() > ADDRESS_LEN {
        return Err(EncodingError::AddressTooWide(bytes.len()));
    }
    let mut address = [0u8; ADDRESS_LEN];
    address[ADDRESS_LEN - bytes.len()..].copy_from_slice(&bytes);
    Ok(address)
}

fn decode_hex_digits(digits: &str) -> Result<Vec<u8>, EncodingError> {
    if digits.is_empty() {
        return Err(EncodingError::InvalidHex(digits.to_string()));
    }
    // Odd-length quantities like "0x3e8" are valid; pad the high nibble.
    let padded;
    let even = if digits.len() % 2 == 1 {
        padded = format!("0{}", digits);
        padded.as_str()
    } else {
        digits
    };
    hex::decode(even).map_err(|_| EncodingError::InvalidHex(digits.to_string()))
}

/// Decimal string to big-endian word, schoolbook multiply-add over the bytes.
fn parse_decimal_word(digits: &str) -> Result<[u8; WORD_LEN], EncodingError> {
    if digits.is_empty() {
        return Err(EncodingError::InvalidDecimal(digits.to_string()));
    }

    let mut word = [0u8; WORD_LEN];
    for c in digits.chars() {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| EncodingError::InvalidDecimal(digits.to_string()))?;

        let mut carry = digit;
        for byte in word.iter_mut().rev() {
            let acc = (*byte as u32) * 10 + carry;
            *byte = (acc & 0xFF) as u8;
            carry = acc >> 8;
        }
        if carry != 0 {
            return Err(EncodingError::IntegerOverflow { bits: 256 });
        }
    }
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint256_left_padded() {
        let encoded = encode_packed(&[Field::uint256(&[0x03, 0xe8])]).unwrap();
        assert_eq!(encoded.len(), 32);
        assert!(encoded[..30].iter().all(|b| *b == 0));
        assert_eq!(&encoded[30..], &[0x03, 0xe8]);
    }

    #[test]
    fn test_packed_has_no_separators() {
        let address = [0x11u8; 20];
        let encoded = encode_packed(&[
            Field::uint256(&[1]),
            Field::Address(&address),
            Field::Bytes(b"ab"),
            Field::Uint { bits: 8, value: &[7] },
        ])
        .unwrap();

        assert_eq!(encoded.len(), 32 + 20 + 2 + 1);
        assert_eq!(encoded[31], 1);
        assert_eq!(&encoded[32..52], &address);
        assert_eq!(&encoded[52..54], b"ab");
        assert_eq!(encoded[54], 7);
    }

    #[test]
    fn test_short_address_is_padded() {
        let encoded = encode_packed(&[Field::Address(&[0x01])]).unwrap();
        assert_eq!(encoded.len(), 20);
        assert_eq!(encoded[19], 0x01);
        assert!(encoded[..19].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_wide_address_rejected() {
        let wide = [0xAAu8; 21];
        assert_eq!(
            encode_packed(&[Field::Address(&wide)]),
            Err(EncodingError::AddressTooWide(21))
        );
        assert_eq!(
            parse_address("0x0102030405060708090a0b0c0d0e0f101112131415"),
            Err(EncodingError::AddressTooWide(21))
        );
    }

    #[test]
    fn test_integer_overflow_rejected() {
        let big = [0xFFu8; 33];
        assert_eq!(
            encode_packed(&[Field::uint256(&big)]),
            Err(EncodingError::IntegerOverflow { bits: 256 })
        );
        assert_eq!(
            encode_packed(&[Field::Uint { bits: 8, value: &[1, 0] }]),
            Err(EncodingError::IntegerOverflow { bits: 8 })
        );

        // Leading zero bytes do not count against the width
        let mut padded = [0u8; 40];
        padded[39] = 5;
        assert!(encode_packed(&[Field::uint256(&padded)]).is_ok());
    }

    #[test]
    fn test_invalid_width_rejected() {
        assert_eq!(
            encode_packed(&[Field::Uint { bits: 12, value: &[1] }]),
            Err(EncodingError::InvalidWidth(12))
        );
        assert_eq!(
            encode_packed(&[Field::Uint { bits: 264, value: &[1] }]),
            Err(EncodingError::InvalidWidth(264))
        );
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_uint256("1000").unwrap(), u64_to_word(1000));
        assert_eq!(parse_uint256("0").unwrap(), [0u8; 32]);
        assert_eq!(
            parse_uint256("18446744073709551616").unwrap()[23],
            0x01,
            "2^64 sets the ninth byte from the right"
        );

        // 2^256 - 1 fits, 2^256 does not
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(parse_uint256(max).unwrap(), [0xFF; 32]);
        let over = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert_eq!(
            parse_uint256(over),
            Err(EncodingError::IntegerOverflow { bits: 256 })
        );

        assert!(matches!(parse_uint256("12a"), Err(EncodingError::InvalidDecimal(_))));
        assert!(matches!(parse_uint256(""), Err(EncodingError::InvalidDecimal(_))));
    }

    #[test]
    fn test_parse_hex_uint() {
        assert_eq!(parse_uint256("0x3e8").unwrap(), u64_to_word(1000));
        assert_eq!(parse_uint256("0x61").unwrap(), u64_to_word(97));
        assert!(matches!(parse_uint256("0xzz"), Err(EncodingError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_address() {
        let address = parse_address("0x604799aDB2d80B75FE1F9C1FC817D866f883dD0c").unwrap();
        assert_eq!(address[0], 0x60);
        assert_eq!(address[19], 0x0c);

        let one = parse_address("0x01").unwrap();
        assert_eq!(one[19], 1);
        assert!(one[..19].iter().all(|b| *b == 0));
    }
}
