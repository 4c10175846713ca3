//! Hex conversions used at the edges of the codec.
//!
//! Keys travel as hex text, product IDs and app versions as hex numbers.

use crate::error::{BootpackError, BootpackResult};

/// Decode a hex string (either case, even length) into raw bytes.
///
/// The error names only the length and the offending position: the input may be key material.
pub fn bytes_from_hex(text: &str) -> BootpackResult<Vec<u8>> {
    hex::decode(text).map_err(|e| {
        let detail = match e {
            hex::FromHexError::InvalidHexCharacter { index, .. } => {
                format!("invalid character at position {index}")
            }
            hex::FromHexError::OddLength => "odd number of digits".to_string(),
            hex::FromHexError::InvalidStringLength => "wrong number of digits".to_string(),
        };
        BootpackError::MalformedHex(format!("{detail} ({} characters)", text.len()))
    })
}

/// Render bytes as lower-case hex.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Parse a `u32` written in hex, with an optional `0x` prefix.
pub fn parse_hex_u32(text: &str) -> BootpackResult<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    if digits.is_empty() {
        return Err(BootpackError::MalformedHex(format!(
            "'{text}': no hex digits"
        )));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(BootpackError::MalformedHex(format!(
            "'{text}': not a hex number"
        )));
    }

    u32::from_str_radix(digits, 16)
        .map_err(|_| BootpackError::MalformedHex(format!("'{text}': does not fit in 32 bits")))
}

/// Parse optional identifier text, treating absent or blank input as 0.
pub fn parse_hex_u32_or_default(text: Option<&str>) -> BootpackResult<u32> {
    match text.map(str::trim) {
        None | Some("") => Ok(0),
        Some(t) => parse_hex_u32(t),
    }
}

/// Render a `u32` as lower-case hex without prefix.
pub fn format_hex_u32(value: u32) -> String {
    format!("{value:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_mixed_case() {
        assert_eq!(bytes_from_hex("DEADbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(bytes_from_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_rejects_odd_length() {
        let err = bytes_from_hex("abc").unwrap_err();
        assert!(matches!(err, BootpackError::MalformedHex(_)));
    }

    #[test]
    fn test_decode_rejects_non_hex() {
        let err = bytes_from_hex("zz00").unwrap_err();
        assert!(matches!(err, BootpackError::MalformedHex(_)));
    }

    #[test]
    fn test_decode_error_does_not_echo_input() {
        let err = bytes_from_hex("2b7e151628aed2a6abf7158809cf4f3Z").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("position 31"), "{text}");
        assert!(text.contains("32 characters"), "{text}");
        assert!(!text.contains("2b7e1516"), "{text}");
        assert!(!text.contains('Z'), "{text}");

        let text = bytes_from_hex("abcdef012").unwrap_err().to_string();
        assert!(text.contains("odd number of digits"), "{text}");
        assert!(!text.contains("abcdef"), "{text}");
    }

    #[test]
    fn test_parse_u32() {
        assert_eq!(parse_hex_u32("1a2b").unwrap(), 0x1a2b);
        assert_eq!(parse_hex_u32("0xFFFFFFFF").unwrap(), u32::MAX);
        assert_eq!(parse_hex_u32("0X10").unwrap(), 16);
    }

    #[test]
    fn test_parse_u32_rejects_bad_input() {
        for bad in ["", "0x", "12g4", "-1", "+1", "100000000", " 12"] {
            assert!(
                matches!(parse_hex_u32(bad), Err(BootpackError::MalformedHex(_))),
                "'{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_u32_default() {
        assert_eq!(parse_hex_u32_or_default(None).unwrap(), 0);
        assert_eq!(parse_hex_u32_or_default(Some("  ")).unwrap(), 0);
        assert_eq!(parse_hex_u32_or_default(Some(" ff ")).unwrap(), 255);
    }

    #[test]
    fn test_format_u32() {
        assert_eq!(format_hex_u32(0xabc), "abc");
        assert_eq!(format_hex_u32(0), "0");
    }

    proptest! {
        #[test]
        fn hex_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..=512)) {
            let text = bytes_to_hex(&data);
            prop_assert_eq!(text.len(), data.len() * 2);
            prop_assert_eq!(bytes_from_hex(&text).unwrap(), data.clone());
            prop_assert_eq!(bytes_from_hex(&text.to_uppercase()).unwrap(), data);
        }

        #[test]
        fn u32_roundtrip(value in any::<u32>()) {
            prop_assert_eq!(parse_hex_u32(&format_hex_u32(value)).unwrap(), value);
        }

        #[test]
        fn odd_length_always_rejected(data in proptest::collection::vec(any::<u8>(), 0..=64)) {
            let mut text = bytes_to_hex(&data);
            text.push('a');
            prop_assert!(bytes_from_hex(&text).is_err());
        }
    }
}
