//! CRC32 (IEEE 802.3 polynomial), the integrity field of the container header.

/// CRC32/IEEE of `data`.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(crc32(b""), 0);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b"The quick brown fox jumps over the lazy dog"), 0x414F_A339);
    }

    #[test]
    fn test_single_bit_flip_changes_crc() {
        let data = vec![0u8; 2048];
        let mut flipped = data.clone();
        flipped[1500] ^= 0x01;
        assert_ne!(crc32(&data), crc32(&flipped));
    }

    #[test]
    fn test_padding_affects_crc() {
        // Trailing zeros are significant, so both sides must pad identically.
        assert_ne!(crc32(&[1, 2, 3]), crc32(&[1, 2, 3, 0]));
    }
}
