//! Fixed 36-byte container header.

use bootpack_core::{BootpackError, BootpackResult, ImageParams, IV_LEN, PAGE_SIZE};

/// Header preceding the ciphertext of every container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub protocol_version: u32,
    pub product_id: u32,
    pub app_version: u32,
    /// Number of `PAGE_SIZE` pages in the padded plaintext
    pub page_count: u32,
    pub iv: [u8; IV_LEN],
    /// CRC32 of the padded plaintext, computed before encryption
    pub plaintext_crc32: u32,
}

impl ContainerHeader {
    pub const LEN: usize = 4 // protocol_version
        + 4                  // product_id
        + 4                  // app_version
        + 4                  // page_count
        + IV_LEN             // iv
        + 4; // plaintext_crc32

    pub fn new(params: &ImageParams, page_count: u32, iv: [u8; IV_LEN], plaintext_crc32: u32) -> Self {
        Self {
            protocol_version: params.protocol_version,
            product_id: params.product_id,
            app_version: params.app_version,
            page_count,
            iv,
            plaintext_crc32,
        }
    }

    /// Ciphertext length implied by `page_count`, or `None` if it overflows `usize`.
    pub fn payload_len(&self) -> Option<usize> {
        (self.page_count as usize).checked_mul(PAGE_SIZE)
    }

    pub fn params(&self) -> ImageParams {
        ImageParams {
            protocol_version: self.protocol_version,
            product_id: self.product_id,
            app_version: self.app_version,
        }
    }

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[0..4].copy_from_slice(&self.protocol_version.to_le_bytes());
        out[4..8].copy_from_slice(&self.product_id.to_le_bytes());
        out[8..12].copy_from_slice(&self.app_version.to_le_bytes());
        out[12..16].copy_from_slice(&self.page_count.to_le_bytes());
        out[16..16 + IV_LEN].copy_from_slice(&self.iv);
        out[16 + IV_LEN..].copy_from_slice(&self.plaintext_crc32.to_le_bytes());
        out
    }

    /// Parse the header from the start of `buf`. Bytes past `LEN` are ignored.
    pub fn decode(buf: &[u8]) -> BootpackResult<Self> {
        if buf.len() < Self::LEN {
            return Err(BootpackError::InvalidHeader {
                have: buf.len(),
                need: Self::LEN,
            });
        }

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&buf[16..16 + IV_LEN]);

        Ok(Self {
            protocol_version: read_u32_le(buf, 0),
            product_id: read_u32_le(buf, 4),
            app_version: read_u32_le(buf, 8),
            page_count: read_u32_le(buf, 12),
            iv,
            plaintext_crc32: read_u32_le(buf, 16 + IV_LEN),
        })
    }
}

fn read_u32_le(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContainerHeader {
        ContainerHeader {
            protocol_version: 1,
            product_id: 0x1122_3344,
            app_version: 0x0002_0001,
            page_count: 2,
            iv: [0xA5; IV_LEN],
            plaintext_crc32: 0xDEAD_BEEF,
        }
    }

    #[test]
    fn test_header_len() {
        assert_eq!(ContainerHeader::LEN, 36);
    }

    #[test]
    fn test_wire_layout() {
        let bytes = sample().encode();
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[0x44, 0x33, 0x22, 0x11]);
        assert_eq!(&bytes[8..12], &[0x01, 0x00, 0x02, 0x00]);
        assert_eq!(&bytes[12..16], &[2, 0, 0, 0]);
        assert_eq!(&bytes[16..32], &[0xA5; 16]);
        assert_eq!(&bytes[32..36], &[0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn test_decode_encoded() {
        let header = sample();
        let mut buf = header.encode().to_vec();
        buf.extend_from_slice(&[0u8; 10]);
        assert_eq!(ContainerHeader::decode(&buf).unwrap(), header);
    }

    #[test]
    fn test_decode_short_buffer() {
        let bytes = sample().encode();
        let err = ContainerHeader::decode(&bytes[..35]).unwrap_err();
        assert!(matches!(err, BootpackError::InvalidHeader { have: 35, need: 36 }));
        let err = ContainerHeader::decode(&[]).unwrap_err();
        assert!(matches!(err, BootpackError::InvalidHeader { have: 0, need: 36 }));
    }

    #[test]
    fn test_payload_len() {
        assert_eq!(sample().payload_len(), Some(2048));
        let empty = ContainerHeader { page_count: 0, ..sample() };
        assert_eq!(empty.payload_len(), Some(0));
    }
}
