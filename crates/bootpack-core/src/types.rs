use serde::{Deserialize, Serialize};

/// Padding granularity of the plaintext image, in bytes.
pub const PAGE_SIZE: usize = 1024;

/// Length of an image key (AES-128).
pub const KEY_LEN: usize = 16;

/// Length of the per-container initialization vector.
pub const IV_LEN: usize = 16;

/// Container format version written by `create`.
pub const PROTOCOL_VERSION: u32 = 1;

/// Header metadata supplied by the caller when building a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageParams {
    pub protocol_version: u32,
    pub product_id: u32,
    pub app_version: u32,
}

impl ImageParams {
    pub fn new(product_id: u32, app_version: u32) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            product_id,
            app_version,
        }
    }
}

impl Default for ImageParams {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// Where the key used for an operation came from.
///
/// Only informational: the codec consumes key bytes and never the provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeySource {
    /// Freshly generated from the system CSPRNG
    Generated,
    /// Read from an existing raw key file
    LoadedFromFile,
    /// Typed in as hex text
    Entered,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            KeySource::Generated => "generated",
            KeySource::LoadedFromFile => "key file",
            KeySource::Entered => "hex text",
        };
        f.write_str(s)
    }
}
