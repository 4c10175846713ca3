//! Image keys: generation, raw key files and hex text
//!
//! A key file is exactly the 16 raw key bytes, no header. Every way of
//! obtaining a key enforces `KEY_LEN`.

use std::path::Path;

use zeroize::Zeroize;

use bootpack_core::encoding::{bytes_from_hex, bytes_to_hex};
use bootpack_core::{BootpackError, BootpackResult, KeySource, KEY_LEN};

use crate::cipher::random_bytes;

/// A 128-bit image encryption key. Zeroized on drop.
#[derive(Clone)]
pub struct ImageKey {
    bytes: [u8; KEY_LEN],
}

impl ImageKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Copy a key out of a slice, failing with `InvalidKeyLength` unless it is exactly 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> BootpackResult<Self> {
        let bytes: [u8; KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| BootpackError::InvalidKeyLength {
                    expected: KEY_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self { bytes })
    }

    /// Decode hex key text (32 hex digits).
    pub fn from_hex(text: &str) -> BootpackResult<Self> {
        let mut raw = bytes_from_hex(text)?;
        let key = Self::from_slice(&raw);
        raw.zeroize();
        key
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.bytes)
    }
}

impl Drop for ImageKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A key together with where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedKey {
    pub key: ImageKey,
    pub source: KeySource,
}

/// Generate a random 128-bit image key.
pub fn generate_key() -> ImageKey {
    let mut raw = random_bytes(KEY_LEN);
    let mut bytes = [0u8; KEY_LEN];
    bytes.copy_from_slice(&raw);
    raw.zeroize();
    ImageKey::from_bytes(bytes)
}

/// Read a raw key file. The file must hold exactly `KEY_LEN` bytes.
pub fn read_key_file(path: &Path) -> BootpackResult<ImageKey> {
    let mut raw = std::fs::read(path).map_err(|source| BootpackError::KeyFile {
        path: path.display().to_string(),
        source,
    })?;
    let key = ImageKey::from_slice(&raw);
    raw.zeroize();
    if key.is_ok() {
        tracing::debug!(path = %path.display(), "loaded key file");
    }
    key
}

/// Write `key` as a raw key file, truncating any existing file.
pub fn write_key_file(path: &Path, key: &ImageKey) -> BootpackResult<()> {
    std::fs::write(path, key.as_bytes()).map_err(|source| BootpackError::KeyFile {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "wrote key file");
    Ok(())
}
