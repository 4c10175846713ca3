//! Create and recover firmware containers
//!
//! Create: read image → pad to pages → CRC32 → AES-128-CTR with a random IV →
//! header + ciphertext.
//!
//! Recover: parse header → take `page_count * PAGE_SIZE` ciphertext bytes →
//! decrypt → CRC32 compare. The plaintext is returned (and written) even when
//! the CRC disagrees; the mismatch is reported through `integrity_ok`.
//!
//! Every validation error is raised before the first byte is written.

use std::io::{Read, Write};

use serde::Serialize;
use tracing::{debug, info, warn};

use bootpack_core::encoding::bytes_to_hex;
use bootpack_core::{BootpackError, BootpackResult, ImageParams, IV_LEN, PAGE_SIZE, PROTOCOL_VERSION};
use bootpack_crypto::{crc32, decrypt, encrypt, random_iv, ImageKey};

use crate::header::ContainerHeader;
use crate::padding::pad_to_page_boundary;

/// Outcome of [`create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateReport {
    pub header: ContainerHeader,
    /// Length of the input image before padding
    pub plaintext_len: usize,
    /// Ciphertext bytes written after the header
    pub ciphertext_len: usize,
}

/// Outcome of [`recover`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverReport {
    pub header: ContainerHeader,
    pub computed_crc32: u32,
    pub integrity_ok: bool,
    /// Plaintext bytes written to the output
    pub plaintext_len: usize,
}

impl RecoverReport {
    pub fn protocol_version(&self) -> u32 {
        self.header.protocol_version
    }

    pub fn product_id(&self) -> u32 {
        self.header.product_id
    }

    pub fn app_version(&self) -> u32 {
        self.header.app_version
    }
}

/// A decrypted container held in memory.
#[derive(Debug, Clone)]
pub struct RecoveredImage {
    pub header: ContainerHeader,
    /// Padded plaintext, `page_count * PAGE_SIZE` bytes
    pub plaintext: Vec<u8>,
    pub computed_crc32: u32,
    pub integrity_ok: bool,
}

/// Header-only view of a container, no key required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerSummary {
    pub protocol_version: u32,
    pub product_id: u32,
    pub app_version: u32,
    pub page_count: u32,
    pub payload_len: Option<usize>,
    pub iv: String,
    pub plaintext_crc32: u32,
    pub container_len: usize,
    /// True if at least `payload_len` ciphertext bytes follow the header
    pub complete: bool,
    pub trailing_bytes: usize,
}

/// Build a container in memory from a plaintext image and an explicit IV.
///
/// Returns the header and the full container bytes (header followed by ciphertext).
pub fn seal_image(
    params: &ImageParams,
    key: &ImageKey,
    iv: [u8; IV_LEN],
    plaintext: Vec<u8>,
) -> BootpackResult<(ContainerHeader, Vec<u8>)> {
    let original_len = plaintext.len();
    let padded = pad_to_page_boundary(plaintext, PAGE_SIZE);
    let page_count = u32::try_from(padded.len() / PAGE_SIZE)
        .map_err(|_| BootpackError::ImageTooLarge { bytes: original_len })?;

    let plaintext_crc32 = crc32(&padded);
    debug!(
        plaintext_len = original_len,
        padded_len = padded.len(),
        page_count,
        crc32 = plaintext_crc32,
        "image padded"
    );

    let ciphertext = encrypt(&padded, key.as_bytes(), &iv)?;
    let header = ContainerHeader::new(params, page_count, iv, plaintext_crc32);

    let mut container = Vec::with_capacity(ContainerHeader::LEN + ciphertext.len());
    container.extend_from_slice(&header.encode());
    container.extend_from_slice(&ciphertext);
    Ok((header, container))
}

/// Decrypt an in-memory container and check its CRC.
///
/// Bytes after the declared ciphertext are ignored.
pub fn open_image(key: &ImageKey, container: &[u8]) -> BootpackResult<RecoveredImage> {
    let header = ContainerHeader::decode(container)?;
    let available = container.len() - ContainerHeader::LEN;
    let expected = header
        .payload_len()
        .ok_or(BootpackError::TruncatedContainer {
            expected: usize::MAX,
            available,
        })?;

    if available < expected {
        return Err(BootpackError::TruncatedContainer { expected, available });
    }
    if available > expected {
        warn!(
            trailing = available - expected,
            "ignoring bytes after the declared ciphertext"
        );
    }
    if header.protocol_version != PROTOCOL_VERSION {
        warn!(
            protocol_version = header.protocol_version,
            "container uses an unknown protocol version"
        );
    }

    let ciphertext = &container[ContainerHeader::LEN..ContainerHeader::LEN + expected];
    let decrypted = decrypt(ciphertext, key.as_bytes(), &header.iv)?;
    if decrypted.len() != expected {
        return Err(BootpackError::TruncatedContainer {
            expected,
            available: decrypted.len(),
        });
    }

    let plaintext = pad_to_page_boundary(decrypted, PAGE_SIZE);
    let computed_crc32 = crc32(&plaintext);
    let integrity_ok = computed_crc32 == header.plaintext_crc32;

    Ok(RecoveredImage {
        header,
        plaintext,
        computed_crc32,
        integrity_ok,
    })
}

/// Read a whole plaintext image from `input` and write the container to `output`.
///
/// `key` must be exactly `KEY_LEN` bytes; this is checked before `input` is read.
pub fn create<R: Read, W: Write>(
    params: &ImageParams,
    key: &[u8],
    input: &mut R,
    output: &mut W,
) -> BootpackResult<CreateReport> {
    let key = ImageKey::from_slice(key)?;

    let mut plaintext = Vec::new();
    input
        .read_to_end(&mut plaintext)
        .map_err(BootpackError::InputRead)?;
    let plaintext_len = plaintext.len();

    let (header, container) = seal_image(params, &key, random_iv(), plaintext)?;

    output
        .write_all(&container)
        .and_then(|_| output.flush())
        .map_err(BootpackError::OutputWrite)?;

    let ciphertext_len = container.len() - ContainerHeader::LEN;
    info!(
        product_id = header.product_id,
        app_version = header.app_version,
        pages = header.page_count,
        ciphertext_len,
        "container created"
    );

    Ok(CreateReport {
        header,
        plaintext_len,
        ciphertext_len,
    })
}

/// Read a whole container from `input`, decrypt it and write the plaintext to `output`.
///
/// The plaintext is written whether or not the CRC matches.
pub fn recover<R: Read, W: Write>(
    key: &[u8],
    input: &mut R,
    output: &mut W,
) -> BootpackResult<RecoverReport> {
    let key = ImageKey::from_slice(key)?;

    let mut container = Vec::new();
    input
        .read_to_end(&mut container)
        .map_err(BootpackError::InputRead)?;

    let image = open_image(&key, &container)?;

    output
        .write_all(&image.plaintext)
        .and_then(|_| output.flush())
        .map_err(BootpackError::OutputWrite)?;

    if image.integrity_ok {
        info!(
            product_id = image.header.product_id,
            pages = image.header.page_count,
            "container recovered"
        );
    } else {
        warn!(
            stored = image.header.plaintext_crc32,
            computed = image.computed_crc32,
            "CRC mismatch: wrong key or corrupted container"
        );
    }

    Ok(RecoverReport {
        header: image.header,
        computed_crc32: image.computed_crc32,
        integrity_ok: image.integrity_ok,
        plaintext_len: image.plaintext.len(),
    })
}

/// Parse the header of a container without decrypting it.
pub fn inspect<R: Read>(input: &mut R) -> BootpackResult<ContainerSummary> {
    let mut container = Vec::new();
    input
        .read_to_end(&mut container)
        .map_err(BootpackError::InputRead)?;

    let header = ContainerHeader::decode(&container)?;
    let available = container.len() - ContainerHeader::LEN;
    let payload_len = header.payload_len();
    let complete = payload_len.map_or(false, |len| available >= len);
    let trailing_bytes = payload_len.map_or(0, |len| available.saturating_sub(len));

    Ok(ContainerSummary {
        protocol_version: header.protocol_version,
        product_id: header.product_id,
        app_version: header.app_version,
        page_count: header.page_count,
        payload_len,
        iv: bytes_to_hex(&header.iv),
        plaintext_crc32: header.plaintext_crc32,
        container_len: container.len(),
        complete,
        trailing_bytes,
    })
}
