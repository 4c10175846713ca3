//! Path-based create/recover.
//!
//! Output goes to a uniquely named temp file next to `dest` and is renamed
//! over `dest` only after the codec succeeded and the data was synced. Each
//! run gets its own temp file, so concurrent writers to the same destination
//! never share a partially written inode. The temp file is removed on failure.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use bootpack_core::{BootpackError, BootpackResult, ImageParams};
use bootpack_crypto::ImageKey;

use crate::codec::{create, recover, CreateReport, RecoverReport};

/// Build a container from the image at `input_path` and write it to `output_path`.
///
/// The key length is validated before either file is opened.
pub fn create_file(
    params: &ImageParams,
    key: &[u8],
    input_path: &Path,
    output_path: &Path,
) -> BootpackResult<CreateReport> {
    let key = ImageKey::from_slice(key)?;
    let mut input = BufReader::new(File::open(input_path).map_err(BootpackError::InputRead)?);

    write_atomically(output_path, |out| {
        create(params, key.as_bytes(), &mut input, out)
    })
}

/// Recover the plaintext of the container at `input_path` into `output_path`.
///
/// The output is written even when the CRC does not match.
pub fn recover_file(
    key: &[u8],
    input_path: &Path,
    output_path: &Path,
) -> BootpackResult<RecoverReport> {
    let key = ImageKey::from_slice(key)?;
    let mut input = BufReader::new(File::open(input_path).map_err(BootpackError::InputRead)?);

    write_atomically(output_path, |out| recover(key.as_bytes(), &mut input, out))
}

fn write_atomically<T>(
    dest: &Path,
    write: impl FnOnce(&mut BufWriter<NamedTempFile>) -> BootpackResult<T>,
) -> BootpackResult<T> {
    let mut writer = BufWriter::new(temp_file_for(dest)?);
    let value = write(&mut writer)?;

    let tmp = writer
        .into_inner()
        .map_err(|e| BootpackError::OutputWrite(e.into_error()))?;
    tmp.as_file().sync_all().map_err(BootpackError::OutputWrite)?;
    tmp.persist(dest)
        .map_err(|e| BootpackError::OutputWrite(e.error))?;
    Ok(value)
}

/// Create `.<name>.XXXXXX.tmp` in the destination's directory.
///
/// Dropping the returned file before it is persisted deletes it.
fn temp_file_for(dest: &Path) -> BootpackResult<NamedTempFile> {
    let name = dest.file_name().ok_or_else(|| {
        BootpackError::OutputWrite(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a file path: {}", dest.display()),
        ))
    })?;
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut prefix = OsString::from(".");
    prefix.push(name);
    prefix.push(".");
    tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(BootpackError::OutputWrite)
}
