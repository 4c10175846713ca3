//! bootpack-core: shared types, configuration, errors and identifier encoding
//!
//! # Overview
//! - `error`: the `BootpackError` taxonomy shared by every crate
//! - `config`: `bootpack.toml` schema
//! - `types`: image parameters, key provenance and format constants
//! - `encoding`: hex conversions for keys and numeric identifiers
//! - `history`: recently used file paths, persisted as JSON

pub mod config;
pub mod encoding;
pub mod error;
pub mod history;
pub mod types;

pub use error::{BootpackError, BootpackResult};
pub use types::{ImageParams, KeySource, IV_LEN, KEY_LEN, PAGE_SIZE, PROTOCOL_VERSION};
