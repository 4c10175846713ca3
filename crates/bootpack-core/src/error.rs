use thiserror::Error;

pub type BootpackResult<T> = Result<T, BootpackError>;

#[derive(Debug, Error)]
pub enum BootpackError {
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid {what}: expected {expected} bytes, got {actual}")]
    InvalidKeyMaterial {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("malformed hex: {0}")]
    MalformedHex(String),

    #[error("reading input: {0}")]
    InputRead(#[source] std::io::Error),

    #[error("writing output: {0}")]
    OutputWrite(#[source] std::io::Error),

    #[error("invalid container header: {have} bytes available, {need} required")]
    InvalidHeader { have: usize, need: usize },

    #[error("truncated container: expected {expected} ciphertext bytes, {available} available")]
    TruncatedContainer { expected: usize, available: usize },

    #[error("image too large: {bytes} bytes does not fit a 32-bit page count")]
    ImageTooLarge { bytes: usize },

    #[error("key file {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl BootpackError {
    /// True for failures caused by the supplied key rather than by the data.
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            BootpackError::InvalidKeyLength { .. } | BootpackError::InvalidKeyMaterial { .. }
        )
    }
}
