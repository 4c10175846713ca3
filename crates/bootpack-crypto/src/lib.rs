//! bootpack-crypto: the cryptographic capabilities behind the image container
//!
//! - `cipher`: AES-128-CTR encryption and CSPRNG byte generation
//! - `checksum`: CRC32/IEEE over the padded plaintext
//! - `keys`: 16-byte image keys, raw key files and hex key text
//!
//! ```text
//! padded plaintext ──crc32──▶ header CRC
//!        │
//!        └──AES-128-CTR(key, iv = random 16 bytes)──▶ ciphertext (same length)
//! ```

pub mod checksum;
pub mod cipher;
pub mod keys;

pub use checksum::crc32;
pub use cipher::{decrypt, encrypt, random_bytes, random_iv};
pub use keys::{generate_key, read_key_file, write_key_file, ImageKey, ResolvedKey};

pub use bootpack_core::{IV_LEN, KEY_LEN};
