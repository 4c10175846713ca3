//! AES-128-CTR payload encryption
//!
//! The 16-byte IV is the initial counter block (128-bit big-endian counter).
//! CTR is length preserving: the caller pads the plaintext to whole pages
//! itself, and decryption is the same keystream application as encryption.

use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::RngCore;

use bootpack_core::{BootpackError, BootpackResult, IV_LEN, KEY_LEN};

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

/// Fill a new buffer of `n` bytes from the thread-local CSPRNG.
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

/// Generate a random IV for one container.
pub fn random_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}

/// Encrypt `plaintext` with AES-128-CTR. Output has the same length as the input.
pub fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8]) -> BootpackResult<Vec<u8>> {
    let mut cipher = init_cipher(key, iv)?;
    let mut out = plaintext.to_vec();
    cipher.apply_keystream(&mut out);
    Ok(out)
}

/// Exact inverse of [`encrypt`] for the same key and IV.
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> BootpackResult<Vec<u8>> {
    let mut cipher = init_cipher(key, iv)?;
    let mut out = ciphertext.to_vec();
    cipher.apply_keystream(&mut out);
    Ok(out)
}

fn init_cipher(key: &[u8], iv: &[u8]) -> BootpackResult<Aes128Ctr> {
    if key.len() != KEY_LEN {
        return Err(BootpackError::InvalidKeyMaterial {
            what: "key",
            expected: KEY_LEN,
            actual: key.len(),
        });
    }
    if iv.len() != IV_LEN {
        return Err(BootpackError::InvalidKeyMaterial {
            what: "iv",
            expected: IV_LEN,
            actual: iv.len(),
        });
    }
    Aes128Ctr::new_from_slices(key, iv).map_err(|_| BootpackError::InvalidKeyMaterial {
        what: "key",
        expected: KEY_LEN,
        actual: key.len(),
    })
}
