//! Symmetric message layer. The Burmester-Desmedt shared secret is a bare
//! integer; this module turns it into an AEAD key and wraps/unwraps chat
//! payloads so they survive the JSON frame as plain strings.
//!
//! The shared secret is hashed with SHA-256 before use as a key: the integer
//! itself is only ~32 bits of entropy and is never used as key material
//! directly.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use sha2::{Digest, Sha256};

use crate::errors::CoreError;

const NONCE_LEN: usize = 12;

fn derive_key(shared_secret: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(shared_secret.to_be_bytes());
    hasher.finalize().into()
}

/// Encrypts `plaintext` under `shared_secret`, returning lowercase hex of
/// `nonce || ciphertext` so the result is a safe JSON string.
pub fn encrypt(plaintext: &str, shared_secret: u64) -> String {
    let key_bytes = derive_key(shared_secret);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    // Only fails for payloads far larger than any chat line; there is no
    // recoverable action for the caller, so narrow the panic surface here.
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .expect("AES-256-GCM encryption of a chat line cannot fail");

    let mut wire = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    wire.extend_from_slice(&nonce);
    wire.extend_from_slice(&ciphertext);
    hex::encode(wire)
}

/// Inverse of [`encrypt`]. Fails if `hex` is not valid hex, is shorter than a
/// nonce, or does not authenticate under the key derived from
/// `shared_secret`.
pub fn decrypt(hex: &str, shared_secret: u64) -> Result<String, CoreError> {
    let wire = hex::decode(hex)?;
    if wire.len() < NONCE_LEN {
        return Err(CoreError::DecryptionFailed);
    }
    let (nonce_bytes, ciphertext) = wire.split_at(NONCE_LEN);

    let key_bytes = derive_key(shared_secret);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CoreError::DecryptionFailed)?;

    Ok(String::from_utf8(plaintext)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_for_various_keys_and_messages() {
        for key in [0u64, 1, 42, 3_786_491_542] {
            for msg in ["", "hi", "the quick brown fox 🦊", "a".repeat(500).as_str()] {
                let ct = encrypt(msg, key);
                assert_eq!(decrypt(&ct, key).unwrap(), msg);
            }
        }
    }

    #[test]
    fn ciphertext_is_lowercase_hex() {
        let ct = encrypt("hello", 7);
        assert!(ct.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let ct = encrypt("secret", 1);
        assert!(decrypt(&ct, 2).is_err());
    }

    #[test]
    fn invalid_hex_is_rejected() {
        assert!(decrypt("not hex!!", 1).is_err());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        assert!(decrypt("ab", 1).is_err());
    }
}
