//! # Content encryption: note bodies at rest
//!
//! Note content is encrypted before it is written to the database and decrypted
//! after it is read, using **AES-256-GCM** with one symmetric key per process.
//! There is no key management or rotation here: the key comes from settings
//! (`crypto.content_key`, 64 hex chars) or is generated for the process.
//!
//! ## Encoded form
//!
//! `hex(nonce ‖ ciphertext)`: a fresh random 12-byte nonce followed by the
//! ciphertext and its 16-byte tag, hex-encoded so it fits a JSON string field.
//!
//! ## Public API
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Cipher::from_hex`] | Builds a cipher from a 64 hex-char key. |
//! | [`Cipher::generate`] | Builds a cipher with a random key. |
//! | [`Cipher::encode`] | Encrypts a string into its encoded form. |
//! | [`Cipher::decode`] | Reverses [`Cipher::encode`]. |

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::RngCore;
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("content key must be 64 hex chars (32 bytes), got {0} bytes")]
    KeyLength(usize),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("encoded content is shorter than a nonce")]
    Truncated,
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed")]
    Decrypt,
    #[error("decrypted content is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Clone)]
pub struct Cipher {
    aes: Aes256Gcm,
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}

impl Cipher {
    pub fn new(key: &[u8; 32]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key);
        Self {
            aes: Aes256Gcm::new(key),
        }
    }

    /// Read and validate a 32-byte key given as 64 hex chars.
    pub fn from_hex(hex_key: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex_key.trim())?;
        let key: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::KeyLength(bytes.len()))?;
        Ok(Self::new(&key))
    }

    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self::new(&key)
    }

    pub fn encode(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .aes
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(hex::encode(out))
    }

    pub fn decode(&self, encoded: &str) -> Result<String, CryptoError> {
        let bytes = hex::decode(encoded)?;
        if bytes.len() < NONCE_LEN {
            return Err(CryptoError::Truncated);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .aes
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decrypt)?;
        Ok(String::from_utf8(plaintext)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_preserves_unicode() {
        let cipher = Cipher::generate();
        for text in [
            "",
            "plain ascii",
            "# Heading\n\n- [ ] todo\n",
            "Catatan harian 📝 ünïcödé, 日本語, עברית",
            "\u{0}\u{1F600}\u{10FFFF}",
        ] {
            let encoded = cipher.encode(text).unwrap();
            assert_eq!(cipher.decode(&encoded).unwrap(), text);
        }
    }

    #[test]
    fn test_encoding_hides_plaintext_and_uses_fresh_nonces() {
        let cipher = Cipher::generate();
        let first = cipher.encode("secret").unwrap();
        let second = cipher.encode("secret").unwrap();

        assert!(!first.contains("secret"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_wrong_key_fails_to_decode() {
        let encoded = Cipher::generate().encode("secret").unwrap();
        assert!(matches!(
            Cipher::generate().decode(&encoded),
            Err(CryptoError::Decrypt)
        ));
    }

    #[test]
    fn test_malformed_input() {
        let cipher = Cipher::generate();
        assert!(matches!(cipher.decode("zz"), Err(CryptoError::Hex(_))));
        assert!(matches!(cipher.decode("00ff"), Err(CryptoError::Truncated)));
    }

    #[test]
    fn test_from_hex_validates_length() {
        let key = "11".repeat(32);
        let a = Cipher::from_hex(&key).unwrap();
        let b = Cipher::from_hex(&key).unwrap();
        assert_eq!(b.decode(&a.encode("shared key").unwrap()).unwrap(), "shared key");

        assert!(matches!(
            Cipher::from_hex("abcd"),
            Err(CryptoError::KeyLength(2))
        ));
    }
}
