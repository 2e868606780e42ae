//! Symmetric encryption for account secrets stored in user rows
//! (SMTP passwords, AI provider keys).
//!
//! Format: base64(nonce[12] || AES-256-GCM ciphertext).

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::Rng;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("Encryption error: {0}")]
    Encryption(String),
    #[error("Decryption error: {0}")]
    Decryption(String),
    #[error("Key error: {0}")]
    Key(String),
}

pub struct Encryptor {
    cipher: Aes256Gcm,
}

impl Encryptor {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::Key(format!(
                "expected a {KEY_LEN}-byte key, got {} bytes",
                key.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(key);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Builds an encryptor from the base64 `ENCRYPTION_KEY` value.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let key = BASE64
            .decode(encoded.trim())
            .map_err(|e| CryptoError::Key(e.to_string()))?;
        Self::new(&key)
    }

    pub fn encrypt(&self, data: &str) -> Result<String, CryptoError> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::rng().random();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, data.as_bytes())
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);
        Ok(BASE64.encode(combined))
    }

    pub fn decrypt(&self, encrypted_data: &str) -> Result<String, CryptoError> {
        let data = BASE64
            .decode(encrypted_data)
            .map_err(|e| CryptoError::Decryption(e.to_string()))?;

        if data.len() <= NONCE_LEN {
            return Err(CryptoError::Decryption("Invalid data length".into()));
        }

        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| CryptoError::Decryption(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| CryptoError::Decryption(e.to_string()))
    }
}
