//! ChaCha20-Poly1305 protection for the stored console password.
//!
//! Stored form: base64(nonce || ciphertext || tag), with a fresh random
//! 96-bit nonce per encryption. The 256-bit key is per deployment and
//! never written to the config file.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretBox, SecretString};
use tracing::{debug, info};

use smartpole_core::{CoreError, PasswordCipher};

use crate::ConfigError;

/// Nonce size for ChaCha20-Poly1305 (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Key size for ChaCha20-Poly1305 (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Environment variable holding the base64 key.
pub const KEY_ENV: &str = "SMARTPOLE_CIPHER_KEY";

const KEYRING_SERVICE: &str = "smartpole";
const KEYRING_USER: &str = "cipher-key";

pub struct AeadCipher {
    key: SecretBox<[u8; KEY_SIZE]>,
}

impl AeadCipher {
    pub fn from_key(key: &[u8]) -> Result<Self, ConfigError> {
        let key: [u8; KEY_SIZE] = key.try_into().map_err(|_| {
            ConfigError::Cipher(format!(
                "invalid key size: expected {KEY_SIZE}, got {}",
                key.len()
            ))
        })?;
        Ok(Self {
            key: SecretBox::new(Box::new(key)),
        })
    }

    pub fn from_base64(encoded: &str) -> Result<Self, ConfigError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfigError::Cipher(format!("key is not valid base64: {e}")))?;
        Self::from_key(&bytes)
    }

    /// A cipher with a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut key);
        Self {
            key: SecretBox::new(Box::new(key)),
        }
    }

    pub fn key_base64(&self) -> String {
        STANDARD.encode(self.key.expose_secret())
    }

    /// Key from `SMARTPOLE_CIPHER_KEY`, else from the system keyring.
    ///
    /// When the keyring has no entry yet a key is generated and stored
    /// there.
    pub fn resolve() -> Result<Self, ConfigError> {
        if let Ok(encoded) = std::env::var(KEY_ENV) {
            debug!("cipher key from environment");
            return Self::from_base64(&encoded);
        }

        let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
        match entry.get_password() {
            Ok(encoded) => {
                debug!("cipher key from keyring");
                Self::from_base64(&encoded)
            }
            Err(keyring::Error::NoEntry) => {
                let cipher = Self::generate();
                entry.set_password(&cipher.key_base64())?;
                info!("generated new cipher key in system keyring");
                Ok(cipher)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn aead(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(self.key.expose_secret()))
    }

    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<String, ConfigError> {
        let mut nonce = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .aead()
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| ConfigError::Cipher(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    pub fn decrypt_bytes(&self, stored: &str) -> Result<Vec<u8>, ConfigError> {
        let raw = STANDARD
            .decode(stored.trim())
            .map_err(|e| ConfigError::Cipher(format!("stored password is not valid base64: {e}")))?;
        if raw.len() <= NONCE_SIZE {
            return Err(ConfigError::Cipher("stored password is truncated".into()));
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_SIZE);

        self.aead()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                ConfigError::Cipher("cannot decrypt stored password (wrong key?)".into())
            })
    }
}

impl PasswordCipher for AeadCipher {
    fn encrypt(&self, plaintext: &SecretString) -> Result<String, CoreError> {
        Ok(self.encrypt_bytes(plaintext.expose_secret().as_bytes())?)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<SecretString, CoreError> {
        let bytes = self.decrypt_bytes(ciphertext)?;
        let plaintext = String::from_utf8(bytes)
            .map_err(|_| ConfigError::Cipher("decrypted password is not UTF-8".into()))?;
        Ok(SecretString::from(plaintext))
    }
}

impl std::fmt::Debug for AeadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AeadCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use smartpole_core::ErrorKind;

    use super::*;

    #[test]
    fn test_password_survives_encryption() {
        let cipher = AeadCipher::generate();
        let stored = cipher.encrypt(&SecretString::from("s3cret")).unwrap();

        assert!(!stored.contains("s3cret"));
        assert_eq!(cipher.decrypt(&stored).unwrap().expose_secret(), "s3cret");
    }

    #[test]
    fn test_nonce_differs_per_encryption() {
        let cipher = AeadCipher::generate();
        let a = cipher.encrypt_bytes(b"same").unwrap();
        let b = cipher.encrypt_bytes(b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_is_configuration_error() {
        let stored = AeadCipher::generate().encrypt_bytes(b"pw").unwrap();
        let err = AeadCipher::generate().decrypt(&stored).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationInvalid);
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let cipher = AeadCipher::generate();
        let mut raw = STANDARD.decode(cipher.encrypt_bytes(b"pw").unwrap()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        assert!(cipher.decrypt_bytes(&STANDARD.encode(raw)).is_err());
    }

    #[test]
    fn test_truncated_or_garbage_input() {
        let cipher = AeadCipher::generate();
        assert!(cipher.decrypt_bytes("AAAA").is_err());
        assert!(cipher.decrypt_bytes("not base64!").is_err());
    }

    #[test]
    fn test_key_round_trips_through_base64() {
        let cipher = AeadCipher::generate();
        let stored = cipher.encrypt_bytes(b"pw").unwrap();

        let restored = AeadCipher::from_base64(&cipher.key_base64()).unwrap();
        assert_eq!(restored.decrypt_bytes(&stored).unwrap(), b"pw");
    }

    #[test]
    fn test_invalid_key_size() {
        assert!(AeadCipher::from_key(&[0u8; 16]).is_err());
        assert!(AeadCipher::from_base64("c2hvcnQ=").is_err());
    }
}
