use rand::{RngCore, rngs::OsRng};
use aes_gcm::{Aes256Gcm, Nonce, aead::{Aead, KeyInit}};
use super::errors::{ErrorCode, PavilionError};

const NONCE_LEN: usize = 12;

///
/// Reversible encryption for personal details held on an account (AES-256-GCM).
///
/// This is unrelated to password hashing - anything sealed here can be read back with the key.
///
#[derive(Clone)]
pub struct PiiCipher {
    cipher: Aes256Gcm,
}

impl PiiCipher {
    ///
    /// The key is 32 bytes, base64 encoded.
    ///
    pub fn new(key: &str) -> Result<Self, PavilionError> {
        let key = base64::decode(key.trim())
            .map_err(|e| ErrorCode::InvalidConfig.with_msg(&format!("pii_key is not base64: {}", e)))?;

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| ErrorCode::InvalidConfig.with_msg(&format!("pii_key must be 32 bytes, not {}", key.len())))?;

        Ok(PiiCipher { cipher })
    }

    ///
    /// Seal the value as base64(nonce || ciphertext). A fresh nonce is used every time.
    ///
    pub fn encrypt(&self, plain_text: &str) -> Result<String, PavilionError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let sealed = self.cipher.encrypt(Nonce::from_slice(&nonce), plain_text.as_bytes())
            .map_err(|e| ErrorCode::EncryptionError.with_msg(&format!("Unable to encrypt: {}", e)))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + sealed.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&sealed);
        Ok(base64::encode(combined))
    }

    pub fn decrypt(&self, sealed: &str) -> Result<String, PavilionError> {
        let combined = base64::decode(sealed)
            .map_err(|e| ErrorCode::EncryptionError.with_msg(&format!("Sealed value is not base64: {}", e)))?;

        if combined.len() <= NONCE_LEN {
            return Err(ErrorCode::EncryptionError.with_msg("Sealed value is too short"))
        }

        let (nonce, sealed) = combined.split_at(NONCE_LEN);
        let plain = self.cipher.decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|e| ErrorCode::EncryptionError.with_msg(&format!("Unable to decrypt: {}", e)))?;

        String::from_utf8(plain)
            .map_err(|e| ErrorCode::EncryptionError.with_msg(&format!("Decrypted value is not utf-8: {}", e)))
    }
}
