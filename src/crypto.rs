use aes_gcm::aead::{rand_core::RngCore, Aead, OsRng};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::StoreError;

pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 200_000;
const ENVELOPE_VERSION: u8 = 1;
const TAG_LEN: usize = 16;

/// On-disk shape of an encrypted value. All binary fields are base64.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CryptoEnvelope {
    pub v: u8,
    pub salt: String,
    pub iv: String,
    pub tag: String,
    pub data: String,
}

/// A derived key together with the salt it was derived from.
#[derive(Clone)]
pub struct SealingKey {
    salt: Vec<u8>,
    key: [u8; 32],
}

impl SealingKey {
    pub fn fresh(passphrase: &str, iterations: u32) -> Self {
        let mut salt = [0u8; 16];
        OsRng.fill_bytes(&mut salt);
        Self::from_salt(passphrase, &salt, iterations)
    }

    pub fn from_salt(passphrase: &str, salt: &[u8], iterations: u32) -> Self {
        Self {
            salt: salt.to_vec(),
            key: derive_key(passphrase, salt, iterations.max(1)),
        }
    }

    pub fn salt(&self) -> &[u8] {
        self.salt.as_slice()
    }
}

impl std::fmt::Debug for SealingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealingKey").finish_non_exhaustive()
    }
}

pub fn seal(text: &str, key: &SealingKey) -> Result<CryptoEnvelope, StoreError> {
    let mut iv = [0u8; 12];
    OsRng.fill_bytes(&mut iv);
    let cipher = Aes256Gcm::new_from_slice(key.key.as_slice())
        .map_err(|err| StoreError::Crypto(err.to_string()))?;
    let encrypted = cipher
        .encrypt(Nonce::from_slice(&iv), text.as_bytes())
        .map_err(|err| StoreError::Crypto(err.to_string()))?;

    if encrypted.len() < TAG_LEN {
        return Err(StoreError::Crypto("encryption output too short".to_string()));
    }
    let (data, tag) = encrypted.split_at(encrypted.len() - TAG_LEN);

    Ok(CryptoEnvelope {
        v: ENVELOPE_VERSION,
        salt: encode_b64(key.salt()),
        iv: encode_b64(&iv),
        tag: encode_b64(tag),
        data: encode_b64(data),
    })
}

/// Returns `None` for anything that does not authenticate under `key`.
pub fn open(envelope: &CryptoEnvelope, key: &SealingKey) -> Option<String> {
    let iv = decode_b64(envelope.iv.as_str())?;
    let tag = decode_b64(envelope.tag.as_str())?;
    let data = decode_b64(envelope.data.as_str())?;
    if iv.len() != 12 || tag.is_empty() {
        return None;
    }

    let cipher = Aes256Gcm::new_from_slice(key.key.as_slice()).ok()?;
    let mut combined = Vec::with_capacity(data.len() + tag.len());
    combined.extend_from_slice(data.as_slice());
    combined.extend_from_slice(tag.as_slice());

    let decrypted = cipher
        .decrypt(Nonce::from_slice(iv.as_slice()), combined.as_slice())
        .ok()?;
    String::from_utf8(decrypted).ok()
}

pub fn envelope_salt(envelope: &CryptoEnvelope) -> Option<Vec<u8>> {
    decode_b64(envelope.salt.as_str()).filter(|salt| !salt.is_empty())
}

fn derive_key(passphrase: &str, salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, iterations, &mut key);
    key
}

fn decode_b64(value: &str) -> Option<Vec<u8>> {
    B64.decode(value).ok()
}

fn encode_b64(bytes: &[u8]) -> String {
    B64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_text_opens_with_same_key() {
        let key = SealingKey::fresh("hunter2", 1_000);
        let envelope = seal("[1,2,3]", &key).unwrap();
        assert_eq!(envelope.v, 1);
        assert_eq!(open(&envelope, &key).as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn wrong_passphrase_does_not_open() {
        let key = SealingKey::fresh("right", 1_000);
        let envelope = seal("secret", &key).unwrap();
        let salt = envelope_salt(&envelope).unwrap();
        let other = SealingKey::from_salt("wrong", &salt, 1_000);
        assert!(open(&envelope, &other).is_none());
    }

    #[test]
    fn tampered_envelope_does_not_open() {
        let key = SealingKey::fresh("pw", 1_000);
        let mut envelope = seal("payload", &key).unwrap();
        envelope.iv = "not base64!".to_string();
        assert!(open(&envelope, &key).is_none());
    }
}
