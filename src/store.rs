//! Synchronous string key-value stores backing every collection.
//!
//! The core only needs `get`/`set`/`remove` on whole string values. Two
//! backends ship with the crate: an in-process map (optionally bounded, which
//! is how rejected writes are exercised) and a directory of JSON files that
//! can be sealed with a passphrase.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::crypto::{self, CryptoEnvelope, SealingKey, DEFAULT_PBKDF2_ITERATIONS};
use crate::error::StoreError;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects any write that would push the summed key and value length
    /// past `quota` bytes, like a browser's storage quota.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(quota),
        }
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                warn!(key, needed, quota, "memory store rejected write");
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under `root`.
pub struct FileStore {
    root: PathBuf,
    sealing: Option<Sealing>,
}

struct Sealing {
    passphrase: String,
    iterations: u32,
    cached: Mutex<Option<SealingKey>>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sealing: None,
        }
    }

    pub fn encrypted(root: impl Into<PathBuf>, passphrase: impl Into<String>) -> Self {
        Self::encrypted_with_iterations(root, passphrase, DEFAULT_PBKDF2_ITERATIONS)
    }

    pub fn encrypted_with_iterations(
        root: impl Into<PathBuf>,
        passphrase: impl Into<String>,
        iterations: u32,
    ) -> Self {
        Self {
            root: root.into(),
            sealing: Some(Sealing {
                passphrase: passphrase.into(),
                iterations,
                cached: Mutex::new(None),
            }),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn is_encrypted(&self) -> bool {
        self.sealing.is_some()
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let rel = sanitize_relative_path(key)?;
        let mut path = self.root.join(rel);
        let file_name = match path.file_name() {
            Some(name) => format!("{}.json", name.to_string_lossy()),
            None => return Err(StoreError::InvalidKey(key.to_string())),
        };
        path.set_file_name(file_name);
        Ok(path)
    }

    fn open_sealed(&self, sealing: &Sealing, raw: &str) -> Option<String> {
        let envelope: CryptoEnvelope = serde_json::from_str(raw).ok()?;
        let salt = crypto::envelope_salt(&envelope)?;
        let key = match self.cached_key(sealing) {
            Some(cached) if cached.salt() == salt.as_slice() => cached,
            _ => SealingKey::from_salt(&sealing.passphrase, &salt, sealing.iterations),
        };
        let text = crypto::open(&envelope, &key)?;
        if let Ok(mut guard) = sealing.cached.lock() {
            *guard = Some(key);
        }
        Some(text)
    }

    fn seal(&self, sealing: &Sealing, value: &str) -> Result<String, StoreError> {
        let key = match self.cached_key(sealing) {
            Some(cached) => cached,
            None => {
                let fresh = SealingKey::fresh(&sealing.passphrase, sealing.iterations);
                if let Ok(mut guard) = sealing.cached.lock() {
                    *guard = Some(fresh.clone());
                }
                fresh
            }
        };
        let envelope = crypto::seal(value, &key)?;
        serde_json::to_string(&envelope).map_err(|err| StoreError::Crypto(err.to_string()))
    }

    fn cached_key(&self, sealing: &Sealing) -> Option<SealingKey> {
        sealing.cached.lock().ok()?.clone()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path.as_path())?;
        match &self.sealing {
            None => Ok(Some(raw)),
            Some(sealing) => {
                let opened = self.open_sealed(sealing, raw.as_str());
                if opened.is_none() {
                    warn!(key, "sealed value could not be opened; treating as absent");
                }
                Ok(opened)
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        let content = match &self.sealing {
            None => value.to_string(),
            Some(sealing) => self.seal(sealing, value)?,
        };
        write_text_file(path.as_path(), content.as_str())?;
        debug!(key, bytes = content.len(), path = %path.display(), "wrote store file");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Writes to a sibling temp file first so a failed write never truncates the
/// previous contents.
fn write_text_file(path: &Path, content: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(tmp.as_path(), content)?;
    fs::rename(tmp.as_path(), path)?;
    Ok(())
}

fn sanitize_relative_path(value: &str) -> Result<PathBuf, StoreError> {
    let mut out = PathBuf::new();
    for component in Path::new(value).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return Err(StoreError::InvalidKey(value.to_string())),
        }
    }
    if out.as_os_str().is_empty() {
        return Err(StoreError::InvalidKey(value.to_string()));
    }
    Ok(out)
}
