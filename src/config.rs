use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::store::{FileStore, KeyValueStore, MemoryStore};
use crate::view::Theme;

pub const CONFIG_FILE: &str = "pocketdesk.toml";
pub const DATA_DIR_ENV: &str = "POCKETDESK_DATA_DIR";
pub const PASSPHRASE_ENV: &str = "POCKETDESK_PASSPHRASE";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    #[default]
    File,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    pub root: Option<PathBuf>,
    pub encrypt: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ViewConfig {
    pub default_theme: Theme,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub view: ViewConfig,
    #[serde(skip)]
    pub passphrase: Option<String>,
}

impl AppConfig {
    pub fn in_memory() -> Self {
        Self {
            storage: StorageConfig {
                backend: Backend::Memory,
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path` if it exists, then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.is_file() {
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            Self::parse(text.as_str())?
        } else {
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
            self.storage.root = Some(PathBuf::from(dir));
        }
        if let Some(passphrase) = lookup(PASSPHRASE_ENV).filter(|p| !p.is_empty()) {
            self.passphrase = Some(passphrase);
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage.root = Some(root.into());
        self
    }

    /// Fills in `root` when the config left it unset, e.g. with the app data
    /// directory resolved by the desktop shell.
    pub fn or_root(mut self, root: impl Into<PathBuf>) -> Self {
        if self.storage.root.is_none() {
            self.storage.root = Some(root.into());
        }
        self
    }

    pub fn build_store(&self) -> Result<Arc<dyn KeyValueStore>, ConfigError> {
        match self.storage.backend {
            Backend::Memory => Ok(Arc::new(MemoryStore::new())),
            Backend::File => {
                let root = self.storage.root.clone().ok_or(ConfigError::MissingRoot)?;
                if self.storage.encrypt {
                    let passphrase = self
                        .passphrase
                        .clone()
                        .ok_or(ConfigError::MissingPassphrase)?;
                    info!(root = %root.display(), "using encrypted file storage");
                    Ok(Arc::new(FileStore::encrypted(root, passphrase)))
                } else {
                    info!(root = %root.display(), "using file storage");
                    Ok(Arc::new(FileStore::new(root)))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.storage.backend, Backend::File);
        assert_eq!(config.view.default_theme, Theme::Dark);
    }

    #[test]
    fn parses_sections() {
        let config = AppConfig::parse(
            r#"
            [storage]
            backend = "file"
            root = "/tmp/desk"
            encrypt = true

            [view]
            default_theme = "light"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.root, Some(PathBuf::from("/tmp/desk")));
        assert!(config.storage.encrypt);
        assert_eq!(config.view.default_theme, Theme::Light);
    }

    #[test]
    fn unknown_backend_is_an_error() {
        assert!(matches!(
            AppConfig::parse("[storage]\nbackend = \"cloud\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_root_and_passphrase() {
        let mut config = AppConfig::default().with_root("/from/file");
        config.apply_env(|name| match name {
            DATA_DIR_ENV => Some("/from/env".to_string()),
            PASSPHRASE_ENV => Some("s3cret".to_string()),
            _ => None,
        });
        assert_eq!(config.storage.root, Some(PathBuf::from("/from/env")));
        assert_eq!(config.passphrase.as_deref(), Some("s3cret"));
    }

    #[test]
    fn file_backend_needs_root_and_passphrase_when_encrypted() {
        assert!(matches!(
            AppConfig::default().build_store(),
            Err(ConfigError::MissingRoot)
        ));
        let mut config = AppConfig::default().with_root("/tmp/x");
        config.storage.encrypt = true;
        assert!(matches!(
            config.build_store(),
            Err(ConfigError::MissingPassphrase)
        ));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.storage.backend, Backend::File);
    }
}
