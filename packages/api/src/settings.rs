//! Runtime settings: backend connection parameters, storage, editor timing, content key.
//!
//! Sources, later ones winning: built-in defaults, an optional `notepad.toml`,
//! then environment variables prefixed `NOTEPAD` with `__` between sections
//! (`NOTEPAD__EDITOR__SAVE_DEBOUNCE_MS=500`). A `.env` file is loaded first.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::warn;

use crate::crypto::{Cipher, CryptoError};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Backend {
    pub database_url: String,
    pub project_id: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    File,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Storage {
    pub kind: StorageKind,
    /// Where the file database lives. Defaults to the platform data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Editor {
    pub save_debounce_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Crypto {
    /// 64 hex chars. When unset a key is generated for the process.
    #[serde(default)]
    pub content_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub backend: Backend,
    pub storage: Storage,
    pub editor: Editor,
    #[serde(default)]
    pub crypto: Crypto,
}

impl Settings {
    /// Load from `notepad.toml` in the working directory and the environment.
    pub fn new() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load(Path::new("notepad.toml"))
    }

    pub fn load(file: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("backend.database_url", "memory://local")?
            .set_default("backend.project_id", "notepad")?
            .set_default("storage.kind", "memory")?
            .set_default("editor.save_debounce_ms", 1000)?
            .add_source(
                File::from(file)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix("NOTEPAD").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.editor.save_debounce_ms)
    }

    /// The content cipher for this process.
    pub fn cipher(&self) -> Result<Cipher, CryptoError> {
        match &self.crypto.content_key {
            Some(key) => Cipher::from_hex(key),
            None => {
                warn!("crypto.content_key is not set; notes written now are unreadable after restart");
                Ok(Cipher::generate())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("missing.toml")).unwrap();

        assert_eq!(settings.storage.kind, StorageKind::Memory);
        assert_eq!(settings.save_debounce(), Duration::from_millis(1000));
        assert_eq!(settings.backend.project_id, "notepad");
        assert!(settings.crypto.content_key.is_none());
        assert!(settings.cipher().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notepad.toml");
        std::fs::write(
            &file,
            format!(
                r#"
[backend]
database_url = "https://notes.example.com"
project_id = "notes-prod"
api_key = "key-123"

[storage]
kind = "file"
data_dir = "/var/lib/notepad"

[editor]
save_debounce_ms = 250

[crypto]
content_key = "{}"
"#,
                "ab".repeat(32)
            ),
        )
        .unwrap();

        let settings = Settings::load(&file).unwrap();
        assert_eq!(settings.backend.database_url, "https://notes.example.com");
        assert_eq!(settings.backend.api_key, "key-123");
        assert_eq!(settings.storage.kind, StorageKind::File);
        assert_eq!(settings.storage.data_dir, Some(PathBuf::from("/var/lib/notepad")));
        assert_eq!(settings.save_debounce(), Duration::from_millis(250));
        assert!(settings.cipher().is_ok());
    }

    #[test]
    fn test_bad_content_key() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notepad.toml");
        std::fs::write(&file, "[crypto]\ncontent_key = \"abcd\"\n").unwrap();

        let settings = Settings::load(&file).unwrap();
        assert!(matches!(settings.cipher(), Err(CryptoError::KeyLength(2))));
    }
}
