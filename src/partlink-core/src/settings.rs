//! Plugin settings port and its two host-side implementations.
//!
//! Settings are flat string key/value pairs scoped to one supplier
//! connection. [`FileSettingsStore`] keeps ordinary keys in a TOML file and
//! routes secret keys to the OS keyring.

use crate::secrets::{CredentialStore, SecretKind, SecretsError};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("secret storage failed: {0}")]
    Secrets(#[from] SecretsError),
    #[error("invalid value {value:?} for setting {key}")]
    Invalid { key: String, value: String },
    #[error("settings store lock poisoned")]
    Poisoned,
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Host settings port. Implementations serialize concurrent writes.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> SettingsResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> SettingsResult<()>;

    fn remove(&self, key: &str) -> SettingsResult<()>;

    /// Reads a boolean flag; accepts `true/false`, `1/0`, `yes/no` in any case.
    fn get_bool(&self, key: &str) -> SettingsResult<Option<bool>> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" | "" => Ok(Some(false)),
            _ => Err(SettingsError::Invalid {
                key: key.to_string(),
                value: raw,
            }),
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> SettingsResult<()> {
        self.set(key, if value { "true" } else { "false" })
    }
}

#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by tests and fixtures.
    pub fn with(self, key: &str, value: &str) -> Self {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        self
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> SettingsResult<Option<String>> {
        let values = self.values.lock().map_err(|_| SettingsError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> SettingsResult<()> {
        let mut values = self.values.lock().map_err(|_| SettingsError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> SettingsResult<()> {
        let mut values = self.values.lock().map_err(|_| SettingsError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}

type SettingsFile = BTreeMap<String, BTreeMap<String, String>>;

/// File-backed settings for one `<supplier>/<connection>` scope.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    supplier: String,
    connection: String,
    secret_keys: HashMap<String, SecretKind>,
    credentials: CredentialStore,
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>, supplier: &str, connection: &str) -> Self {
        Self {
            path: path.into(),
            supplier: supplier.to_string(),
            connection: connection.to_string(),
            secret_keys: HashMap::new(),
            credentials: CredentialStore::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Routes `key` to the OS keyring instead of the settings file.
    pub fn with_secret(mut self, key: &str, kind: SecretKind) -> Self {
        self.secret_keys.insert(key.to_string(), kind);
        self
    }

    fn scope(&self) -> String {
        format!("{}.{}", self.supplier, self.connection)
    }

    fn read_file(&self) -> SettingsResult<SettingsFile> {
        read_settings_file(&self.path)
    }

    fn write_file(&self, contents: &SettingsFile) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let encoded = toml::to_string_pretty(contents)?;
        fs::write(&self.path, encoded).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn read_settings_file(path: &Path) -> SettingsResult<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::new());
    }
    let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> SettingsResult<Option<String>> {
        if let Some(kind) = self.secret_keys.get(key) {
            return match self.credentials.get(&self.supplier, &self.connection, *kind) {
                Ok(secret) => Ok(Some(secret)),
                Err(SecretsError::NotFound { .. }) => Ok(None),
                Err(e) => Err(e.into()),
            };
        }
        let file = self.read_file()?;
        Ok(file.get(&self.scope()).and_then(|table| table.get(key)).cloned())
    }

    fn set(&self, key: &str, value: &str) -> SettingsResult<()> {
        if let Some(kind) = self.secret_keys.get(key) {
            self.credentials
                .store(&self.supplier, &self.connection, *kind, value)?;
            return Ok(());
        }
        let _guard = self.write_lock.lock().map_err(|_| SettingsError::Poisoned)?;
        let mut file = self.read_file()?;
        file.entry(self.scope())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.write_file(&file)?;
        tracing::debug!(key, path = %self.path.display(), "stored setting");
        Ok(())
    }

    fn remove(&self, key: &str) -> SettingsResult<()> {
        if let Some(kind) = self.secret_keys.get(key) {
            self.credentials
                .delete(&self.supplier, &self.connection, *kind)?;
            return Ok(());
        }
        let _guard = self.write_lock.lock().map_err(|_| SettingsError::Poisoned)?;
        let mut file = self.read_file()?;
        if let Some(table) = file.get_mut(&self.scope()) {
            table.remove(key);
        }
        self.write_file(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_parsing() {
        let store = MemorySettings::new()
            .with("A", "True")
            .with("B", "0")
            .with("C", "maybe");
        assert_eq!(store.get_bool("A").unwrap(), Some(true));
        assert_eq!(store.get_bool("B").unwrap(), Some(false));
        assert_eq!(store.get_bool("MISSING").unwrap(), None);
        assert!(matches!(
            store.get_bool("C"),
            Err(SettingsError::Invalid { .. })
        ));
    }

    #[test]
    fn file_store_round_trip_and_scoping() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/settings.toml");
        let digikey = FileSettingsStore::new(&path, "digikey", "default");
        let other = FileSettingsStore::new(&path, "digikey", "lab");

        digikey.set("DIGI_CLIENT_ID", "client-123").unwrap();
        digikey.set_bool("AUTHENTICATED", true).unwrap();
        other.set("DIGI_CLIENT_ID", "lab-client").unwrap();

        let reopened = FileSettingsStore::new(&path, "digikey", "default");
        assert_eq!(
            reopened.get("DIGI_CLIENT_ID").unwrap().as_deref(),
            Some("client-123")
        );
        assert_eq!(reopened.get_bool("AUTHENTICATED").unwrap(), Some(true));
        assert_eq!(
            other.get("DIGI_CLIENT_ID").unwrap().as_deref(),
            Some("lab-client")
        );

        reopened.remove("DIGI_CLIENT_ID").unwrap();
        assert_eq!(digikey.get("DIGI_CLIENT_ID").unwrap(), None);
    }

    #[test]
    fn corrupt_file_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.toml");
        fs::write(&path, "not = [valid").unwrap();
        let store = FileSettingsStore::new(&path, "digikey", "default");
        match store.get("DIGI_CLIENT_ID") {
            Err(SettingsError::Parse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
