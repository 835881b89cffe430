//! Dotted-key settings document with change notification.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use toml::{Table, Value};
use tracing::{debug, trace, warn};
use webshell_events::{HandlerResult, Signal, SubscriberId};

use crate::error::{ConfigError, ConfigResult};

/// Maximum accepted settings file size (1 MB).
const MAX_SETTINGS_FILE_SIZE: usize = 1_048_576;

/// A single change applied to the settings document.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChange {
    /// Full dotted key, e.g. `plugins.test.enabled`.
    pub key: String,
    /// New value, `None` when the key was removed.
    pub value: Option<Value>,
    /// Value before the change, `None` when the key was absent.
    pub previous: Option<Value>,
}

impl SettingChange {
    /// The new value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_ref().and_then(Value::as_bool)
    }
}

/// Settings store backed by a TOML document.
///
/// Keys are dotted paths into nested tables (`plugins.test.enabled` lives in
/// `[plugins.test]`). When the store was opened from a file every successful
/// write is persisted before subscribers are notified.
pub struct Settings {
    path: Option<PathBuf>,
    root: Table,
    changed: Signal<SettingChange>,
}

impl Settings {
    /// Open the settings file at `path`.
    ///
    /// A missing file yields an empty document; it is created on the first
    /// write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let root = load_table(&path)?.unwrap_or_default();
        Ok(Self {
            path: Some(path),
            root,
            changed: Signal::new("settings-changed"),
        })
    }

    /// Create a store that is never persisted.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_table(Table::new())
    }

    /// Create a non-persisted store from an existing document.
    #[must_use]
    pub fn from_table(root: Table) -> Self {
        Self {
            path: None,
            root,
            changed: Signal::new("settings-changed"),
        }
    }

    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The whole document.
    #[must_use]
    pub fn table(&self) -> &Table {
        &self.root
    }

    /// Look up a value by dotted key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let first = parts.next()?;
        let mut current = self.root.get(first)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    /// Look up a boolean value. Non-boolean values read as `None`.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Store `value` under `key`, creating intermediate tables as needed.
    ///
    /// Returns `true` if the stored value changed. Writing the value already
    /// present is a no-op: nothing is persisted and no change is emitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed, a prefix of the key holds a
    /// scalar, the file cannot be written, or a change subscriber fails. In
    /// the last case the new value has already been stored. A failed write
    /// leaves the in-memory table as it was before the call.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> ConfigResult<bool> {
        let value = value.into();
        let (parents, leaf) = split_key(key)?;

        let snapshot = self.root.clone();
        let table = table_for_write(&mut self.root, key, &parents)?;
        if table.get(leaf) == Some(&value) {
            trace!(key, "Setting unchanged");
            return Ok(false);
        }
        let previous = table.insert(leaf.to_string(), value.clone());

        self.persist_or_restore(snapshot)?;
        debug!(key, "Setting changed");
        self.changed.emit(&SettingChange {
            key: key.to_string(),
            value: Some(value),
            previous,
        })?;
        Ok(true)
    }

    /// Remove `key`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Same conditions as [`set`](Self::set).
    pub fn remove(&mut self, key: &str) -> ConfigResult<Option<Value>> {
        let (parents, leaf) = split_key(key)?;

        let snapshot = self.root.clone();
        let mut current = &mut self.root;
        for part in &parents {
            match current.get_mut(*part) {
                Some(Value::Table(t)) => current = t,
                _ => return Ok(None),
            }
        }
        let Some(previous) = current.remove(leaf) else {
            return Ok(None);
        };

        self.persist_or_restore(snapshot)?;
        debug!(key, "Setting removed");
        self.changed.emit(&SettingChange {
            key: key.to_string(),
            value: None,
            previous: Some(previous.clone()),
        })?;
        Ok(Some(previous))
    }

    /// Deserialize the top-level table `name`.
    ///
    /// An absent section yields `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SectionError`] if the section does not match `T`.
    pub fn section<T>(&self, name: &str) -> ConfigResult<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.root.get(name) {
            None => Ok(T::default()),
            Some(value) => value
                .clone()
                .try_into()
                .map_err(|source| ConfigError::SectionError {
                    section: name.to_string(),
                    source,
                }),
        }
    }

    /// Write the document to its backing file. In-memory stores are left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> ConfigResult<()> {
        self.persist()
    }

    /// The change signal. Every effective write emits exactly once.
    #[must_use]
    pub fn changed(&self) -> &Signal<SettingChange> {
        &self.changed
    }

    /// Subscribe to changes whose key starts with `prefix`.
    pub fn subscribe_prefix<F>(&self, prefix: impl Into<String>, mut handler: F) -> SubscriberId
    where
        F: FnMut(&SettingChange) -> HandlerResult + 'static,
    {
        let prefix = prefix.into();
        self.changed.subscribe(move |change: &SettingChange| {
            if change.key.starts_with(&prefix) {
                handler(change)
            } else {
                Ok(())
            }
        })
    }

    fn persist(&self) -> ConfigResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = toml::to_string_pretty(&self.root)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| write_error(path, source))?;
        }

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, content).map_err(|source| write_error(&tmp, source))?;
        fs::rename(&tmp, path).map_err(|source| write_error(path, source))?;

        trace!(path = %path.display(), "Settings saved");
        Ok(())
    }

    fn persist_or_restore(&mut self, snapshot: Table) -> ConfigResult<()> {
        self.persist().inspect_err(|e| {
            warn!(error = %e, "Settings not saved, reverting in-memory change");
            self.root = snapshot;
        })
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("path", &self.path)
            .field("keys", &self.root.len())
            .field("subscribers", &self.changed.len())
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn write_error(path: &Path, source: io::Error) -> ConfigError {
    ConfigError::WriteError {
        path: path.display().to_string(),
        source,
    }
}

/// Read and parse a settings file, returning `None` if it doesn't exist.
fn load_table(path: &Path) -> ConfigResult<Option<Table>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Settings file not found, starting empty");
            return Ok(None);
        },
        Err(source) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source,
            });
        },
    };

    if content.len() > MAX_SETTINGS_FILE_SIZE {
        return Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "file is {} bytes, exceeding the {MAX_SETTINGS_FILE_SIZE} byte limit",
                    content.len()
                ),
            ),
        });
    }

    let table: Table = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(table))
}

fn split_key(key: &str) -> ConfigResult<(Vec<&str>, &str)> {
    let mut parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::InvalidKey {
            key: key.to_string(),
            message: "empty path component".to_string(),
        });
    }
    // split always yields at least one element
    let leaf = parts.pop().unwrap_or_default();
    Ok((parts, leaf))
}

fn table_for_write<'a>(
    root: &'a mut Table,
    key: &str,
    parents: &[&str],
) -> ConfigResult<&'a mut Table> {
    let mut current = root;
    let mut consumed = 0_usize;
    for part in parents {
        consumed = consumed.saturating_add(part.len()).saturating_add(1);
        let entry = current
            .entry((*part).to_string())
            .or_insert(Value::Table(Table::new()));
        match entry {
            Value::Table(t) => current = t,
            _ => {
                let prefix = key.get(..consumed.saturating_sub(1)).unwrap_or(key);
                return Err(ConfigError::NotATable {
                    key: prefix.to_string(),
                });
            },
        }
    }
    Ok(current)
}
