use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use waystone::Result;

/// Key under which the account id derived from a registration check is stored.
pub const ACCOUNT_ID_KEY: &str = "account_id";

/// Local key-value persistence. The client only writes to it.
pub trait PreferenceStore: Send + Sync {
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn get(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: DashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.value().clone())
    }
}

/// Preferences cached in memory and flushed to a JSON object on every write.
pub struct JsonFilePreferences {
    path: PathBuf,
    values: DashMap<String, String>,
    /// Serializes file writes
    write_lock: Mutex<()>,
}

impl JsonFilePreferences {
    /// Open {path}, starting empty if it is missing or unreadable
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = DashMap::new();

        if path.exists() {
            match std::fs::read_to_string(&path)
                .map_err(waystone::WaystoneError::from)
                .and_then(|s| {
                    serde_json::from_str::<BTreeMap<String, String>>(&s).map_err(Into::into)
                }) {
                Ok(stored) => {
                    for (k, v) in stored {
                        values.insert(k, v);
                    }
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to load preferences from {}: {}, starting empty",
                        path.display(),
                        e
                    );
                }
            }
        }

        Self {
            path,
            values,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let snapshot: BTreeMap<String, String> = self
            .values
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        let previous = self.values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush() {
            // Memory must not get ahead of the file.
            match previous {
                Some(old) => self.values.insert(key.to_string(), old),
                None => self.values.remove(key).map(|(_, v)| v),
            };
            return Err(e);
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.value().clone())
    }
}
