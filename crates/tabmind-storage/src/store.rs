//! Key-value store capability and JSON helpers

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::StorageError;
use crate::Result;

/// Persistent string key-value store.
///
/// No transactions and no compare-and-swap: a read followed by a write is
/// only safe because the engine performs both inside one event-loop turn.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed access on top of any [`KeyValueStore`].
///
/// The settings blob is a JSON object whose top-level fields ("sections")
/// are owned by different components. Section updates merge into the blob
/// instead of replacing it, so the categories writer never clobbers sessions.
pub trait JsonStoreExt: KeyValueStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }

    /// Read-modify-write the JSON object stored at `key`.
    fn update_blob<F, R>(&self, key: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Map<String, Value>) -> R,
    {
        let mut blob = match self.get_json::<Value>(key)? {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => Map::new(),
            Some(_) => return Err(StorageError::NotAnObject(key.to_string())),
        };

        let result = f(&mut blob);
        self.set_json(key, &Value::Object(blob))?;
        Ok(result)
    }

    /// Read one section of the blob at `key`, falling back to its default.
    fn read_section<T>(&self, key: &str, section: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let value = match self.get_json::<Value>(key)? {
            Some(Value::Object(mut map)) => map.remove(section),
            Some(Value::Null) | None => None,
            Some(_) => return Err(StorageError::NotAnObject(key.to_string())),
        };

        match value {
            Some(Value::Null) | None => Ok(T::default()),
            Some(v) => Ok(serde_json::from_value(v)?),
        }
    }

    /// Read-modify-write one section of the blob at `key`.
    fn update_section<T, F, R>(&self, key: &str, section: &str, f: F) -> Result<R>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> R,
    {
        let mut current: T = self.read_section(key, section)?;
        let result = f(&mut current);
        let value = serde_json::to_value(&current)?;
        self.update_blob(key, |blob| {
            blob.insert(section.to_string(), value);
        })?;
        Ok(result)
    }
}

impl<S: KeyValueStore + ?Sized> JsonStoreExt for S {}

/// In-process store, used by tests and by hosts without a data directory.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
