//! Dirty-tracked bot storage.
//!
//! The server keeps a small key → text map per bot. [`StateStore`] loads the
//! whole map once, serves reads and writes locally, and remembers which keys
//! changed. [`flush`](StateStore::flush) pushes exactly those keys back in a
//! single request; the dispatcher calls it after every processed message.
//!
//! Values are encoded as JSON text, so anything `Serialize` can be stored:
//!
//! ```rust,ignore
//! let store = handler.storage_mut()?;
//! let count: u64 = if store.contains("count") { store.get("count")? } else { 0 };
//! store.put("count", &(count + 1))?;
//! ```

use std::collections::BTreeSet;

use parley_core::{BoxedClient, StorageMap};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{StateError, StateResult};

/// Local, dirty-tracked copy of a bot's remote storage.
pub struct StateStore {
    client: BoxedClient,
    /// Serialized values, keyed by storage key.
    entries: StorageMap,
    /// Keys written since the last successful flush; always a subset of `entries`.
    dirty: BTreeSet<String>,
}

impl StateStore {
    /// Loads the complete storage map from the server.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Initialization`] if the fetch fails.
    pub async fn new(client: BoxedClient) -> StateResult<Self> {
        let entries = client
            .get_storage()
            .await
            .map_err(StateError::Initialization)?;
        debug!(entries = entries.len(), "Loaded bot storage");

        Ok(Self {
            client,
            entries,
            dirty: BTreeSet::new(),
        })
    }

    /// Stores `value` under `key` and marks the key dirty. No network I/O.
    pub fn put<T>(&mut self, key: impl Into<String>, value: &T) -> StateResult<()>
    where
        T: Serialize + ?Sized,
    {
        let key = key.into();
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(source) => return Err(StateError::Serialize { key, source }),
        };
        self.entries.insert(key.clone(), encoded);
        self.dirty.insert(key);
        Ok(())
    }

    /// Reads and decodes the value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`StateError::KeyNotFound`] if the key is absent,
    /// [`StateError::Deserialize`] if the stored text does not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StateResult<T> {
        let raw = self
            .entries
            .get(key)
            .ok_or_else(|| StateError::KeyNotFound(key.to_string()))?;
        serde_json::from_str(raw).map_err(|source| StateError::Deserialize {
            key: key.to_string(),
            source,
        })
    }

    /// Returns `true` if a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns `true` if there are unflushed writes.
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Keys written since the last successful flush, in sorted order.
    pub fn dirty_keys(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    /// Sends all dirty entries to the server in one batched update.
    ///
    /// Does nothing (and makes no request) when nothing changed. On failure
    /// the dirty set is kept, so calling `flush` again retries the same keys.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Sync`] if the server rejects the update.
    pub async fn flush(&mut self) -> StateResult<()> {
        if self.dirty.is_empty() {
            return Ok(());
        }

        let update: StorageMap = self
            .dirty
            .iter()
            .filter_map(|key| self.entries.get(key).map(|v| (key.clone(), v.clone())))
            .collect();
        let count = update.len();

        if let Err(e) = self.client.update_storage(update).await {
            warn!(keys = count, error = %e, "Failed to flush bot storage");
            return Err(StateError::Sync(e));
        }

        self.dirty.clear();
        debug!(keys = count, "Flushed bot storage");
        Ok(())
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("entries", &self.entries.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}
