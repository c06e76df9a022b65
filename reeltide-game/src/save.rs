//! Save-blob persistence over a pluggable string store.

use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use thiserror::Error;

use crate::state::GameState;

/// Storage key for the single save slot.
pub const SAVE_KEY: &str = "reeltide.save";

/// The storage medium the game persists through. Implementations map a
/// string key to a string blob; a browser host backs this with
/// `localStorage`, a desktop host with a file, tests with [`MemoryStore`].
pub trait SaveStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the medium cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Write `value` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns an error when the medium rejects the write.
    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Delete the blob under `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the medium rejects the delete.
    fn delete(&self, key: &str) -> Result<(), Self::Error>;
}

/// Failures while saving or loading.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The underlying store rejected the operation.
    #[error("save store failed: {0}")]
    Store(#[source] anyhow::Error),
    /// The stored blob is not a valid state document.
    #[error("corrupt save data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Serialize `state` and persist it under [`SAVE_KEY`].
///
/// # Errors
///
/// Returns [`SaveError::Store`] when the store rejects the write.
pub fn save_state<S: SaveStore>(store: &S, state: &GameState) -> Result<(), SaveError> {
    let blob = serde_json::to_string(state)?;
    store
        .write(SAVE_KEY, &blob)
        .map_err(|e| SaveError::Store(anyhow::Error::new(e)))?;
    log::debug!("saved {} bytes", blob.len());
    Ok(())
}

/// Load and decode the stored state, if a blob exists.
///
/// # Errors
///
/// Returns [`SaveError::Store`] when the medium cannot be read and
/// [`SaveError::Corrupt`] when the blob does not parse.
pub fn load_state<S: SaveStore>(store: &S) -> Result<Option<GameState>, SaveError> {
    let blob = store
        .read(SAVE_KEY)
        .map_err(|e| SaveError::Store(anyhow::Error::new(e)))?;
    match blob {
        Some(blob) => {
            let state: GameState = serde_json::from_str(&blob)?;
            log::debug!("loaded {} bytes", blob.len());
            Ok(Some(state))
        }
        None => Ok(None),
    }
}

/// Remove any stored blob.
///
/// # Errors
///
/// Returns [`SaveError::Store`] when the medium rejects the delete.
pub fn clear_state<S: SaveStore>(store: &S) -> Result<(), SaveError> {
    store
        .delete(SAVE_KEY)
        .map_err(|e| SaveError::Store(anyhow::Error::new(e)))
}

/// In-memory store for tests and headless hosts. Clones share the same
/// map, so a session and a test can watch the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct peek at a stored blob, mainly for assertions.
    #[must_use]
    pub fn blob(&self, key: &str) -> Option<String> {
        self.blobs.borrow().get(key).cloned()
    }

    /// Drop a raw blob in place, bypassing serialization.
    pub fn put_blob(&self, key: &str, value: &str) {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl SaveStore for MemoryStore {
    type Error = Infallible;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), Self::Error> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}
