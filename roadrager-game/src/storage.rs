//! Persistence adapters for world state snapshots.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::rc::Rc;

use thiserror::Error;

use crate::GameStorage;
use crate::state::WorldState;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for '{slot}': {source}")]
    Io {
        slot: String,
        #[source]
        source: std::io::Error,
    },
    #[error("saved state in '{slot}' is not valid: {source}")]
    Serde {
        slot: String,
        #[source]
        source: serde_json::Error,
    },
}

fn encode(slot: &str, state: &WorldState) -> Result<String, StorageError> {
    serde_json::to_string_pretty(state).map_err(|source| StorageError::Serde {
        slot: slot.to_string(),
        source,
    })
}

fn decode(slot: &str, raw: &str) -> Result<WorldState, StorageError> {
    serde_json::from_str(raw).map_err(|source| StorageError::Serde {
        slot: slot.to_string(),
        source,
    })
}

/// In-process key-value store holding serialized snapshots.
///
/// Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text in a slot, bypassing serialization.
    pub fn insert_raw(&self, slot: &str, raw: impl Into<String>) {
        self.slots.borrow_mut().insert(slot.to_string(), raw.into());
    }

    #[must_use]
    pub fn raw(&self, slot: &str) -> Option<String> {
        self.slots.borrow().get(slot).cloned()
    }

    #[must_use]
    pub fn contains(&self, slot: &str) -> bool {
        self.slots.borrow().contains_key(slot)
    }
}

impl GameStorage for MemoryStorage {
    type Error = StorageError;

    fn save_state(&self, slot: &str, state: &WorldState) -> Result<(), Self::Error> {
        let raw = encode(slot, state)?;
        self.slots.borrow_mut().insert(slot.to_string(), raw);
        Ok(())
    }

    fn load_state(&self, slot: &str) -> Result<Option<WorldState>, Self::Error> {
        self.slots
            .borrow()
            .get(slot)
            .map(|raw| decode(slot, raw))
            .transpose()
    }

    fn delete_state(&self, slot: &str) -> Result<(), Self::Error> {
        self.slots.borrow_mut().remove(slot);
        Ok(())
    }
}

/// One pretty-printed JSON file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn slot_path(&self, slot: &str) -> PathBuf {
        let file: String = slot
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file}.json"))
    }

    fn io_error(slot: &str, source: std::io::Error) -> StorageError {
        StorageError::Io {
            slot: slot.to_string(),
            source,
        }
    }
}

impl GameStorage for JsonFileStorage {
    type Error = StorageError;

    fn save_state(&self, slot: &str, state: &WorldState) -> Result<(), Self::Error> {
        let raw = encode(slot, state)?;
        fs::create_dir_all(&self.root).map_err(|err| Self::io_error(slot, err))?;
        let path = self.slot_path(slot);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(|err| Self::io_error(slot, err))?;
        fs::rename(&tmp, &path).map_err(|err| Self::io_error(slot, err))
    }

    fn load_state(&self, slot: &str) -> Result<Option<WorldState>, Self::Error> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(raw) => decode(slot, &raw).map(Some),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::io_error(slot, err)),
        }
    }

    fn delete_state(&self, slot: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.slot_path(slot)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Self::io_error(slot, err)),
        }
    }
}
