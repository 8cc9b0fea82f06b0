use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::warn;

/// Version stamped into every snapshot. Snapshots carrying any other version
/// are discarded on hydration.
pub const SNAPSHOT_VERSION: u32 = 0;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Named string slots, the shape of browser local storage.
pub trait SnapshotStorage {
    fn get_item(&self, name: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, name: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, name: &str) -> Result<(), StorageError>;
}

/// In-memory storage. Clones share the same slots, like two tabs of one origin.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn get_item(&self, name: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.borrow().get(name).cloned())
    }

    fn set_item(&mut self, name: &str, value: &str) -> Result<(), StorageError> {
        self.slots.borrow_mut().insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, name: &str) -> Result<(), StorageError> {
        self.slots.borrow_mut().remove(name);
        Ok(())
    }
}

/// One `<name>.json` file per slot under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl SnapshotStorage for FileStorage {
    fn get_item(&self, name: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(name)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, name: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path_for(name), value)?;
        Ok(())
    }

    fn remove_item(&mut self, name: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(name)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// A state value with a single update function.
pub trait StateContainer {
    type Action;

    fn apply(&mut self, action: Self::Action);
}

/// A container that can be written to and restored from a named snapshot.
pub trait Persisted: Default {
    const STORAGE_NAME: &'static str;
    type Snapshot: Serialize + DeserializeOwned;

    fn snapshot(&self) -> Self::Snapshot;
    fn restore(snapshot: Self::Snapshot) -> Self;
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    version: u32,
}

pub struct PersistedStore<T, S> {
    state: T,
    storage: S,
}

impl<T, S> PersistedStore<T, S>
where
    T: StateContainer + Persisted,
    S: SnapshotStorage,
{
    /// Builds the store from whatever snapshot `storage` holds. Missing,
    /// malformed, or foreign-version snapshots yield an empty container.
    pub fn hydrate(storage: S) -> Self {
        let state = match storage.get_item(T::STORAGE_NAME) {
            Ok(Some(raw)) => match serde_json::from_str::<Envelope<T::Snapshot>>(&raw) {
                Ok(envelope) if envelope.version == SNAPSHOT_VERSION => T::restore(envelope.state),
                Ok(envelope) => {
                    warn!(
                        "Discarding {} snapshot with unsupported version {}",
                        T::STORAGE_NAME,
                        envelope.version
                    );
                    T::default()
                }
                Err(e) => {
                    warn!("Discarding unreadable {} snapshot: {}", T::STORAGE_NAME, e);
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                warn!("Failed to read {} snapshot: {}", T::STORAGE_NAME, e);
                T::default()
            }
        };

        Self { state, storage }
    }

    pub fn state(&self) -> &T {
        &self.state
    }

    /// Applies `action`, then writes the new snapshot. Write failures are
    /// logged and otherwise ignored.
    pub fn dispatch(&mut self, action: T::Action) {
        self.state.apply(action);
        if let Err(e) = self.persist() {
            warn!("Failed to persist {} snapshot: {}", T::STORAGE_NAME, e);
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        let envelope = Envelope {
            state: self.state.snapshot(),
            version: SNAPSHOT_VERSION,
        };
        let json = serde_json::to_string(&envelope)?;
        self.storage.set_item(T::STORAGE_NAME, &json)
    }
}
