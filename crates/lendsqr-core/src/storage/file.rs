//! Directory-backed medium shared between processes.
//!
//! Each key lives in `<dir>/<key>.json`. Every write goes to its own
//! uniquely named temporary file that is renamed into place, so concurrent
//! writers never share a temp file and a reader sees a whole payload. A debounced file watcher reports changes made by other
//! processes; changes this handle made itself are recognised by content and
//! dropped.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use tempfile::NamedTempFile;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::medium::{Origin, StorageEvent, StorageEvents, StorageMedium, EVENT_CHANNEL_CAPACITY};
use super::{Result, StorageError};

/// File extension for stored keys.
const KEY_EXTENSION: &str = "json";

/// Debounce window for directory change notifications.
const WATCH_DEBOUNCE_MS: u64 = 200;

/// Last payload this handle wrote per key (`None` = this handle removed it).
type OwnWrites = Arc<Mutex<HashMap<String, Option<String>>>>;

pub struct FileMedium {
    dir: PathBuf,
    own_writes: OwnWrites,
    events: broadcast::Sender<StorageEvent>,
    watcher: Mutex<Option<Debouncer<RecommendedWatcher>>>,
}

impl FileMedium {
    /// Open a medium rooted at `dir`, creating the directory if needed.
    /// No watcher is started; see [`FileMedium::watch`].
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            dir,
            own_writes: Arc::new(Mutex::new(HashMap::new())),
            events,
            watcher: Mutex::new(None),
        })
    }

    /// Open a medium and start watching the directory for writes by other processes.
    pub fn open_watched(dir: impl Into<PathBuf>) -> Result<Self> {
        let medium = Self::open(dir)?;
        medium.watch()?;
        Ok(medium)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Start the directory watcher. Calling it twice replaces the first watcher.
    pub fn watch(&self) -> Result<()> {
        let (sync_tx, sync_rx) = mpsc::channel::<DebounceEventResult>();
        let mut debouncer = new_debouncer(Duration::from_millis(WATCH_DEBOUNCE_MS), sync_tx)?;
        debouncer
            .watcher()
            .watch(&self.dir, RecursiveMode::NonRecursive)?;

        let dir = self.dir.clone();
        let own_writes = Arc::clone(&self.own_writes);
        let events = self.events.clone();

        // Bridge notify's thread to the broadcast channel.
        std::thread::spawn(move || {
            while let Ok(result) = sync_rx.recv() {
                match result {
                    Ok(batch) => {
                        for event in batch {
                            if !matches!(event.kind, DebouncedEventKind::Any) {
                                continue;
                            }
                            if let Some(key) = key_from_path(&event.path) {
                                forward_external_change(&dir, &key, &own_writes, &events);
                            }
                        }
                    }
                    Err(e) => warn!(error = %e, "Storage watcher error"),
                }
            }
            debug!("Storage watcher stopped");
        });

        let mut slot = self.watcher.lock().map_err(|_| StorageError::Poisoned)?;
        *slot = Some(debouncer);
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.{}", key, KEY_EXTENSION)))
    }

    fn remember(&self, key: &str, payload: Option<String>) -> Result<()> {
        let mut own = self.own_writes.lock().map_err(|_| StorageError::Poisoned)?;
        own.insert(key.to_string(), payload);
        Ok(())
    }
}

/// Announce a changed key unless its current content is what this handle wrote last.
fn forward_external_change(
    dir: &Path,
    key: &str,
    own_writes: &OwnWrites,
    events: &broadcast::Sender<StorageEvent>,
) {
    let current = std::fs::read_to_string(dir.join(format!("{}.{}", key, KEY_EXTENSION))).ok();
    let is_own = match own_writes.lock() {
        Ok(own) => own.get(key).is_some_and(|last| *last == current),
        Err(_) => false,
    };
    if is_own {
        return;
    }
    debug!(key, "External storage change");
    let _ = events.send(StorageEvent {
        key: key.to_string(),
        origin: Origin::External,
    });
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

fn key_from_path(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some(KEY_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    validate_key(stem).ok()?;
    Some(stem.to_string())
}

impl StorageMedium for FileMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        self.remember(key, Some(value.to_string()))?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        self.remember(key, None)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| key_from_path(&entry.path()))
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn subscribe(&self) -> StorageEvents {
        // Every event on this channel comes from another process.
        StorageEvents::new(self.events.subscribe(), Origin::Context(0))
    }
}
