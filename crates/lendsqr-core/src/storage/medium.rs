//! Key-value media that back the expiring cache.
//!
//! A medium is shared by every open view ("context"). Writes made through
//! one handle are announced to subscribers on the other handles, never to
//! the handle that made them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tracing::debug;

use super::{Result, StorageError};

/// Capacity of the change-notification channel.
/// Subscribers that fall further behind skip the missed events.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Where a storage change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A handle in this process, identified by its context id.
    Context(u64),
    /// Another process writing to the same medium.
    External,
}

/// A key that was written or removed by some context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub origin: Origin,
}

/// Persistent key-value medium addressed by string keys.
pub trait StorageMedium: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;

    fn keys(&self) -> Result<Vec<String>>;

    /// Subscribe to changes made by *other* contexts.
    fn subscribe(&self) -> StorageEvents;
}

/// Subscription to storage changes made elsewhere.
///
/// Events originating from the subscribing handle are filtered out.
/// Dropping the subscription releases it.
#[derive(Debug)]
pub struct StorageEvents {
    rx: broadcast::Receiver<StorageEvent>,
    own: Origin,
}

impl StorageEvents {
    pub(crate) fn new(rx: broadcast::Receiver<StorageEvent>, own: Origin) -> Self {
        Self { rx, own }
    }

    /// Next pending event without waiting. `None` when nothing is queued.
    pub fn try_next(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.origin == self.own => continue,
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Storage subscriber lagged");
                    continue;
                }
                Err(_) => return None,
            }
        }
    }

    /// Wait for the next event. `None` once the medium has been dropped.
    pub async fn next(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.origin == self.own => continue,
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Storage subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

struct MemoryShared {
    items: RwLock<BTreeMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
    next_context: AtomicU64,
}

/// In-process medium. Each handle returned by [`MemoryMedium::open_context`]
/// behaves like a separate browser tab over the same storage.
#[derive(Clone)]
pub struct MemoryMedium {
    shared: Arc<MemoryShared>,
    context: u64,
}

impl MemoryMedium {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(MemoryShared {
                items: RwLock::new(BTreeMap::new()),
                events,
                next_context: AtomicU64::new(1),
            }),
            context: 0,
        }
    }

    /// Another handle onto the same storage with its own context id.
    pub fn open_context(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            context: self.shared.next_context.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn context_id(&self) -> u64 {
        self.context
    }

    fn announce(&self, key: &str) {
        // No receivers is fine: nobody else is watching.
        let _ = self.shared.events.send(StorageEvent {
            key: key.to_string(),
            origin: Origin::Context(self.context),
        });
    }
}

impl Default for MemoryMedium {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageMedium for MemoryMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.shared.items.read().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        {
            let mut items = self.shared.items.write().map_err(|_| StorageError::Poisoned)?;
            items.insert(key.to_string(), value.to_string());
        }
        self.announce(key);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let removed = {
            let mut items = self.shared.items.write().map_err(|_| StorageError::Poisoned)?;
            items.remove(key).is_some()
        };
        if removed {
            self.announce(key);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let items = self.shared.items.read().map_err(|_| StorageError::Poisoned)?;
        Ok(items.keys().cloned().collect())
    }

    fn subscribe(&self) -> StorageEvents {
        StorageEvents::new(self.shared.events.subscribe(), Origin::Context(self.context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip() {
        let medium = MemoryMedium::new();
        medium.set_item("users", "[]").unwrap();
        assert_eq!(medium.get_item("users").unwrap().as_deref(), Some("[]"));
        assert_eq!(medium.get_item("missing").unwrap(), None);
    }

    #[test]
    fn test_memory_remove_and_keys() {
        let medium = MemoryMedium::new();
        medium.set_item("b", "2").unwrap();
        medium.set_item("a", "1").unwrap();
        assert_eq!(medium.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);

        medium.remove_item("a").unwrap();
        assert_eq!(medium.keys().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn test_contexts_share_storage() {
        let tab_a = MemoryMedium::new();
        let tab_b = tab_a.open_context();
        assert_ne!(tab_a.context_id(), tab_b.context_id());

        tab_a.set_item("users", "[1]").unwrap();
        assert_eq!(tab_b.get_item("users").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_own_writes_do_not_notify() {
        let tab_a = MemoryMedium::new();
        let tab_b = tab_a.open_context();
        let mut events_a = tab_a.subscribe();
        let mut events_b = tab_b.subscribe();

        tab_a.set_item("users", "[]").unwrap();

        assert_eq!(events_a.try_next(), None);
        let event = events_b.try_next().unwrap();
        assert_eq!(event.key, "users");
        assert_eq!(event.origin, Origin::Context(tab_a.context_id()));
        assert_eq!(events_b.try_next(), None);
    }

    #[test]
    fn test_removing_absent_key_is_silent() {
        let tab_a = MemoryMedium::new();
        let tab_b = tab_a.open_context();
        let mut events_b = tab_b.subscribe();

        tab_a.remove_item("nothing").unwrap();
        assert_eq!(events_b.try_next(), None);
    }

    #[tokio::test]
    async fn test_next_waits_for_foreign_event() {
        let tab_a = MemoryMedium::new();
        let tab_b = tab_a.open_context();
        let mut events_b = tab_b.subscribe();

        tab_b.set_item("selectedUser", "{}").unwrap();
        tab_a.set_item("users", "[]").unwrap();

        let event = events_b.next().await.unwrap();
        assert_eq!(event.key, "users");
    }
}
