use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::medium::{StorageEvents, StorageMedium};

/// Stored envelope: the cached value plus an absolute expiry in
/// milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expiry: Some(now_millis().saturating_add(ttl.num_milliseconds())),
        }
    }

    /// Entries without an expiry never expire.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expiry.is_some_and(|expiry| now_ms > expiry)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

impl CacheEntry<Value> {
    /// Parse a stored payload. Anything that is not a JSON object is not an
    /// envelope. A missing `value` reads as `null`; an `expiry` written by a
    /// JavaScript client may be a float.
    pub fn parse(raw: &str) -> Option<Self> {
        let Value::Object(mut map) = serde_json::from_str::<Value>(raw).ok()? else {
            return None;
        };
        let expiry = map.get("expiry").and_then(|e| {
            e.as_i64().or_else(|| e.as_f64().map(|f| f as i64))
        });
        let value = map.remove("value").unwrap_or(Value::Null);
        Some(Self { value, expiry })
    }
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Get/set over a [`StorageMedium`] where every value carries an expiry.
///
/// Expiry is enforced lazily on [`get`](Self::get) and by the explicit
/// [`cleanup_expired`](Self::cleanup_expired) sweep; there are no timers.
/// Medium failures never reach the caller: reads turn into misses and
/// writes are logged.
#[derive(Clone)]
pub struct ExpiringStore {
    medium: Arc<dyn StorageMedium>,
}

impl ExpiringStore {
    pub fn new(medium: Arc<dyn StorageMedium>) -> Self {
        Self { medium }
    }

    pub fn medium(&self) -> &Arc<dyn StorageMedium> {
        &self.medium
    }

    /// Store `value` under `key`, expiring `ttl` from now. A negative TTL
    /// stores an entry that is already expired.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let entry = CacheEntry::new(value, ttl);
        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };
        if let Err(e) = self.medium.set_item(key, &payload) {
            warn!(key, error = %e, "Failed to write cache entry");
        }
    }

    /// Read the value under `key`.
    ///
    /// Returns `None` when the key is absent, when the payload is not a
    /// valid envelope (left in place), or when the entry has expired (in
    /// which case it is removed).
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.medium.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to read cache entry");
                return None;
            }
        };

        let Some(entry) = CacheEntry::<Value>::parse(&raw) else {
            debug!(key, "Ignoring unparseable cache entry");
            return None;
        };

        if entry.is_expired() {
            debug!(key, "Cache entry expired");
            self.remove(key);
            return None;
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Expiry of the entry under `key`, without consuming or removing it.
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.medium.get_item(key).ok().flatten()?;
        CacheEntry::<Value>::parse(&raw)?.expires_at()
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.medium.remove_item(key) {
            warn!(key, error = %e, "Failed to remove cache entry");
        }
    }

    /// Remove every expired entry in the medium. Unparseable payloads and
    /// entries without an expiry are left alone.
    pub fn cleanup_expired(&self) {
        let keys = match self.medium.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list cache keys");
                return;
            }
        };

        let now = now_millis();
        let mut removed = 0usize;
        for key in keys {
            let Ok(Some(raw)) = self.medium.get_item(&key) else {
                continue;
            };
            let Some(entry) = CacheEntry::<Value>::parse(&raw) else {
                continue;
            };
            if entry.is_expired_at(now) {
                self.remove(&key);
                removed += 1;
            }
        }
        debug!(removed, "Expired cache entries swept");
    }

    /// Changes other contexts make to the underlying medium.
    pub fn subscribe(&self) -> StorageEvents {
        self.medium.subscribe()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryMedium;
    use serde_json::json;

    fn store() -> (ExpiringStore, MemoryMedium) {
        let medium = MemoryMedium::new();
        (ExpiringStore::new(Arc::new(medium.clone())), medium)
    }

    #[test]
    fn test_cache_roundtrip() {
        let (store, _) = store();
        let value = json!({"id": "1", "tags": ["a", "b"], "nested": {"n": 3}});
        store.set("users", &value, Duration::hours(1));
        assert_eq!(store.get::<Value>("users"), Some(value));
    }

    #[test]
    fn test_expired_entry_is_deleted() {
        let (store, medium) = store();
        store.set("users", &vec![1, 2, 3], Duration::milliseconds(-1));

        assert_eq!(store.get::<Vec<i32>>("users"), None);
        assert_eq!(medium.get_item("users").unwrap(), None);
        assert_eq!(store.get::<Vec<i32>>("users"), None);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss_and_left_in_place() {
        let (store, medium) = store();
        medium.set_item("users", "{not json").unwrap();

        assert_eq!(store.get::<Value>("users"), None);
        assert_eq!(medium.get_item("users").unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn test_non_object_payload_is_not_an_envelope() {
        let (store, medium) = store();
        medium.set_item("users", "[1, 2]").unwrap();
        assert_eq!(store.get::<Value>("users"), None);
    }

    #[test]
    fn test_entry_without_expiry_never_expires() {
        let (store, medium) = store();
        medium.set_item("legacy", r#"{"value": [1]}"#).unwrap();
        assert_eq!(store.get::<Vec<i32>>("legacy"), Some(vec![1]));
    }

    #[test]
    fn test_float_expiry_is_accepted() {
        let (store, medium) = store();
        let future = (now_millis() + 60_000) as f64 + 0.5;
        medium
            .set_item("users", &format!(r#"{{"value": "x", "expiry": {}}}"#, future))
            .unwrap();
        assert_eq!(store.get::<String>("users"), Some("x".to_string()));
    }

    #[test]
    fn test_wrong_shape_is_a_miss() {
        let (store, _) = store();
        store.set("users", &"text", Duration::hours(1));
        assert_eq!(store.get::<Vec<i32>>("users"), None);
    }

    #[test]
    fn test_cleanup_removes_only_expired() {
        let (store, medium) = store();
        for i in 0..3 {
            store.set(&format!("old{}", i), &i, Duration::milliseconds(-1000));
        }
        store.set("fresh", &1, Duration::hours(1));
        medium.set_item("forever", r#"{"value": 1}"#).unwrap();
        medium.set_item("corrupt", "][").unwrap();

        store.cleanup_expired();

        assert_eq!(
            medium.keys().unwrap(),
            vec![
                "corrupt".to_string(),
                "forever".to_string(),
                "fresh".to_string()
            ]
        );
    }

    #[test]
    fn test_expires_at_does_not_consume() {
        let (store, medium) = store();
        store.set("users", &1, Duration::milliseconds(-1));
        assert!(store.expires_at("users").is_some());
        assert!(medium.get_item("users").unwrap().is_some());
    }

    #[test]
    fn test_envelope_format() {
        let (store, medium) = store();
        store.set("users", &json!([1]), Duration::hours(1));
        let raw: Value = serde_json::from_str(&medium.get_item("users").unwrap().unwrap()).unwrap();
        assert_eq!(raw["value"], json!([1]));
        assert!(raw["expiry"].as_i64().unwrap() > now_millis());
    }

    #[test]
    fn test_cache_entry_expiry() {
        let entry = CacheEntry::new(1, Duration::minutes(60));
        assert!(!entry.is_expired());
        assert!(entry.is_expired_at(entry.expiry.unwrap() + 1));
        assert!(!entry.is_expired_at(entry.expiry.unwrap()));
    }

    #[test]
    fn test_oversized_ttl_does_not_overflow() {
        let entry = CacheEntry::new(1, Duration::milliseconds(i64::MAX));
        assert_eq!(entry.expiry, Some(i64::MAX));
        assert!(!entry.is_expired());
    }
}
