//! Owner of the canonical user collection.
//!
//! The repository reads through the expiring cache (`users` and
//! `selectedUser` keys) and falls back to the fetch collaborator on a miss.
//! Every collection change is written back before the mutating call
//! returns, so memory and cache never disagree within one context.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::models::UserRecord;
use crate::source::UserSource;
use crate::status::MutationError;
use crate::storage::{ExpiringStore, StorageEvents};

/// Cache key for the full user collection.
pub const USERS_KEY: &str = "users";

/// Cache key for the record opened in the detail view.
pub const SELECTED_USER_KEY: &str = "selectedUser";

/// Default lifetime of cached entries: one hour.
pub const DEFAULT_TTL_MS: i64 = 3_600_000;

pub struct UserRepository {
    store: ExpiringStore,
    source: Arc<dyn UserSource>,
    users: Vec<UserRecord>,
    ttl: Duration,
    loaded: bool,
}

impl UserRepository {
    pub fn new(store: ExpiringStore, source: Arc<dyn UserSource>) -> Self {
        Self {
            store,
            source,
            users: Vec::new(),
            ttl: Duration::milliseconds(DEFAULT_TTL_MS),
            loaded: false,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn store(&self) -> &ExpiringStore {
        &self.store
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current canonical collection (empty until the first load).
    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    /// Whether a load or replace has populated the collection.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Load the collection from cache, or from the fetch collaborator on a miss.
    ///
    /// A fetched collection is written to the cache. A failed fetch is
    /// logged and yields an empty collection, which is not cached.
    pub async fn load(&mut self) -> &[UserRecord] {
        if let Some(cached) = self.store.get::<Vec<UserRecord>>(USERS_KEY) {
            debug!(count = cached.len(), "Users loaded from cache");
            self.adopt(cached);
            return &self.users;
        }

        match self.source.fetch_users().await {
            Ok(fetched) => {
                info!(count = fetched.len(), "Users fetched from source");
                self.adopt(fetched);
                self.store.set(USERS_KEY, &self.users, self.ttl);
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch users, showing an empty list");
                self.adopt(Vec::new());
            }
        }
        &self.users
    }

    /// Replace the canonical collection and persist it.
    pub fn replace_all(&mut self, updated: Vec<UserRecord>) {
        self.adopt(updated);
        self.store.set(USERS_KEY, &self.users, self.ttl);
    }

    /// Look up one record for the detail view.
    ///
    /// The `selectedUser` cache answers directly when it holds the same id;
    /// otherwise the full collection is loaded and scanned.
    pub async fn get_by_id(&mut self, id: &str) -> Option<UserRecord> {
        if let Some(selected) = self.selected() {
            if selected.id == id {
                debug!(id, "Detail served from selected user cache");
                return Some(selected);
            }
        }

        self.load().await;
        let found = self.users.iter().find(|u| u.id == id).cloned();
        if found.is_none() {
            debug!(id, "User not found");
        }
        found
    }

    /// Remember `user` as the record the detail view will open.
    pub fn select(&self, user: &UserRecord) {
        self.store.set(SELECTED_USER_KEY, user, self.ttl);
    }

    /// Validate and select a record before navigating to its detail view.
    pub fn select_for_detail(&self, user: &UserRecord) -> Result<(), MutationError> {
        if !user.has_valid_id() {
            warn!(username = %user.username, "Cannot open a user without an id");
            return Err(MutationError::MissingIdentifier);
        }
        self.select(user);
        Ok(())
    }

    /// The cached detail-view record, if still valid.
    pub fn selected(&self) -> Option<UserRecord> {
        self.store.get(SELECTED_USER_KEY)
    }

    /// Drop both cache entries. The in-memory collection is left as is.
    pub fn clear_cache(&self) {
        self.store.remove(USERS_KEY);
        self.store.remove(SELECTED_USER_KEY);
    }

    /// Storage changes made by other contexts.
    pub fn subscribe(&self) -> StorageEvents {
        self.store.subscribe()
    }

    fn adopt(&mut self, users: Vec<UserRecord>) {
        self.users = dedupe_by_id(users);
        self.loaded = true;
    }
}

/// Keep the first record for each id. Records without an id are kept;
/// they cannot collide with anything addressable.
fn dedupe_by_id(users: Vec<UserRecord>) -> Vec<UserRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(users.len());
    let before = users.len();
    let deduped: Vec<UserRecord> = users
        .into_iter()
        .filter(|u| !u.has_valid_id() || seen.insert(u.id.clone()))
        .collect();
    if deduped.len() != before {
        warn!(dropped = before - deduped.len(), "Dropped users with duplicate ids");
    }
    deduped
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::source::FetchError;
    use crate::storage::{MemoryMedium, StorageMedium};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetch collaborator returning a fixed collection (or failing) and
    /// counting calls.
    pub(crate) struct FakeSource {
        users: Option<Vec<UserRecord>>,
        pub(crate) calls: AtomicUsize,
    }

    impl FakeSource {
        pub(crate) fn returning(users: Vec<UserRecord>) -> Arc<Self> {
            Arc::new(Self {
                users: Some(users),
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn failing() -> Arc<Self> {
            Arc::new(Self {
                users: None,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserSource for FakeSource {
        async fn fetch_users(&self) -> Result<Vec<UserRecord>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.users
                .clone()
                .ok_or_else(|| FetchError::ServerError("boom".to_string()))
        }
    }

    pub(crate) fn user(id: &str, status: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: format!("user{}", id),
            organization: "Lendsqr".to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn repo_with(
        medium: &MemoryMedium,
        source: Arc<FakeSource>,
    ) -> UserRepository {
        UserRepository::new(ExpiringStore::new(Arc::new(medium.clone())), source)
    }

    #[tokio::test]
    async fn test_load_fetches_and_caches_on_miss() {
        let medium = MemoryMedium::new();
        let u1 = user("1", "Active");
        let u2 = user("2", "Inactive");
        let source = FakeSource::returning(vec![u1.clone(), u2.clone()]);
        let mut repo = repo_with(&medium, source.clone());

        let loaded = repo.load().await.to_vec();
        assert_eq!(loaded, vec![u1.clone(), u2.clone()]);
        assert_eq!(
            repo.store().get::<Vec<UserRecord>>(USERS_KEY),
            Some(vec![u1, u2])
        );
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_load_prefers_cache() {
        let medium = MemoryMedium::new();
        let cached = vec![user("9", "Active")];
        let store = ExpiringStore::new(Arc::new(medium.clone()));
        store.set(USERS_KEY, &cached, Duration::hours(1));

        let source = FakeSource::returning(vec![user("1", "Active")]);
        let mut repo = repo_with(&medium, source.clone());

        assert_eq!(repo.load().await, cached.as_slice());
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cached_records_with_null_fields_are_kept() {
        let medium = MemoryMedium::new();
        let expiry = crate::storage::expiring::now_millis() + 60_000;
        medium
            .set_item(
                USERS_KEY,
                &format!(
                    r#"{{"value":[{{"id":"1"}},{{"id":"2","phone":null}}],"expiry":{}}}"#,
                    expiry
                ),
            )
            .unwrap();

        let source = FakeSource::returning(vec![user("9", "Active")]);
        let mut repo = repo_with(&medium, source.clone());

        let ids: Vec<String> = repo.load().await.iter().map(|u| u.id.clone()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_load_refetches_after_expiry() {
        let medium = MemoryMedium::new();
        let store = ExpiringStore::new(Arc::new(medium.clone()));
        store.set(USERS_KEY, &vec![user("9", "Active")], Duration::milliseconds(-1));

        let source = FakeSource::returning(vec![user("1", "Active")]);
        let mut repo = repo_with(&medium, source.clone());

        assert_eq!(repo.load().await[0].id, "1");
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty_and_caches_nothing() {
        let medium = MemoryMedium::new();
        let mut repo = repo_with(&medium, FakeSource::failing());

        assert!(repo.load().await.is_empty());
        assert!(repo.is_loaded());
        assert_eq!(medium.get_item(USERS_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_replace_all_persists() {
        let medium = MemoryMedium::new();
        let mut repo = repo_with(&medium, FakeSource::returning(vec![]));
        let updated = vec![user("1", "Blacklisted")];

        repo.replace_all(updated.clone());

        assert_eq!(repo.users(), updated.as_slice());
        assert_eq!(repo.store().get::<Vec<UserRecord>>(USERS_KEY), Some(updated));
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_dropped() {
        let medium = MemoryMedium::new();
        let first = user("1", "Active");
        let mut dup = user("1", "Inactive");
        dup.username = "impostor".to_string();
        let source = FakeSource::returning(vec![first.clone(), dup, user("2", "Active")]);
        let mut repo = repo_with(&medium, source);

        let loaded = repo.load().await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], first);
    }

    #[tokio::test]
    async fn test_get_by_id_uses_matching_selection() {
        let medium = MemoryMedium::new();
        let source = FakeSource::returning(vec![user("7", "Active")]);
        let mut repo = repo_with(&medium, source.clone());
        let selected = user("7", "Inactive");
        repo.select(&selected);

        assert_eq!(repo.get_by_id("7").await, Some(selected));
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_get_by_id_ignores_mismatched_selection() {
        let medium = MemoryMedium::new();
        let seven = user("7", "Active");
        let source = FakeSource::returning(vec![seven.clone(), user("8", "Active")]);
        let mut repo = repo_with(&medium, source.clone());
        repo.select(&user("9", "Blacklisted"));

        assert_eq!(repo.get_by_id("7").await, Some(seven));
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let medium = MemoryMedium::new();
        let mut repo = repo_with(&medium, FakeSource::returning(vec![user("1", "Active")]));
        assert_eq!(repo.get_by_id("404").await, None);
    }

    #[test]
    fn test_select_for_detail_requires_id() {
        let medium = MemoryMedium::new();
        let repo = repo_with(&medium, FakeSource::returning(vec![]));

        let result = repo.select_for_detail(&user("", "Active"));
        assert!(matches!(result, Err(MutationError::MissingIdentifier)));
        assert_eq!(medium.get_item(SELECTED_USER_KEY).unwrap(), None);

        repo.select_for_detail(&user("3", "Active")).unwrap();
        assert_eq!(repo.selected().map(|u| u.id), Some("3".to_string()));
    }

    #[test]
    fn test_clear_cache() {
        let medium = MemoryMedium::new();
        let mut repo = repo_with(&medium, FakeSource::returning(vec![]));
        repo.replace_all(vec![user("1", "Active")]);
        repo.select(&user("1", "Active"));

        repo.clear_cache();
        assert!(medium.keys().unwrap().is_empty());
        assert_eq!(repo.users().len(), 1);
    }
}
