//! Keeps a view's collection in step with writes made by other views.
//!
//! A `CrossViewSync` holds a storage subscription taken from the view's own
//! repository, so writes made through that repository never trigger it.
//! When another context rewrites `users`, the view reloads through the
//! cache-read path of [`UserRepository::load`].

use tracing::debug;

use crate::repository::{UserRepository, USERS_KEY};
use crate::storage::StorageEvents;

pub struct CrossViewSync {
    events: StorageEvents,
}

impl CrossViewSync {
    /// Start listening for changes made outside `repo`'s context.
    /// Dropping the returned value ends the subscription.
    pub fn subscribe(repo: &UserRepository) -> Self {
        Self {
            events: repo.subscribe(),
        }
    }

    /// Drain queued notifications and report whether any touched `users`.
    pub fn has_pending(&mut self) -> bool {
        let mut pending = false;
        while let Some(event) = self.events.try_next() {
            if event.key == USERS_KEY {
                pending = true;
            }
        }
        pending
    }

    /// Wait until another context changes `users`.
    /// Returns `false` once the medium has gone away.
    pub async fn changed(&mut self) -> bool {
        while let Some(event) = self.events.next().await {
            if event.key == USERS_KEY {
                return true;
            }
        }
        false
    }

    /// Reload `repo` if another context changed `users` since the last call.
    /// Returns whether a reload happened.
    pub async fn sync(&mut self, repo: &mut UserRepository) -> bool {
        if !self.has_pending() {
            return false;
        }
        let count = repo.load().await.len();
        debug!(count, "Reloaded users after external change");
        true
    }
}
