//! Status transitions for user records.
//!
//! `change_status` is the pure transform. `apply_status_change` is what the
//! list and detail views call: it computes the new collection, persists it,
//! refreshes the `selectedUser` entry when it is the record being changed,
//! and lets the storage write notify other open views.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{UserRecord, UserStatus};
use crate::repository::UserRepository;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("User record has no id")]
    MissingIdentifier,
}

/// Copy of `users` with the record `target_id` moved to `new_status`.
///
/// An unknown id returns an identical collection.
pub fn change_status(
    users: &[UserRecord],
    target_id: &str,
    new_status: &UserStatus,
) -> Vec<UserRecord> {
    users
        .iter()
        .map(|u| {
            if u.id == target_id {
                u.with_status(new_status)
            } else {
                u.clone()
            }
        })
        .collect()
}

/// Statuses a record in `current` can move to.
///
/// The two canonical statuses other than the current one; all three when
/// the current status is not recognised.
pub fn available_transitions(current: &UserStatus) -> Vec<UserStatus> {
    UserStatus::CANONICAL
        .iter()
        .filter(|s| *s != current)
        .cloned()
        .collect()
}

/// Change one record's status everywhere it is held.
///
/// Returns the updated record, `Ok(None)` when no collection or selection
/// holds `target_id`, and `MissingIdentifier` for a blank id (nothing is
/// touched in that case).
pub async fn apply_status_change(
    repo: &mut UserRepository,
    target_id: &str,
    new_status: &UserStatus,
) -> Result<Option<UserRecord>, MutationError> {
    if target_id.trim().is_empty() {
        warn!(status = %new_status, "Refusing status change for a user without an id");
        return Err(MutationError::MissingIdentifier);
    }

    if !repo.is_loaded() {
        repo.load().await;
    }

    let updated_users = change_status(repo.users(), target_id, new_status);
    let mut updated = updated_users.iter().find(|u| u.id == target_id).cloned();
    if updated.is_some() {
        repo.replace_all(updated_users);
    }

    if let Some(selected) = repo.selected().filter(|s| s.id == target_id) {
        let refreshed = updated.clone().unwrap_or_else(|| selected.with_status(new_status));
        repo.select(&refreshed);
        updated.get_or_insert(refreshed);
    }

    match &updated {
        Some(user) => info!(id = %user.id, status = %new_status, "User status changed"),
        None => debug!(id = target_id, "Status change target not found"),
    }
    Ok(updated)
}
