//! Core of the Lendsqr admin dashboard.
//!
//! Owns the customer collection a dashboard view works from:
//!
//! - `storage`: expiring key-value cache over a shared medium
//! - `source`: where the collection is fetched from on a cache miss
//! - `repository`: the canonical collection and the `selectedUser` entry
//! - `projector`: search, filters and pagination over the collection
//! - `status`: status changes that persist and notify other views
//! - `sync`: reloads a view when another view rewrites the collection
//! - `summary`: headline counts
//!
//! Frontends (the `lendsqr` TUI) render what these return and route every
//! state change back through them.

pub mod config;
pub mod models;
pub mod projector;
pub mod repository;
pub mod source;
pub mod status;
pub mod storage;
pub mod summary;
pub mod sync;
pub mod utils;

pub use config::{Config, SourceLocation};
pub use models::{UserRecord, UserStatus};
pub use projector::{FilterCriteria, ListState, PageLink, PageSize, Projection};
pub use repository::{UserRepository, SELECTED_USER_KEY, USERS_KEY};
pub use status::{apply_status_change, available_transitions, change_status, MutationError};
pub use storage::{ExpiringStore, FileMedium, MemoryMedium, StorageMedium};
pub use summary::UserSummary;
pub use sync::CrossViewSync;
