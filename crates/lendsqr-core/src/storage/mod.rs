//! Expiring key-value cache over a persistent medium.
//!
//! - `ExpiringStore`: get/set/cleanup where every value carries an expiry
//! - `StorageMedium`: the key-value medium itself, with `MemoryMedium`
//!   (in-process, one handle per view) and `FileMedium` (a cache directory
//!   shared between processes)
//! - `StorageEvents`: notifications of writes made by other contexts

pub mod error;
pub mod expiring;
pub mod file;
pub mod medium;

pub use error::{Result, StorageError};
pub use expiring::{CacheEntry, ExpiringStore};
pub use file::FileMedium;
pub use medium::{MemoryMedium, Origin, StorageEvent, StorageEvents, StorageMedium};
