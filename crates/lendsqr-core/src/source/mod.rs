//! Fetch collaborators for the initial user collection.
//!
//! `UserSource` is the seam; `HttpUserSource` serves the mock resource over
//! HTTP and `FileUserSource` reads it from disk. Failures are `FetchError`s,
//! which the repository logs and turns into an empty collection.

pub mod client;
pub mod error;

pub use client::{parse_user_array, FileUserSource, HttpUserSource, UserSource};
pub use error::FetchError;
