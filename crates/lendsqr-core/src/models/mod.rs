//! Data models for Lendsqr customer records.
//!
//! - `UserRecord`: a customer with contact details, account flags and
//!   nested `Profile`, `Education`, `Socials` and `Guarantor` records
//! - `UserStatus`: typed view over the stored status string

pub mod user;

pub use user::{Education, Guarantor, Profile, Socials, UserRecord, UserStatus};
