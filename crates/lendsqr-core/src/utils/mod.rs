//! Utility functions for string formatting and manipulation.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    format_balance, format_count, format_joined_long, format_joined_short, format_remaining,
    parse_joined, truncate_string,
};

/// Case-insensitive substring test. `needle` must already be lowercased.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
