//! Shared error plumbing.
//!
//! Every module boundary owns its own `thiserror` enum; this trait gives each
//! of them a grepable code and a retry hint so hosts can log and surface
//! failures uniformly.

/// Grepable error code and retryable flag for user-facing error reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
