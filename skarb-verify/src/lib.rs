//! # Skarb Verify
//!
//! Database-side verification for the Skarb end-to-end suite. Test cases drive the
//! web application, then use this crate to read back what the application
//! actually persisted.
//!
//! ## Module Organization
//!
//! - `db`: connection settings, the single-connection [`DbSession`], fixture schema
//! - `models`: `users` and `tasks` rows with parameterised statements
//! - `verify`: the [`Verifier`] predicates, assertions and mutators, plus retry policy
//! - `auth`: password hashing for accounts seeded without the UI
//! - `error`: infrastructure vs. assertion error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod verify;

pub use db::connection::ConnectionConfig;
pub use db::session::DbSession;
pub use error::{VerifyError, VerifyResult};
pub use verify::Verifier;

/// Current version of the verification library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
