/// Error taxonomy for database verification
///
/// Failures fall into two families that test reports must keep apart:
///
/// - **Infrastructure**: the verification machinery itself broke (cannot connect,
///   session already closed, a statement failed). The checked state is unknown.
/// - **Assertion**: the database was read successfully but does not hold what the
///   test expected (missing row, different field value, duplicate email).
///
/// # Example
///
/// ```
/// use skarb_verify::error::{Entity, VerifyError};
///
/// let err = VerifyError::Mismatch {
///     entity: Entity::User,
///     key: "jane@example.com".to_string(),
///     field: "first_name",
///     expected: "Jane".to_string(),
///     actual: Some("Janet".to_string()),
/// };
///
/// assert!(err.is_assertion());
/// assert!(!err.is_infrastructure());
/// ```

use crate::auth::password::PasswordError;
use std::fmt;

/// Verification result type alias
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Kind of row a check was keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// Row in `users`, keyed by email
    User,

    /// Row in `tasks`, keyed by name
    Task,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User => write!(f, "user"),
            Entity::Task => write!(f, "task"),
        }
    }
}

/// Unified verification error
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The database connection could not be established
    #[error("Database setup failed: {0}")]
    Setup(String),

    /// Configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// The session was closed before the check ran
    #[error("Database session is closed")]
    SessionClosed,

    /// A statement failed to execute
    #[error("Query `{operation}` failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Password hashing for a seeded account failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// No row exists for the key of a field assertion
    #[error("No {entity} found for `{key}`")]
    Missing { entity: Entity, key: String },

    /// A stored field differs from the expected value
    #[error(
        "{entity} `{key}`: {field} mismatch (expected {expected:?}, found {})",
        render_actual(.actual)
    )]
    Mismatch {
        entity: Entity,
        key: String,
        field: &'static str,
        expected: String,
        actual: Option<String>,
    },

    /// A user with this email is already present
    #[error("User with email `{0}` already exists; refusing to insert a duplicate")]
    DuplicateEmail(String),

    /// A polled condition never became true
    #[error("{what} not observed after {attempts} attempt(s)")]
    Timeout { what: String, attempts: u32 },
}

fn render_actual(actual: &Option<String>) -> String {
    match actual {
        Some(value) => format!("{:?}", value),
        None => "NULL".to_string(),
    }
}

impl VerifyError {
    /// Builds a mapper that tags a sqlx error with the failing operation
    pub fn query(operation: &'static str) -> impl FnOnce(sqlx::Error) -> VerifyError {
        move |source| VerifyError::Query { operation, source }
    }

    /// True when the database state contradicts the test's expectation
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            VerifyError::Missing { .. }
                | VerifyError::Mismatch { .. }
                | VerifyError::DuplicateEmail(_)
                | VerifyError::Timeout { .. }
        )
    }

    /// True when the verification machinery itself failed
    pub fn is_infrastructure(&self) -> bool {
        !self.is_assertion()
    }
}
