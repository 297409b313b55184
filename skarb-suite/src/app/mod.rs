/// The application under test, as scenarios see it
///
/// Scenarios never talk to pages or endpoints directly. They call an
/// [`Application`], the seam where a browser-driving implementation (page
/// objects clicking through the UI) or the database-backed
/// [`DirectApplication`] plugs in.
///
/// # Contract
///
/// All implementations must:
/// 1. Persist a registration as an `UNCONFIRMED` account before returning `Ok`
/// 2. Refuse sign-in for accounts that are not `ACTIVE` or whose password differs
/// 3. Refuse task creation unless an NGO is signed in
/// 4. Persist a created task (and its stages) as `PENDING` before returning `Ok`
///
/// # Example
///
/// ```no_run
/// use skarb_suite::app::{Application, DirectApplication};
/// use skarb_suite::fixtures::Volunteer;
/// use skarb_verify::DbSession;
/// use std::sync::Arc;
///
/// # async fn example(session: Arc<DbSession>) -> Result<(), Box<dyn std::error::Error>> {
/// let mut app = DirectApplication::new(session);
/// let volunteer = Volunteer::generate();
///
/// app.register_volunteer(&volunteer).await?;
/// # Ok(())
/// # }
/// ```

pub mod direct;

pub use direct::DirectApplication;

use crate::fixtures::{Ngo, Partner, TaskDraft, Volunteer};
use async_trait::async_trait;
use skarb_verify::VerifyError;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The registration form did not accept the data
    #[error("Registration rejected: {0}")]
    RegistrationRejected(String),

    /// Login failed
    #[error("Sign-in rejected for `{login}`: {reason}")]
    SignInRejected { login: String, reason: String },

    /// The action needs a signed-in user
    #[error("No user is signed in")]
    NotSignedIn,

    /// The task form did not accept the data
    #[error("Task rejected: {0}")]
    TaskRejected(String),

    /// Talking to the database failed
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// Application result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Driver for the Skarb web application
#[async_trait]
pub trait Application: Send + Sync {
    /// Short driver name, used in reports
    fn name(&self) -> &str;

    /// Fills and submits the volunteer registration form
    async fn register_volunteer(&mut self, volunteer: &Volunteer) -> AppResult<()>;

    /// Fills and submits the partner registration form
    async fn register_partner(&mut self, partner: &Partner) -> AppResult<()>;

    /// Fills and submits the NGO registration form
    async fn register_ngo(&mut self, ngo: &Ngo) -> AppResult<()>;

    /// Signs in with the given login (email) and password
    async fn sign_in(&mut self, login: &str, password: &str) -> AppResult<()>;

    /// Signs out the current user
    ///
    /// # Errors
    ///
    /// `AppError::NotSignedIn` when nobody is signed in.
    async fn sign_out(&mut self) -> AppResult<()>;

    /// Fills and publishes the "task for volunteers" form
    async fn create_task(&mut self, draft: &TaskDraft) -> AppResult<()>;
}
