/// Business-level assertions against the application's database
///
/// A [`Verifier`] borrows a [`DbSession`] and turns questions a test asks
/// ("does this user exist?", "was the last name stored as typed?", "is the task
/// completed?") into parameterised statements.
///
/// Three kinds of answers come back:
///
/// - predicates (`user_exists`, `task_exists`, ...) return `bool`; a missing key is
///   simply `false`, never an error
/// - assertions (`assert_user_first_name`, `assert_task_data`, ...) return `()`
///   or an assertion error naming entity, key and field
/// - mutators (`confirm_user_email`, `approve_ngo`, `set_task_status`) return
///   whether a row was changed
///
/// Statement failures surface as `VerifyError::Query`, kept apart from
/// assertion failures so reports show which side broke.
///
/// # Example
///
/// ```no_run
/// use skarb_verify::db::connection::ConnectionConfig;
/// use skarb_verify::db::session::DbSession;
/// use skarb_verify::models::task::TaskStatus;
/// use skarb_verify::verify::Verifier;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = DbSession::connect(ConnectionConfig::from_env()?).await?;
/// let verifier = Verifier::new(&session);
///
/// assert!(verifier.user_exists("jane.doe+test1@example.com").await?);
/// verifier.assert_user_first_name("jane.doe+test1@example.com", "Jane").await?;
///
/// verifier.set_task_status("Paint the shelter fence", TaskStatus::Completed).await?;
/// assert_eq!(
///     verifier.current_task_status("Paint the shelter fence").await?.as_deref(),
///     Some("COMPLETED")
/// );
///
/// session.close().await?;
/// # Ok(())
/// # }
/// ```

pub mod retry;

use crate::db::session::DbSession;
use crate::error::{Entity, VerifyError, VerifyResult};
use crate::models::task::{Task, TaskStatus};
use crate::models::user::{NewUser, User, UserField, UserStatus};
use retry::{wait_until, RetryPolicy};
use tracing::{debug, info, warn};

/// Database verification helper
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'s> {
    session: &'s DbSession,
    retry: RetryPolicy,
}

impl<'s> Verifier<'s> {
    /// Creates a verifier that checks every condition exactly once
    pub fn new(session: &'s DbSession) -> Self {
        Self {
            session,
            retry: RetryPolicy::none(),
        }
    }

    /// Uses `policy` for the `wait_for_*` operations
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// The session this verifier reads through
    pub fn session(&self) -> &'s DbSession {
        self.session
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    /// Number of `users` rows with this email
    pub async fn user_count(&self, email: &str) -> VerifyResult<i64> {
        let mut conn = self.session.connection().await?;
        let count = User::count_by_email(&mut conn, email)
            .await
            .map_err(VerifyError::query("user_count"))?;

        debug!(email, count, "Counted users by email");
        Ok(count)
    }

    /// True iff no user has this email
    ///
    /// Precondition check before inserting a user by hand.
    pub async fn user_absent(&self, email: &str) -> VerifyResult<bool> {
        Ok(self.user_count(email).await? == 0)
    }

    /// True iff at least one user has this email
    pub async fn user_exists(&self, email: &str) -> VerifyResult<bool> {
        Ok(self.user_count(email).await? > 0)
    }

    /// Polls [`user_exists`](Self::user_exists) under the verifier's retry policy
    pub async fn wait_for_user(&self, email: &str) -> VerifyResult<()> {
        let what = format!("user `{}`", email);
        wait_until(self.retry, &what, || self.user_exists(email)).await
    }

    /// Inserts a user after checking the email is free
    ///
    /// # Errors
    ///
    /// `VerifyError::DuplicateEmail` if the email is already present, including
    /// when another session inserts it between the check and the insert.
    pub async fn insert_user(&self, data: &NewUser) -> VerifyResult<User> {
        if !self.user_absent(&data.email).await? {
            return Err(VerifyError::DuplicateEmail(data.email.clone()));
        }

        let mut conn = self.session.connection().await?;
        let user = User::insert(&mut conn, data).await.map_err(|e| {
            if is_email_taken(&e) {
                warn!(email = %data.email, "Email taken by a concurrent insert");
                VerifyError::DuplicateEmail(data.email.clone())
            } else {
                VerifyError::query("insert_user")(e)
            }
        })?;

        info!(email = %user.email, role = %user.role, id = user.id, "Inserted user");
        Ok(user)
    }

    /// Marks the user's email as confirmed by activating the account
    ///
    /// Stands in for clicking the link in the confirmation email. Returns true if
    /// a row was updated.
    pub async fn confirm_user_email(&self, email: &str) -> VerifyResult<bool> {
        let mut conn = self.session.connection().await?;
        let updated = User::set_status_by_email(&mut conn, email, UserStatus::Active)
            .await
            .map_err(VerifyError::query("confirm_user_email"))?;

        info!(email, updated, "Confirmed user email");
        Ok(updated)
    }

    /// Asserts the stored first name equals `expected` byte for byte
    pub async fn assert_user_first_name(&self, email: &str, expected: &str) -> VerifyResult<()> {
        self.assert_user_field(email, UserField::FirstName, expected).await
    }

    /// Asserts the stored last name equals `expected` byte for byte
    pub async fn assert_user_last_name(&self, email: &str, expected: &str) -> VerifyResult<()> {
        self.assert_user_field(email, UserField::LastName, expected).await
    }

    /// Asserts the stored position in the organization equals `expected`
    pub async fn assert_user_position(&self, email: &str, expected: &str) -> VerifyResult<()> {
        self.assert_user_field(email, UserField::Position, expected).await
    }

    /// Asserts the stored organization name of a partner equals `expected`
    pub async fn assert_partner_organization_name(&self, email: &str, expected: &str) -> VerifyResult<()> {
        self.assert_user_field(email, UserField::OrganizationName, expected).await
    }

    async fn assert_user_field(&self, email: &str, field: UserField, expected: &str) -> VerifyResult<()> {
        let stored = {
            let mut conn = self.session.connection().await?;
            User::field_by_email(&mut conn, email, field)
                .await
                .map_err(VerifyError::query("assert_user_field"))?
        };

        let actual = stored.ok_or_else(|| VerifyError::Missing {
            entity: Entity::User,
            key: email.to_string(),
        })?;

        check_field(Entity::User, email, field.column(), expected, actual)
    }

    /// Approves an NGO account
    ///
    /// Returns true if an NGO with this email was found and flagged; false for
    /// unknown emails and for users with another role.
    pub async fn approve_ngo(&self, email: &str) -> VerifyResult<bool> {
        let mut conn = self.session.connection().await?;
        let approved = User::approve_ngo_by_email(&mut conn, email)
            .await
            .map_err(VerifyError::query("approve_ngo"))?;

        info!(email, approved, "Approved NGO");
        Ok(approved)
    }

    /// Newest users first, at most `limit`
    pub async fn recent_users(&self, limit: i64) -> VerifyResult<Vec<User>> {
        let mut conn = self.session.connection().await?;
        User::recent(&mut conn, limit)
            .await
            .map_err(VerifyError::query("recent_users"))
    }

    // ---------------------------------------------------------------------
    // Tasks
    // ---------------------------------------------------------------------

    /// True iff at least one task has this name
    pub async fn task_exists(&self, name: &str) -> VerifyResult<bool> {
        let mut conn = self.session.connection().await?;
        let count = Task::count_by_name(&mut conn, name)
            .await
            .map_err(VerifyError::query("task_exists"))?;

        debug!(name, count, "Counted tasks by name");
        Ok(count > 0)
    }

    /// Polls [`task_exists`](Self::task_exists) under the verifier's retry policy
    pub async fn wait_for_task(&self, name: &str) -> VerifyResult<()> {
        let what = format!("task `{}`", name);
        wait_until(self.retry, &what, || self.task_exists(name)).await
    }

    /// Asserts the task's free-text fields match what was typed into the form
    ///
    /// Fields are compared in form order; the first difference is reported.
    pub async fn assert_task_data(
        &self,
        name: &str,
        description: &str,
        expected_outcome: &str,
        volunteer_benefit: &str,
    ) -> VerifyResult<()> {
        let task = {
            let mut conn = self.session.connection().await?;
            Task::find_by_name(&mut conn, name)
                .await
                .map_err(VerifyError::query("assert_task_data"))?
        };

        let task = task.ok_or_else(|| VerifyError::Missing {
            entity: Entity::Task,
            key: name.to_string(),
        })?;

        check_field(Entity::Task, name, "description", description, Some(task.description))?;
        check_field(Entity::Task, name, "expected_outcome", expected_outcome, Some(task.expected_outcome))?;
        check_field(Entity::Task, name, "volunteer_benefit", volunteer_benefit, Some(task.volunteer_benefit))
    }

    /// Raw status of the task, `None` if no task has this name
    pub async fn current_task_status(&self, name: &str) -> VerifyResult<Option<String>> {
        let mut conn = self.session.connection().await?;
        let status = Task::status_by_name(&mut conn, name)
            .await
            .map_err(VerifyError::query("current_task_status"))?;

        debug!(name, status = ?status, "Read task status");
        Ok(status)
    }

    /// Overwrites the task's status, bypassing the application
    ///
    /// Simulates a status change for tests. Returns true if a row was updated.
    pub async fn set_task_status(&self, name: &str, status: TaskStatus) -> VerifyResult<bool> {
        let mut conn = self.session.connection().await?;
        let updated = Task::set_status_by_name(&mut conn, name, status)
            .await
            .map_err(VerifyError::query("set_task_status"))?;

        info!(name, status = %status, updated, "Set task status");
        Ok(updated)
    }
}

/// Unique constraint on `users.email`
const USERS_EMAIL_KEY: &str = "users_email_key";

fn is_email_taken(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|e| e.is_unique_violation() && e.constraint() == Some(USERS_EMAIL_KEY))
}

fn check_field(
    entity: Entity,
    key: &str,
    field: &'static str,
    expected: &str,
    actual: Option<String>,
) -> VerifyResult<()> {
    if actual.as_deref() == Some(expected) {
        return Ok(());
    }

    Err(VerifyError::Mismatch {
        entity,
        key: key.to_string(),
        field,
        expected: expected.to_string(),
        actual,
    })
}
