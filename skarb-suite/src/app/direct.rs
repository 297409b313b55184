/// Database-backed application driver
///
/// Performs each form submission as the application would persist it, without a
/// browser: registrations become `UNCONFIRMED` users, sign-in checks status and
/// the Argon2 hash, and task creation writes a `PENDING` task with its stages.
/// Form-level validation uses the same `validator` rules as the fixtures.

use crate::app::{AppError, AppResult, Application};
use crate::fixtures::{Ngo, Partner, TaskDraft, Volunteer};
use async_trait::async_trait;
use skarb_verify::auth::password::{validate_password_strength, verify_password};
use skarb_verify::models::task::Task;
use skarb_verify::models::user::{NewUser, User, UserRole, UserStatus};
use skarb_verify::{DbSession, VerifyError, Verifier};
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

/// Drives the application through its database
#[derive(Debug)]
pub struct DirectApplication {
    session: Arc<DbSession>,
    signed_in: Option<User>,
}

impl DirectApplication {
    pub fn new(session: Arc<DbSession>) -> Self {
        Self {
            session,
            signed_in: None,
        }
    }

    /// The user currently signed in, if any
    pub fn current_user(&self) -> Option<&User> {
        self.signed_in.as_ref()
    }

    async fn register(&self, form: &impl Validate, password: &str, user: NewUser) -> AppResult<()> {
        form.validate()
            .map_err(|e| AppError::RegistrationRejected(e.to_string()))?;
        validate_password_strength(password).map_err(AppError::RegistrationRejected)?;

        let role = user.role;
        match Verifier::new(&self.session).insert_user(&user).await {
            Ok(stored) => {
                info!(email = %stored.email, role = %role, "Registration submitted");
                Ok(())
            }
            Err(VerifyError::DuplicateEmail(email)) => {
                warn!(email = %email, "Registration refused: email taken");
                Err(AppError::RegistrationRejected(format!(
                    "A user with email {} already exists",
                    email
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Application for DirectApplication {
    fn name(&self) -> &str {
        "direct"
    }

    async fn register_volunteer(&mut self, volunteer: &Volunteer) -> AppResult<()> {
        let user = volunteer.to_new_user().map_err(VerifyError::from)?;
        self.register(volunteer, &volunteer.password, user).await
    }

    async fn register_partner(&mut self, partner: &Partner) -> AppResult<()> {
        let user = partner.to_new_user().map_err(VerifyError::from)?;
        self.register(partner, &partner.password, user).await
    }

    async fn register_ngo(&mut self, ngo: &Ngo) -> AppResult<()> {
        let user = ngo.to_new_user().map_err(VerifyError::from)?;
        self.register(ngo, &ngo.password, user).await
    }

    async fn sign_in(&mut self, login: &str, password: &str) -> AppResult<()> {
        let user = {
            let mut conn = self.session.connection().await?;
            User::find_by_email(&mut conn, login)
                .await
                .map_err(VerifyError::query("sign_in"))?
        };

        let rejected = |reason: &str| AppError::SignInRejected {
            login: login.to_string(),
            reason: reason.to_string(),
        };

        let user = user.ok_or_else(|| rejected("unknown login"))?;

        if user.status() != Some(UserStatus::Active) {
            debug!(login, status = %user.status, "Sign-in refused for inactive account");
            return Err(rejected("account is not active"));
        }

        if !verify_password(password, &user.password).map_err(VerifyError::from)? {
            return Err(rejected("wrong password"));
        }

        info!(login, role = %user.role, "Signed in");
        self.signed_in = Some(user);
        Ok(())
    }

    async fn sign_out(&mut self) -> AppResult<()> {
        let user = self.signed_in.take().ok_or(AppError::NotSignedIn)?;
        info!(login = %user.email, "Signed out");
        Ok(())
    }

    async fn create_task(&mut self, draft: &TaskDraft) -> AppResult<()> {
        let user = self.signed_in.as_ref().ok_or(AppError::NotSignedIn)?;

        if user.role() != Some(UserRole::Ngo) {
            return Err(AppError::TaskRejected(format!(
                "{} may not create tasks",
                user.role
            )));
        }

        draft
            .validate_all()
            .map_err(|e| AppError::TaskRejected(e.to_string()))?;

        let task = {
            let mut conn = self.session.connection().await?;
            Task::insert(&mut conn, &draft.to_new_task(Some(user.id)))
                .await
                .map_err(VerifyError::query("create_task"))?
        };

        info!(name = %task.name, id = task.id, stages = draft.stages.len(), "Task created and published");
        Ok(())
    }
}
