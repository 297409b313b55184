/// End-to-end scenarios
///
/// Each scenario drives the application through an [`Application`] and then
/// reads back what was persisted with a [`Verifier`]. A scenario returns its
/// [`ScenarioReport`] on success; the first failed check ends it with a
/// [`ScenarioError`] that says whether the application, the database checks or
/// the expectation itself failed.
///
/// | Scenario | Flow |
/// |---|---|
/// | [`seed_volunteer_without_browser`] | absent, insert, present |
/// | [`list_recent_users`] | newest users, at most `limit` |
/// | [`sign_in_after_confirming_email`] | register, confirm, sign in, sign out |
/// | [`volunteer_registration_persists`] | register, exists, names |
/// | [`partner_registration_persists`] | register, exists, names, position, organization |
/// | [`ngo_registration_and_approval`] | register, exists, approve |
/// | [`task_lifecycle`] | NGO creates a task, data and status checks, completion |

use crate::app::{AppError, Application};
use crate::config::Credentials;
use crate::fixtures::{Ngo, Partner, TaskDraft, Volunteer};
use crate::report::ScenarioReport;
use skarb_verify::models::task::TaskStatus;
use skarb_verify::models::user::{Sex, UserStatus};
use skarb_verify::{VerifyError, Verifier};
use tracing::info;

/// Scenario error types
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// A database check failed or could not run
    #[error("Verification failed: {0}")]
    Verify(#[from] VerifyError),

    /// The application refused an action
    #[error("Application error: {0}")]
    App(#[from] AppError),

    /// An expectation about the run did not hold
    #[error("Assertion failed: {0}")]
    Assertion(String),
}

/// Scenario result type alias
pub type ScenarioResult<T> = Result<T, ScenarioError>;

fn ensure(condition: bool, message: impl FnOnce() -> String) -> ScenarioResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Assertion(message()))
    }
}

/// Adds a volunteer straight to the database and checks it is there
pub async fn seed_volunteer_without_browser(verifier: &Verifier<'_>) -> ScenarioResult<ScenarioReport> {
    let mut report = ScenarioReport::new("seed_volunteer_without_browser", "database");
    let volunteer = Volunteer::generate();

    ensure(verifier.user_absent(&volunteer.email).await?, || {
        format!(
            "Volunteer with email {} already exists; two users cannot share an email",
            volunteer.email
        )
    })?;

    let mut user = volunteer
        .to_new_user()
        .map_err(VerifyError::from)?
        .with_status(UserStatus::Active);
    user.sex = Some(Sex::Female);

    verifier.insert_user(&user).await?;
    report.step("Inserted a new volunteer into the database");

    ensure(verifier.user_exists(&volunteer.email).await?, || {
        format!("No volunteer with email {} after insertion", volunteer.email)
    })?;
    report.step("Volunteer is present in the database");

    Ok(report.finish())
}

/// Lists the newest users
pub async fn list_recent_users(verifier: &Verifier<'_>, limit: i64) -> ScenarioResult<ScenarioReport> {
    let mut report = ScenarioReport::new("list_recent_users", "database");

    let users = verifier.recent_users(limit).await?;
    for user in &users {
        info!(
            id = user.id,
            email = %user.email,
            role = %user.role,
            status = %user.status,
            created = %user.created_date,
            "User"
        );
    }

    ensure(users.len() as i64 <= limit, || {
        format!("Expected at most {} rows, got {}", limit, users.len())
    })?;
    ensure(users.windows(2).all(|pair| pair[0].id > pair[1].id), || {
        "Users are not ordered newest first".to_string()
    })?;
    report.step(format!("Listed {} of at most {} newest users", users.len(), limit));

    Ok(report.finish())
}

/// Registers a volunteer, confirms the email in the database, signs in and out
pub async fn sign_in_after_confirming_email<A: Application>(
    app: &mut A,
    verifier: &Verifier<'_>,
) -> ScenarioResult<ScenarioReport> {
    let mut report = ScenarioReport::new("sign_in_after_confirming_email", app.name());
    let volunteer = Volunteer::generate();

    app.register_volunteer(&volunteer).await?;
    report.step("Volunteer registration submitted");

    match app.sign_in(&volunteer.email, &volunteer.password).await {
        Err(AppError::SignInRejected { .. }) => {}
        Ok(()) => {
            return Err(ScenarioError::Assertion(
                "Unconfirmed volunteer was able to sign in".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    }
    report.step("Sign-in refused before email confirmation");

    ensure(verifier.confirm_user_email(&volunteer.email).await?, || {
        format!("No user with email {} to confirm", volunteer.email)
    })?;
    report.step("Email confirmed in the database");

    app.sign_in(&volunteer.email, &volunteer.password).await?;
    report.step("Volunteer signed in");

    app.sign_out().await?;
    report.step("Volunteer signed out");

    Ok(report.finish())
}

/// Registers a volunteer and checks the stored names
pub async fn volunteer_registration_persists<A: Application>(
    app: &mut A,
    verifier: &Verifier<'_>,
) -> ScenarioResult<ScenarioReport> {
    let mut report = ScenarioReport::new("volunteer_registration_persists", app.name());
    let volunteer = Volunteer::generate();

    app.register_volunteer(&volunteer).await?;
    report.step("Volunteer registration submitted");

    verifier.wait_for_user(&volunteer.email).await?;
    report.step("Volunteer is present in the database");

    verifier.assert_user_first_name(&volunteer.email, &volunteer.first_name).await?;
    verifier.assert_user_last_name(&volunteer.email, &volunteer.last_name).await?;
    report.step("Volunteer data in the database is correct");

    Ok(report.finish())
}

/// Registers a partner and checks names, position and organization
pub async fn partner_registration_persists<A: Application>(
    app: &mut A,
    verifier: &Verifier<'_>,
) -> ScenarioResult<ScenarioReport> {
    let mut report = ScenarioReport::new("partner_registration_persists", app.name());
    let partner = Partner::generate();

    app.register_partner(&partner).await?;
    report.step("Partner registration submitted");

    verifier.wait_for_user(&partner.email).await?;
    report.step("Partner is present in the database");

    verifier.assert_user_first_name(&partner.email, &partner.first_name).await?;
    verifier.assert_user_last_name(&partner.email, &partner.last_name).await?;
    verifier.assert_user_position(&partner.email, &partner.position).await?;
    verifier
        .assert_partner_organization_name(&partner.email, &partner.organization_name)
        .await?;
    report.step("Partner data in the database is correct");

    Ok(report.finish())
}

/// Registers an NGO and approves it
pub async fn ngo_registration_and_approval<A: Application>(
    app: &mut A,
    verifier: &Verifier<'_>,
) -> ScenarioResult<ScenarioReport> {
    let mut report = ScenarioReport::new("ngo_registration_and_approval", app.name());
    let ngo = Ngo::generate();

    app.register_ngo(&ngo).await?;
    report.step("NGO registration submitted");

    verifier.wait_for_user(&ngo.email).await?;
    report.step("NGO is present in the database");

    ensure(verifier.approve_ngo(&ngo.email).await?, || {
        format!("NGO with email {} was not approved", ngo.email)
    })?;
    report.step("NGO approved in the database");

    Ok(report.finish())
}

/// Registers, confirms and approves a fresh NGO account
///
/// For runs without a pre-provisioned NGO login.
pub async fn provision_ngo<A: Application>(app: &mut A, verifier: &Verifier<'_>) -> ScenarioResult<Credentials> {
    let ngo = Ngo::generate();

    app.register_ngo(&ngo).await?;
    verifier.wait_for_user(&ngo.email).await?;

    ensure(verifier.confirm_user_email(&ngo.email).await?, || {
        format!("No NGO with email {} to confirm", ngo.email)
    })?;
    ensure(verifier.approve_ngo(&ngo.email).await?, || {
        format!("NGO with email {} was not approved", ngo.email)
    })?;

    info!(email = %ngo.email, "Provisioned NGO account");
    Ok(Credentials {
        login: ngo.email,
        password: ngo.password,
    })
}

/// An NGO creates a task; its data and status are checked and it is completed
pub async fn task_lifecycle<A: Application>(
    app: &mut A,
    verifier: &Verifier<'_>,
    ngo: &Credentials,
) -> ScenarioResult<ScenarioReport> {
    let mut report = ScenarioReport::new("task_lifecycle", app.name());

    app.sign_in(&ngo.login, &ngo.password).await?;
    report.step("NGO signed in");

    let draft = TaskDraft::generate();
    app.create_task(&draft).await?;
    report.step("Task created and published");

    verifier.wait_for_task(&draft.name).await?;
    report.step("Task is present in the database");

    verifier
        .assert_task_data(
            &draft.name,
            &draft.description,
            &draft.expected_outcome,
            &draft.volunteer_benefit,
        )
        .await?;
    report.step("Task data in the database is correct");

    let before = verifier.current_task_status(&draft.name).await?;
    report.step(format!(
        "Current task status in the database: {}",
        before.as_deref().unwrap_or("NULL")
    ));

    let target = TaskStatus::Completed;
    ensure(verifier.set_task_status(&draft.name, target).await?, || {
        format!("No task named {} to update", draft.name)
    })?;
    report.step(format!("Set task status in the database to {}", target));

    let after = verifier.current_task_status(&draft.name).await?;
    report.step(format!(
        "Current task status in the database: {}",
        after.as_deref().unwrap_or("NULL")
    ));

    ensure(after.as_deref() == Some(target.as_str()), || {
        format!("Expected status {}, found {:?}", target, after)
    })?;
    ensure(before != after, || {
        format!("Status did not change (still {:?})", after)
    })?;

    app.sign_out().await?;
    report.step("NGO signed out");

    Ok(report.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure() {
        assert!(ensure(true, || unreachable!()).is_ok());

        let err = ensure(false, || "Users are not ordered newest first".to_string()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Assertion failed: Users are not ordered newest first"
        );
    }

    #[test]
    fn test_error_sources_are_kept_apart() {
        let verify: ScenarioError = VerifyError::SessionClosed.into();
        assert!(matches!(verify, ScenarioError::Verify(_)));

        let app: ScenarioError = AppError::NotSignedIn.into();
        assert!(matches!(app, ScenarioError::App(_)));
    }
}
