/// Integration tests for the verifier's predicates, assertions and mutators
///
/// Run with: cargo test -p skarb-verify --test verifier_tests

mod common;

use common::{new_task, new_user, unique_email, unique_task_name};
use skarb_verify::error::{Entity, VerifyError};
use skarb_verify::models::task::{Task, TaskStatus};
use skarb_verify::models::user::{NewUser, User, UserRole, UserStatus};
use skarb_verify::verify::retry::RetryPolicy;
use skarb_verify::verify::Verifier;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_insert_leaves_exactly_one_row() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);
    let email = unique_email("volunteer");

    assert!(verifier.user_absent(&email).await.unwrap());
    assert!(!verifier.user_exists(&email).await.unwrap());

    let user = verifier
        .insert_user(&new_user(UserRole::Volunteer, &email))
        .await
        .expect("Insert should succeed");

    assert_eq!(user.email, email);
    assert_eq!(user.role(), Some(UserRole::Volunteer));
    assert_eq!(user.status(), Some(UserStatus::Unconfirmed));
    assert_eq!(verifier.user_count(&email).await.unwrap(), 1);
    assert!(verifier.user_exists(&email).await.unwrap());
    assert!(!verifier.user_absent(&email).await.unwrap());

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_insert_is_refused() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);
    let email = unique_email("partner");

    verifier
        .insert_user(&new_user(UserRole::Partner, &email))
        .await
        .unwrap();

    let err = verifier
        .insert_user(&new_user(UserRole::Volunteer, &email))
        .await
        .unwrap_err();

    assert!(matches!(err, VerifyError::DuplicateEmail(ref e) if e == &email));
    assert_eq!(verifier.user_count(&email).await.unwrap(), 1);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_duplicate_insert_is_an_assertion_failure() {
    let Some(first) = common::test_session().await else { return };
    let Some(second) = common::test_session().await else { return };
    let (a, b) = (Verifier::new(&first), Verifier::new(&second));

    for _ in 0..20 {
        let email = unique_email("race");
        let payload = new_user(UserRole::Volunteer, &email);

        let (left, right) = tokio::join!(a.insert_user(&payload), b.insert_user(&payload));

        let err = match (left, right) {
            (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
            (left, right) => panic!("Expected one winner, got {:?} and {:?}", left, right),
        };
        assert!(
            matches!(err, VerifyError::DuplicateEmail(ref e) if e == &email),
            "Loser should see a duplicate, got {:?}",
            err
        );
        assert!(err.is_assertion());
        assert_eq!(a.user_count(&email).await.unwrap(), 1);
    }

    first.close().await.unwrap();
    second.close().await.unwrap();
}

#[tokio::test]
async fn test_jane_doe_scenario() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);
    let email = "jane.doe+test1@example.com";

    // Left over from an earlier run
    {
        let mut conn = session.connection().await.unwrap();
        User::delete_by_email(&mut conn, email).await.unwrap();
    }

    assert!(verifier.user_absent(email).await.unwrap());

    let data = NewUser::new(UserRole::Volunteer, "Jane", "Doe", email, "Jane#Doe2024")
        .unwrap()
        .with_status(UserStatus::Active);
    verifier.insert_user(&data).await.unwrap();

    assert!(verifier.user_exists(email).await.unwrap());
    verifier.assert_user_first_name(email, "Jane").await.unwrap();
    verifier.assert_user_last_name(email, "Doe").await.unwrap();

    {
        let mut conn = session.connection().await.unwrap();
        User::delete_by_email(&mut conn, email).await.unwrap();
    }
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_existence_check_is_idempotent() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);
    let email = unique_email("volunteer");

    assert_eq!(
        verifier.user_exists(&email).await.unwrap(),
        verifier.user_exists(&email).await.unwrap()
    );

    verifier
        .insert_user(&new_user(UserRole::Volunteer, &email))
        .await
        .unwrap();

    assert!(verifier.user_exists(&email).await.unwrap());
    assert!(verifier.user_exists(&email).await.unwrap());

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_field_round_trip_is_byte_exact() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);
    let email = unique_email("partner");

    let mut data = NewUser::new(UserRole::Partner, "Олена", "O'Connor", &email, "Skarb#2024").unwrap();
    data.position = Some("Head of \"Logistics\"".to_string());
    data.organization_name = Some("Bob's Shelter; DROP TABLE users; --".to_string());
    verifier.insert_user(&data).await.unwrap();

    verifier.assert_user_first_name(&email, "Олена").await.unwrap();
    verifier.assert_user_last_name(&email, "O'Connor").await.unwrap();
    verifier
        .assert_user_position(&email, "Head of \"Logistics\"")
        .await
        .unwrap();
    verifier
        .assert_partner_organization_name(&email, "Bob's Shelter; DROP TABLE users; --")
        .await
        .unwrap();

    // Still there: values are bound, never spliced into SQL
    assert!(verifier.user_exists(&email).await.unwrap());

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_field_mismatch_names_field_and_key() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);
    let email = unique_email("volunteer");

    verifier
        .insert_user(&new_user(UserRole::Volunteer, &email))
        .await
        .unwrap();

    let err = verifier
        .assert_user_first_name(&email, "Oksana")
        .await
        .unwrap_err();

    assert!(err.is_assertion());
    match err {
        VerifyError::Mismatch {
            entity,
            key,
            field,
            expected,
            actual,
        } => {
            assert_eq!(entity, Entity::User);
            assert_eq!(key, email);
            assert_eq!(field, "first_name");
            assert_eq!(expected, "Oksana");
            assert_eq!(actual.as_deref(), Some("Olena"));
        }
        other => panic!("Expected mismatch, got {:?}", other),
    }

    // Volunteers have no position
    let err = verifier
        .assert_user_position(&email, "Coordinator")
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::Mismatch { actual: None, .. }));

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_unknown_keys_are_not_found_not_errors() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);
    let email = unique_email("ghost");
    let task_name = unique_task_name();

    assert!(verifier.user_absent(&email).await.unwrap());
    assert!(!verifier.user_exists(&email).await.unwrap());
    assert!(!verifier.confirm_user_email(&email).await.unwrap());
    assert!(!verifier.approve_ngo(&email).await.unwrap());

    assert!(!verifier.task_exists(&task_name).await.unwrap());
    assert_eq!(verifier.current_task_status(&task_name).await.unwrap(), None);
    assert!(!verifier
        .set_task_status(&task_name, TaskStatus::Completed)
        .await
        .unwrap());

    // Field assertions on a missing row fail as assertions
    let err = verifier
        .assert_user_first_name(&email, "Olena")
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::Missing { entity: Entity::User, .. }));

    let err = verifier
        .assert_task_data(&task_name, "a", "b", "c")
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::Missing { entity: Entity::Task, .. }));

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_confirm_user_email_activates_account() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);
    let email = unique_email("volunteer");

    verifier
        .insert_user(&new_user(UserRole::Volunteer, &email))
        .await
        .unwrap();

    assert!(verifier.confirm_user_email(&email).await.unwrap());

    let user = {
        let mut conn = session.connection().await.unwrap();
        User::find_by_email(&mut conn, &email).await.unwrap().unwrap()
    };
    assert_eq!(user.status(), Some(UserStatus::Active));

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_approve_ngo_only_touches_ngos() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);
    let ngo_email = unique_email("ngo");
    let volunteer_email = unique_email("volunteer");

    verifier
        .insert_user(&new_user(UserRole::Ngo, &ngo_email))
        .await
        .unwrap();
    verifier
        .insert_user(&new_user(UserRole::Volunteer, &volunteer_email))
        .await
        .unwrap();

    assert!(verifier.approve_ngo(&ngo_email).await.unwrap());
    assert!(!verifier.approve_ngo(&volunteer_email).await.unwrap());

    let (ngo, volunteer) = {
        let mut conn = session.connection().await.unwrap();
        let ngo = User::find_by_email(&mut conn, &ngo_email).await.unwrap().unwrap();
        let volunteer = User::find_by_email(&mut conn, &volunteer_email).await.unwrap().unwrap();
        (ngo, volunteer)
    };
    assert!(ngo.is_approved);
    assert!(!volunteer.is_approved);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_task_data_and_status_transition() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);
    let name = unique_task_name();

    let task = {
        let mut conn = session.connection().await.unwrap();
        Task::insert(&mut conn, &new_task(&name)).await.unwrap()
    };
    assert_eq!(task.status, "PENDING");

    assert!(verifier.task_exists(&name).await.unwrap());
    verifier
        .assert_task_data(
            &name,
            "Paint the fence around the dog shelter",
            "A freshly painted fence",
            "Outdoor work with a friendly team",
        )
        .await
        .unwrap();

    let before = verifier.current_task_status(&name).await.unwrap();
    assert_eq!(before.as_deref(), Some("PENDING"));

    assert!(verifier
        .set_task_status(&name, TaskStatus::Completed)
        .await
        .unwrap());

    let after = verifier.current_task_status(&name).await.unwrap();
    assert_eq!(after.as_deref(), Some("COMPLETED"));
    assert_ne!(before, after);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_task_data_mismatch_reports_first_differing_field() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);
    let name = unique_task_name();

    {
        let mut conn = session.connection().await.unwrap();
        Task::insert(&mut conn, &new_task(&name)).await.unwrap();
    }

    let err = verifier
        .assert_task_data(
            &name,
            "Paint the fence around the dog shelter",
            "A freshly painted fence",
            "Free lunch",
        )
        .await
        .unwrap_err();

    match err {
        VerifyError::Mismatch { entity, field, .. } => {
            assert_eq!(entity, Entity::Task);
            assert_eq!(field, "volunteer_benefit");
        }
        other => panic!("Expected mismatch, got {:?}", other),
    }

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_task_stages_keep_form_order() {
    let Some(session) = common::test_session().await else { return };
    let name = unique_task_name();

    let stages = {
        let mut conn = session.connection().await.unwrap();
        let task = Task::insert(&mut conn, &new_task(&name)).await.unwrap();
        Task::stages(&mut conn, task.id).await.unwrap()
    };

    let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Preparation", "Painting"]);
    assert_eq!(stages[0].position, 1);
    assert_eq!(stages[1].position, 2);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_task_names_resolve_to_newest() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);
    let name = unique_task_name();

    {
        let mut conn = session.connection().await.unwrap();
        Task::insert(&mut conn, &new_task(&name)).await.unwrap();
        Task::insert(&mut conn, &new_task(&name)).await.unwrap();
    }

    assert!(verifier
        .set_task_status(&name, TaskStatus::Completed)
        .await
        .unwrap());
    assert_eq!(
        verifier.current_task_status(&name).await.unwrap().as_deref(),
        Some("COMPLETED")
    );

    {
        let mut conn = session.connection().await.unwrap();
        assert_eq!(Task::count_by_name(&mut conn, &name).await.unwrap(), 2);
        assert_eq!(Task::delete_by_name(&mut conn, &name).await.unwrap(), 2);
    }

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_recent_users_newest_first() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);

    for _ in 0..2 {
        verifier
            .insert_user(&new_user(UserRole::Volunteer, &unique_email("recent")))
            .await
            .unwrap();
    }

    let users = verifier.recent_users(5).await.unwrap();
    assert!(users.len() >= 2 && users.len() <= 5, "Expected 2..=5 rows, got {}", users.len());
    assert!(users.windows(2).all(|pair| pair[0].id > pair[1].id));

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_wait_for_user_sees_late_write() {
    let Some(session) = common::test_session().await else { return };
    let session = Arc::new(session);
    let email = unique_email("late");

    let writer = {
        let session = session.clone();
        let email = email.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Verifier::new(&session)
                .insert_user(&new_user(UserRole::Volunteer, &email))
                .await
                .expect("Late insert should succeed");
        })
    };

    let verifier = Verifier::new(&session).with_retry(RetryPolicy::new(8, Duration::from_millis(100)));
    verifier
        .wait_for_user(&email)
        .await
        .expect("User should appear within the retry budget");

    writer.await.unwrap();
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_wait_for_task_without_retry_fails_once() {
    let Some(session) = common::test_session().await else { return };
    let verifier = Verifier::new(&session);

    let err = verifier.wait_for_task(&unique_task_name()).await.unwrap_err();
    assert!(matches!(err, VerifyError::Timeout { attempts: 1, .. }));

    session.close().await.unwrap();
}
