/// Generated test data for registration and task forms
///
/// Every generator returns a fresh, valid record whose email (or task name)
/// carries a UUID suffix, so repeated runs against the same database never
/// collide. Records validate with the same rules the registration forms enforce.
///
/// # Example
///
/// ```
/// use skarb_suite::fixtures::{NgoBuilder, Volunteer};
/// use validator::Validate;
///
/// let volunteer = Volunteer::generate();
/// assert!(volunteer.validate().is_ok());
///
/// let ngo = NgoBuilder::new()
///     .first_name("Iryna")
///     .last_name("Kovalenko")
///     .email("iryna@example.org")
///     .password("Shelter#2024")
///     .organization_name("Paws of Kharkiv")
///     .build();
/// assert_eq!(ngo.first_name, "Iryna");
/// ```

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use skarb_verify::auth::password::PasswordError;
use skarb_verify::models::task::{NewTask, NewTaskStage};
use skarb_verify::models::user::{NewUser, Sex, UserRole};
use uuid::Uuid;
use validator::Validate;

/// Categories offered by the registration and task forms
pub const CATEGORIES: &[&str] = &[
    "ANIMALS",
    "CHILDREN",
    "EDUCATION",
    "ECOLOGY",
    "HEALTHCARE",
    "HUMANITARIAN_AID",
    "SOCIAL",
    "VETERANS",
];

const FIRST_NAMES: &[&str] = &["Olena", "Taras", "Iryna", "Andrii", "Sofiia", "Dmytro", "Mariia", "Bohdan"];
const LAST_NAMES: &[&str] = &["Shevchenko", "Kovalenko", "Bondarenko", "Tkachenko", "O'Neill", "Melnyk"];
const POSITIONS: &[&str] = &["Coordinator", "Project manager", "Director", "Volunteer lead"];

/// A volunteer as typed into the registration form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Volunteer {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100))]
    pub last_name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 10, max = 32))]
    pub phone: String,

    #[validate(length(min = 8))]
    pub password: String,

    #[validate(length(max = 1000))]
    pub about: String,

    pub category: String,
}

/// A partner (business) as typed into the registration form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Partner {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100))]
    pub last_name: String,

    pub sex: Sex,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 10, max = 32))]
    pub phone: String,

    #[validate(length(min = 8))]
    pub password: String,

    #[validate(length(min = 1, max = 255))]
    pub organization_name: String,

    pub category: String,

    #[validate(length(min = 1, max = 255))]
    pub position: String,

    #[validate(url)]
    pub organization_link: String,

    #[validate(length(max = 1000))]
    pub about: String,
}

/// An NGO as typed into the registration form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Ngo {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100))]
    pub last_name: String,

    pub sex: Sex,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 10, max = 32))]
    pub phone: String,

    #[validate(length(min = 8))]
    pub password: String,

    #[validate(length(min = 1, max = 255))]
    pub organization_name: String,

    pub category: String,

    #[validate(length(min = 1, max = 255))]
    pub position: String,

    #[validate(url)]
    pub organization_link: String,

    #[validate(length(max = 1000))]
    pub about: String,

    /// Link to the state registry entry
    #[validate(url)]
    pub register_link: String,
}

/// A task for volunteers as typed into the creation form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskDraft {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub category: String,

    /// Days from today
    #[validate(range(min = 1, max = 365))]
    pub deadline_in_days: i64,

    #[validate(length(min = 1))]
    pub description: String,

    #[validate(length(min = 1))]
    pub expected_outcome: String,

    #[validate(length(min = 1))]
    pub volunteer_benefit: String,

    pub requirements: String,
    pub interview_required: bool,

    #[validate(range(min = 0))]
    pub saved_money: i64,

    /// Stage rules are checked by [`TaskDraft::validate_all`]
    #[validate(length(min = 1, max = 20))]
    pub stages: Vec<StageDraft>,
}

/// One work stage of a [`TaskDraft`]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StageDraft {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 100))]
    pub duration: String,

    #[validate(length(min = 1))]
    pub description: String,
}

fn pick(options: &[&str]) -> String {
    options
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
        .to_string()
}

fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()
}

fn phone() -> String {
    let mut rng = rand::thread_rng();
    format!("+380{}", rng.gen_range(500_000_000u64..999_999_999))
}

fn password() -> String {
    // Upper, lower, digit and symbol so strength rules on the form pass
    format!("Skarb#{}", rand::thread_rng().gen_range(1000..9999))
}

fn sex() -> Sex {
    if rand::thread_rng().gen_bool(0.5) {
        Sex::Female
    } else {
        Sex::Male
    }
}

impl Volunteer {
    /// A fresh volunteer with a unique email
    pub fn generate() -> Self {
        let suffix = unique_suffix();
        Self {
            first_name: pick(FIRST_NAMES),
            last_name: pick(LAST_NAMES),
            email: format!("volunteer.{}@example.com", suffix),
            phone: phone(),
            password: password(),
            about: "Weekends free, happy to help with anything outdoors".to_string(),
            category: pick(CATEGORIES),
        }
    }

    /// Insert payload, as the registration form would store it
    pub fn to_new_user(&self) -> Result<NewUser, PasswordError> {
        let mut user = NewUser::new(
            UserRole::Volunteer,
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.password,
        )?;
        user.phone = Some(self.phone.clone());
        user.about = Some(self.about.clone());
        user.category = Some(self.category.clone());
        Ok(user)
    }
}

impl Partner {
    /// A fresh partner with a unique email
    pub fn generate() -> Self {
        let suffix = unique_suffix();
        Self {
            first_name: pick(FIRST_NAMES),
            last_name: pick(LAST_NAMES),
            sex: sex(),
            email: format!("partner.{}@example.com", suffix),
            phone: phone(),
            password: password(),
            organization_name: format!("Partner Co {}", &suffix[..8]),
            category: pick(CATEGORIES),
            position: pick(POSITIONS),
            organization_link: format!("https://partner-{}.example.com", &suffix[..8]),
            about: "Local business sponsoring volunteer work".to_string(),
        }
    }

    /// Insert payload, as the registration form would store it
    pub fn to_new_user(&self) -> Result<NewUser, PasswordError> {
        let mut user = NewUser::new(
            UserRole::Partner,
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.password,
        )?;
        user.sex = Some(self.sex);
        user.phone = Some(self.phone.clone());
        user.position = Some(self.position.clone());
        user.organization_name = Some(self.organization_name.clone());
        user.organization_link = Some(self.organization_link.clone());
        user.about = Some(self.about.clone());
        user.category = Some(self.category.clone());
        Ok(user)
    }
}

impl Ngo {
    /// A fresh NGO with a unique email
    pub fn generate() -> Self {
        let suffix = unique_suffix();
        NgoBuilder::new()
            .first_name(pick(FIRST_NAMES))
            .last_name(pick(LAST_NAMES))
            .sex(sex())
            .email(format!("ngo.{}@example.org", suffix))
            .phone(phone())
            .password(password())
            .organization_name(format!("Charity Fund {}", &suffix[..8]))
            .category(pick(CATEGORIES))
            .position(pick(POSITIONS))
            .organization_link(format!("https://ngo-{}.example.org", &suffix[..8]))
            .about("Registered charity helping displaced families")
            .register_link(format!("https://registry.example.gov/ngo/{}", suffix))
            .build()
    }

    /// Insert payload, as the registration form would store it
    pub fn to_new_user(&self) -> Result<NewUser, PasswordError> {
        let mut user = NewUser::new(
            UserRole::Ngo,
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.password,
        )?;
        user.sex = Some(self.sex);
        user.phone = Some(self.phone.clone());
        user.position = Some(self.position.clone());
        user.organization_name = Some(self.organization_name.clone());
        user.organization_link = Some(self.organization_link.clone());
        user.register_link = Some(self.register_link.clone());
        user.about = Some(self.about.clone());
        user.category = Some(self.category.clone());
        Ok(user)
    }
}

/// Step-by-step construction of an [`Ngo`]
///
/// Fields left unset keep the values of a generic, valid NGO.
#[derive(Debug, Clone)]
pub struct NgoBuilder {
    ngo: Ngo,
}

impl Default for NgoBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NgoBuilder {
    pub fn new() -> Self {
        Self {
            ngo: Ngo {
                first_name: "Olena".to_string(),
                last_name: "Shevchenko".to_string(),
                sex: Sex::Female,
                email: "ngo@example.org".to_string(),
                phone: "+380501234567".to_string(),
                password: "Skarb#2024".to_string(),
                organization_name: "Charity Fund".to_string(),
                category: CATEGORIES[0].to_string(),
                position: "Director".to_string(),
                organization_link: "https://ngo.example.org".to_string(),
                about: String::new(),
                register_link: "https://registry.example.gov/ngo".to_string(),
            },
        }
    }

    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.ngo.first_name = value.into();
        self
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.ngo.last_name = value.into();
        self
    }

    pub fn sex(mut self, value: Sex) -> Self {
        self.ngo.sex = value;
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.ngo.email = value.into();
        self
    }

    pub fn phone(mut self, value: impl Into<String>) -> Self {
        self.ngo.phone = value.into();
        self
    }

    pub fn password(mut self, value: impl Into<String>) -> Self {
        self.ngo.password = value.into();
        self
    }

    pub fn organization_name(mut self, value: impl Into<String>) -> Self {
        self.ngo.organization_name = value.into();
        self
    }

    pub fn category(mut self, value: impl Into<String>) -> Self {
        self.ngo.category = value.into();
        self
    }

    pub fn position(mut self, value: impl Into<String>) -> Self {
        self.ngo.position = value.into();
        self
    }

    pub fn organization_link(mut self, value: impl Into<String>) -> Self {
        self.ngo.organization_link = value.into();
        self
    }

    pub fn about(mut self, value: impl Into<String>) -> Self {
        self.ngo.about = value.into();
        self
    }

    pub fn register_link(mut self, value: impl Into<String>) -> Self {
        self.ngo.register_link = value.into();
        self
    }

    pub fn build(self) -> Ngo {
        self.ngo
    }
}

impl TaskDraft {
    /// A fresh task with a unique name and two work stages
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            name: format!("Task {}", unique_suffix()),
            category: pick(CATEGORIES),
            deadline_in_days: 5,
            description: "Sort and pack donated winter clothes".to_string(),
            expected_outcome: "Two hundred packed parcels ready for delivery".to_string(),
            volunteer_benefit: "Team work experience and a reference letter".to_string(),
            requirements: "Able to lift 10 kg".to_string(),
            interview_required: true,
            saved_money: rng.gen_range(100..10_000),
            stages: vec![
                StageDraft {
                    name: "Sorting".to_string(),
                    duration: "2 days".to_string(),
                    description: "Sort clothes by size and season".to_string(),
                },
                StageDraft {
                    name: "Packing".to_string(),
                    duration: "1 day".to_string(),
                    description: "Pack parcels and label them".to_string(),
                },
            ],
        }
    }

    /// Validates the task and each of its stages
    pub fn validate_all(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        self.stages.iter().try_for_each(|stage| stage.validate())
    }

    /// Insert payload for a task created by `created_by`
    pub fn to_new_task(&self, created_by: Option<i64>) -> NewTask {
        NewTask {
            name: self.name.clone(),
            description: self.description.clone(),
            expected_outcome: self.expected_outcome.clone(),
            volunteer_benefit: self.volunteer_benefit.clone(),
            requirements: Some(self.requirements.clone()),
            category: Some(self.category.clone()),
            deadline: Some(chrono::Utc::now() + chrono::Duration::days(self.deadline_in_days)),
            interview_required: self.interview_required,
            saved_money: Some(self.saved_money),
            created_by,
            stages: self
                .stages
                .iter()
                .map(|stage| NewTaskStage {
                    name: stage.name.clone(),
                    duration: stage.duration.clone(),
                    description: stage.description.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_records_validate() {
        assert!(Volunteer::generate().validate().is_ok());
        assert!(Partner::generate().validate().is_ok());
        assert!(Ngo::generate().validate().is_ok());
        assert!(TaskDraft::generate().validate_all().is_ok());
    }

    #[test]
    fn test_generated_emails_are_unique() {
        let a = Volunteer::generate();
        let b = Volunteer::generate();
        assert_ne!(a.email, b.email);
        assert_ne!(TaskDraft::generate().name, TaskDraft::generate().name);
    }

    #[test]
    fn test_generated_category_is_known() {
        let volunteer = Volunteer::generate();
        assert!(CATEGORIES.contains(&volunteer.category.as_str()));
    }

    #[test]
    fn test_empty_stage_name_is_rejected() {
        let mut task = TaskDraft::generate();
        task.stages[1].name.clear();
        assert!(task.validate().is_ok());
        assert!(task.validate_all().is_err());
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        let mut volunteer = Volunteer::generate();
        volunteer.email = "not-an-email".to_string();
        assert!(volunteer.validate().is_err());
    }

    #[test]
    fn test_task_without_stages_is_rejected() {
        let mut task = TaskDraft::generate();
        task.stages.clear();
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_task_with_too_many_stages_is_rejected() {
        let mut task = TaskDraft::generate();
        let stage = task.stages[0].clone();
        task.stages = vec![stage; 20];
        assert!(task.validate_all().is_ok());

        task.stages.push(task.stages[0].clone());
        assert!(task.validate().is_err());
        assert!(task.validate_all().is_err());
    }

    #[test]
    fn test_builder_overrides_only_set_fields() {
        let ngo = NgoBuilder::new()
            .email("fund@example.org")
            .register_link("https://registry.example.gov/ngo/42")
            .build();

        assert_eq!(ngo.email, "fund@example.org");
        assert_eq!(ngo.register_link, "https://registry.example.gov/ngo/42");
        assert_eq!(ngo.first_name, "Olena");
        assert!(ngo.validate().is_ok());
    }

    #[test]
    fn test_partner_to_new_user_keeps_organization() {
        let partner = Partner::generate();
        let user = partner.to_new_user().unwrap();

        assert_eq!(user.role, UserRole::Partner);
        assert_eq!(user.organization_name.as_deref(), Some(partner.organization_name.as_str()));
        assert_eq!(user.position.as_deref(), Some(partner.position.as_str()));
        assert_ne!(user.password_hash, partner.password);
    }

    #[test]
    fn test_task_draft_keeps_stage_order() {
        let draft = TaskDraft::generate();
        let task = draft.to_new_task(Some(7));

        assert_eq!(task.created_by, Some(7));
        assert_eq!(task.stages.len(), 2);
        assert_eq!(task.stages[0].name, "Sorting");
        assert_eq!(task.stages[1].name, "Packing");
        assert!(task.deadline.unwrap() > chrono::Utc::now());
    }
}
