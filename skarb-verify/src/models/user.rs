/// User rows and the statements the verifier runs against them
///
/// Volunteers, partners and NGOs share one `users` table and are told apart by
/// `role`. Email is the lookup key and is unique across all roles.
///
/// # Schema (fixture copy)
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     sex VARCHAR(10),
///     phone VARCHAR(32),
///     password VARCHAR(255) NOT NULL,
///     role VARCHAR(32) NOT NULL,
///     status VARCHAR(32) NOT NULL DEFAULT 'UNCONFIRMED',
///     position VARCHAR(255),
///     organization_name VARCHAR(255),
///     organization_link VARCHAR(512),
///     register_link VARCHAR(512),
///     about TEXT,
///     category VARCHAR(100),
///     is_approved BOOLEAN NOT NULL DEFAULT FALSE,
///     locale VARCHAR(8) NOT NULL DEFAULT 'UK',
///     created_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use skarb_verify::models::user::{NewUser, User, UserRole};
/// use sqlx::PgConnection;
///
/// # async fn example(conn: &mut PgConnection) -> Result<(), Box<dyn std::error::Error>> {
/// let data = NewUser::new(UserRole::Volunteer, "Jane", "Doe", "jane@example.com", "Jane#2024")?;
/// let user = User::insert(conn, &data).await?;
///
/// assert_eq!(User::count_by_email(conn, "jane@example.com").await?, 1);
/// # Ok(())
/// # }
/// ```

use crate::auth::password::{hash_password, PasswordError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use std::fmt;
use std::str::FromStr;

/// Role column values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "ROLE_VOLUNTEER")]
    Volunteer,
    #[serde(rename = "ROLE_PARTNER")]
    Partner,
    #[serde(rename = "ROLE_NGO")]
    Ngo,
}

impl UserRole {
    /// Converts role to its database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Volunteer => "ROLE_VOLUNTEER",
            UserRole::Partner => "ROLE_PARTNER",
            UserRole::Ngo => "ROLE_NGO",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_VOLUNTEER" => Ok(UserRole::Volunteer),
            "ROLE_PARTNER" => Ok(UserRole::Partner),
            "ROLE_NGO" => Ok(UserRole::Ngo),
            other => Err(format!("Unknown user role: {}", other)),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status column values
///
/// Registration through the UI creates `UNCONFIRMED` accounts; following the
/// emailed confirmation link makes them `ACTIVE`. Only active accounts can sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Unconfirmed,
    Active,
    Blocked,
}

impl UserStatus {
    /// Converts status to its database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Unconfirmed => "UNCONFIRMED",
            UserStatus::Active => "ACTIVE",
            UserStatus::Blocked => "BLOCKED",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNCONFIRMED" => Ok(UserStatus::Unconfirmed),
            "ACTIVE" => Ok(UserStatus::Active),
            "BLOCKED" => Ok(UserStatus::Blocked),
            other => Err(format!("Unknown user status: {}", other)),
        }
    }
}

/// Sex column values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "MALE",
            Sex::Female => "FEMALE",
        }
    }
}

/// Text columns that field assertions may compare
///
/// Column names only ever come from this enum, so they can be spliced into SQL
/// while every value stays a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    FirstName,
    LastName,
    Position,
    OrganizationName,
}

impl UserField {
    /// Column name in `users`
    pub fn column(&self) -> &'static str {
        match self {
            UserField::FirstName => "first_name",
            UserField::LastName => "last_name",
            UserField::Position => "position",
            UserField::OrganizationName => "organization_name",
        }
    }
}

/// A row of the `users` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,

    /// Unique across all roles
    pub email: String,

    pub sex: Option<String>,
    pub phone: Option<String>,

    /// Argon2id hash (or whatever the application stored)
    #[serde(skip_serializing)]
    pub password: String,

    /// `ROLE_VOLUNTEER`, `ROLE_PARTNER` or `ROLE_NGO`
    pub role: String,

    /// `UNCONFIRMED`, `ACTIVE` or `BLOCKED`
    pub status: String,

    /// Position inside the organization (partners and NGOs)
    pub position: Option<String>,
    pub organization_name: Option<String>,
    pub organization_link: Option<String>,

    /// State registry link (NGOs)
    pub register_link: Option<String>,

    pub about: Option<String>,
    pub category: Option<String>,

    /// Set by an administrator for NGOs
    pub is_approved: bool,

    pub locale: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl User {
    /// Parsed role, if the stored value is one this crate knows
    pub fn role(&self) -> Option<UserRole> {
        self.role.parse().ok()
    }

    /// Parsed status, if the stored value is one this crate knows
    pub fn status(&self) -> Option<UserStatus> {
        self.status.parse().ok()
    }
}

/// Input for inserting a user directly, bypassing the registration form
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub sex: Option<Sex>,
    pub phone: Option<String>,

    /// Argon2id hash (NOT the plaintext password)
    pub password_hash: String,

    pub role: UserRole,
    pub status: UserStatus,
    pub position: Option<String>,
    pub organization_name: Option<String>,
    pub organization_link: Option<String>,
    pub register_link: Option<String>,
    pub about: Option<String>,
    pub category: Option<String>,
    pub locale: String,
}

impl NewUser {
    /// Creates an insert payload, hashing the plaintext password
    ///
    /// Status defaults to `UNCONFIRMED` and locale to `UK`; optional profile
    /// fields start empty.
    pub fn new(
        role: UserRole,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: &str,
    ) -> Result<Self, PasswordError> {
        Ok(Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            sex: None,
            phone: None,
            password_hash: hash_password(password)?,
            role,
            status: UserStatus::Unconfirmed,
            position: None,
            organization_name: None,
            organization_link: None,
            register_link: None,
            about: None,
            category: None,
            locale: "UK".to_string(),
        })
    }

    /// Same payload with a different status
    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }
}

impl User {
    /// Inserts a user
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation if the email is taken.
    pub async fn insert(conn: &mut PgConnection, data: &NewUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, sex, phone, password, role, status,
                               position, organization_name, organization_link, register_link,
                               about, category, locale)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING id, first_name, last_name, email, sex, phone, password, role, status,
                      position, organization_name, organization_link, register_link, about,
                      category, is_approved, locale, created_date, updated_date
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(data.sex.map(|s| s.as_str()))
        .bind(&data.phone)
        .bind(&data.password_hash)
        .bind(data.role.as_str())
        .bind(data.status.as_str())
        .bind(&data.position)
        .bind(&data.organization_name)
        .bind(&data.organization_link)
        .bind(&data.register_link)
        .bind(&data.about)
        .bind(&data.category)
        .bind(&data.locale)
        .fetch_one(conn)
        .await
    }

    /// Finds a user by email (exact, case-sensitive match)
    pub async fn find_by_email(
        conn: &mut PgConnection,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, sex, phone, password, role, status,
                   position, organization_name, organization_link, register_link, about,
                   category, is_approved, locale, created_date, updated_date
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(conn)
        .await
    }

    /// Counts rows with this email
    pub async fn count_by_email(conn: &mut PgConnection, email: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(conn)
            .await?;

        Ok(count)
    }

    /// Reads one text column of the row keyed by email
    ///
    /// Returns `None` when no row matches and `Some(None)` when the column is NULL.
    pub async fn field_by_email(
        conn: &mut PgConnection,
        email: &str,
        field: UserField,
    ) -> Result<Option<Option<String>>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", field.column());

        sqlx::query_scalar::<_, Option<String>>(&query)
            .bind(email)
            .fetch_optional(conn)
            .await
    }

    /// Sets the account status
    ///
    /// Returns true if a row was updated.
    pub async fn set_status_by_email(
        conn: &mut PgConnection,
        email: &str,
        status: UserStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET status = $2,
                updated_date = NOW()
            WHERE email = $1
            "#,
        )
        .bind(email)
        .bind(status.as_str())
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flags an NGO account as approved
    ///
    /// Returns true only if a row with role `ROLE_NGO` matched.
    pub async fn approve_ngo_by_email(conn: &mut PgConnection, email: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_approved = TRUE,
                updated_date = NOW()
            WHERE email = $1 AND role = $2
            "#,
        )
        .bind(email)
        .bind(UserRole::Ngo.as_str())
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the most recently inserted users, newest first
    pub async fn recent(conn: &mut PgConnection, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, sex, phone, password, role, status,
                   position, organization_name, organization_link, register_link, about,
                   category, is_approved, locale, created_date, updated_date
            FROM users
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(conn)
        .await
    }

    /// Deletes a user by email
    ///
    /// Returns true if a row was deleted.
    pub async fn delete_by_email(conn: &mut PgConnection, email: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
