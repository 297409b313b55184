/// Task rows, their work stages, and the statements the verifier runs on them
///
/// Tasks are published by NGOs for volunteers. Tests look tasks up by name; names
/// are generated to be unique, and when duplicates do exist the newest row wins.
///
/// # Status
///
/// ```text
/// PENDING (on creation) ──> COMPLETED
/// ```
///
/// The application may know more statuses; anything else read back is passed
/// through as a plain string.
///
/// # Schema (fixture copy)
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     expected_outcome TEXT NOT NULL,
///     volunteer_benefit TEXT NOT NULL,
///     requirements TEXT,
///     category VARCHAR(100),
///     status VARCHAR(32) NOT NULL DEFAULT 'PENDING',
///     deadline TIMESTAMPTZ,
///     interview_required BOOLEAN NOT NULL DEFAULT FALSE,
///     saved_money BIGINT,
///     created_by BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     created_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_stages (
///     id BIGSERIAL PRIMARY KEY,
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     position SMALLINT NOT NULL,
///     name VARCHAR(255) NOT NULL,
///     duration VARCHAR(64) NOT NULL,
///     description TEXT NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgConnection};
use std::fmt;
use std::str::FromStr;

/// Task status column values exercised by the suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// Published and waiting for volunteers
    Pending,

    /// Work finished
    Completed,
}

impl TaskStatus {
    /// Converts status to its database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    /// Checks if the application itself would perform this transition
    ///
    /// Status overrides done by tests ignore this.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        matches!((self, target), (TaskStatus::Pending, TaskStatus::Completed))
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskStatus::Pending),
            "COMPLETED" => Ok(TaskStatus::Completed),
            other => Err(format!("Unknown task status: {}", other)),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `tasks` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,

    /// Lookup key in tests
    pub name: String,

    pub description: String,
    pub expected_outcome: String,
    pub volunteer_benefit: String,
    pub requirements: Option<String>,
    pub category: Option<String>,

    /// Raw status value (see [`TaskStatus`])
    pub status: String,

    pub deadline: Option<DateTime<Utc>>,
    pub interview_required: bool,

    /// Money the organization expects to save, in whole hryvnias
    pub saved_money: Option<i64>,

    /// Id of the NGO user that published the task
    pub created_by: Option<i64>,

    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// A row of the `task_stages` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskStage {
    pub task_id: i64,

    /// 1-based order within the task
    pub position: i16,

    pub name: String,

    /// Free text as typed into the form, e.g. "3 days"
    pub duration: String,

    pub description: String,
}

/// Input for one work stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaskStage {
    pub name: String,
    pub duration: String,
    pub description: String,
}

/// Input for inserting a task with its stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub expected_outcome: String,
    pub volunteer_benefit: String,
    pub requirements: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub interview_required: bool,
    pub saved_money: Option<i64>,
    pub created_by: Option<i64>,

    /// Stored with positions 1..=n in this order
    pub stages: Vec<NewTaskStage>,
}

impl Task {
    /// Inserts a task in `PENDING` status together with its stages
    ///
    /// Task and stages are written in one transaction.
    pub async fn insert(conn: &mut PgConnection, data: &NewTask) -> Result<Self, sqlx::Error> {
        let mut tx = conn.begin().await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (name, description, expected_outcome, volunteer_benefit, requirements,
                               category, status, deadline, interview_required, saved_money, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, name, description, expected_outcome, volunteer_benefit, requirements,
                      category, status, deadline, interview_required, saved_money, created_by,
                      created_date, updated_date
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.expected_outcome)
        .bind(&data.volunteer_benefit)
        .bind(&data.requirements)
        .bind(&data.category)
        .bind(TaskStatus::Pending.as_str())
        .bind(data.deadline)
        .bind(data.interview_required)
        .bind(data.saved_money)
        .bind(data.created_by)
        .fetch_one(&mut *tx)
        .await?;

        for (index, stage) in data.stages.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO task_stages (task_id, position, name, duration, description)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(task.id)
            .bind(stage_position(index)?)
            .bind(&stage.name)
            .bind(&stage.duration)
            .bind(&stage.description)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(task)
    }

    /// Finds the newest task with this name
    pub async fn find_by_name(conn: &mut PgConnection, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, expected_outcome, volunteer_benefit, requirements,
                   category, status, deadline, interview_required, saved_money, created_by,
                   created_date, updated_date
            FROM tasks
            WHERE name = $1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(conn)
        .await
    }

    /// Counts tasks with this name
    pub async fn count_by_name(conn: &mut PgConnection, name: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE name = $1")
            .bind(name)
            .fetch_one(conn)
            .await?;

        Ok(count)
    }

    /// Reads the raw status of the newest task with this name
    pub async fn status_by_name(conn: &mut PgConnection, name: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT status
            FROM tasks
            WHERE name = $1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(conn)
        .await
    }

    /// Overwrites the status of the newest task with this name
    ///
    /// Returns true if a row was updated.
    pub async fn set_status_by_name(
        conn: &mut PgConnection,
        name: &str,
        status: TaskStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET status = $2,
                updated_date = NOW()
            WHERE id = (SELECT id FROM tasks WHERE name = $1 ORDER BY id DESC LIMIT 1)
            "#,
        )
        .bind(name)
        .bind(status.as_str())
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the stages of a task in position order
    pub async fn stages(conn: &mut PgConnection, task_id: i64) -> Result<Vec<TaskStage>, sqlx::Error> {
        sqlx::query_as::<_, TaskStage>(
            r#"
            SELECT task_id, position, name, duration, description
            FROM task_stages
            WHERE task_id = $1
            ORDER BY position
            "#,
        )
        .bind(task_id)
        .fetch_all(conn)
        .await
    }

    /// Deletes every task with this name (stages cascade)
    ///
    /// Returns the number of deleted tasks.
    pub async fn delete_by_name(conn: &mut PgConnection, name: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE name = $1")
            .bind(name)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}

/// 1-based `task_stages.position` for the stage at `index`
fn stage_position(index: usize) -> Result<i16, sqlx::Error> {
    index
        .checked_add(1)
        .and_then(|position| i16::try_from(position).ok())
        .ok_or_else(|| {
            sqlx::Error::Protocol(format!(
                "Stage index {} does not fit in a SMALLINT position",
                index
            ))
        })
}
