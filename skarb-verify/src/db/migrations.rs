/// Fixture schema for local verification runs
///
/// The real schema belongs to the application under test. To exercise the
/// verifier without a full deployment, `migrations/` carries a reduced copy of
/// the `users`, `tasks` and `task_stages` tables with exactly the columns the
/// verifier touches.
///
/// # Example
///
/// ```no_run
/// use skarb_verify::db::connection::{open_connection, ConnectionConfig};
/// use skarb_verify::db::migrations::{ensure_database_exists, run_migrations};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConnectionConfig::from_env()?;
/// ensure_database_exists(&config.url).await?;
///
/// let mut conn = open_connection(&config).await?;
/// run_migrations(&mut conn).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::{migrate::MigrateDatabase, postgres::PgConnection, Postgres};
use tracing::{debug, info, warn};

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Number of migrations that have been applied
    pub applied_migrations: usize,

    /// Latest applied migration version (timestamp)
    pub latest_version: Option<i64>,

    /// Whether every bundled migration has been applied
    pub is_up_to_date: bool,
}

/// Number of migrations bundled with this crate
pub fn bundled_migrations() -> usize {
    sqlx::migrate!("./migrations").migrations.len()
}

/// Applies the fixture schema
///
/// Already applied migrations are skipped, so this is safe to call from every
/// test. Concurrent callers are serialised by sqlx's advisory lock.
pub async fn run_migrations(conn: &mut PgConnection) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Applying fixture schema migrations");

    match sqlx::migrate!("./migrations").run(conn).await {
        Ok(()) => {
            info!("Fixture schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Gets the current migration status
pub async fn get_migration_status(conn: &mut PgConnection) -> Result<MigrationStatus, sqlx::Error> {
    debug!("Checking migration status");

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = current_schema()
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(&mut *conn)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
            is_up_to_date: false,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT
            COUNT(*) as count,
            MAX(version) as latest_version
         FROM _sqlx_migrations
         WHERE success = true",
    )
    .fetch_one(&mut *conn)
    .await?;

    debug!(
        applied_migrations = count,
        latest_version = ?latest_version,
        "Migration status retrieved"
    );

    let applied_migrations = count as usize;
    Ok(MigrationStatus {
        applied_migrations,
        latest_version,
        is_up_to_date: applied_migrations >= bundled_migrations(),
    })
}

/// Creates the database if it doesn't exist
///
/// Intended for scratch databases used by local runs and CI.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
        info!("Database created successfully");
    } else {
        debug!("Database already exists");
    }

    Ok(())
}
