/// Verification session: one live connection for the length of a test run
///
/// A [`DbSession`] owns a single PostgreSQL connection. It is created explicitly
/// by whoever owns the test run and passed to every verifier that needs it, then
/// closed once at teardown. Tests that want isolation open one session each; a
/// suite that prefers a shared fixture can use [`DbSession::shared`].
///
/// # Lifecycle
///
/// ```text
/// connect() ──> open ──close()──> closed
///                 │                  │
///           connection() ok    connection() -> SessionClosed
///                              close()      -> Ok(false)
/// ```
///
/// # Example
///
/// ```no_run
/// use skarb_verify::db::connection::ConnectionConfig;
/// use skarb_verify::db::session::DbSession;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = DbSession::connect(ConnectionConfig::from_env()?).await?;
///
/// {
///     let mut conn = session.connection().await?;
///     sqlx::query("SELECT 1").execute(&mut *conn).await?;
/// }
///
/// assert!(session.close().await?);
/// assert!(!session.close().await?);
/// # Ok(())
/// # }
/// ```

use crate::db::connection::{self, open_connection, ConnectionConfig};
use crate::error::{VerifyError, VerifyResult};
use sqlx::postgres::PgConnection;
use sqlx::Connection;
use std::sync::Arc;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard, OnceCell};
use tracing::{debug, info};

static SHARED: OnceCell<Arc<DbSession>> = OnceCell::const_new();

/// Owner of the single verification connection
pub struct DbSession {
    conn: Mutex<Option<PgConnection>>,
}

impl std::fmt::Debug for DbSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbSession").finish_non_exhaustive()
    }
}

impl DbSession {
    /// Opens a new session
    ///
    /// # Errors
    ///
    /// Fails fast with `VerifyError::Setup` or `VerifyError::Config`; a session
    /// never exists without a working connection.
    pub async fn connect(config: ConnectionConfig) -> VerifyResult<Self> {
        let conn = open_connection(&config).await?;
        Ok(Self::from_connection(conn))
    }

    /// Wraps an already open connection
    pub fn from_connection(conn: PgConnection) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }

    /// Returns the process-wide session, opening it on first use
    ///
    /// The first call reads [`ConnectionConfig::from_env`]. If that call fails the
    /// error is returned and the next call tries again. All later calls return the
    /// same session, including after it has been closed.
    ///
    /// The connection is bound to the tokio runtime that opened it, so the shared
    /// session suits a single-runtime harness rather than per-test runtimes.
    pub async fn shared() -> VerifyResult<Arc<DbSession>> {
        SHARED
            .get_or_try_init(|| async {
                info!("Opening shared verification session");
                let config = ConnectionConfig::from_env()?;
                DbSession::connect(config).await.map(Arc::new)
            })
            .await
            .cloned()
    }

    /// Grants exclusive use of the connection
    ///
    /// Hold the guard for one statement (or one short sequence) and drop it.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::SessionClosed` once [`close`](Self::close) has run.
    pub async fn connection(&self) -> VerifyResult<MappedMutexGuard<'_, PgConnection>> {
        let guard = self.conn.lock().await;
        MutexGuard::try_map(guard, |slot| slot.as_mut()).map_err(|_| VerifyError::SessionClosed)
    }

    /// Re-runs the health check on the open connection
    pub async fn health_check(&self) -> VerifyResult<()> {
        let mut conn = self.connection().await?;
        connection::health_check(&mut *conn)
            .await
            .map_err(VerifyError::query("health_check"))
    }

    /// Whether the session has been closed
    pub async fn is_closed(&self) -> bool {
        self.conn.lock().await.is_none()
    }

    /// Closes the connection
    ///
    /// Idempotent: returns `Ok(true)` when this call closed the connection and
    /// `Ok(false)` when it was already closed. The handle is released even if the
    /// server-side goodbye fails.
    pub async fn close(&self) -> VerifyResult<bool> {
        let conn = self.conn.lock().await.take();

        match conn {
            Some(conn) => {
                info!("Closing verification database connection");
                conn.close().await.map_err(VerifyError::query("close"))?;
                info!("Verification database connection closed");
                Ok(true)
            }
            None => {
                debug!("Verification session already closed");
                Ok(false)
            }
        }
    }
}
