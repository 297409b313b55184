/// Database layer for verification runs
///
/// # Modules
///
/// - `connection`: connection settings, opening and health checks
/// - `session`: the single shared connection and its lifecycle
/// - `migrations`: fixture schema for scratch databases
///
/// Row models live in the `models` module at crate root level.
///
/// # Example
///
/// ```no_run
/// use skarb_verify::db::connection::ConnectionConfig;
/// use skarb_verify::db::session::DbSession;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ConnectionConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let session = DbSession::connect(config).await?;
///     session.close().await?;
///     Ok(())
/// }
/// ```

pub mod connection;
pub mod migrations;
pub mod session;
