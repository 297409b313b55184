/// Row models for the tables the suite verifies
///
/// # Models
///
/// - `user`: volunteers, partners and NGOs (one table, keyed by email)
/// - `task`: tasks published by NGOs and their work stages (keyed by name)
///
/// Every statement takes a `&mut PgConnection` borrowed from a
/// [`DbSession`](crate::db::session::DbSession) and binds all values as parameters.

pub mod task;
pub mod user;
