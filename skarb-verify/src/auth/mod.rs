/// Credential utilities for seeded accounts
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and the registration form's strength rules

pub mod password;
