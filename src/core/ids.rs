//! Identifier generation for ledger entities.
//!
//! Ids are random v4 UUIDs behind a short kind prefix, so two entities created
//! within the same millisecond never collide.

use uuid::Uuid;

/// Generates a new identifier such as `env_5f0c…`.
#[must_use]
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}
