//! Unified error type for the budget ledger.
//!
//! Ledger rejections (closed month, missing reference, invalid amount, double
//! funding) are explicit variants so callers can tell "rejected" apart from
//! "nothing to do".

use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// A month key that is not of the form `YYYY-MM`
    #[error("Invalid month key '{key}', expected YYYY-MM")]
    InvalidMonthKey {
        /// The rejected input
        key: String,
    },

    /// Attempted to mutate a month that has been validated
    #[error("Month {month} is closed")]
    MonthClosed {
        /// The closed month key
        month: String,
    },

    /// A referenced entity does not exist
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Entity kind (account, envelope, project, ...)
        kind: &'static str,
        /// The missing identifier
        id: String,
    },

    /// Amount is not a finite, strictly positive number
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Envelope has already been funded for this month
    #[error("Envelope '{envelope_id}' is already funded for {month}")]
    AlreadyFunded {
        /// Envelope identifier
        envelope_id: String,
        /// Month key
        month: String,
    },

    /// The in-memory state changed but the document could not be written
    #[error("Failed to persist ledger document: {message}")]
    PersistenceFailed {
        /// Underlying failure
        message: String,
    },

    /// The ledger store task is no longer running
    #[error("Ledger store is closed")]
    StoreClosed,

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Document (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Formatting failure while building a reply
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Discord framework failure
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether the ledger refused the request, as opposed to an
    /// infrastructure failure. Rejections are reported back to the user.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::InvalidMonthKey { .. }
                | Self::MonthClosed { .. }
                | Self::NotFound { .. }
                | Self::InvalidAmount { .. }
                | Self::AlreadyFunded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_distinguished_from_failures() {
        assert!(Error::not_found("envelope", "env_x").is_rejection());
        assert!(Error::InvalidAmount { amount: 0.0 }.is_rejection());
        assert!(!Error::StoreClosed.is_rejection());
        assert!(
            !Error::PersistenceFailed {
                message: "disk full".to_string()
            }
            .is_rejection()
        );
    }

    #[test]
    fn test_not_found_message() {
        let error = Error::not_found("project", "proj_1");
        assert_eq!(error.to_string(), "project 'proj_1' not found");
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
