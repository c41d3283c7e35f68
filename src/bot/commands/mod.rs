//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Budget configuration commands
pub mod budget;

/// Envelope and provision commands
pub mod envelope;

/// General utility commands
pub mod general;

/// Month commands (incomes, summaries, closing)
pub mod month;

/// Savings and project commands
pub mod savings;

// Export commands
pub use budget::*;
pub use envelope::*;
pub use general::*;
pub use month::*;
pub use savings::*;
