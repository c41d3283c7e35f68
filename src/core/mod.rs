//! Core ledger logic - framework-agnostic state transitions, roll-ups and persistence
//!
//! Reducers in this module are pure: they borrow a [`model::Ledger`] and return a
//! new one, or an error with the input untouched. [`store`] serializes commands
//! for one user and persists every change through a [`gateway::DocumentGateway`].

/// Configuration mutations (recurring items, envelopes, accounts, provisions, projects)
pub mod config_ops;
/// Envelope funding and spending
pub mod envelope;
/// Document persistence and live snapshots
pub mod gateway;
/// Entity id generation
pub mod ids;
/// Command enum and dispatcher
pub mod ledger;
/// Ledger document types
pub mod model;
/// Cent rounding and amount parsing
pub mod money;
/// `YYYY-MM` month keys
pub mod month;
/// Month lifecycle, incomes and expenses
pub mod monthly;
/// Annual provision transfers and expenses
pub mod provision;
/// Month, year, savings and provision roll-ups
pub mod report;
/// Savings transfers and project funding
pub mod savings;
/// Signed-in users
pub mod session;
/// Per-user command queue
pub mod store;
