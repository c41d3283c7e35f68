//! Entity module - Contains all SeaORM entity definitions for the database.
//! The ledger is stored as one document row per user.

pub mod ledger_document;

pub use ledger_document::{
    Column as LedgerDocumentColumn, Entity as LedgerDocument, Model as LedgerDocumentModel,
};
