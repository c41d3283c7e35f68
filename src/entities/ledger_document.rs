//! Ledger document entity - One serialized budget ledger per user.
//!
//! The whole `{config, monthlyData}` tree is stored as JSON text and replaced
//! wholesale on every write. `revision` increases by one on each write so that
//! stale snapshots can be told apart from newer ones.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger document database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_documents")]
pub struct Model {
    /// Opaque identity of the owner
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Owner display name at the time of the last write
    pub display_name: String,
    /// Owner avatar URL at the time of the last write
    pub avatar_url: Option<String>,
    /// Serialized ledger (`{"config": ..., "monthlyData": ...}`)
    #[sea_orm(column_type = "Text")]
    pub document: String,
    /// Write counter, starting at 1
    pub revision: i64,
    /// When the document was last written
    pub updated_at: DateTimeUtc,
}

/// `LedgerDocument` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
