//! Persistence gateway.
//!
//! The ledger is persisted as one document per user, read whole on open and
//! written whole after every change. Committed writes are broadcast to every
//! subscriber, including the session that wrote them.

use crate::{
    core::model::{Ledger, UserIdentity},
    entities::{LedgerDocument, ledger_document},
    errors::Result,
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::future::Future;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

/// Capacity of the live snapshot channel.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// A committed ledger document.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Owner of the document
    pub user_id: String,
    /// Write counter of the document
    pub revision: i64,
    /// Document contents
    pub ledger: Ledger,
}

/// Document store holding one ledger per user.
pub trait DocumentGateway: Send + Sync + 'static {
    /// Reads the user's document, `None` on first run.
    fn load(&self, user: &UserIdentity) -> impl Future<Output = Result<Option<Snapshot>>> + Send;

    /// Replaces the user's document and returns its new revision.
    fn save(&self, user: &UserIdentity, ledger: &Ledger) -> impl Future<Output = Result<i64>> + Send;

    /// Live feed of committed documents for all users.
    fn subscribe(&self) -> broadcast::Receiver<Snapshot>;
}

/// [`DocumentGateway`] backed by a `SeaORM` database.
#[derive(Debug, Clone)]
pub struct SeaOrmGateway {
    db: DatabaseConnection,
    updates: broadcast::Sender<Snapshot>,
}

impl SeaOrmGateway {
    /// Wraps a connection whose tables have already been created.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let (updates, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self { db, updates }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl DocumentGateway for SeaOrmGateway {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn load(&self, user: &UserIdentity) -> Result<Option<Snapshot>> {
        let Some(row) = LedgerDocument::find_by_id(user.id.clone()).one(&self.db).await? else {
            debug!("No ledger document yet");
            return Ok(None);
        };
        let ledger: Ledger = serde_json::from_str(&row.document)?;
        Ok(Some(Snapshot {
            user_id: row.user_id,
            revision: row.revision,
            ledger,
        }))
    }

    #[instrument(skip(self, user, ledger), fields(user_id = %user.id))]
    async fn save(&self, user: &UserIdentity, ledger: &Ledger) -> Result<i64> {
        let document = serde_json::to_string(ledger)?;
        let now = chrono::Utc::now();

        // Read-increment-write of the revision must not interleave with another save
        let txn = self.db.begin().await?;
        let existing = LedgerDocument::find_by_id(user.id.clone()).one(&txn).await?;

        let revision = if let Some(row) = existing {
            let revision = row.revision + 1;
            let mut active_model: ledger_document::ActiveModel = row.into();
            active_model.display_name = Set(user.display_name.clone());
            active_model.avatar_url = Set(user.avatar_url.clone());
            active_model.document = Set(document);
            active_model.revision = Set(revision);
            active_model.updated_at = Set(now);
            active_model.update(&txn).await?;
            revision
        } else {
            let new_document = ledger_document::ActiveModel {
                user_id: Set(user.id.clone()),
                display_name: Set(user.display_name.clone()),
                avatar_url: Set(user.avatar_url.clone()),
                document: Set(document),
                revision: Set(1),
                updated_at: Set(now),
            };
            new_document.insert(&txn).await?;
            1
        };

        txn.commit().await?;
        debug!(revision, "Ledger document saved");

        // No live subscribers is not an error
        let _ = self.updates.send(Snapshot {
            user_id: user.id.clone(),
            revision,
            ledger: ledger.clone(),
        });
        Ok(revision)
    }

    fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_load_missing_document() -> Result<()> {
        let gateway = setup_gateway().await?;
        assert!(gateway.load(&test_identity("nobody")).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() -> Result<()> {
        let gateway = setup_gateway().await?;
        let user = test_identity("alice");
        let ledger = sample_ledger();

        let revision = gateway.save(&user, &ledger).await?;
        assert_eq!(revision, 1);

        let snapshot = gateway.load(&user).await?.unwrap();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.ledger, ledger);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_replaces_document_and_bumps_revision() -> Result<()> {
        let gateway = setup_gateway().await?;
        let user = test_identity("alice");

        gateway.save(&user, &sample_ledger()).await?;
        let empty = Ledger::default();
        let revision = gateway.save(&user, &empty).await?;
        assert_eq!(revision, 2);

        let snapshot = gateway.load(&user).await?.unwrap();
        assert_eq!(snapshot.ledger, empty);

        let count = LedgerDocument::find().count(gateway.connection()).await?;
        assert_eq!(count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_documents_are_per_user() -> Result<()> {
        let gateway = setup_gateway().await?;
        gateway.save(&test_identity("alice"), &sample_ledger()).await?;
        gateway.save(&test_identity("bob"), &Ledger::default()).await?;

        let alice = gateway.load(&test_identity("alice")).await?.unwrap();
        let bob = gateway.load(&test_identity("bob")).await?.unwrap();
        assert_eq!(alice.ledger, sample_ledger());
        assert_eq!(bob.ledger, Ledger::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_broadcasts_snapshot() -> Result<()> {
        let gateway = setup_gateway().await?;
        let mut updates = gateway.subscribe();
        let user = test_identity("alice");

        gateway.save(&user, &sample_ledger()).await?;
        let snapshot = updates.recv().await.unwrap();
        assert_eq!(snapshot.user_id, "alice");
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.ledger, sample_ledger());
        Ok(())
    }
}
