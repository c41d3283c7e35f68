//! Signed-in users and their open ledger stores.
//!
//! Authentication happens upstream; callers hand over an already verified
//! [`UserIdentity`]. Signing in opens (or reuses) the user's store, signing out
//! drops it so the next sign-in reloads from persistence.

use crate::{
    core::{
        gateway::DocumentGateway,
        model::{BudgetConfig, UserIdentity},
        store::LedgerHandle,
    },
    errors::Result,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::info;

/// Registry of open ledger stores keyed by user id.
#[derive(Debug)]
pub struct SessionRegistry<G> {
    gateway: Arc<G>,
    defaults: BudgetConfig,
    sessions: Mutex<HashMap<String, LedgerHandle>>,
}

impl<G: DocumentGateway> SessionRegistry<G> {
    /// Creates an empty registry. `defaults` seeds first-run ledgers.
    #[must_use]
    pub fn new(gateway: Arc<G>, defaults: BudgetConfig) -> Self {
        Self {
            gateway,
            defaults,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the user's store, opening it on first use.
    ///
    /// The registry is not locked while the store loads, so a slow first load
    /// does not hold up other users. When two sign-ins of the same user race,
    /// the first store registered wins and the other is dropped.
    pub async fn sign_in(&self, identity: UserIdentity) -> Result<LedgerHandle> {
        if let Some(handle) = self.session(&identity.id).await {
            return Ok(handle);
        }

        let user_id = identity.id.clone();
        let opened =
            LedgerHandle::open(Arc::clone(&self.gateway), identity, self.defaults.clone()).await?;
        let handle = self
            .sessions
            .lock()
            .await
            .entry(user_id.clone())
            .or_insert(opened)
            .clone();
        info!(user_id = %user_id, "User signed in");
        Ok(handle)
    }

    /// Drops the user's store. Returns false when no session was open.
    pub async fn sign_out(&self, user_id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(user_id).is_some();
        if removed {
            info!(user_id = %user_id, "User signed out");
        }
        removed
    }

    /// The user's store if they are signed in.
    pub async fn session(&self, user_id: &str) -> Option<LedgerHandle> {
        self.sessions.lock().await.get(user_id).cloned()
    }

    /// Number of signed-in users.
    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Configuration used for first-run ledgers and resets.
    #[must_use]
    pub const fn defaults(&self) -> &BudgetConfig {
        &self.defaults
    }
}
