//! Ledger store - the single writer for one user's ledger.
//!
//! A background task owns the state. Local commands and remote snapshots are
//! funneled through the same task, so a reducer run and a reconciliation never
//! interleave. Each command is applied in memory first, observers are notified,
//! then the document is written. Inbound snapshots replace the state when
//! their revision is newer than the last one known (last write wins).

use crate::{
    core::{
        gateway::{DocumentGateway, Snapshot},
        ledger::{self, Command, Outcome, Transition},
        model::{BudgetConfig, Ledger, UserIdentity},
    },
    errors::{Error, Result},
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};

/// Pending requests before `dispatch` callers start waiting for room.
const REQUEST_QUEUE_CAPACITY: usize = 32;

enum Request {
    Apply {
        command: Command,
        reply: oneshot::Sender<Result<Outcome>>,
    },
    Flush {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Cloneable handle to a running ledger store.
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    identity: UserIdentity,
    requests: mpsc::Sender<Request>,
    state: watch::Receiver<Arc<Ledger>>,
}

impl LedgerHandle {
    /// Loads the user's ledger and starts its store task.
    ///
    /// When the user has no document yet, a ledger built from `defaults` with
    /// empty monthly data is written first.
    #[instrument(skip(gateway, identity, defaults), fields(user_id = %identity.id))]
    pub async fn open<G: DocumentGateway>(
        gateway: Arc<G>,
        identity: UserIdentity,
        defaults: BudgetConfig,
    ) -> Result<Self> {
        // Subscribe before loading so no write lands between the two
        let remote = gateway.subscribe();

        let (ledger, revision) = match gateway.load(&identity).await? {
            Some(snapshot) => (snapshot.ledger, snapshot.revision),
            None => {
                info!("First run, writing default configuration");
                let ledger = Ledger::new(defaults);
                let revision = gateway.save(&identity, &ledger).await?;
                (ledger, revision)
            }
        };

        let (state_tx, state_rx) = watch::channel(Arc::new(ledger));
        let (requests_tx, requests_rx) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
        let task = StoreTask {
            gateway,
            identity: identity.clone(),
            state: state_tx,
            revision,
            dirty: false,
        };
        tokio::spawn(task.run(requests_rx, remote));

        Ok(Self {
            identity,
            requests: requests_tx,
            state: state_rx,
        })
    }

    /// Applies a command and persists the result.
    ///
    /// # Errors
    /// Ledger rejections are returned unchanged. [`Error::PersistenceFailed`]
    /// means the change is live in memory but not yet written; call
    /// [`LedgerHandle::flush`] to retry.
    pub async fn dispatch(&self, command: Command) -> Result<Outcome> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Request::Apply { command, reply })
            .await
            .map_err(|_| Error::StoreClosed)?;
        response.await.map_err(|_| Error::StoreClosed)?
    }

    /// Writes the in-memory ledger if a previous write failed.
    pub async fn flush(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Request::Flush { reply })
            .await
            .map_err(|_| Error::StoreClosed)?;
        response.await.map_err(|_| Error::StoreClosed)?
    }

    /// The current ledger.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Ledger> {
        Arc::clone(&self.state.borrow())
    }

    /// A receiver notified every time the ledger changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Ledger>> {
        self.state.clone()
    }

    /// Owner of this ledger.
    #[must_use]
    pub const fn identity(&self) -> &UserIdentity {
        &self.identity
    }
}

struct StoreTask<G> {
    gateway: Arc<G>,
    identity: UserIdentity,
    state: watch::Sender<Arc<Ledger>>,
    /// Revision of the last document written or accepted
    revision: i64,
    /// In-memory state differs from the last successful write
    dirty: bool,
}

impl<G: DocumentGateway> StoreTask<G> {
    async fn run(
        mut self,
        mut requests: mpsc::Receiver<Request>,
        mut remote: broadcast::Receiver<Snapshot>,
    ) {
        let mut remote_open = true;
        loop {
            // Remote snapshots first: anything broadcast before a request was
            // queued is reconciled before that request runs
            tokio::select! {
                biased;
                snapshot = remote.recv(), if remote_open => match snapshot {
                    Ok(snapshot) => self.reconcile(snapshot),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(user_id = %self.identity.id, skipped, "Missed remote snapshots, reloading");
                        self.resync().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => remote_open = false,
                },
                request = requests.recv() => {
                    let Some(request) = request else { break };
                    self.handle(request).await;
                }
            }
        }
        debug!(user_id = %self.identity.id, "Ledger store stopped");
    }

    async fn handle(&mut self, request: Request) {
        match request {
            Request::Apply { command, reply } => {
                let result = self.apply(command).await;
                let _ = reply.send(result);
            }
            Request::Flush { reply } => {
                let result = if self.dirty {
                    let current = Arc::clone(&self.state.borrow());
                    self.persist(&current).await
                } else {
                    Ok(())
                };
                let _ = reply.send(result);
            }
        }
    }

    async fn apply(&mut self, command: Command) -> Result<Outcome> {
        let current = Arc::clone(&self.state.borrow());
        let Transition { ledger, outcome } = ledger::apply(&current, command).inspect_err(|e| {
            debug!(user_id = %self.identity.id, error = %e, "Command rejected");
        })?;
        if outcome == Outcome::Unchanged {
            return Ok(outcome);
        }

        let ledger = Arc::new(ledger);
        self.state.send_replace(Arc::clone(&ledger));
        self.persist(&ledger).await?;
        Ok(outcome)
    }

    async fn persist(&mut self, ledger: &Ledger) -> Result<()> {
        match self.gateway.save(&self.identity, ledger).await {
            Ok(revision) => {
                self.revision = revision;
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                warn!(user_id = %self.identity.id, error = %e, "Ledger write failed, keeping in-memory state");
                Err(Error::PersistenceFailed {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Reloads the stored document after missed broadcasts.
    async fn resync(&mut self) {
        match self.gateway.load(&self.identity).await {
            Ok(Some(snapshot)) => self.reconcile(snapshot),
            Ok(None) => {}
            Err(e) => {
                warn!(user_id = %self.identity.id, error = %e, "Reload after missed snapshots failed");
            }
        }
    }

    fn reconcile(&mut self, snapshot: Snapshot) {
        if snapshot.user_id != self.identity.id || snapshot.revision <= self.revision {
            return;
        }
        if self.dirty {
            warn!(user_id = %self.identity.id, "Newer remote document replaces unsaved local changes");
            self.dirty = false;
        }
        debug!(user_id = %self.identity.id, revision = snapshot.revision, "Accepting remote snapshot");
        self.revision = snapshot.revision;
        if **self.state.borrow() != snapshot.ledger {
            self.state.send_replace(Arc::new(snapshot.ledger));
        }
    }
}
