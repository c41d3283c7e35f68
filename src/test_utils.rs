//! Shared test utilities for the budget ledger.
//!
//! This module provides a sample household ledger matching the documented
//! scenarios, plus helpers for setting up in-memory databases and stores.

use crate::{
    core::{
        gateway::{DocumentGateway, SeaOrmGateway, Snapshot},
        model::{
            Account, AccountCategory, AnnualProvisionItem, BudgetConfig, Envelope,
            EnvelopeCategory, FlexibleBudget, ItemKind, Ledger, Project, RecurringItem,
            UserIdentity,
        },
        month::MonthKey,
        store::LedgerHandle,
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::broadcast;

/// Id of the current account (balance 5000)
pub const CURRENT_ID: &str = "current";
/// Id of the savings account (balance 3000)
pub const LDD_ID: &str = "ldd";
/// Id of the second savings account (balance 1000)
pub const CASDEN_ID: &str = "casden";
/// Id of the provision buffer account (balance 0)
pub const PROVISIONS_ID: &str = "provisions";
/// Fixed rent item, target 880
pub const RENT_ID: &str = "poste_loyer";
/// Mandatory envelope, target 400
pub const GROCERIES_ID: &str = "env_courses";
/// Secondary envelope, target 100
pub const LEISURE_ID: &str = "env_loisirs";
/// 2026 provision item, planned 600
pub const INSURANCE_ID: &str = "prov_assurance";
/// 2026 provision item, planned 1200
pub const TAXES_ID: &str = "prov_impots";
/// Project with target 10000 and 4000 already allocated
pub const PROJECT_ID: &str = "proj_voyage";

/// Parses a month key, panicking on malformed test input.
#[allow(clippy::unwrap_used)]
pub fn month(key: &str) -> MonthKey {
    key.parse().unwrap()
}

fn account(id: &str, label: &str, category: AccountCategory, initial: f64) -> Account {
    Account {
        id: id.to_string(),
        label: label.to_string(),
        category,
        initial,
    }
}

fn provision(id: &str, label: &str, planned: f64) -> AnnualProvisionItem {
    AnnualProvisionItem {
        id: id.to_string(),
        label: label.to_string(),
        planned,
        spent: 0.0,
        history: Vec::new(),
    }
}

/// Configuration used by most tests.
///
/// # Contents
/// * accounts: current 5000, ldd 3000, casden 1000, provisions 0
/// * postes: rent (fixed, 880), groceries (mandatory envelope, 400)
/// * envelopes: groceries (mandatory, 400), leisure (secondary, 100), both at balance 0
/// * 2026 provisions: insurance 600, taxes 1200
/// * project: trip, target 10000, allocations ldd 3000 / casden 1000
pub fn sample_config() -> BudgetConfig {
    BudgetConfig {
        accounts: vec![
            account(CURRENT_ID, "Compte courant", AccountCategory::Current, 5000.0),
            account(LDD_ID, "LDD", AccountCategory::Savings, 3000.0),
            account(CASDEN_ID, "CASDEN", AccountCategory::Savings, 1000.0),
            account(PROVISIONS_ID, "Provisions", AccountCategory::Provision, 0.0),
        ],
        postes: vec![
            RecurringItem {
                id: RENT_ID.to_string(),
                label: "Loyer".to_string(),
                kind: ItemKind::Fixed,
                amount: 880.0,
            },
            RecurringItem {
                id: "poste_courses".to_string(),
                label: "Courses".to_string(),
                kind: ItemKind::MandatoryEnvelope,
                amount: 400.0,
            },
        ],
        envelopes: vec![
            Envelope {
                id: GROCERIES_ID.to_string(),
                label: "Courses".to_string(),
                category: EnvelopeCategory::Mandatory,
                target: 400.0,
                balance: 0.0,
            },
            Envelope {
                id: LEISURE_ID.to_string(),
                label: "Loisirs".to_string(),
                category: EnvelopeCategory::Secondary,
                target: 100.0,
                balance: 0.0,
            },
        ],
        provision_account_id: Some(PROVISIONS_ID.to_string()),
        savings_account_id: Some(LDD_ID.to_string()),
        annual_provisions: BTreeMap::from([(
            2026,
            vec![
                provision(INSURANCE_ID, "Assurance auto", 600.0),
                provision(TAXES_ID, "Taxe foncière", 1200.0),
            ],
        )]),
        projects: vec![Project {
            id: PROJECT_ID.to_string(),
            label: "Voyage".to_string(),
            target: 10000.0,
            allocations: BTreeMap::from([
                (LDD_ID.to_string(), 3000.0),
                (CASDEN_ID.to_string(), 1000.0),
            ]),
        }],
        flexible_budget: FlexibleBudget { target: 300.0 },
    }
}

/// A ledger built on [`sample_config`] with no monthly data.
pub fn sample_ledger() -> Ledger {
    Ledger::new(sample_config())
}

/// Balance of an account in `ledger`, 0 when missing.
pub fn balance(ledger: &Ledger, account_id: &str) -> f64 {
    ledger.config.account(account_id).map_or(0.0, |a| a.initial)
}

/// Balance of an envelope in `ledger`, 0 when missing.
pub fn envelope_balance(ledger: &Ledger, envelope_id: &str) -> f64 {
    ledger.config.envelope(envelope_id).map_or(0.0, |e| e.balance)
}

/// Identity used by store and session tests.
pub fn test_identity(id: &str) -> UserIdentity {
    UserIdentity {
        id: id.to_string(),
        display_name: format!("User {id}"),
        avatar_url: None,
    }
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all persistence tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Gateway over a fresh in-memory database.
pub async fn setup_gateway() -> Result<Arc<SeaOrmGateway>> {
    let db = setup_test_db().await?;
    Ok(Arc::new(SeaOrmGateway::new(db)))
}

/// Opens a store for `user` seeded with [`sample_config`].
pub async fn setup_store(user: &str) -> Result<(Arc<SeaOrmGateway>, LedgerHandle)> {
    let gateway = setup_gateway().await?;
    let handle =
        LedgerHandle::open(Arc::clone(&gateway), test_identity(user), sample_config()).await?;
    Ok((gateway, handle))
}

/// Gateway whose writes can be switched to fail.
pub struct FlakyGateway {
    /// Real gateway used when writes succeed
    pub inner: SeaOrmGateway,
    /// When set, every `save` fails
    pub fail_writes: AtomicBool,
}

impl FlakyGateway {
    /// Wraps a fresh in-memory gateway.
    pub async fn new() -> Result<Arc<Self>> {
        let db = setup_test_db().await?;
        Ok(Arc::new(Self {
            inner: SeaOrmGateway::new(db),
            fail_writes: AtomicBool::new(false),
        }))
    }

    /// Makes subsequent writes fail or succeed.
    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }
}

impl DocumentGateway for FlakyGateway {
    async fn load(&self, user: &UserIdentity) -> Result<Option<Snapshot>> {
        self.inner.load(user).await
    }

    async fn save(&self, user: &UserIdentity, ledger: &Ledger) -> Result<i64> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Config {
                message: "simulated write failure".to_string(),
            });
        }
        self.inner.save(user, ledger).await
    }

    fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.inner.subscribe()
    }
}
