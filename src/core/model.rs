//! Ledger document model.
//!
//! One [`Ledger`] is stored per user: the [`BudgetConfig`] tree and the
//! per-month [`MonthRecord`] map. All types serialize with camelCase field names.

use crate::core::{money, month::MonthKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Role of an account in the household budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountCategory {
    /// The single day-to-day account all transfers originate from
    Current,
    /// Savings account (livret, LDD, ...)
    Savings,
    /// Buffer account holding annual provisions
    Provision,
}

/// A bank account and its running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique identifier
    pub id: String,
    /// Display label
    pub label: String,
    /// Account role
    pub category: AccountCategory,
    /// Running balance
    pub initial: f64,
}

/// How a recurring item is budgeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    /// Fixed monthly charge (rent, insurance)
    Fixed,
    /// Covered by a mandatory envelope
    MandatoryEnvelope,
    /// Covered by a secondary envelope
    SecondaryEnvelope,
    /// Irregular charge pre-funded through provisions
    Amortized,
}

/// A recurring expense category ("poste").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringItem {
    /// Unique identifier
    pub id: String,
    /// Display label
    pub label: String,
    /// Budgeting kind
    pub kind: ItemKind,
    /// Target monthly amount
    pub amount: f64,
}

/// Envelope priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnvelopeCategory {
    /// Must be funded every month
    Mandatory,
    /// Funded when the month allows it
    Secondary,
}

/// A sub-budget with its own balance, topped up from the current account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Unique identifier
    pub id: String,
    /// Display label
    pub label: String,
    /// Envelope priority
    pub category: EnvelopeCategory,
    /// Monthly funding target
    pub target: f64,
    /// Running balance
    pub balance: f64,
}

/// One expense charged against an annual provision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionHistoryEntry {
    /// Shared with the matching month-side [`ProvisionExpense`]
    pub id: String,
    /// Description
    pub label: String,
    /// Amount spent
    pub amount: f64,
    /// Month the expense was recorded in
    pub month: MonthKey,
}

/// A yearly or irregular charge pre-funded by monthly transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualProvisionItem {
    /// Unique identifier
    pub id: String,
    /// Display label
    pub label: String,
    /// Planned amount for the whole year
    pub planned: f64,
    /// Always equal to the sum of `history` amounts
    pub spent: f64,
    /// Expenses in the order they were recorded
    #[serde(default)]
    pub history: Vec<ProvisionHistoryEntry>,
}

impl AnnualProvisionItem {
    /// Planned amount not yet spent.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        money::round2(self.planned - self.spent)
    }
}

/// A savings goal with money earmarked in one or more accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier
    pub id: String,
    /// Display label
    pub label: String,
    /// Amount to reach
    pub target: f64,
    /// Earmarked amount per account id
    #[serde(default)]
    pub allocations: BTreeMap<String, f64>,
}

impl Project {
    /// Total earmarked across all accounts.
    #[must_use]
    pub fn allocated(&self) -> f64 {
        money::sum(self.allocations.values().copied())
    }
}

/// Monthly target for variable everyday spending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexibleBudget {
    /// Monthly target
    pub target: f64,
}

/// The configuration half of the ledger document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetConfig {
    /// Bank accounts
    pub accounts: Vec<Account>,
    /// Recurring expense categories
    pub postes: Vec<RecurringItem>,
    /// Envelopes
    pub envelopes: Vec<Envelope>,
    /// Account receiving the monthly provision transfer
    pub provision_account_id: Option<String>,
    /// Account receiving savings transfers
    pub savings_account_id: Option<String>,
    /// Provision items bucketed by calendar year
    pub annual_provisions: BTreeMap<i32, Vec<AnnualProvisionItem>>,
    /// Savings projects
    pub projects: Vec<Project>,
    /// Variable spending target
    pub flexible_budget: FlexibleBudget,
}

impl BudgetConfig {
    /// The account with category `current`. The first one wins if several exist.
    #[must_use]
    pub fn current_account(&self) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.category == AccountCategory::Current)
    }

    /// Looks up an account by id.
    #[must_use]
    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Looks up an envelope by id.
    #[must_use]
    pub fn envelope(&self, id: &str) -> Option<&Envelope> {
        self.envelopes.iter().find(|e| e.id == id)
    }

    /// Looks up a project by id.
    #[must_use]
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Provision items of `year`, empty when none are configured.
    #[must_use]
    pub fn provisions_for(&self, year: i32) -> &[AnnualProvisionItem] {
        self.annual_provisions
            .get(&year)
            .map_or(&[], Vec::as_slice)
    }

    /// Amount transferred to the provision buffer each month of `year`.
    #[must_use]
    pub fn monthly_provision_amount(&self, year: i32) -> f64 {
        let planned = money::sum(self.provisions_for(year).iter().map(|p| p.planned));
        money::round2(planned / 12.0)
    }

    /// Adds `delta` to an account balance. Returns false if the account does not exist.
    pub(crate) fn credit_account(&mut self, id: &str, delta: f64) -> bool {
        self.accounts.iter_mut().find(|a| a.id == id).is_some_and(|a| {
            a.initial = money::round2(a.initial + delta);
            true
        })
    }
}

/// A line of income for the month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeLine {
    /// Unique identifier
    pub id: String,
    /// Description (salary, refund, ...)
    pub label: String,
    /// Amount received
    pub amount: f64,
}

/// A generic expense line (envelope or flexible spending).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseEntry {
    /// Unique identifier
    pub id: String,
    /// Description
    pub label: String,
    /// Amount spent
    pub amount: f64,
}

/// An expense paid out of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeExpense {
    /// Unique identifier
    pub id: String,
    /// Envelope debited
    pub envelope_id: String,
    /// Description
    pub label: String,
    /// Amount spent
    pub amount: f64,
}

/// An expense paid out of the provision buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionExpense {
    /// Shared with the matching [`ProvisionHistoryEntry`]
    pub id: String,
    /// Provision item charged
    pub item_id: String,
    /// Year bucket of the provision item
    pub year: i32,
    /// Description
    pub label: String,
    /// Amount spent
    pub amount: f64,
}

/// Destination of an allocation transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AllocationKind {
    /// Transfer to the savings account
    Savings,
    /// Transfer earmarked for a project
    Project,
}

/// A transfer toward savings or a project, attributed to a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationTransaction {
    /// Unique identifier
    pub id: String,
    /// Savings or project
    #[serde(rename = "type")]
    pub kind: AllocationKind,
    /// Amount moved
    pub amount: f64,
    /// Project funded, for project allocations
    #[serde(default)]
    pub project_id: Option<String>,
    /// Account credited
    pub target_account_id: String,
    /// Free-text note
    #[serde(default)]
    pub note: String,
}

/// Everything recorded for one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthRecord {
    /// Income lines
    pub incomes: Vec<IncomeLine>,
    /// Actual amount per recurring item id, overriding the target
    pub overrides: BTreeMap<String, f64>,
    /// Fixed items checked off as paid
    pub validated: BTreeSet<String>,
    /// Amount moved into each envelope funded this month
    pub funded: BTreeMap<String, f64>,
    /// Envelope spending history
    pub envelope_expenses: Vec<EnvelopeExpense>,
    /// Provision spending history
    pub provision_expenses: Vec<ProvisionExpense>,
    /// Variable spending lines
    pub flexible_expenses: Vec<ExpenseEntry>,
    /// Amount moved to the provision buffer, `None` when not done
    pub provision_transfer: Option<f64>,
    /// Savings and project transfers
    pub allocations: Vec<AllocationTransaction>,
    /// Locked against further edits
    pub is_closed: bool,
    /// Free-text note
    pub note: String,
}

impl MonthRecord {
    /// Whether the envelope has been funded this month.
    #[must_use]
    pub fn is_funded(&self, envelope_id: &str) -> bool {
        self.funded.contains_key(envelope_id)
    }

    /// Whether the monthly provision transfer has been made.
    #[must_use]
    pub const fn provision_transfer_done(&self) -> bool {
        self.provision_transfer.is_some()
    }
}

/// Month records keyed by month.
pub type MonthlyData = BTreeMap<MonthKey, MonthRecord>;

/// The whole per-user document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ledger {
    /// Configuration tree
    pub config: BudgetConfig,
    /// Per-month records
    pub monthly_data: MonthlyData,
}

impl Ledger {
    /// A ledger with the given configuration and no monthly data.
    #[must_use]
    pub const fn new(config: BudgetConfig) -> Self {
        Self {
            config,
            monthly_data: BTreeMap::new(),
        }
    }

    /// The record for `month`; months never written read as an empty open record.
    #[must_use]
    pub fn month(&self, month: MonthKey) -> MonthRecord {
        self.monthly_data.get(&month).cloned().unwrap_or_default()
    }

    /// Whether `month` has been validated.
    #[must_use]
    pub fn is_closed(&self, month: MonthKey) -> bool {
        self.monthly_data.get(&month).is_some_and(|m| m.is_closed)
    }
}

/// The authenticated owner of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// Opaque identifier
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Avatar image URL
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_document_uses_config_and_monthly_data_fields() {
        let mut ledger = sample_ledger();
        ledger
            .monthly_data
            .insert(month("2026-01"), MonthRecord::default());

        let json = serde_json::to_value(&ledger).unwrap();
        assert!(json.get("config").is_some());
        assert!(json["monthlyData"].get("2026-01").is_some());
        assert_eq!(json["monthlyData"]["2026-01"]["isClosed"], false);

        let back: Ledger = serde_json::from_value(json).unwrap();
        assert_eq!(back, ledger);
    }

    #[test]
    fn test_missing_fields_default() {
        let ledger: Ledger = serde_json::from_str(r#"{"config": {"accounts": []}}"#).unwrap();
        assert!(ledger.monthly_data.is_empty());
        assert!(ledger.config.projects.is_empty());
    }

    #[test]
    fn test_unwritten_month_reads_open() {
        let ledger = sample_ledger();
        let record = ledger.month(month("2030-05"));
        assert!(!record.is_closed);
        assert!(!ledger.is_closed(month("2030-05")));
    }

    #[test]
    fn test_monthly_provision_amount() {
        let ledger = sample_ledger();
        // 600 + 1200 planned for 2026
        assert_eq!(ledger.config.monthly_provision_amount(2026), 150.0);
        assert_eq!(ledger.config.monthly_provision_amount(1999), 0.0);
    }

    #[test]
    fn test_project_allocated() {
        let ledger = sample_ledger();
        let project = ledger.config.project(PROJECT_ID).unwrap();
        assert_eq!(project.allocated(), 4000.0);
    }
}
