//! Configuration mutations.
//!
//! Every operation borrows the current [`BudgetConfig`] and returns a new one;
//! the input is never modified. Updates are idempotent, adds always append a
//! new entity with a fresh id, and unknown ids yield [`Error::NotFound`].

use crate::{
    core::{
        ids::new_id,
        model::{
            Account, AccountCategory, AnnualProvisionItem, BudgetConfig, Envelope,
            EnvelopeCategory, ItemKind, Project, RecurringItem,
        },
        money,
    },
    errors::{Error, Result},
};
use std::collections::BTreeMap;

/// Editable fields of a recurring item.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringItemDraft {
    /// Display label
    pub label: String,
    /// Budgeting kind
    pub kind: ItemKind,
    /// Target monthly amount
    pub amount: f64,
}

/// Editable fields of an envelope. The balance is not part of the draft.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeDraft {
    /// Display label
    pub label: String,
    /// Envelope priority
    pub category: EnvelopeCategory,
    /// Monthly funding target
    pub target: f64,
}

/// Editable fields of an annual provision item.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionDraft {
    /// Display label
    pub label: String,
    /// Planned yearly amount
    pub planned: f64,
}

/// Editable fields of a project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    /// Display label
    pub label: String,
    /// Amount to reach
    pub target: f64,
}

fn validate_label(label: &str) -> Result<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(Error::Config {
            message: "Label cannot be empty".to_string(),
        });
    }
    Ok(label.to_string())
}

/// Appends a recurring item and returns the new config with its id.
pub fn add_recurring_item(
    config: &BudgetConfig,
    draft: RecurringItemDraft,
) -> Result<(BudgetConfig, String)> {
    let id = new_id("poste");
    let mut next = config.clone();
    next.postes.push(RecurringItem {
        id: id.clone(),
        label: validate_label(&draft.label)?,
        kind: draft.kind,
        amount: money::sanitize(draft.amount),
    });
    Ok((next, id))
}

/// Replaces the editable fields of a recurring item.
pub fn update_recurring_item(
    config: &BudgetConfig,
    id: &str,
    draft: RecurringItemDraft,
) -> Result<BudgetConfig> {
    let label = validate_label(&draft.label)?;
    let mut next = config.clone();
    let item = next
        .postes
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| Error::not_found("recurring item", id))?;
    item.label = label;
    item.kind = draft.kind;
    item.amount = money::sanitize(draft.amount);
    Ok(next)
}

/// Removes a recurring item.
pub fn remove_recurring_item(config: &BudgetConfig, id: &str) -> Result<BudgetConfig> {
    if !config.postes.iter().any(|p| p.id == id) {
        return Err(Error::not_found("recurring item", id));
    }
    let mut next = config.clone();
    next.postes.retain(|p| p.id != id);
    Ok(next)
}

/// Appends an envelope with a zero balance.
pub fn add_envelope(config: &BudgetConfig, draft: EnvelopeDraft) -> Result<(BudgetConfig, String)> {
    let id = new_id("env");
    let mut next = config.clone();
    next.envelopes.push(Envelope {
        id: id.clone(),
        label: validate_label(&draft.label)?,
        category: draft.category,
        target: money::sanitize(draft.target),
        balance: 0.0,
    });
    Ok((next, id))
}

/// Replaces the label, category and target of an envelope, keeping its balance.
pub fn update_envelope(config: &BudgetConfig, id: &str, draft: EnvelopeDraft) -> Result<BudgetConfig> {
    let label = validate_label(&draft.label)?;
    let mut next = config.clone();
    let envelope = next
        .envelopes
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| Error::not_found("envelope", id))?;
    envelope.label = label;
    envelope.category = draft.category;
    envelope.target = money::sanitize(draft.target);
    Ok(next)
}

/// Removes an envelope.
pub fn remove_envelope(config: &BudgetConfig, id: &str) -> Result<BudgetConfig> {
    if config.envelope(id).is_none() {
        return Err(Error::not_found("envelope", id));
    }
    let mut next = config.clone();
    next.envelopes.retain(|e| e.id != id);
    Ok(next)
}

/// Appends an account.
pub fn add_account(
    config: &BudgetConfig,
    label: &str,
    category: AccountCategory,
    initial: f64,
) -> Result<(BudgetConfig, String)> {
    if category == AccountCategory::Current && config.current_account().is_some() {
        return Err(Error::Config {
            message: "A current account already exists".to_string(),
        });
    }
    let id = new_id("acc");
    let mut next = config.clone();
    next.accounts.push(Account {
        id: id.clone(),
        label: validate_label(label)?,
        category,
        initial: money::sanitize(initial),
    });
    Ok((next, id))
}

/// Sets the running balance of an account.
pub fn update_account_balance(config: &BudgetConfig, id: &str, balance: f64) -> Result<BudgetConfig> {
    let mut next = config.clone();
    let account = next
        .accounts
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| Error::not_found("account", id))?;
    account.initial = money::sanitize(balance);
    Ok(next)
}

fn require_category(config: &BudgetConfig, id: &str, category: AccountCategory) -> Result<()> {
    match config.account(id) {
        Some(account) if account.category == category => Ok(()),
        Some(_) => Err(Error::Config {
            message: format!("Account '{id}' is not a {category:?} account"),
        }),
        None => Err(Error::not_found("account", id)),
    }
}

/// Designates the account receiving the monthly provision transfer.
pub fn set_provision_account(config: &BudgetConfig, id: &str) -> Result<BudgetConfig> {
    require_category(config, id, AccountCategory::Provision)?;
    let mut next = config.clone();
    next.provision_account_id = Some(id.to_string());
    Ok(next)
}

/// Designates the account receiving savings transfers.
pub fn set_savings_account(config: &BudgetConfig, id: &str) -> Result<BudgetConfig> {
    require_category(config, id, AccountCategory::Savings)?;
    let mut next = config.clone();
    next.savings_account_id = Some(id.to_string());
    Ok(next)
}

/// Appends a provision item to the `year` bucket.
pub fn add_provision_item(
    config: &BudgetConfig,
    year: i32,
    draft: ProvisionDraft,
) -> Result<(BudgetConfig, String)> {
    let id = new_id("prov");
    let mut next = config.clone();
    next.annual_provisions
        .entry(year)
        .or_default()
        .push(AnnualProvisionItem {
            id: id.clone(),
            label: validate_label(&draft.label)?,
            planned: money::sanitize(draft.planned),
            spent: 0.0,
            history: Vec::new(),
        });
    Ok((next, id))
}

/// Replaces the label and planned amount of a provision item. Spending history is kept.
pub fn update_provision_item(
    config: &BudgetConfig,
    year: i32,
    id: &str,
    draft: ProvisionDraft,
) -> Result<BudgetConfig> {
    let label = validate_label(&draft.label)?;
    let mut next = config.clone();
    let item = next
        .annual_provisions
        .get_mut(&year)
        .and_then(|items| items.iter_mut().find(|p| p.id == id))
        .ok_or_else(|| Error::not_found("provision item", id))?;
    item.label = label;
    item.planned = money::sanitize(draft.planned);
    Ok(next)
}

/// Removes a provision item from the `year` bucket.
pub fn remove_provision_item(config: &BudgetConfig, year: i32, id: &str) -> Result<BudgetConfig> {
    if !config.provisions_for(year).iter().any(|p| p.id == id) {
        return Err(Error::not_found("provision item", id));
    }
    let mut next = config.clone();
    if let Some(items) = next.annual_provisions.get_mut(&year) {
        items.retain(|p| p.id != id);
    }
    Ok(next)
}

/// Appends a project with no allocations.
pub fn add_project(config: &BudgetConfig, draft: ProjectDraft) -> Result<(BudgetConfig, String)> {
    let id = new_id("proj");
    let mut next = config.clone();
    next.projects.push(Project {
        id: id.clone(),
        label: validate_label(&draft.label)?,
        target: money::sanitize(draft.target),
        allocations: BTreeMap::new(),
    });
    Ok((next, id))
}

/// Replaces the label and target of a project, keeping its allocations.
pub fn update_project(config: &BudgetConfig, id: &str, draft: ProjectDraft) -> Result<BudgetConfig> {
    let label = validate_label(&draft.label)?;
    let mut next = config.clone();
    let project = next
        .projects
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| Error::not_found("project", id))?;
    project.label = label;
    project.target = money::sanitize(draft.target);
    Ok(next)
}

/// Removes a project.
pub fn remove_project(config: &BudgetConfig, id: &str) -> Result<BudgetConfig> {
    if config.project(id).is_none() {
        return Err(Error::not_found("project", id));
    }
    let mut next = config.clone();
    next.projects.retain(|p| p.id != id);
    Ok(next)
}

/// Sets the monthly target for variable spending.
#[must_use]
pub fn set_flexible_target(config: &BudgetConfig, target: f64) -> BudgetConfig {
    let mut next = config.clone();
    next.flexible_budget.target = money::sanitize(target);
    next
}
