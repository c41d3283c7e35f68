//! Command reducer.
//!
//! Every change to a ledger is expressed as a [`Command`]. [`apply`] is a pure
//! function from the current ledger and a command to a new ledger plus an
//! [`Outcome`]; it never modifies its input.

use crate::{
    core::{
        config_ops::{self, EnvelopeDraft, ProjectDraft, ProvisionDraft, RecurringItemDraft},
        envelope,
        model::{AccountCategory, BudgetConfig, Ledger},
        month::MonthKey,
        monthly, provision, savings,
    },
    errors::Result,
};

/// A single state transition request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Append a recurring item
    AddRecurringItem(RecurringItemDraft),
    /// Replace a recurring item's fields
    UpdateRecurringItem {
        /// Item id
        id: String,
        /// New fields
        draft: RecurringItemDraft,
    },
    /// Delete a recurring item
    RemoveRecurringItem {
        /// Item id
        id: String,
    },
    /// Append an envelope
    AddEnvelope(EnvelopeDraft),
    /// Replace an envelope's fields
    UpdateEnvelope {
        /// Envelope id
        id: String,
        /// New fields
        draft: EnvelopeDraft,
    },
    /// Delete an envelope
    RemoveEnvelope {
        /// Envelope id
        id: String,
    },
    /// Append an account
    AddAccount {
        /// Display label
        label: String,
        /// Account role
        category: AccountCategory,
        /// Opening balance
        initial: f64,
    },
    /// Set an account balance
    UpdateAccountBalance {
        /// Account id
        id: String,
        /// New balance
        balance: f64,
    },
    /// Choose the provision buffer account
    SetProvisionAccount {
        /// Account id
        id: String,
    },
    /// Choose the savings account
    SetSavingsAccount {
        /// Account id
        id: String,
    },
    /// Append a provision item to a year
    AddProvisionItem {
        /// Year bucket
        year: i32,
        /// Item fields
        draft: ProvisionDraft,
    },
    /// Replace a provision item's fields
    UpdateProvisionItem {
        /// Year bucket
        year: i32,
        /// Item id
        id: String,
        /// New fields
        draft: ProvisionDraft,
    },
    /// Delete a provision item
    RemoveProvisionItem {
        /// Year bucket
        year: i32,
        /// Item id
        id: String,
    },
    /// Append a project
    AddProject(ProjectDraft),
    /// Replace a project's label and target
    UpdateProject {
        /// Project id
        id: String,
        /// New fields
        draft: ProjectDraft,
    },
    /// Delete a project
    RemoveProject {
        /// Project id
        id: String,
    },
    /// Set the flexible spending target
    SetFlexibleTarget {
        /// Monthly target
        target: f64,
    },
    /// Add an income line
    AddIncome {
        /// Month
        month: MonthKey,
        /// Description
        label: String,
        /// Amount
        amount: f64,
    },
    /// Edit an income line
    UpdateIncome {
        /// Month
        month: MonthKey,
        /// Income id
        id: String,
        /// Description
        label: String,
        /// Amount
        amount: f64,
    },
    /// Delete an income line
    RemoveIncome {
        /// Month
        month: MonthKey,
        /// Income id
        id: String,
    },
    /// Override or clear the actual amount of a recurring item
    SetExpenseOverride {
        /// Month
        month: MonthKey,
        /// Recurring item id
        poste_id: String,
        /// Actual amount, `None` to clear
        amount: Option<f64>,
    },
    /// Check or uncheck a fixed expense
    ToggleValidated {
        /// Month
        month: MonthKey,
        /// Recurring item id
        poste_id: String,
    },
    /// Record variable spending
    AddFlexibleExpense {
        /// Month
        month: MonthKey,
        /// Description
        label: String,
        /// Amount
        amount: f64,
    },
    /// Delete variable spending
    RemoveFlexibleExpense {
        /// Month
        month: MonthKey,
        /// Expense id
        id: String,
    },
    /// Replace the month note
    SetNote {
        /// Month
        month: MonthKey,
        /// Note text
        note: String,
    },
    /// Fund an envelope with its monthly target
    FundEnvelope {
        /// Month
        month: MonthKey,
        /// Envelope id
        envelope_id: String,
    },
    /// Cancel this month's envelope funding
    UnfundEnvelope {
        /// Month
        month: MonthKey,
        /// Envelope id
        envelope_id: String,
    },
    /// Spend from an envelope
    SpendEnvelope {
        /// Month
        month: MonthKey,
        /// Envelope id
        envelope_id: String,
        /// Description
        label: String,
        /// Amount
        amount: f64,
    },
    /// Delete an envelope spend
    RemoveEnvelopeSpend {
        /// Month
        month: MonthKey,
        /// Expense id
        expense_id: String,
    },
    /// Toggle the monthly provision transfer
    ToggleProvisionTransfer {
        /// Month
        month: MonthKey,
    },
    /// Pay an expense from the provision buffer
    RecordProvisionExpense {
        /// Month
        month: MonthKey,
        /// Provision item id
        item_id: String,
        /// Description
        label: String,
        /// Amount
        amount: f64,
    },
    /// Delete a provision expense
    RemoveProvisionExpense {
        /// Month
        month: MonthKey,
        /// Expense id
        expense_id: String,
    },
    /// Move money to the savings account
    TransferToSavings {
        /// Amount
        amount: f64,
    },
    /// Move money back from the savings account
    RetrieveFromSavings {
        /// Amount
        amount: f64,
    },
    /// Move money to savings and record it on a month
    TransferToSavingsInMonth {
        /// Month
        month: MonthKey,
        /// Amount
        amount: f64,
        /// Note
        note: String,
    },
    /// Earmark money for a project
    FundProject {
        /// Project id
        project_id: String,
        /// Amount
        amount: f64,
        /// Account holding the money
        target_account_id: String,
    },
    /// Move money to an account for a project and record it on a month
    FundProjectInMonth {
        /// Month
        month: MonthKey,
        /// Project id
        project_id: String,
        /// Amount
        amount: f64,
        /// Account receiving the money
        target_account_id: String,
        /// Note
        note: String,
    },
    /// Cancel a month-scoped allocation
    RemoveAllocation {
        /// Month
        month: MonthKey,
        /// Allocation id
        allocation_id: String,
    },
    /// Validate a month
    CloseMonth {
        /// Month
        month: MonthKey,
    },
    /// Unlock a validated month
    ReopenMonth {
        /// Month
        month: MonthKey,
    },
    /// Replace everything with a default configuration and no monthly data
    ResetAll {
        /// Configuration to start from
        defaults: BudgetConfig,
    },
}

/// What a successful command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The ledger changed
    Applied,
    /// A new entity was created
    Created {
        /// Id of the new entity
        id: String,
    },
    /// A flag was flipped
    Toggled {
        /// State after the toggle
        on: bool,
    },
    /// A month was validated
    MonthClosed {
        /// The month the caller should move to
        next: MonthKey,
    },
    /// The command had nothing to do
    Unchanged,
}

/// A new ledger and what produced it.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Ledger after the command
    pub ledger: Ledger,
    /// Result of the command
    pub outcome: Outcome,
}

impl Transition {
    fn applied(ledger: Ledger) -> Self {
        Self {
            ledger,
            outcome: Outcome::Applied,
        }
    }

    fn created((ledger, id): (Ledger, String)) -> Self {
        Self {
            ledger,
            outcome: Outcome::Created { id },
        }
    }

    fn toggled((ledger, on): (Ledger, bool)) -> Self {
        Self {
            ledger,
            outcome: Outcome::Toggled { on },
        }
    }
}

fn with_config(ledger: &Ledger, config: BudgetConfig) -> Ledger {
    Ledger {
        config,
        monthly_data: ledger.monthly_data.clone(),
    }
}

fn config_created(ledger: &Ledger, (config, id): (BudgetConfig, String)) -> Transition {
    Transition::created((with_config(ledger, config), id))
}

/// Applies `command` to `ledger`, returning the new ledger.
///
/// # Errors
/// Rejections leave the input untouched: [`crate::errors::Error::MonthClosed`],
/// [`crate::errors::Error::NotFound`], [`crate::errors::Error::InvalidAmount`],
/// [`crate::errors::Error::AlreadyFunded`] and configuration errors.
#[allow(clippy::too_many_lines)]
pub fn apply(ledger: &Ledger, command: Command) -> Result<Transition> {
    let config = &ledger.config;
    let transition = match command {
        Command::AddRecurringItem(draft) => {
            config_created(ledger, config_ops::add_recurring_item(config, draft)?)
        }
        Command::UpdateRecurringItem { id, draft } => Transition::applied(with_config(
            ledger,
            config_ops::update_recurring_item(config, &id, draft)?,
        )),
        Command::RemoveRecurringItem { id } => Transition::applied(with_config(
            ledger,
            config_ops::remove_recurring_item(config, &id)?,
        )),
        Command::AddEnvelope(draft) => config_created(ledger, config_ops::add_envelope(config, draft)?),
        Command::UpdateEnvelope { id, draft } => Transition::applied(with_config(
            ledger,
            config_ops::update_envelope(config, &id, draft)?,
        )),
        Command::RemoveEnvelope { id } => {
            Transition::applied(with_config(ledger, config_ops::remove_envelope(config, &id)?))
        }
        Command::AddAccount {
            label,
            category,
            initial,
        } => config_created(
            ledger,
            config_ops::add_account(config, &label, category, initial)?,
        ),
        Command::UpdateAccountBalance { id, balance } => Transition::applied(with_config(
            ledger,
            config_ops::update_account_balance(config, &id, balance)?,
        )),
        Command::SetProvisionAccount { id } => Transition::applied(with_config(
            ledger,
            config_ops::set_provision_account(config, &id)?,
        )),
        Command::SetSavingsAccount { id } => Transition::applied(with_config(
            ledger,
            config_ops::set_savings_account(config, &id)?,
        )),
        Command::AddProvisionItem { year, draft } => config_created(
            ledger,
            config_ops::add_provision_item(config, year, draft)?,
        ),
        Command::UpdateProvisionItem { year, id, draft } => Transition::applied(with_config(
            ledger,
            config_ops::update_provision_item(config, year, &id, draft)?,
        )),
        Command::RemoveProvisionItem { year, id } => Transition::applied(with_config(
            ledger,
            config_ops::remove_provision_item(config, year, &id)?,
        )),
        Command::AddProject(draft) => config_created(ledger, config_ops::add_project(config, draft)?),
        Command::UpdateProject { id, draft } => Transition::applied(with_config(
            ledger,
            config_ops::update_project(config, &id, draft)?,
        )),
        Command::RemoveProject { id } => {
            Transition::applied(with_config(ledger, config_ops::remove_project(config, &id)?))
        }
        Command::SetFlexibleTarget { target } => Transition::applied(with_config(
            ledger,
            config_ops::set_flexible_target(config, target),
        )),
        Command::AddIncome {
            month,
            label,
            amount,
        } => Transition::created(monthly::add_income(ledger, month, &label, amount)?),
        Command::UpdateIncome {
            month,
            id,
            label,
            amount,
        } => Transition::applied(monthly::update_income(ledger, month, &id, &label, amount)?),
        Command::RemoveIncome { month, id } => {
            Transition::applied(monthly::remove_income(ledger, month, &id)?)
        }
        Command::SetExpenseOverride {
            month,
            poste_id,
            amount,
        } => Transition::applied(monthly::set_expense_override(
            ledger, month, &poste_id, amount,
        )?),
        Command::ToggleValidated { month, poste_id } => {
            Transition::toggled(monthly::toggle_validated(ledger, month, &poste_id)?)
        }
        Command::AddFlexibleExpense {
            month,
            label,
            amount,
        } => Transition::created(monthly::add_flexible_expense(ledger, month, &label, amount)?),
        Command::RemoveFlexibleExpense { month, id } => {
            Transition::applied(monthly::remove_flexible_expense(ledger, month, &id)?)
        }
        Command::SetNote { month, note } => {
            Transition::applied(monthly::set_note(ledger, month, &note)?)
        }
        Command::FundEnvelope { month, envelope_id } => {
            Transition::applied(envelope::fund_envelope(ledger, month, &envelope_id)?)
        }
        Command::UnfundEnvelope { month, envelope_id } => {
            Transition::applied(envelope::unfund_envelope(ledger, month, &envelope_id)?)
        }
        Command::SpendEnvelope {
            month,
            envelope_id,
            label,
            amount,
        } => Transition::created(envelope::record_envelope_spend(
            ledger,
            month,
            &envelope_id,
            &label,
            amount,
        )?),
        Command::RemoveEnvelopeSpend { month, expense_id } => {
            Transition::applied(envelope::remove_envelope_spend(ledger, month, &expense_id)?)
        }
        Command::ToggleProvisionTransfer { month } => {
            Transition::toggled(provision::toggle_provision_transfer(ledger, month)?)
        }
        Command::RecordProvisionExpense {
            month,
            item_id,
            label,
            amount,
        } => Transition::created(provision::record_provision_expense(
            ledger, month, &item_id, &label, amount,
        )?),
        Command::RemoveProvisionExpense { month, expense_id } => Transition::applied(
            provision::remove_provision_expense(ledger, month, &expense_id)?,
        ),
        Command::TransferToSavings { amount } => {
            Transition::applied(savings::transfer_to_savings(ledger, amount)?)
        }
        Command::RetrieveFromSavings { amount } => {
            Transition::applied(savings::retrieve_from_savings(ledger, amount)?)
        }
        Command::TransferToSavingsInMonth {
            month,
            amount,
            note,
        } => Transition::created(savings::transfer_to_savings_in_month(
            ledger, month, amount, &note,
        )?),
        Command::FundProject {
            project_id,
            amount,
            target_account_id,
        } => Transition::applied(savings::fund_project(
            ledger,
            &project_id,
            amount,
            &target_account_id,
        )?),
        Command::FundProjectInMonth {
            month,
            project_id,
            amount,
            target_account_id,
            note,
        } => Transition::created(savings::fund_project_in_month(
            ledger,
            month,
            &project_id,
            amount,
            &target_account_id,
            &note,
        )?),
        Command::RemoveAllocation {
            month,
            allocation_id,
        } => Transition::applied(savings::remove_allocation(ledger, month, &allocation_id)?),
        Command::CloseMonth { month } => {
            let (ledger, next) = monthly::close_month(ledger, month)?;
            Transition {
                ledger,
                outcome: Outcome::MonthClosed { next },
            }
        }
        Command::ReopenMonth { month } => {
            let (ledger, changed) = monthly::reopen_month(ledger, month)?;
            Transition {
                ledger,
                outcome: if changed {
                    Outcome::Applied
                } else {
                    Outcome::Unchanged
                },
            }
        }
        Command::ResetAll { defaults } => Transition::applied(Ledger::new(defaults)),
    };
    Ok(transition)
}
