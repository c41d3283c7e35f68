//! Per-month ledger operations.
//!
//! A month is `OPEN` until it is validated with [`close_month`] and `OPEN` again
//! after [`reopen_month`]. Every other mutation on a closed month fails with
//! [`Error::MonthClosed`] and leaves the ledger untouched. Month records are
//! created implicitly on first write.

use crate::{
    core::{
        ids::new_id,
        model::{BudgetConfig, ExpenseEntry, IncomeLine, Ledger, MonthRecord},
        money,
        month::MonthKey,
    },
    errors::{Error, Result},
};
use tracing::debug;

/// Applies `edit` to a copy of the ledger, scoped to one open month.
///
/// The closure sees the config and the month record of the copy. If it fails the
/// copy is discarded, so every operation built on this is all-or-nothing.
pub(crate) fn edit_open_month<T, F>(ledger: &Ledger, month: MonthKey, edit: F) -> Result<(Ledger, T)>
where
    F: FnOnce(&mut BudgetConfig, &mut MonthRecord) -> Result<T>,
{
    if ledger.is_closed(month) {
        return Err(Error::MonthClosed {
            month: month.to_string(),
        });
    }
    let mut next = ledger.clone();
    let record = next.monthly_data.entry(month).or_default();
    let value = edit(&mut next.config, record)?;
    Ok((next, value))
}

/// Adds an income line. Malformed amounts count as 0.
pub fn add_income(
    ledger: &Ledger,
    month: MonthKey,
    label: &str,
    amount: f64,
) -> Result<(Ledger, String)> {
    edit_open_month(ledger, month, |_, record| {
        let id = new_id("inc");
        record.incomes.push(IncomeLine {
            id: id.clone(),
            label: label.trim().to_string(),
            amount: money::sanitize(amount),
        });
        Ok(id)
    })
}

/// Replaces the label and amount of an income line.
pub fn update_income(
    ledger: &Ledger,
    month: MonthKey,
    income_id: &str,
    label: &str,
    amount: f64,
) -> Result<Ledger> {
    edit_open_month(ledger, month, |_, record| {
        let line = record
            .incomes
            .iter_mut()
            .find(|i| i.id == income_id)
            .ok_or_else(|| Error::not_found("income", income_id))?;
        line.label = label.trim().to_string();
        line.amount = money::sanitize(amount);
        Ok(())
    })
    .map(|(next, ())| next)
}

/// Removes an income line.
pub fn remove_income(ledger: &Ledger, month: MonthKey, income_id: &str) -> Result<Ledger> {
    edit_open_month(ledger, month, |_, record| {
        let before = record.incomes.len();
        record.incomes.retain(|i| i.id != income_id);
        if record.incomes.len() == before {
            return Err(Error::not_found("income", income_id));
        }
        Ok(())
    })
    .map(|(next, ())| next)
}

/// Sets the actual amount of a recurring item for the month; `None` reverts to the target.
pub fn set_expense_override(
    ledger: &Ledger,
    month: MonthKey,
    poste_id: &str,
    amount: Option<f64>,
) -> Result<Ledger> {
    edit_open_month(ledger, month, |config, record| {
        if !config.postes.iter().any(|p| p.id == poste_id) {
            return Err(Error::not_found("recurring item", poste_id));
        }
        match amount {
            Some(amount) => {
                record
                    .overrides
                    .insert(poste_id.to_string(), money::sanitize(amount));
            }
            None => {
                record.overrides.remove(poste_id);
            }
        }
        Ok(())
    })
    .map(|(next, ())| next)
}

/// Checks or unchecks a fixed expense as paid. Returns the new checked state.
pub fn toggle_validated(ledger: &Ledger, month: MonthKey, poste_id: &str) -> Result<(Ledger, bool)> {
    edit_open_month(ledger, month, |config, record| {
        if !config.postes.iter().any(|p| p.id == poste_id) {
            return Err(Error::not_found("recurring item", poste_id));
        }
        if record.validated.remove(poste_id) {
            Ok(false)
        } else {
            record.validated.insert(poste_id.to_string());
            Ok(true)
        }
    })
}

/// Records a variable everyday expense.
pub fn add_flexible_expense(
    ledger: &Ledger,
    month: MonthKey,
    label: &str,
    amount: f64,
) -> Result<(Ledger, String)> {
    let amount = money::positive(amount)?;
    edit_open_month(ledger, month, |_, record| {
        let id = new_id("flex");
        record.flexible_expenses.push(ExpenseEntry {
            id: id.clone(),
            label: label.trim().to_string(),
            amount,
        });
        Ok(id)
    })
}

/// Removes a variable expense.
pub fn remove_flexible_expense(ledger: &Ledger, month: MonthKey, expense_id: &str) -> Result<Ledger> {
    edit_open_month(ledger, month, |_, record| {
        let before = record.flexible_expenses.len();
        record.flexible_expenses.retain(|e| e.id != expense_id);
        if record.flexible_expenses.len() == before {
            return Err(Error::not_found("expense", expense_id));
        }
        Ok(())
    })
    .map(|(next, ())| next)
}

/// Replaces the free-text note of the month.
pub fn set_note(ledger: &Ledger, month: MonthKey, note: &str) -> Result<Ledger> {
    edit_open_month(ledger, month, |_, record| {
        record.note = note.to_string();
        Ok(())
    })
    .map(|(next, ())| next)
}

/// Validates (closes) a month and returns the key of the following month.
///
/// Closing December also sweeps every envelope balance to zero so the new year
/// starts from empty envelopes. Both effects land in the same new ledger.
pub fn close_month(ledger: &Ledger, month: MonthKey) -> Result<(Ledger, MonthKey)> {
    edit_open_month(ledger, month, |config, record| {
        record.is_closed = true;
        if month.is_december() {
            debug!(%month, "Year-end sweep: resetting envelope balances");
            for envelope in &mut config.envelopes {
                envelope.balance = 0.0;
            }
        }
        Ok(month.next())
    })
}

/// Reopens a closed month. Returns `false` when the month was already open.
pub fn reopen_month(ledger: &Ledger, month: MonthKey) -> Result<(Ledger, bool)> {
    if !ledger.is_closed(month) {
        return Ok((ledger.clone(), false));
    }
    let mut next = ledger.clone();
    if let Some(record) = next.monthly_data.get_mut(&month) {
        record.is_closed = false;
    }
    Ok((next, true))
}
