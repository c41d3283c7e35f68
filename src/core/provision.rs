//! Annual provisions.
//!
//! Irregular yearly charges are pre-funded by a fixed monthly transfer from the
//! current account into a buffer account, and paid out of that buffer. Each
//! payment is recorded twice, on the provision item and on the month, within a
//! single transition.

use crate::{
    core::{
        ids::new_id,
        model::{BudgetConfig, Ledger, ProvisionExpense, ProvisionHistoryEntry},
        monthly::edit_open_month,
        money,
        month::MonthKey,
    },
    errors::{Error, Result},
};
use tracing::debug;

fn provision_account_id(config: &BudgetConfig) -> Result<String> {
    let id = config
        .provision_account_id
        .clone()
        .ok_or_else(|| Error::not_found("account", "provision"))?;
    if config.account(&id).is_none() {
        return Err(Error::not_found("account", id));
    }
    Ok(id)
}

fn current_account_id(config: &BudgetConfig) -> Result<String> {
    config
        .current_account()
        .map(|a| a.id.clone())
        .ok_or_else(|| Error::not_found("account", "current"))
}

/// Toggles the monthly transfer to the provision buffer. Returns whether it is now done.
///
/// Turning it on moves `monthly_provision_amount(year)` and remembers the
/// amount; turning it off moves back exactly what was remembered, so toggling
/// twice is balance-neutral even if the planned amounts changed in between.
/// Turning it on for a year with nothing planned is [`Error::InvalidAmount`].
pub fn toggle_provision_transfer(ledger: &Ledger, month: MonthKey) -> Result<(Ledger, bool)> {
    edit_open_month(ledger, month, |config, record| {
        let current = current_account_id(config)?;
        let buffer = provision_account_id(config)?;

        if let Some(amount) = record.provision_transfer.take() {
            config.credit_account(&buffer, -amount);
            config.credit_account(&current, amount);
            debug!(%month, amount, "Provision transfer cancelled");
            Ok(false)
        } else {
            let amount = config.monthly_provision_amount(month.year());
            if amount <= 0.0 {
                return Err(Error::InvalidAmount { amount });
            }
            config.credit_account(&current, -amount);
            config.credit_account(&buffer, amount);
            record.provision_transfer = Some(amount);
            debug!(%month, amount, "Provision transfer done");
            Ok(true)
        }
    })
}

/// Pays an expense out of the provision buffer against a provision item of the month's year.
pub fn record_provision_expense(
    ledger: &Ledger,
    month: MonthKey,
    item_id: &str,
    label: &str,
    amount: f64,
) -> Result<(Ledger, String)> {
    let amount = money::positive(amount)?;
    let year = month.year();
    edit_open_month(ledger, month, |config, record| {
        let buffer = provision_account_id(config)?;
        let item = config
            .annual_provisions
            .get_mut(&year)
            .and_then(|items| items.iter_mut().find(|p| p.id == item_id))
            .ok_or_else(|| Error::not_found("provision item", item_id))?;

        let id = new_id("pexp");
        let label = label.trim().to_string();
        item.spent = money::round2(item.spent + amount);
        item.history.push(ProvisionHistoryEntry {
            id: id.clone(),
            label: label.clone(),
            amount,
            month,
        });
        record.provision_expenses.push(ProvisionExpense {
            id: id.clone(),
            item_id: item_id.to_string(),
            year,
            label,
            amount,
        });
        config.credit_account(&buffer, -amount);
        Ok(id)
    })
}

/// Reverses a provision expense on the buffer account, the item and the month.
pub fn remove_provision_expense(ledger: &Ledger, month: MonthKey, expense_id: &str) -> Result<Ledger> {
    edit_open_month(ledger, month, |config, record| {
        let buffer = provision_account_id(config)?;
        let index = record
            .provision_expenses
            .iter()
            .position(|e| e.id == expense_id)
            .ok_or_else(|| Error::not_found("provision expense", expense_id))?;
        let expense = record.provision_expenses.remove(index);

        let item = config
            .annual_provisions
            .get_mut(&expense.year)
            .and_then(|items| items.iter_mut().find(|p| p.id == expense.item_id))
            .ok_or_else(|| Error::not_found("provision item", expense.item_id.clone()))?;
        item.history.retain(|h| h.id != expense.id);
        item.spent = money::sum(item.history.iter().map(|h| h.amount));

        config.credit_account(&buffer, expense.amount);
        Ok(())
    })
    .map(|(next, ())| next)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::monthly::close_month, test_utils::*};

    fn item(ledger: &Ledger, id: &str) -> crate::core::model::AnnualProvisionItem {
        ledger
            .config
            .provisions_for(2026)
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_toggle_on_moves_monthly_amount() {
        let m = month("2026-01");
        let (ledger, done) = toggle_provision_transfer(&sample_ledger(), m).unwrap();
        assert!(done);
        assert_eq!(balance(&ledger, CURRENT_ID), 4850.0);
        assert_eq!(balance(&ledger, PROVISIONS_ID), 150.0);
        assert_eq!(ledger.month(m).provision_transfer, Some(150.0));
    }

    #[test]
    fn test_toggle_twice_is_neutral() {
        let m = month("2026-01");
        let start = sample_ledger();
        let (on, _) = toggle_provision_transfer(&start, m).unwrap();
        let (off, done) = toggle_provision_transfer(&on, m).unwrap();
        assert!(!done);
        assert_eq!(balance(&off, PROVISIONS_ID), balance(&start, PROVISIONS_ID));
        assert_eq!(balance(&off, CURRENT_ID), balance(&start, CURRENT_ID));
        assert!(!off.month(m).provision_transfer_done());
    }

    #[test]
    fn test_toggle_off_reverses_recorded_amount_after_plan_change() {
        let m = month("2026-01");
        let (mut on, _) = toggle_provision_transfer(&sample_ledger(), m).unwrap();
        on.config.annual_provisions.get_mut(&2026).unwrap()[0].planned = 6000.0;
        let (off, _) = toggle_provision_transfer(&on, m).unwrap();
        assert_eq!(balance(&off, PROVISIONS_ID), 0.0);
        assert_eq!(balance(&off, CURRENT_ID), 5000.0);
    }

    #[test]
    fn test_toggle_without_buffer_account() {
        let mut ledger = sample_ledger();
        ledger.config.provision_account_id = None;
        assert!(matches!(
            toggle_provision_transfer(&ledger, month("2026-01")),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_toggle_rejects_year_without_provisions() {
        let ledger = sample_ledger();
        let result = toggle_provision_transfer(&ledger, month("2027-01"));
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        assert_eq!(balance(&ledger, CURRENT_ID), 5000.0);
    }

    #[test]
    fn test_provision_expense_updates_all_three() {
        let m = month("2026-05");
        let (ledger, id) =
            record_provision_expense(&sample_ledger(), m, INSURANCE_ID, "Échéance", 420.0).unwrap();

        assert_eq!(balance(&ledger, PROVISIONS_ID), -420.0);
        let insurance = item(&ledger, INSURANCE_ID);
        assert_eq!(insurance.spent, 420.0);
        assert_eq!(insurance.history.len(), 1);
        assert_eq!(insurance.history[0].id, id);
        assert_eq!(insurance.history[0].month, m);
        assert_eq!(ledger.month(m).provision_expenses.len(), 1);
        assert_eq!(ledger.month(m).provision_expenses[0].id, id);
    }

    #[test]
    fn test_remove_provision_expense_reverses_exactly() {
        let m = month("2026-05");
        let start = sample_ledger();
        let (ledger, keep) =
            record_provision_expense(&start, m, TAXES_ID, "Acompte", 300.0).unwrap();
        let (ledger, drop) =
            record_provision_expense(&ledger, m, TAXES_ID, "Solde", 512.34).unwrap();

        let ledger = remove_provision_expense(&ledger, m, &drop).unwrap();
        let taxes = item(&ledger, TAXES_ID);
        assert_eq!(taxes.spent, 300.0);
        assert_eq!(taxes.history.len(), 1);
        assert_eq!(taxes.history[0].id, keep);
        assert_eq!(balance(&ledger, PROVISIONS_ID), -300.0);
        assert_eq!(ledger.month(m).provision_expenses.len(), 1);

        let ledger = remove_provision_expense(&ledger, m, &keep).unwrap();
        assert_eq!(ledger.config, start.config);
    }

    #[test]
    fn test_spent_matches_history_sum() {
        let m = month("2026-06");
        let mut ledger = sample_ledger();
        for amount in [10.1, 20.2, 30.3] {
            ledger = record_provision_expense(&ledger, m, INSURANCE_ID, "x", amount)
                .unwrap()
                .0;
        }
        let insurance = item(&ledger, INSURANCE_ID);
        assert_eq!(
            insurance.spent,
            money::sum(insurance.history.iter().map(|h| h.amount))
        );
        assert_eq!(insurance.remaining(), 539.4);
    }

    #[test]
    fn test_unknown_item_leaves_ledger_unchanged() {
        let ledger = sample_ledger();
        let result = record_provision_expense(&ledger, month("2027-01"), INSURANCE_ID, "x", 10.0);
        // The item lives in the 2026 bucket
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_closed_month_rejects_provision_operations() {
        let m = month("2026-02");
        let (closed, _) = close_month(&sample_ledger(), m).unwrap();
        assert!(matches!(
            toggle_provision_transfer(&closed, m),
            Err(Error::MonthClosed { .. })
        ));
        assert!(matches!(
            record_provision_expense(&closed, m, INSURANCE_ID, "x", 1.0),
            Err(Error::MonthClosed { .. })
        ));
    }
}
