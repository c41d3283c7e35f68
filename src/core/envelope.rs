//! Envelope funding and spending.
//!
//! Funding moves the envelope's monthly target from the current account into
//! the envelope, once per month. Spending decrements the envelope and keeps a
//! history line in the month; removing that line restores the exact balance.

use crate::{
    core::{
        ids::new_id,
        model::{EnvelopeExpense, Ledger},
        monthly::edit_open_month,
        money,
        month::MonthKey,
    },
    errors::{Error, Result},
};
use tracing::debug;

/// Funds an envelope for `month` with its monthly target.
///
/// The current account is debited even if that takes it below zero. An
/// envelope can be funded once per month; a second call fails with
/// [`Error::AlreadyFunded`].
pub fn fund_envelope(ledger: &Ledger, month: MonthKey, envelope_id: &str) -> Result<Ledger> {
    edit_open_month(ledger, month, |config, record| {
        if record.is_funded(envelope_id) {
            return Err(Error::AlreadyFunded {
                envelope_id: envelope_id.to_string(),
                month: month.to_string(),
            });
        }
        let current_id = config
            .current_account()
            .map(|a| a.id.clone())
            .ok_or_else(|| Error::not_found("account", "current"))?;
        let envelope = config
            .envelopes
            .iter_mut()
            .find(|e| e.id == envelope_id)
            .ok_or_else(|| Error::not_found("envelope", envelope_id))?;

        let amount = envelope.target;
        envelope.balance = money::round2(envelope.balance + amount);
        config.credit_account(&current_id, -amount);
        record.funded.insert(envelope_id.to_string(), amount);
        debug!(%month, envelope_id, amount, "Envelope funded");
        Ok(())
    })
    .map(|(next, ())| next)
}

/// Cancels this month's funding, moving the exact funded amount back to the current account.
pub fn unfund_envelope(ledger: &Ledger, month: MonthKey, envelope_id: &str) -> Result<Ledger> {
    edit_open_month(ledger, month, |config, record| {
        let amount = record
            .funded
            .remove(envelope_id)
            .ok_or_else(|| Error::not_found("envelope funding", envelope_id))?;
        let current_id = config
            .current_account()
            .map(|a| a.id.clone())
            .ok_or_else(|| Error::not_found("account", "current"))?;
        let envelope = config
            .envelopes
            .iter_mut()
            .find(|e| e.id == envelope_id)
            .ok_or_else(|| Error::not_found("envelope", envelope_id))?;

        envelope.balance = money::round2(envelope.balance - amount);
        config.credit_account(&current_id, amount);
        Ok(())
    })
    .map(|(next, ())| next)
}

/// Records a spend from an envelope and returns the history line id.
pub fn record_envelope_spend(
    ledger: &Ledger,
    month: MonthKey,
    envelope_id: &str,
    label: &str,
    amount: f64,
) -> Result<(Ledger, String)> {
    let amount = money::positive(amount)?;
    edit_open_month(ledger, month, |config, record| {
        let envelope = config
            .envelopes
            .iter_mut()
            .find(|e| e.id == envelope_id)
            .ok_or_else(|| Error::not_found("envelope", envelope_id))?;
        envelope.balance = money::round2(envelope.balance - amount);

        let id = new_id("spend");
        record.envelope_expenses.push(EnvelopeExpense {
            id: id.clone(),
            envelope_id: envelope_id.to_string(),
            label: label.trim().to_string(),
            amount,
        });
        Ok(id)
    })
}

/// Removes an envelope spend and gives its amount back to the envelope.
pub fn remove_envelope_spend(ledger: &Ledger, month: MonthKey, expense_id: &str) -> Result<Ledger> {
    edit_open_month(ledger, month, |config, record| {
        let index = record
            .envelope_expenses
            .iter()
            .position(|e| e.id == expense_id)
            .ok_or_else(|| Error::not_found("envelope expense", expense_id))?;
        let expense = record.envelope_expenses.remove(index);
        let envelope = config
            .envelopes
            .iter_mut()
            .find(|e| e.id == expense.envelope_id)
            .ok_or_else(|| Error::not_found("envelope", expense.envelope_id.clone()))?;
        envelope.balance = money::round2(envelope.balance + expense.amount);
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

    #[test]
    fn test_fund_envelope_moves_target_from_current() {
        let m = month("2026-01");
        let ledger = sample_ledger();
        let funded = fund_envelope(&ledger, m, GROCERIES_ID).unwrap();

        assert_eq!(balance(&funded, CURRENT_ID), 4600.0);
        assert_eq!(envelope_balance(&funded, GROCERIES_ID), 400.0);
        assert!(funded.month(m).is_funded(GROCERIES_ID));
        // The input ledger is untouched
        assert_eq!(balance(&ledger, CURRENT_ID), 5000.0);
    }

    #[test]
    fn test_fund_twice_in_same_month_rejected() {
        let m = month("2026-01");
        let funded = fund_envelope(&sample_ledger(), m, GROCERIES_ID).unwrap();
        let again = fund_envelope(&funded, m, GROCERIES_ID);
        assert!(matches!(again, Err(Error::AlreadyFunded { .. })));
        assert_eq!(balance(&funded, CURRENT_ID), 4600.0);

        // Next month can be funded again
        let next = fund_envelope(&funded, month("2026-02"), GROCERIES_ID).unwrap();
        assert_eq!(envelope_balance(&next, GROCERIES_ID), 800.0);
    }

    #[test]
    fn test_fund_unknown_envelope() {
        let result = fund_envelope(&sample_ledger(), month("2026-01"), "env_ghost");
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_fund_closed_month_rejected() {
        let m = month("2026-01");
        let (closed, _) = close_month(&sample_ledger(), m).unwrap();
        assert!(matches!(
            fund_envelope(&closed, m, GROCERIES_ID),
            Err(Error::MonthClosed { .. })
        ));
    }

    #[test]
    fn test_unfund_is_exact_inverse_even_after_target_change() {
        let m = month("2026-01");
        let ledger = sample_ledger();
        let mut funded = fund_envelope(&ledger, m, GROCERIES_ID).unwrap();
        funded.config.envelopes[0].target = 999.0;

        let unfunded = unfund_envelope(&funded, m, GROCERIES_ID).unwrap();
        assert_eq!(balance(&unfunded, CURRENT_ID), 5000.0);
        assert_eq!(envelope_balance(&unfunded, GROCERIES_ID), 0.0);
        assert!(!unfunded.month(m).is_funded(GROCERIES_ID));
    }

    #[test]
    fn test_spend_and_remove_spend_are_inverse() {
        let m = month("2026-01");
        let ledger = fund_envelope(&sample_ledger(), m, GROCERIES_ID).unwrap();
        let before = envelope_balance(&ledger, GROCERIES_ID);

        let (spent, id) = record_envelope_spend(&ledger, m, GROCERIES_ID, "Marché", 37.85).unwrap();
        assert_eq!(envelope_balance(&spent, GROCERIES_ID), 362.15);
        assert_eq!(spent.month(m).envelope_expenses.len(), 1);

        let restored = remove_envelope_spend(&spent, m, &id).unwrap();
        assert_eq!(envelope_balance(&restored, GROCERIES_ID), before);
        assert!(restored.month(m).envelope_expenses.is_empty());
    }

    #[test]
    fn test_balance_law_over_sequence() {
        let m = month("2026-01");
        let mut ledger = fund_envelope(&sample_ledger(), m, LEISURE_ID).unwrap();
        let mut kept = Vec::new();
        for (i, amount) in [12.5, 30.0, 7.25, 41.1].into_iter().enumerate() {
            let (next, id) =
                record_envelope_spend(&ledger, m, LEISURE_ID, &format!("Sortie {i}"), amount).unwrap();
            ledger = next;
            kept.push((id, amount));
        }
        // Remove the second and fourth spends
        for index in [3, 1] {
            let (id, _) = kept.remove(index);
            ledger = remove_envelope_spend(&ledger, m, &id).unwrap();
        }
        let remaining: f64 = money::sum(kept.iter().map(|(_, a)| *a));
        assert_eq!(
            envelope_balance(&ledger, LEISURE_ID),
            money::round2(100.0 - remaining)
        );
    }

    #[test]
    fn test_spend_rejects_invalid_amount() {
        let result =
            record_envelope_spend(&sample_ledger(), month("2026-01"), GROCERIES_ID, "x", -5.0);
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
    }

    #[test]
    fn test_overspending_is_permitted() {
        let (ledger, _) =
            record_envelope_spend(&sample_ledger(), month("2026-01"), GROCERIES_ID, "Gros plein", 50.0)
                .unwrap();
        assert_eq!(envelope_balance(&ledger, GROCERIES_ID), -50.0);
    }
}
