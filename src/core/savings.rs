//! Savings transfers and project funding.
//!
//! Base operations act on account balances (savings) or on project earmarks
//! (projects) only. Their month-scoped variants additionally move the money
//! out of the current account and append an [`AllocationTransaction`] to the
//! month, all in one transition, so the annual roll-up sees the same money
//! that actually left the current account.

use crate::{
    core::{
        ids::new_id,
        model::{AllocationKind, AllocationTransaction, BudgetConfig, Ledger, Project},
        monthly::edit_open_month,
        money,
        month::MonthKey,
    },
    errors::{Error, Result},
};

fn current_account_id(config: &BudgetConfig) -> Result<String> {
    config
        .current_account()
        .map(|a| a.id.clone())
        .ok_or_else(|| Error::not_found("account", "current"))
}

fn savings_account_id(config: &BudgetConfig) -> Result<String> {
    let id = config
        .savings_account_id
        .clone()
        .ok_or_else(|| Error::not_found("account", "savings"))?;
    if config.account(&id).is_none() {
        return Err(Error::not_found("account", id));
    }
    Ok(id)
}

/// Moves `amount` between two accounts, both of which must exist.
fn move_between(config: &mut BudgetConfig, from: &str, to: &str, amount: f64) -> Result<()> {
    if config.account(from).is_none() {
        return Err(Error::not_found("account", from));
    }
    if config.account(to).is_none() {
        return Err(Error::not_found("account", to));
    }
    config.credit_account(from, -amount);
    config.credit_account(to, amount);
    Ok(())
}

fn earmark(config: &mut BudgetConfig, project_id: &str, account_id: &str, amount: f64) -> Result<()> {
    if config.account(account_id).is_none() {
        return Err(Error::not_found("account", account_id));
    }
    let project = config
        .projects
        .iter_mut()
        .find(|p| p.id == project_id)
        .ok_or_else(|| Error::not_found("project", project_id))?;
    let entry = project.allocations.entry(account_id.to_string()).or_insert(0.0);
    *entry = money::round2(*entry + amount);
    if entry.abs() < 0.005 {
        project.allocations.remove(account_id);
    }
    Ok(())
}

/// Moves `amount` from the current account to the designated savings account.
pub fn transfer_to_savings(ledger: &Ledger, amount: f64) -> Result<Ledger> {
    let amount = money::positive(amount)?;
    let mut next = ledger.clone();
    let from = current_account_id(&next.config)?;
    let to = savings_account_id(&next.config)?;
    move_between(&mut next.config, &from, &to, amount)?;
    Ok(next)
}

/// Moves `amount` back from the savings account to the current account.
pub fn retrieve_from_savings(ledger: &Ledger, amount: f64) -> Result<Ledger> {
    let amount = money::positive(amount)?;
    let mut next = ledger.clone();
    let from = savings_account_id(&next.config)?;
    let to = current_account_id(&next.config)?;
    move_between(&mut next.config, &from, &to, amount)?;
    Ok(next)
}

/// Transfers to savings and records a `savings` allocation on `month`.
pub fn transfer_to_savings_in_month(
    ledger: &Ledger,
    month: MonthKey,
    amount: f64,
    note: &str,
) -> Result<(Ledger, String)> {
    let amount = money::positive(amount)?;
    edit_open_month(ledger, month, |config, record| {
        let from = current_account_id(config)?;
        let to = savings_account_id(config)?;
        move_between(config, &from, &to, amount)?;

        let id = new_id("alloc");
        record.allocations.push(AllocationTransaction {
            id: id.clone(),
            kind: AllocationKind::Savings,
            amount,
            project_id: None,
            target_account_id: to,
            note: note.to_string(),
        });
        Ok(id)
    })
}

/// Earmarks `amount` already held in `target_account_id` for a project.
pub fn fund_project(
    ledger: &Ledger,
    project_id: &str,
    amount: f64,
    target_account_id: &str,
) -> Result<Ledger> {
    let amount = money::positive(amount)?;
    let mut next = ledger.clone();
    earmark(&mut next.config, project_id, target_account_id, amount)?;
    Ok(next)
}

/// Moves `amount` from the current account to `target_account_id`, earmarks it
/// for the project and records a `project` allocation on `month`.
///
/// The target must be another account than the current one, otherwise nothing
/// would leave the current account while the allocation still counts as outflow.
pub fn fund_project_in_month(
    ledger: &Ledger,
    month: MonthKey,
    project_id: &str,
    amount: f64,
    target_account_id: &str,
    note: &str,
) -> Result<(Ledger, String)> {
    let amount = money::positive(amount)?;
    edit_open_month(ledger, month, |config, record| {
        let from = current_account_id(config)?;
        if from == target_account_id {
            return Err(Error::Config {
                message: "Project money must go to an account other than the current one"
                    .to_string(),
            });
        }
        earmark(config, project_id, target_account_id, amount)?;
        move_between(config, &from, target_account_id, amount)?;

        let id = new_id("alloc");
        record.allocations.push(AllocationTransaction {
            id: id.clone(),
            kind: AllocationKind::Project,
            amount,
            project_id: Some(project_id.to_string()),
            target_account_id: target_account_id.to_string(),
            note: note.to_string(),
        });
        Ok(id)
    })
}

/// Cancels a month-scoped allocation, reversing its balance movement and earmark.
pub fn remove_allocation(ledger: &Ledger, month: MonthKey, allocation_id: &str) -> Result<Ledger> {
    edit_open_month(ledger, month, |config, record| {
        let index = record
            .allocations
            .iter()
            .position(|a| a.id == allocation_id)
            .ok_or_else(|| Error::not_found("allocation", allocation_id))?;
        let allocation = record.allocations.remove(index);
        let current = current_account_id(config)?;

        if let (AllocationKind::Project, Some(project_id)) =
            (allocation.kind, allocation.project_id.as_deref())
        {
            earmark(
                config,
                project_id,
                &allocation.target_account_id,
                -allocation.amount,
            )?;
        }
        move_between(
            config,
            &allocation.target_account_id,
            &current,
            allocation.amount,
        )
    })
    .map(|(next, ())| next)
}

/// Share of the target already earmarked, capped at 100. A zero target reads as 0%.
#[must_use]
pub fn project_progress(project: &Project) -> f64 {
    if project.target <= 0.0 {
        return 0.0;
    }
    money::round2((100.0 * project.allocated() / project.target).min(100.0))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_transfer_and_retrieve_are_inverse() {
        let start = sample_ledger();
        let saved = transfer_to_savings(&start, 250.0).unwrap();
        assert_eq!(balance(&saved, CURRENT_ID), 4750.0);
        assert_eq!(balance(&saved, LDD_ID), 3250.0);

        let back = retrieve_from_savings(&saved, 250.0).unwrap();
        assert_eq!(back, start);
    }

    #[test]
    fn test_transfer_rejects_invalid_amounts() {
        let ledger = sample_ledger();
        for amount in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                transfer_to_savings(&ledger, amount),
                Err(Error::InvalidAmount { .. })
            ));
            assert!(matches!(
                retrieve_from_savings(&ledger, amount),
                Err(Error::InvalidAmount { .. })
            ));
        }
    }

    #[test]
    fn test_transfer_without_savings_account() {
        let mut ledger = sample_ledger();
        ledger.config.savings_account_id = None;
        assert!(matches!(
            transfer_to_savings(&ledger, 10.0),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_month_transfer_moves_and_records() {
        let m = month("2026-03");
        let (ledger, id) = transfer_to_savings_in_month(&sample_ledger(), m, 200.0, "Mars").unwrap();
        assert_eq!(balance(&ledger, CURRENT_ID), 4800.0);
        assert_eq!(balance(&ledger, LDD_ID), 3200.0);

        let record = ledger.month(m);
        assert_eq!(record.allocations.len(), 1);
        assert_eq!(record.allocations[0].id, id);
        assert_eq!(record.allocations[0].kind, AllocationKind::Savings);
        assert_eq!(record.allocations[0].target_account_id, LDD_ID);
    }

    #[test]
    fn test_project_progress_scenario() {
        let ledger = sample_ledger();
        let project = ledger.config.project(PROJECT_ID).unwrap();
        assert_eq!(project_progress(project), 40.0);

        let funded = fund_project(&ledger, PROJECT_ID, 500.0, LDD_ID).unwrap();
        let project = funded.config.project(PROJECT_ID).unwrap();
        assert_eq!(project_progress(project), 45.0);
        assert_eq!(project.allocations.get(LDD_ID), Some(&3500.0));
        // Earmarking alone does not move money
        assert_eq!(balance(&funded, CURRENT_ID), 5000.0);
    }

    #[test]
    fn test_progress_caps_and_zero_target() {
        let mut project = sample_ledger().config.project(PROJECT_ID).cloned().unwrap();
        project.target = 1000.0;
        assert_eq!(project_progress(&project), 100.0);
        project.target = 0.0;
        assert_eq!(project_progress(&project), 0.0);
    }

    #[test]
    fn test_fund_project_unknown_references() {
        let ledger = sample_ledger();
        assert!(matches!(
            fund_project(&ledger, "proj_ghost", 10.0, LDD_ID),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            fund_project(&ledger, PROJECT_ID, 10.0, "acc_ghost"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_month_project_funding_and_removal() {
        let m = month("2026-03");
        let start = sample_ledger();
        let (ledger, id) =
            fund_project_in_month(&start, m, PROJECT_ID, 300.0, CASDEN_ID, "Prime").unwrap();

        assert_eq!(balance(&ledger, CURRENT_ID), 4700.0);
        assert_eq!(balance(&ledger, CASDEN_ID), 1300.0);
        let project = ledger.config.project(PROJECT_ID).unwrap();
        assert_eq!(project.allocations.get(CASDEN_ID), Some(&1300.0));
        assert_eq!(ledger.month(m).allocations[0].kind, AllocationKind::Project);

        let reverted = remove_allocation(&ledger, m, &id).unwrap();
        assert_eq!(reverted.config, start.config);
        assert!(reverted.month(m).allocations.is_empty());
    }

    #[test]
    fn test_month_project_funding_rejects_current_account() {
        let m = month("2026-03");
        let start = sample_ledger();
        let result = fund_project_in_month(&start, m, PROJECT_ID, 300.0, CURRENT_ID, "");
        assert!(matches!(result, Err(Error::Config { .. })));

        // A real target still works and is the only allocation counted
        let (ledger, _) = fund_project_in_month(&start, m, PROJECT_ID, 300.0, LDD_ID, "").unwrap();
        assert_eq!(ledger.month(m).allocations.len(), 1);
        assert_eq!(balance(&ledger, CURRENT_ID), 4700.0);
    }

    #[test]
    fn test_month_transfer_rejects_sub_cent_amount() {
        let result = transfer_to_savings_in_month(&sample_ledger(), month("2026-03"), 0.004, "");
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
    }

    #[test]
    fn test_remove_savings_allocation() {
        let m = month("2026-03");
        let start = sample_ledger();
        let (ledger, id) = transfer_to_savings_in_month(&start, m, 120.0, "").unwrap();
        let reverted = remove_allocation(&ledger, m, &id).unwrap();
        assert_eq!(reverted.config, start.config);
    }
}
