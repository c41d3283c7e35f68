//! Roll-up calculators.
//!
//! Pure functions deriving month, year, savings and provision summaries from a
//! [`Ledger`]. Nothing here is persisted. Amounts are rounded to cents after
//! every combination so twelve chained carry-overs stay exact.

use crate::core::{
    model::{AllocationKind, BudgetConfig, EnvelopeCategory, ItemKind, Ledger, MonthRecord},
    money::{self, round2},
    month::MonthKey,
    savings::project_progress,
};

/// Totals for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    /// The month summarized
    pub month: MonthKey,
    /// Sum of income lines
    pub total_income: f64,
    /// Validated fixed items, actual amount when overridden, target otherwise
    pub total_fixed: f64,
    /// Variable spending recorded this month
    pub total_flexible: f64,
    /// Configured target for variable spending
    pub flexible_target: f64,
    /// Funded mandatory envelopes
    pub total_envelopes_mandatory: f64,
    /// Funded secondary envelopes
    pub total_envelopes_secondary: f64,
    /// Amount moved to the provision buffer
    pub provision_transfer: f64,
    /// Fixed + flexible + envelopes + provision transfer
    pub total_outflow: f64,
    /// Income minus outflow
    pub reste_a_vivre: f64,
    /// Savings allocations of the month
    pub alloc_savings: f64,
    /// Project allocations of the month
    pub alloc_projects: f64,
    /// Whether the month has been validated
    pub is_closed: bool,
}

fn allocation_total(record: &MonthRecord, kind: AllocationKind) -> f64 {
    money::sum(
        record
            .allocations
            .iter()
            .filter(|a| a.kind == kind)
            .map(|a| a.amount),
    )
}

fn funded_total(config: &BudgetConfig, record: &MonthRecord, category: EnvelopeCategory) -> f64 {
    money::sum(
        record
            .funded
            .iter()
            .filter(|(id, _)| config.envelope(id).is_some_and(|e| e.category == category))
            .map(|(_, amount)| *amount),
    )
}

/// Computes the totals of `month`. Months never written summarize to zeros.
#[must_use]
pub fn month_summary(ledger: &Ledger, month: MonthKey) -> MonthSummary {
    let config = &ledger.config;
    let record = ledger.month(month);

    let total_income = money::sum(record.incomes.iter().map(|i| i.amount));
    let total_fixed = money::sum(
        config
            .postes
            .iter()
            .filter(|p| p.kind == ItemKind::Fixed && record.validated.contains(&p.id))
            .map(|p| record.overrides.get(&p.id).copied().unwrap_or(p.amount)),
    );
    let total_flexible = money::sum(record.flexible_expenses.iter().map(|e| e.amount));
    let total_envelopes_mandatory = funded_total(config, &record, EnvelopeCategory::Mandatory);
    let total_envelopes_secondary = funded_total(config, &record, EnvelopeCategory::Secondary);
    let provision_transfer = record.provision_transfer.unwrap_or(0.0);

    let total_outflow = money::sum([
        total_fixed,
        total_flexible,
        total_envelopes_mandatory,
        total_envelopes_secondary,
        provision_transfer,
    ]);

    MonthSummary {
        month,
        total_income,
        total_fixed,
        total_flexible,
        flexible_target: config.flexible_budget.target,
        total_envelopes_mandatory,
        total_envelopes_secondary,
        provision_transfer,
        total_outflow,
        reste_a_vivre: round2(total_income - total_outflow),
        alloc_savings: allocation_total(&record, AllocationKind::Savings),
        alloc_projects: allocation_total(&record, AllocationKind::Project),
        is_closed: record.is_closed,
    }
}

/// One row of the annual roll-up.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualMonth {
    /// The month
    pub month: MonthKey,
    /// Previous month's final balance (the initial balance for January)
    pub carry_over: f64,
    /// Total income
    pub income: f64,
    /// Total outflow
    pub outflow: f64,
    /// Savings allocations
    pub alloc_savings: f64,
    /// Project allocations
    pub alloc_projects: f64,
    /// Balance at the end of the month
    pub solde_final: f64,
    /// Whether the month has been validated
    pub is_closed: bool,
}

/// Twelve chained months of a calendar year.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualRollup {
    /// Calendar year
    pub year: i32,
    /// Balance before January
    pub initial_balance: f64,
    /// January to December
    pub months: Vec<AnnualMonth>,
    /// Year income
    pub total_income: f64,
    /// Year outflow
    pub total_outflow: f64,
    /// Year savings allocations
    pub total_savings: f64,
    /// Year project allocations
    pub total_projects: f64,
    /// December's final balance
    pub final_balance: f64,
}

/// Chains the twelve months of `year` starting from `initial_balance`.
#[must_use]
pub fn annual_rollup(ledger: &Ledger, year: i32, initial_balance: f64) -> AnnualRollup {
    let mut carry_over = round2(initial_balance);
    let mut months = Vec::with_capacity(12);

    for month in MonthKey::months_of(year) {
        let summary = month_summary(ledger, month);
        let mut solde = round2(carry_over + summary.total_income);
        solde = round2(solde - summary.total_outflow);
        solde = round2(solde - summary.alloc_savings);
        solde = round2(solde - summary.alloc_projects);

        months.push(AnnualMonth {
            month,
            carry_over,
            income: summary.total_income,
            outflow: summary.total_outflow,
            alloc_savings: summary.alloc_savings,
            alloc_projects: summary.alloc_projects,
            solde_final: solde,
            is_closed: summary.is_closed,
        });
        carry_over = solde;
    }

    AnnualRollup {
        year,
        initial_balance: round2(initial_balance),
        total_income: money::sum(months.iter().map(|m| m.income)),
        total_outflow: money::sum(months.iter().map(|m| m.outflow)),
        total_savings: money::sum(months.iter().map(|m| m.alloc_savings)),
        total_projects: money::sum(months.iter().map(|m| m.alloc_projects)),
        final_balance: carry_over,
        months,
    }
}

/// Progress of one project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectReport {
    /// Project id
    pub id: String,
    /// Project label
    pub label: String,
    /// Amount to reach
    pub target: f64,
    /// Amount earmarked so far
    pub allocated: f64,
    /// Capped progress percentage
    pub progress_percent: f64,
}

/// Savings accounts and project progress.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsOverview {
    /// `(label, balance)` of every savings account
    pub accounts: Vec<(String, f64)>,
    /// Sum of savings balances
    pub total: f64,
    /// Every project
    pub projects: Vec<ProjectReport>,
}

/// Summarizes savings accounts and projects.
#[must_use]
pub fn savings_overview(config: &BudgetConfig) -> SavingsOverview {
    use crate::core::model::AccountCategory;

    let accounts: Vec<(String, f64)> = config
        .accounts
        .iter()
        .filter(|a| a.category == AccountCategory::Savings)
        .map(|a| (a.label.clone(), a.initial))
        .collect();
    let projects = config
        .projects
        .iter()
        .map(|p| ProjectReport {
            id: p.id.clone(),
            label: p.label.clone(),
            target: p.target,
            allocated: p.allocated(),
            progress_percent: project_progress(p),
        })
        .collect();

    SavingsOverview {
        total: money::sum(accounts.iter().map(|(_, b)| *b)),
        accounts,
        projects,
    }
}

/// Budget status of one provision item.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionReport {
    /// Item id
    pub id: String,
    /// Item label
    pub label: String,
    /// Planned for the year
    pub planned: f64,
    /// Spent so far
    pub spent: f64,
    /// Planned minus spent
    pub remaining: f64,
}

/// Lists the provision items of `year` with what remains of each.
#[must_use]
pub fn provision_overview(config: &BudgetConfig, year: i32) -> Vec<ProvisionReport> {
    config
        .provisions_for(year)
        .iter()
        .map(|p| ProvisionReport {
            id: p.id.clone(),
            label: p.label.clone(),
            planned: p.planned,
            spent: p.spent,
            remaining: p.remaining(),
        })
        .collect()
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80.0%`
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // clamped_progress ∈ [0, 100] and length is small, so the cast cannot overflow
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    format!(
        "[{}{}] {progress_percent:.1}%",
        "█".repeat(filled),
        "░".repeat(empty)
    )
}

/// Formats an amount in euros with an explicit sign, e.g. `+12.50 €` or `-3.00 €`.
#[must_use]
pub fn format_signed_amount(amount: f64) -> String {
    if amount >= 0.0 {
        format!("+{amount:.2} €")
    } else {
        format!("-{:.2} €", amount.abs())
    }
}

/// Formats a month summary as a multi-line block for chat or logs.
#[must_use]
pub fn format_month_summary(summary: &MonthSummary) -> String {
    use std::fmt::Write;

    let mut out = format!(
        "{} {}\n",
        summary.month.label(),
        if summary.is_closed { "(closed)" } else { "(open)" }
    );
    let lines = [
        ("Income", summary.total_income),
        ("Fixed", summary.total_fixed),
        ("Flexible", summary.total_flexible),
        ("Envelopes (mandatory)", summary.total_envelopes_mandatory),
        ("Envelopes (secondary)", summary.total_envelopes_secondary),
        ("Provision transfer", summary.provision_transfer),
        ("Total outflow", summary.total_outflow),
        ("Reste à vivre", summary.reste_a_vivre),
        ("Savings", summary.alloc_savings),
        ("Projects", summary.alloc_projects),
    ];
    for (label, amount) in lines {
        // Writing to a String cannot fail
        let _ = writeln!(out, "  {label:<22} {amount:>10.2} €");
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{envelope, monthly, provision, savings},
        test_utils::*,
    };

    #[test]
    fn test_month_scenario_reste_a_vivre() {
        let m = month("2026-01");
        let (ledger, _) = monthly::add_income(&sample_ledger(), m, "Salaire", 3000.0).unwrap();
        let (ledger, _) = monthly::toggle_validated(&ledger, m, RENT_ID).unwrap();

        let summary = month_summary(&ledger, m);
        assert_eq!(summary.total_income, 3000.0);
        assert_eq!(summary.total_fixed, 880.0);
        assert_eq!(summary.total_outflow, 880.0);
        assert_eq!(summary.reste_a_vivre, 2120.0);
    }

    #[test]
    fn test_unvalidated_fixed_items_are_excluded() {
        let m = month("2026-01");
        let (ledger, _) = monthly::add_income(&sample_ledger(), m, "Salaire", 3000.0).unwrap();
        let summary = month_summary(&ledger, m);
        assert_eq!(summary.total_fixed, 0.0);
        assert_eq!(summary.reste_a_vivre, 3000.0);
    }

    #[test]
    fn test_override_replaces_target() {
        let m = month("2026-01");
        let ledger = monthly::set_expense_override(&sample_ledger(), m, RENT_ID, Some(905.5)).unwrap();
        let (ledger, _) = monthly::toggle_validated(&ledger, m, RENT_ID).unwrap();
        assert_eq!(month_summary(&ledger, m).total_fixed, 905.5);
    }

    #[test]
    fn test_all_outflow_categories() {
        let m = month("2026-02");
        let ledger = sample_ledger();
        let (ledger, _) = monthly::add_income(&ledger, m, "Salaire", 3200.0).unwrap();
        let (ledger, _) = monthly::add_income(&ledger, m, "Remboursement", 45.3).unwrap();
        let (ledger, _) = monthly::toggle_validated(&ledger, m, RENT_ID).unwrap();
        let (ledger, _) = monthly::add_flexible_expense(&ledger, m, "Pharmacie", 23.7).unwrap();
        let ledger = envelope::fund_envelope(&ledger, m, GROCERIES_ID).unwrap();
        let ledger = envelope::fund_envelope(&ledger, m, LEISURE_ID).unwrap();
        let (ledger, _) = provision::toggle_provision_transfer(&ledger, m).unwrap();
        let (ledger, _) = savings::transfer_to_savings_in_month(&ledger, m, 200.0, "").unwrap();
        let (ledger, _) =
            savings::fund_project_in_month(&ledger, m, PROJECT_ID, 100.0, LDD_ID, "").unwrap();

        let s = month_summary(&ledger, m);
        assert_eq!(s.total_income, 3245.3);
        assert_eq!(s.total_fixed, 880.0);
        assert_eq!(s.total_flexible, 23.7);
        assert_eq!(s.total_envelopes_mandatory, 400.0);
        assert_eq!(s.total_envelopes_secondary, 100.0);
        assert_eq!(s.provision_transfer, 150.0);
        assert_eq!(s.total_outflow, 1553.7);
        assert_eq!(s.reste_a_vivre, round2(s.total_income - s.total_outflow));
        assert_eq!(s.reste_a_vivre, 1691.6);
        assert_eq!(s.alloc_savings, 200.0);
        assert_eq!(s.alloc_projects, 100.0);
    }

    #[test]
    fn test_annual_rollup_chains_carry_over() {
        let mut ledger = sample_ledger();
        for (key, income) in [("2026-01", 3000.0), ("2026-02", 3100.1), ("2026-03", 2950.45)] {
            let m = month(key);
            ledger = monthly::add_income(&ledger, m, "Salaire", income).unwrap().0;
            ledger = monthly::toggle_validated(&ledger, m, RENT_ID).unwrap().0;
        }
        ledger = savings::transfer_to_savings_in_month(&ledger, month("2026-02"), 150.0, "")
            .unwrap()
            .0;

        let rollup = annual_rollup(&ledger, 2026, 1000.0);
        assert_eq!(rollup.months.len(), 12);
        assert_eq!(rollup.months[0].carry_over, 1000.0);
        assert_eq!(rollup.months[0].solde_final, 3120.0);
        assert_eq!(rollup.months[1].carry_over, 3120.0);
        assert_eq!(rollup.months[1].solde_final, 5190.1);
        assert_eq!(rollup.months[2].solde_final, 7260.55);

        for pair in rollup.months.windows(2) {
            assert_eq!(pair[1].carry_over, pair[0].solde_final);
        }
        for m in &rollup.months {
            assert_eq!(
                m.solde_final,
                round2(m.carry_over + m.income - m.outflow - m.alloc_savings - m.alloc_projects)
            );
        }
        // Months without data carry the balance through
        assert_eq!(rollup.final_balance, 7260.55);
        assert_eq!(rollup.total_savings, 150.0);
    }

    #[test]
    fn test_annual_rollup_no_drift_over_twelve_months() {
        let mut ledger = sample_ledger();
        for m in MonthKey::months_of(2026) {
            ledger = monthly::add_income(&ledger, m, "Petit revenu", 0.1).unwrap().0;
            ledger = monthly::add_flexible_expense(&ledger, m, "Café", 0.2).unwrap().0;
        }
        let rollup = annual_rollup(&ledger, 2026, 0.3);
        assert_eq!(rollup.final_balance, -0.9);
    }

    #[test]
    fn test_savings_overview() {
        let overview = savings_overview(&sample_config());
        assert_eq!(overview.accounts.len(), 2);
        assert_eq!(overview.total, 4000.0);
        assert_eq!(overview.projects[0].progress_percent, 40.0);
        assert_eq!(overview.projects[0].allocated, 4000.0);
    }

    #[test]
    fn test_provision_overview() {
        let (ledger, _) = provision::record_provision_expense(
            &sample_ledger(),
            month("2026-04"),
            INSURANCE_ID,
            "Échéance",
            200.0,
        )
        .unwrap();
        let report = provision_overview(&ledger.config, 2026);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].spent, 200.0);
        assert_eq!(report[0].remaining, 400.0);
        assert!(provision_overview(&ledger.config, 2020).is_empty());
    }

    #[test]
    fn test_format_progress_bar() {
        assert_eq!(format_progress_bar(100.0, Some(10)), "[██████████] 100.0%");
        assert_eq!(format_progress_bar(40.0, Some(10)), "[████░░░░░░] 40.0%");
        assert_eq!(format_progress_bar(-5.0, Some(4)), "[░░░░] -5.0%");
    }

    #[test]
    fn test_format_signed_amount() {
        assert_eq!(format_signed_amount(12.5), "+12.50 €");
        assert_eq!(format_signed_amount(-3.0), "-3.00 €");
    }

    #[test]
    fn test_format_month_summary() {
        let m = month("2026-01");
        let (ledger, _) = monthly::add_income(&sample_ledger(), m, "Salaire", 3000.0).unwrap();
        let text = format_month_summary(&month_summary(&ledger, m));
        assert!(text.contains("January 2026 (open)"));
        assert!(text.contains("3000.00 €"));
        assert!(text.contains("Reste à vivre"));
    }
}
