//! Month Discord commands - incomes, fixed and flexible expenses, summaries,
//! closing and the yearly roll-up.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context, handlers::autocomplete, ledger_for, parse_amount, parse_month, poste_id,
            run_command,
        },
        core::{
            ledger::{Command, Outcome},
            month::MonthKey,
            report,
        },
        errors::Result,
    };
    use std::fmt::Write;

    /// Adds an income line to a month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn income_add(
        ctx: Context<'_>,
        #[description = "Amount received"] amount: String,
        #[description = "Description (salary, refund, ...)"] label: String,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let amount = parse_amount(&amount);
        let command = Command::AddIncome {
            month,
            label: label.clone(),
            amount,
        };
        if run_command(ctx, command).await?.is_some() {
            ctx.say(format!(
                "✅ Added income **{label}** ({}) to {}",
                report::format_signed_amount(amount),
                month.label()
            ))
            .await?;
        }
        Ok(())
    }

    /// Changes the amount of an income line.
    #[poise::command(slash_command, prefix_command)]
    pub async fn income_edit(
        ctx: Context<'_>,
        #[description = "Description of the income line"] label: String,
        #[description = "New amount"] amount: String,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let Some(income) = ledger
            .month(month)
            .incomes
            .into_iter()
            .find(|i| i.label.eq_ignore_ascii_case(&label))
        else {
            ctx.say(format!("❌ No income **{label}** in {}", month.label()))
                .await?;
            return Ok(());
        };

        let amount = parse_amount(&amount);
        let command = Command::UpdateIncome {
            month,
            id: income.id,
            label: income.label.clone(),
            amount,
        };
        if run_command(ctx, command).await?.is_some() {
            ctx.say(format!(
                "✏️ Income **{}** is now {} in {}",
                income.label,
                report::format_signed_amount(amount),
                month.label()
            ))
            .await?;
        }
        Ok(())
    }

    /// Removes an income line from a month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn income_remove(
        ctx: Context<'_>,
        #[description = "Description of the income line"] label: String,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let Some(income) = ledger
            .month(month)
            .incomes
            .into_iter()
            .find(|i| i.label.eq_ignore_ascii_case(&label))
        else {
            ctx.say(format!("❌ No income **{label}** in {}", month.label()))
                .await?;
            return Ok(());
        };

        let command = Command::RemoveIncome {
            month,
            id: income.id,
        };
        if run_command(ctx, command).await?.is_some() {
            ctx.say(format!(
                "🗑️ Removed income **{}** ({:.2} €) from {}",
                income.label,
                income.amount,
                month.label()
            ))
            .await?;
        }
        Ok(())
    }

    /// Checks or unchecks a fixed expense as paid for a month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn fixed_validate(
        ctx: Context<'_>,
        #[description = "Recurring item"]
        #[autocomplete = "autocomplete::autocomplete_poste"]
        poste: String,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let poste_id = poste_id(&ledger, &poste)?;

        let command = Command::ToggleValidated { month, poste_id };
        if let Some((outcome, _)) = run_command(ctx, command).await? {
            let response = match outcome {
                Outcome::Toggled { on: true } => {
                    format!("☑️ **{poste}** marked as paid for {}", month.label())
                }
                _ => format!("⬜ **{poste}** no longer marked as paid for {}", month.label()),
            };
            ctx.say(response).await?;
        }
        Ok(())
    }

    /// Sets the actual amount of a recurring item for a month.
    ///
    /// Leave the amount out to go back to the planned amount.
    #[poise::command(slash_command, prefix_command)]
    pub async fn fixed_amount(
        ctx: Context<'_>,
        #[description = "Recurring item"]
        #[autocomplete = "autocomplete::autocomplete_poste"]
        poste: String,
        #[description = "Actual amount (empty: back to the planned amount)"] amount: Option<String>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let poste_id = poste_id(&ledger, &poste)?;
        let amount = amount.as_deref().map(parse_amount);

        let command = Command::SetExpenseOverride {
            month,
            poste_id,
            amount,
        };
        if run_command(ctx, command).await?.is_some() {
            let response = match amount {
                Some(amount) => format!(
                    "✏️ **{poste}** is {amount:.2} € in {}",
                    month.label()
                ),
                None => format!(
                    "↩️ **{poste}** back to its planned amount in {}",
                    month.label()
                ),
            };
            ctx.say(response).await?;
        }
        Ok(())
    }

    /// Records variable spending outside envelopes.
    #[poise::command(slash_command, prefix_command)]
    pub async fn flex_spend(
        ctx: Context<'_>,
        #[description = "Amount spent"] amount: String,
        #[description = "Optional description"] label: Option<String>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        const DEFAULT_LABEL: &str = "Expense";

        let month = parse_month(month.as_deref())?;
        let amount = parse_amount(&amount);
        let command = Command::AddFlexibleExpense {
            month,
            label: label.unwrap_or_else(|| DEFAULT_LABEL.to_string()),
            amount,
        };
        if let Some((_, ledger)) = run_command(ctx, command).await? {
            let summary = report::month_summary(&ledger, month);
            ctx.say(format!(
                "🛒 Spent {amount:.2} €. Flexible spending in {}: {:.2} € / {:.2} €",
                month.label(),
                summary.total_flexible, summary.flexible_target
            ))
            .await?;
        }
        Ok(())
    }

    /// Removes the latest flexible expense with this description.
    #[poise::command(slash_command, prefix_command)]
    pub async fn flex_remove(
        ctx: Context<'_>,
        #[description = "Description of the expense"] label: String,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let Some(expense) = ledger
            .month(month)
            .flexible_expenses
            .into_iter()
            .rev()
            .find(|e| e.label.eq_ignore_ascii_case(&label))
        else {
            ctx.say(format!("❌ No expense **{label}** in {}", month.label()))
                .await?;
            return Ok(());
        };

        let command = Command::RemoveFlexibleExpense {
            month,
            id: expense.id,
        };
        if run_command(ctx, command).await?.is_some() {
            ctx.say(format!(
                "🗑️ Removed **{}** ({:.2} €) from {}",
                expense.label,
                expense.amount,
                month.label()
            ))
            .await?;
        }
        Ok(())
    }

    /// Replaces the note attached to a month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn note(
        ctx: Context<'_>,
        #[description = "Note text (empty to clear)"] text: Option<String>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let command = Command::SetNote {
            month,
            note: text.unwrap_or_default(),
        };
        if run_command(ctx, command).await?.is_some() {
            ctx.say(format!("📝 Note saved for {}", month.label()))
                .await?;
        }
        Ok(())
    }

    /// Shows the totals of a month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn month_summary(
        ctx: Context<'_>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let summary = report::month_summary(&ledger, month);

        ctx.say(format!(
            "📊 **Month summary**\n```\n{}```",
            report::format_month_summary(&summary)
        ))
        .await?;
        Ok(())
    }

    /// Validates a month. December also resets every envelope balance.
    #[poise::command(slash_command, prefix_command)]
    pub async fn close_month(
        ctx: Context<'_>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let Some((outcome, _)) = run_command(ctx, Command::CloseMonth { month }).await? else {
            return Ok(());
        };

        let mut response = format!("🔒 {} is closed.", month.label());
        if month.is_december() {
            response.push_str(" Envelope balances were reset for the new year.");
        }
        if let Outcome::MonthClosed { next } = outcome {
            write!(&mut response, "\n➡️ Next month: {}", next.label())?;
        }
        ctx.say(response).await?;
        Ok(())
    }

    /// Unlocks a validated month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn reopen_month(
        ctx: Context<'_>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        match run_command(ctx, Command::ReopenMonth { month }).await? {
            Some((Outcome::Unchanged, _)) => {
                ctx.say(format!("ℹ️ {} is already open.", month.label()))
                    .await?;
            }
            Some(_) => {
                ctx.say(format!("🔓 {} is open again.", month.label()))
                    .await?;
            }
            None => {}
        }
        Ok(())
    }

    /// Shows the twelve months of a year chained by their final balances.
    #[poise::command(slash_command, prefix_command)]
    pub async fn year_summary(
        ctx: Context<'_>,
        #[description = "Calendar year (default: current)"] year: Option<i32>,
        #[description = "Balance before January (default: 0)"] initial: Option<String>,
    ) -> Result<()> {
        let year = year.unwrap_or_else(|| MonthKey::current().year());
        let initial = initial.as_deref().map_or(0.0, parse_amount);
        let ledger = ledger_for(ctx).await?.snapshot();
        let rollup = report::annual_rollup(&ledger, year, initial);

        let mut table = String::new();
        writeln!(
            &mut table,
            "{:<8} {:>10} {:>10} {:>10} {:>10}",
            "Month", "Income", "Outflow", "Saved", "Balance"
        )?;
        for row in &rollup.months {
            writeln!(
                &mut table,
                "{:<8} {:>10.2} {:>10.2} {:>10.2} {:>10.2}{}",
                row.month.to_string(),
                row.income,
                row.outflow,
                row.alloc_savings + row.alloc_projects,
                row.solde_final,
                if row.is_closed { " 🔒" } else { "" }
            )?;
        }

        ctx.say(format!(
            "📅 **{year}** (start {:.2} €, end {:.2} €)\n```\n{table}```\nSavings {:.2} € | Projects {:.2} €",
            rollup.initial_balance, rollup.final_balance, rollup.total_savings, rollup.total_projects
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
