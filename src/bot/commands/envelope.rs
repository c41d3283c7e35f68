//! Envelope Discord commands - listing, funding, spending and annual provisions.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context, envelope_id, handlers::autocomplete, ledger_for, parse_amount, parse_month,
            provision_id, run_command,
        },
        core::{
            ledger::{Command, Outcome},
            model::EnvelopeCategory,
            report,
        },
        errors::Result,
    };
    use std::fmt::Write;

    /// Lists envelopes with their balance and funding state for a month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn envelopes(
        ctx: Context<'_>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();

        if ledger.config.envelopes.is_empty() {
            ctx.say("📂 No envelopes configured.").await?;
            return Ok(());
        }

        let record = ledger.month(month);
        let mut response = format!("📂 **Envelopes - {}**\n\n", month.label());
        for envelope in &ledger.config.envelopes {
            let priority = match envelope.category {
                EnvelopeCategory::Mandatory => "🔴",
                EnvelopeCategory::Secondary => "🔵",
            };
            let funded = if record.is_funded(&envelope.id) {
                "✅"
            } else {
                "⬜"
            };
            writeln!(
                &mut response,
                "{priority} {funded} **{}** - {:.2} € (target {:.2} €)",
                envelope.label, envelope.balance, envelope.target
            )?;
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Funds an envelope with its monthly target from the current account.
    #[poise::command(slash_command, prefix_command)]
    pub async fn fund(
        ctx: Context<'_>,
        #[description = "Envelope to fund"]
        #[autocomplete = "autocomplete::autocomplete_envelope"]
        envelope: String,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let envelope_id = envelope_id(&ledger, &envelope)?;

        let command = Command::FundEnvelope {
            month,
            envelope_id: envelope_id.clone(),
        };
        if let Some((_, ledger)) = run_command(ctx, command).await? {
            let balance = ledger.config.envelope(&envelope_id).map_or(0.0, |e| e.balance);
            ctx.say(format!(
                "💌 Funded **{envelope}** for {}. Balance: {balance:.2} €",
                month.label()
            ))
            .await?;
        }
        Ok(())
    }

    /// Cancels an envelope's funding for a month and returns the money.
    #[poise::command(slash_command, prefix_command)]
    pub async fn unfund(
        ctx: Context<'_>,
        #[description = "Envelope to unfund"]
        #[autocomplete = "autocomplete::autocomplete_envelope"]
        envelope: String,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let envelope_id = envelope_id(&ledger, &envelope)?;

        let command = Command::UnfundEnvelope {
            month,
            envelope_id: envelope_id.clone(),
        };
        if let Some((_, ledger)) = run_command(ctx, command).await? {
            let balance = ledger.config.envelope(&envelope_id).map_or(0.0, |e| e.balance);
            ctx.say(format!(
                "↩️ Funding of **{envelope}** cancelled for {}. Balance: {balance:.2} €",
                month.label()
            ))
            .await?;
        }
        Ok(())
    }

    /// Records an expense paid from an envelope.
    #[poise::command(slash_command, prefix_command)]
    pub async fn spend(
        ctx: Context<'_>,
        #[description = "Envelope to spend from"]
        #[autocomplete = "autocomplete::autocomplete_envelope"]
        envelope: String,
        #[description = "Amount spent"] amount: String,
        #[description = "Optional description of the expense"] label: Option<String>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        const DEFAULT_LABEL: &str = "Expense";

        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let envelope_id = envelope_id(&ledger, &envelope)?;
        let amount = parse_amount(&amount);

        let command = Command::SpendEnvelope {
            month,
            envelope_id: envelope_id.clone(),
            label: label.unwrap_or_else(|| DEFAULT_LABEL.to_string()),
            amount,
        };
        if let Some((_, ledger)) = run_command(ctx, command).await? {
            let balance = ledger.config.envelope(&envelope_id).map_or(0.0, |e| e.balance);
            let warning = if balance < 0.0 { " ⚠️ overdrawn" } else { "" };
            ctx.say(format!(
                "💸 Spent {amount:.2} € from **{envelope}**. Balance: {balance:.2} €{warning}"
            ))
            .await?;
        }
        Ok(())
    }

    /// Cancels the latest expense recorded on an envelope for a month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn unspend(
        ctx: Context<'_>,
        #[description = "Envelope of the expense"]
        #[autocomplete = "autocomplete::autocomplete_envelope"]
        envelope: String,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let envelope_id = envelope_id(&ledger, &envelope)?;

        let Some(expense) = ledger
            .month(month)
            .envelope_expenses
            .into_iter()
            .rev()
            .find(|e| e.envelope_id == envelope_id)
        else {
            ctx.say(format!(
                "❌ No expense on **{envelope}** in {}",
                month.label()
            ))
            .await?;
            return Ok(());
        };

        let command = Command::RemoveEnvelopeSpend {
            month,
            expense_id: expense.id,
        };
        if run_command(ctx, command).await?.is_some() {
            ctx.say(format!(
                "↩️ Cancelled **{}** ({:.2} €) on **{envelope}**",
                expense.label, expense.amount
            ))
            .await?;
        }
        Ok(())
    }

    /// Toggles the monthly transfer into the provision account.
    #[poise::command(slash_command, prefix_command)]
    pub async fn provision_toggle(
        ctx: Context<'_>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let command = Command::ToggleProvisionTransfer { month };
        let Some((outcome, ledger)) = run_command(ctx, command).await? else {
            return Ok(());
        };

        let amount = ledger.month(month).provision_transfer.unwrap_or_default();
        let response = match outcome {
            Outcome::Toggled { on: true } => {
                format!("🏦 Provision transfer of {amount:.2} € done for {}", month.label())
            }
            _ => format!("↩️ Provision transfer cancelled for {}", month.label()),
        };
        ctx.say(response).await?;
        Ok(())
    }

    /// Pays an expense out of the provision account.
    #[poise::command(slash_command, prefix_command)]
    pub async fn provision_spend(
        ctx: Context<'_>,
        #[description = "Provision item"]
        #[autocomplete = "autocomplete::autocomplete_provision"]
        item: String,
        #[description = "Amount paid"] amount: String,
        #[description = "Optional description"] label: Option<String>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let item_id = provision_id(&ledger, month.year(), &item)?;
        let amount = parse_amount(&amount);

        let command = Command::RecordProvisionExpense {
            month,
            item_id: item_id.clone(),
            label: label.unwrap_or_else(|| item.clone()),
            amount,
        };
        if let Some((_, ledger)) = run_command(ctx, command).await? {
            let remaining = report::provision_overview(&ledger.config, month.year())
                .into_iter()
                .find(|p| p.id == item_id)
                .map_or(0.0, |p| p.remaining);
            ctx.say(format!(
                "🧾 Paid {amount:.2} € for **{item}**. Remaining this year: {remaining:.2} €"
            ))
            .await?;
        }
        Ok(())
    }

    /// Cancels the latest provision expense of an item for a month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn provision_unspend(
        ctx: Context<'_>,
        #[description = "Provision item"]
        #[autocomplete = "autocomplete::autocomplete_provision"]
        item: String,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let item_id = provision_id(&ledger, month.year(), &item)?;

        let Some(expense) = ledger
            .month(month)
            .provision_expenses
            .into_iter()
            .rev()
            .find(|e| e.item_id == item_id)
        else {
            ctx.say(format!("❌ No expense on **{item}** in {}", month.label()))
                .await?;
            return Ok(());
        };

        let command = Command::RemoveProvisionExpense {
            month,
            expense_id: expense.id,
        };
        if run_command(ctx, command).await?.is_some() {
            ctx.say(format!(
                "↩️ Cancelled **{}** ({:.2} €) on **{item}**",
                expense.label, expense.amount
            ))
            .await?;
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
