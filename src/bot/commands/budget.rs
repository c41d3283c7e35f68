//! Budget configuration Discord commands - recurring items, envelopes,
//! accounts, annual provisions, projects and the flexible target.
//!
//! Removals take a `confirm` flag and do nothing unless it is true.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context, account_id, envelope_id, handlers::autocomplete, ledger_for,
            parse_account_category, parse_amount, parse_envelope_category, parse_item_kind,
            poste_id, project_id, provision_id, run_command,
        },
        core::{
            config_ops::{EnvelopeDraft, ProjectDraft, ProvisionDraft, RecurringItemDraft},
            ledger::Command,
            model::AccountCategory,
            month::MonthKey,
        },
        errors::{Error, Result},
    };

    async fn confirmed(ctx: Context<'_>, confirm: bool, rerun: &str) -> Result<bool> {
        if !confirm {
            ctx.say(format!(
                "⚠️ Nothing was removed. Run `{rerun} confirm:true` to delete it."
            ))
            .await?;
        }
        Ok(confirm)
    }

    /// Adds a recurring expense item.
    #[poise::command(slash_command, prefix_command)]
    pub async fn poste_add(
        ctx: Context<'_>,
        #[description = "Name of the item"] label: String,
        #[description = "fixed, mandatory, secondary or amortized"] kind: String,
        #[description = "Planned monthly amount"] amount: String,
    ) -> Result<()> {
        let draft = RecurringItemDraft {
            label: label.clone(),
            kind: parse_item_kind(&kind)?,
            amount: parse_amount(&amount),
        };
        if run_command(ctx, Command::AddRecurringItem(draft)).await?.is_some() {
            ctx.say(format!("➕ Added recurring item **{label}**")).await?;
        }
        Ok(())
    }

    /// Changes the planned monthly amount of a recurring item.
    #[poise::command(slash_command, prefix_command)]
    pub async fn poste_amount(
        ctx: Context<'_>,
        #[description = "Item to change"]
        #[autocomplete = "autocomplete::autocomplete_poste"]
        poste: String,
        #[description = "New planned monthly amount"] amount: String,
    ) -> Result<()> {
        let ledger = ledger_for(ctx).await?.snapshot();
        let id = poste_id(&ledger, &poste)?;
        let existing = ledger
            .config
            .postes
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::not_found("recurring item", &poste))?;
        let amount = parse_amount(&amount);
        let draft = RecurringItemDraft {
            label: existing.label.clone(),
            kind: existing.kind,
            amount,
        };
        if run_command(ctx, Command::UpdateRecurringItem { id, draft })
            .await?
            .is_some()
        {
            ctx.say(format!("✏️ **{poste}** is now planned at {amount:.2} €"))
                .await?;
        }
        Ok(())
    }

    /// Deletes a recurring expense item.
    #[poise::command(slash_command, prefix_command)]
    pub async fn poste_remove(
        ctx: Context<'_>,
        #[description = "Item to delete"]
        #[autocomplete = "autocomplete::autocomplete_poste"]
        poste: String,
        #[description = "Must be true to delete"] confirm: bool,
    ) -> Result<()> {
        let ledger = ledger_for(ctx).await?.snapshot();
        let id = poste_id(&ledger, &poste)?;
        if !confirmed(ctx, confirm, &format!("/poste_remove {poste}")).await? {
            return Ok(());
        }
        if run_command(ctx, Command::RemoveRecurringItem { id }).await?.is_some() {
            ctx.say(format!("🗑️ Removed recurring item **{poste}**")).await?;
        }
        Ok(())
    }

    /// Creates an envelope with an empty balance.
    #[poise::command(slash_command, prefix_command)]
    pub async fn envelope_add(
        ctx: Context<'_>,
        #[description = "Name of the envelope"] label: String,
        #[description = "mandatory or secondary"] category: String,
        #[description = "Monthly funding target"] target: String,
    ) -> Result<()> {
        let draft = EnvelopeDraft {
            label: label.clone(),
            category: parse_envelope_category(&category)?,
            target: parse_amount(&target),
        };
        if run_command(ctx, Command::AddEnvelope(draft)).await?.is_some() {
            ctx.say(format!("💌 Created envelope **{label}**")).await?;
        }
        Ok(())
    }

    /// Changes the monthly funding target of an envelope.
    #[poise::command(slash_command, prefix_command)]
    pub async fn envelope_target(
        ctx: Context<'_>,
        #[description = "Envelope to change"]
        #[autocomplete = "autocomplete::autocomplete_envelope"]
        envelope: String,
        #[description = "New monthly target"] target: String,
    ) -> Result<()> {
        let ledger = ledger_for(ctx).await?.snapshot();
        let id = envelope_id(&ledger, &envelope)?;
        let existing = ledger
            .config
            .envelope(&id)
            .ok_or_else(|| Error::not_found("envelope", &envelope))?;
        let target = parse_amount(&target);
        let draft = EnvelopeDraft {
            label: existing.label.clone(),
            category: existing.category,
            target,
        };
        if run_command(ctx, Command::UpdateEnvelope { id, draft }).await?.is_some() {
            ctx.say(format!("✏️ **{envelope}** target is now {target:.2} €"))
                .await?;
        }
        Ok(())
    }

    /// Deletes an envelope and its balance.
    #[poise::command(slash_command, prefix_command)]
    pub async fn envelope_remove(
        ctx: Context<'_>,
        #[description = "Envelope to delete"]
        #[autocomplete = "autocomplete::autocomplete_envelope"]
        envelope: String,
        #[description = "Must be true to delete"] confirm: bool,
    ) -> Result<()> {
        let ledger = ledger_for(ctx).await?.snapshot();
        let id = envelope_id(&ledger, &envelope)?;
        if !confirmed(ctx, confirm, &format!("/envelope_remove {envelope}")).await? {
            return Ok(());
        }
        if run_command(ctx, Command::RemoveEnvelope { id }).await?.is_some() {
            ctx.say(format!("🗑️ Removed envelope **{envelope}**")).await?;
        }
        Ok(())
    }

    /// Adds a bank account.
    #[poise::command(slash_command, prefix_command)]
    pub async fn account_add(
        ctx: Context<'_>,
        #[description = "Name of the account"] label: String,
        #[description = "current, savings or provision"] category: String,
        #[description = "Opening balance (default: 0)"] initial: Option<String>,
    ) -> Result<()> {
        let command = Command::AddAccount {
            label: label.clone(),
            category: parse_account_category(&category)?,
            initial: initial.as_deref().map_or(0.0, parse_amount),
        };
        if run_command(ctx, command).await?.is_some() {
            ctx.say(format!("🏦 Added account **{label}**")).await?;
        }
        Ok(())
    }

    /// Sets the balance of an account, e.g. after checking the bank statement.
    #[poise::command(slash_command, prefix_command)]
    pub async fn account_balance(
        ctx: Context<'_>,
        #[description = "Account"]
        #[autocomplete = "autocomplete::autocomplete_account"]
        account: String,
        #[description = "Balance"] balance: String,
    ) -> Result<()> {
        let ledger = ledger_for(ctx).await?.snapshot();
        let id = account_id(&ledger, &account)?;
        let balance = parse_amount(&balance);
        if run_command(ctx, Command::UpdateAccountBalance { id, balance })
            .await?
            .is_some()
        {
            ctx.say(format!("🏦 **{account}** balance set to {balance:.2} €"))
                .await?;
        }
        Ok(())
    }

    /// Chooses the account receiving savings or provision transfers.
    #[poise::command(slash_command, prefix_command)]
    pub async fn account_assign(
        ctx: Context<'_>,
        #[description = "Account"]
        #[autocomplete = "autocomplete::autocomplete_account"]
        account: String,
        #[description = "savings or provision"] role: String,
    ) -> Result<()> {
        let ledger = ledger_for(ctx).await?.snapshot();
        let id = account_id(&ledger, &account)?;
        let command = match parse_account_category(&role)? {
            AccountCategory::Savings => Command::SetSavingsAccount { id },
            AccountCategory::Provision => Command::SetProvisionAccount { id },
            AccountCategory::Current => {
                return Err(Error::Config {
                    message: "Role must be savings or provision".to_string(),
                });
            }
        };
        if run_command(ctx, command).await?.is_some() {
            ctx.say(format!("🏦 **{account}** now receives {role} transfers"))
                .await?;
        }
        Ok(())
    }

    /// Adds an annual provision item to a year.
    #[poise::command(slash_command, prefix_command)]
    pub async fn provision_add(
        ctx: Context<'_>,
        #[description = "Name of the item"] label: String,
        #[description = "Planned amount for the year"] planned: String,
        #[description = "Calendar year (default: current)"] year: Option<i32>,
    ) -> Result<()> {
        let year = year.unwrap_or_else(|| MonthKey::current().year());
        let draft = ProvisionDraft {
            label: label.clone(),
            planned: parse_amount(&planned),
        };
        if let Some((_, ledger)) = run_command(ctx, Command::AddProvisionItem { year, draft }).await? {
            ctx.say(format!(
                "🧾 Added **{label}** to {year}. Monthly provision: {:.2} €",
                ledger.config.monthly_provision_amount(year)
            ))
            .await?;
        }
        Ok(())
    }

    /// Changes the planned yearly amount of a provision item.
    #[poise::command(slash_command, prefix_command)]
    pub async fn provision_planned(
        ctx: Context<'_>,
        #[description = "Provision item"]
        #[autocomplete = "autocomplete::autocomplete_provision"]
        item: String,
        #[description = "New planned amount for the year"] planned: String,
        #[description = "Calendar year (default: current)"] year: Option<i32>,
    ) -> Result<()> {
        let year = year.unwrap_or_else(|| MonthKey::current().year());
        let ledger = ledger_for(ctx).await?.snapshot();
        let id = provision_id(&ledger, year, &item)?;
        let label = ledger
            .config
            .provisions_for(year)
            .iter()
            .find(|p| p.id == id)
            .map_or_else(|| item.clone(), |p| p.label.clone());
        let draft = ProvisionDraft {
            label,
            planned: parse_amount(&planned),
        };
        let command = Command::UpdateProvisionItem { year, id, draft };
        if let Some((_, ledger)) = run_command(ctx, command).await? {
            ctx.say(format!(
                "✏️ **{item}** updated. Monthly provision for {year}: {:.2} €",
                ledger.config.monthly_provision_amount(year)
            ))
            .await?;
        }
        Ok(())
    }

    /// Deletes an annual provision item and its history.
    #[poise::command(slash_command, prefix_command)]
    pub async fn provision_remove(
        ctx: Context<'_>,
        #[description = "Provision item"]
        #[autocomplete = "autocomplete::autocomplete_provision"]
        item: String,
        #[description = "Must be true to delete"] confirm: bool,
        #[description = "Calendar year (default: current)"] year: Option<i32>,
    ) -> Result<()> {
        let year = year.unwrap_or_else(|| MonthKey::current().year());
        let ledger = ledger_for(ctx).await?.snapshot();
        let id = provision_id(&ledger, year, &item)?;
        if !confirmed(ctx, confirm, &format!("/provision_remove {item}")).await? {
            return Ok(());
        }
        if run_command(ctx, Command::RemoveProvisionItem { year, id })
            .await?
            .is_some()
        {
            ctx.say(format!("🗑️ Removed **{item}** from {year}")).await?;
        }
        Ok(())
    }

    /// Creates a savings project.
    #[poise::command(slash_command, prefix_command)]
    pub async fn project_add(
        ctx: Context<'_>,
        #[description = "Name of the project"] label: String,
        #[description = "Amount to reach"] target: String,
    ) -> Result<()> {
        let draft = ProjectDraft {
            label: label.clone(),
            target: parse_amount(&target),
        };
        if run_command(ctx, Command::AddProject(draft)).await?.is_some() {
            ctx.say(format!("🎯 Created project **{label}**")).await?;
        }
        Ok(())
    }

    /// Changes the amount a project aims for.
    #[poise::command(slash_command, prefix_command)]
    pub async fn project_target(
        ctx: Context<'_>,
        #[description = "Project"]
        #[autocomplete = "autocomplete::autocomplete_project"]
        project: String,
        #[description = "New amount to reach"] target: String,
    ) -> Result<()> {
        let ledger = ledger_for(ctx).await?.snapshot();
        let id = project_id(&ledger, &project)?;
        let label = ledger
            .config
            .project(&id)
            .map_or_else(|| project.clone(), |p| p.label.clone());
        let target = parse_amount(&target);
        let draft = ProjectDraft { label, target };
        if run_command(ctx, Command::UpdateProject { id, draft }).await?.is_some() {
            ctx.say(format!("✏️ **{project}** now aims for {target:.2} €"))
                .await?;
        }
        Ok(())
    }

    /// Deletes a project. Earmarked money stays in its accounts.
    #[poise::command(slash_command, prefix_command)]
    pub async fn project_remove(
        ctx: Context<'_>,
        #[description = "Project to delete"]
        #[autocomplete = "autocomplete::autocomplete_project"]
        project: String,
        #[description = "Must be true to delete"] confirm: bool,
    ) -> Result<()> {
        let ledger = ledger_for(ctx).await?.snapshot();
        let id = project_id(&ledger, &project)?;
        if !confirmed(ctx, confirm, &format!("/project_remove {project}")).await? {
            return Ok(());
        }
        if run_command(ctx, Command::RemoveProject { id }).await?.is_some() {
            ctx.say(format!("🗑️ Removed project **{project}**")).await?;
        }
        Ok(())
    }

    /// Sets the monthly target for flexible spending.
    #[poise::command(slash_command, prefix_command)]
    pub async fn flex_target(
        ctx: Context<'_>,
        #[description = "Monthly target"] target: String,
    ) -> Result<()> {
        let target = parse_amount(&target);
        if run_command(ctx, Command::SetFlexibleTarget { target }).await?.is_some() {
            ctx.say(format!("🛒 Flexible spending target set to {target:.2} €"))
                .await?;
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
