//! Savings Discord commands - transfers, project funding and progress.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context, account_id, handlers::autocomplete, ledger_for, parse_amount, parse_month,
            project_id, run_command,
        },
        core::{ledger::Command, model::AllocationKind, report},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Moves money from the current account to savings and records it on a month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn save(
        ctx: Context<'_>,
        #[description = "Amount to save"] amount: String,
        #[description = "Optional note"] note: Option<String>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let amount = parse_amount(&amount);
        let command = Command::TransferToSavingsInMonth {
            month,
            amount,
            note: note.unwrap_or_default(),
        };
        if run_command(ctx, command).await?.is_some() {
            ctx.say(format!(
                "🐷 Saved {amount:.2} € in {}",
                month.label()
            ))
            .await?;
        }
        Ok(())
    }

    /// Moves money back from savings to the current account.
    #[poise::command(slash_command, prefix_command)]
    pub async fn retrieve(
        ctx: Context<'_>,
        #[description = "Amount to take back"] amount: String,
    ) -> Result<()> {
        let amount = parse_amount(&amount);
        if let Some((_, ledger)) = run_command(ctx, Command::RetrieveFromSavings { amount }).await? {
            let current = ledger.config.current_account().map_or(0.0, |a| a.initial);
            ctx.say(format!(
                "💳 Retrieved {amount:.2} € from savings. Current account: {current:.2} €"
            ))
            .await?;
        }
        Ok(())
    }

    /// Moves money to an account and earmarks it for a project.
    #[poise::command(slash_command, prefix_command)]
    pub async fn fund_project(
        ctx: Context<'_>,
        #[description = "Project to fund"]
        #[autocomplete = "autocomplete::autocomplete_project"]
        project: String,
        #[description = "Amount"] amount: String,
        #[description = "Account receiving the money (default: savings account)"]
        #[autocomplete = "autocomplete::autocomplete_account"]
        account: Option<String>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let project_id = project_id(&ledger, &project)?;
        let target_account_id = match account.as_deref() {
            Some(label) => account_id(&ledger, label)?,
            None => ledger
                .config
                .savings_account_id
                .clone()
                .ok_or_else(|| Error::not_found("account", "savings"))?,
        };
        let amount = parse_amount(&amount);

        let command = Command::FundProjectInMonth {
            month,
            project_id: project_id.clone(),
            amount,
            target_account_id,
            note: String::new(),
        };
        if let Some((_, ledger)) = run_command(ctx, command).await? {
            let progress = ledger
                .config
                .project(&project_id)
                .map_or(0.0, crate::core::savings::project_progress);
            ctx.say(format!(
                "🎯 Added {amount:.2} € to **{project}**\n{}",
                report::format_progress_bar(progress, Some(15))
            ))
            .await?;
        }
        Ok(())
    }

    /// Earmarks money already sitting in an account for a project.
    #[poise::command(slash_command, prefix_command)]
    pub async fn earmark(
        ctx: Context<'_>,
        #[description = "Project"]
        #[autocomplete = "autocomplete::autocomplete_project"]
        project: String,
        #[description = "Amount"] amount: String,
        #[description = "Account holding the money"]
        #[autocomplete = "autocomplete::autocomplete_account"]
        account: String,
    ) -> Result<()> {
        let ledger = ledger_for(ctx).await?.snapshot();
        let project_id = project_id(&ledger, &project)?;
        let target_account_id = account_id(&ledger, &account)?;
        let amount = parse_amount(&amount);

        let command = Command::FundProject {
            project_id: project_id.clone(),
            amount,
            target_account_id,
        };
        if let Some((_, ledger)) = run_command(ctx, command).await? {
            let progress = ledger
                .config
                .project(&project_id)
                .map_or(0.0, crate::core::savings::project_progress);
            ctx.say(format!(
                "🏷️ Earmarked {amount:.2} € on **{account}** for **{project}**\n{}",
                report::format_progress_bar(progress, Some(15))
            ))
            .await?;
        }
        Ok(())
    }

    /// Cancels the latest savings or project transfer recorded on a month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn allocation_remove(
        ctx: Context<'_>,
        #[description = "Month as YYYY-MM (default: current)"] month: Option<String>,
    ) -> Result<()> {
        let month = parse_month(month.as_deref())?;
        let ledger = ledger_for(ctx).await?.snapshot();
        let Some(allocation) = ledger.month(month).allocations.pop() else {
            ctx.say(format!("❌ No transfer recorded in {}", month.label()))
                .await?;
            return Ok(());
        };

        let target = match allocation.kind {
            AllocationKind::Savings => "savings".to_string(),
            AllocationKind::Project => allocation
                .project_id
                .as_deref()
                .and_then(|id| ledger.config.project(id))
                .map_or_else(|| "a project".to_string(), |p| format!("**{}**", p.label)),
        };
        let command = Command::RemoveAllocation {
            month,
            allocation_id: allocation.id,
        };
        if run_command(ctx, command).await?.is_some() {
            ctx.say(format!(
                "↩️ Cancelled the {:.2} € transfer to {target} in {}",
                allocation.amount,
                month.label()
            ))
            .await?;
        }
        Ok(())
    }

    /// Shows savings accounts and the progress of every project.
    #[poise::command(slash_command, prefix_command)]
    pub async fn projects(ctx: Context<'_>) -> Result<()> {
        let ledger = ledger_for(ctx).await?.snapshot();
        let overview = report::savings_overview(&ledger.config);

        let mut response = String::from("🐷 **Savings**\n");
        for (label, balance) in &overview.accounts {
            writeln!(&mut response, "• {label}: {balance:.2} €")?;
        }
        writeln!(&mut response, "Total: {:.2} €\n", overview.total)?;

        if overview.projects.is_empty() {
            response.push_str("_No projects yet_\n");
        } else {
            response.push_str("🎯 **Projects**\n");
            for project in &overview.projects {
                writeln!(
                    &mut response,
                    "**{}** - {:.2} € / {:.2} €\n{}",
                    project.label,
                    project.allocated,
                    project.target,
                    report::format_progress_bar(project.progress_percent, Some(15))
                )?;
            }
        }

        ctx.say(response).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
