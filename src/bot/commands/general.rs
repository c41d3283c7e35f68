//! General Discord commands - help, status, sign-out and reset.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, author_identity, ledger_for, run_command},
        core::{ledger::Command, month::MonthKey, report},
        errors::Result,
    };
    use std::fmt::Write;

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let help_text = "**Household Budget Help**\n\
        Months default to the current one; pass `month` as `YYYY-MM` to pick another.\n\n\
        **Month**\n\
        • `/income_add <amount> <label> [month]` / `/income_edit` / `/income_remove <label> [month]` - Incomes.\n\
        • `/fixed_validate <item> [month]` - Checks a fixed expense as paid.\n\
        • `/fixed_amount <item> [amount] [month]` - Sets the actual amount of an item.\n\
        • `/flex_spend <amount> [label] [month]` / `/flex_remove <label> [month]` - Flexible spending.\n\
        • `/note [text] [month]` - Attaches a note to a month.\n\
        • `/month_summary [month]` - Shows totals and reste à vivre.\n\
        • `/close_month [month]` / `/reopen_month [month]` - Locks or unlocks a month.\n\
        • `/year_summary [year] [initial]` - Shows the monthly carry-over chain.\n\n\
        **Envelopes & provisions**\n\
        • `/envelopes [month]` - Lists envelopes and their balances.\n\
        • `/fund <envelope> [month]` / `/unfund <envelope> [month]` - Funds or unfunds an envelope.\n\
        • `/spend <envelope> <amount> [label] [month]` - Records an envelope expense.\n\
        • `/unspend <envelope> [month]` - Cancels the latest expense on an envelope.\n\
        • `/provision_toggle [month]` - Toggles the monthly provision transfer.\n\
        • `/provision_spend <item> <amount> [label] [month]` - Pays from the provision buffer.\n\
        • `/provision_unspend <item> [month]` - Cancels the latest provision expense.\n\n\
        **Savings**\n\
        • `/save <amount> [note] [month]` / `/retrieve <amount>` - Moves money to or from savings.\n\
        • `/fund_project <project> <amount> [account] [month]` - Funds a project.\n\
        • `/earmark <project> <amount> <account>` - Earmarks money already in an account.\n\
        • `/allocation_remove [month]` - Cancels the latest savings or project transfer.\n\
        • `/projects` - Shows savings accounts and project progress.";

        let setup_text = "**Budget setup**\n\
        • `/poste_add <label> <kind> <amount>` / `/poste_amount` / `/poste_remove <item> confirm:true`\n\
        • `/envelope_add <label> <category> <target>` / `/envelope_target` / `/envelope_remove <envelope> confirm:true`\n\
        • `/account_add <label> <category> [initial]` / `/account_balance` / `/account_assign <account> <role>`\n\
        • `/provision_add <label> <planned> [year]` / `/provision_planned` / `/provision_remove <item> confirm:true [year]`\n\
        • `/project_add <label> <target>` / `/project_target` / `/project_remove <project> confirm:true`\n\
        • `/flex_target <target>` - Sets the monthly flexible spending target.\n\n\
        **Account**\n\
        • `/status` - Shows your balances for the current month.\n\
        • `/signout` - Closes your session.\n\
        • `/reset confirm:true` - Erases everything and restores the default configuration.";

        ctx.say(help_text).await?;
        ctx.say(setup_text).await?;
        Ok(())
    }

    /// Shows the current account balance and this month's reste à vivre.
    #[poise::command(slash_command, prefix_command)]
    pub async fn status(ctx: Context<'_>) -> Result<()> {
        let handle = ledger_for(ctx).await?;
        let ledger = handle.snapshot();
        let month = MonthKey::current();
        let summary = report::month_summary(&ledger, month);

        let mut response = format!("👤 **{}**\n\n", handle.identity().display_name);
        for account in &ledger.config.accounts {
            writeln!(
                &mut response,
                "🏦 {} ({:?}): {:.2} €",
                account.label, account.category, account.initial
            )?;
        }
        writeln!(&mut response)?;
        writeln!(
            &mut response,
            "📅 {} {}",
            month.label(),
            if summary.is_closed { "🔒" } else { "🔓" }
        )?;
        writeln!(
            &mut response,
            "💶 Reste à vivre: {}",
            report::format_signed_amount(summary.reste_a_vivre)
        )?;

        ctx.say(response).await?;
        Ok(())
    }

    /// Closes your session. Your data stays saved.
    #[poise::command(slash_command, prefix_command)]
    pub async fn signout(ctx: Context<'_>) -> Result<()> {
        let identity = author_identity(ctx);
        if ctx.data().sessions.sign_out(&identity.id).await {
            ctx.say("👋 Signed out.").await?;
        } else {
            ctx.say("ℹ️ You were not signed in.").await?;
        }
        Ok(())
    }

    /// Erases all months and restores the default configuration.
    #[poise::command(slash_command, prefix_command)]
    pub async fn reset(
        ctx: Context<'_>,
        #[description = "Must be true: this erases all your data"] confirm: bool,
    ) -> Result<()> {
        if !confirm {
            ctx.say("⚠️ Nothing was erased. Run `/reset confirm:true` to wipe your ledger.")
                .await?;
            return Ok(());
        }

        let defaults = ctx.data().sessions.defaults().clone();
        if run_command(ctx, Command::ResetAll { defaults }).await?.is_some() {
            ctx.say("🧹 Ledger reset to the default configuration.")
                .await?;
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
