//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the household budget,
//! including all slash commands, autocomplete handlers, and bot context management.
//! The Discord author is the signed-in user: every command opens (or reuses)
//! the author's ledger store through the [`SessionRegistry`].

/// Discord command implementations (general, month, envelope, savings)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    core::{
        gateway::SeaOrmGateway,
        ledger::{Command, Outcome},
        model::{AccountCategory, EnvelopeCategory, ItemKind, Ledger, UserIdentity},
        money,
        month::MonthKey,
        session::SessionRegistry,
        store::LedgerHandle,
    },
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Shorthand for the poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Shared data available to all bot commands.
pub struct BotData {
    /// Open ledger stores, one per signed-in Discord user
    pub sessions: SessionRegistry<SeaOrmGateway>,
}

impl BotData {
    /// Creates a new `BotData` around a session registry.
    #[must_use]
    pub const fn new(sessions: SessionRegistry<SeaOrmGateway>) -> Self {
        Self { sessions }
    }
}

/// Identity of the command author.
#[must_use]
pub fn author_identity(ctx: Context<'_>) -> UserIdentity {
    let author = ctx.author();
    UserIdentity {
        id: author.id.to_string(),
        display_name: author
            .global_name
            .clone()
            .unwrap_or_else(|| author.name.clone()),
        avatar_url: author.avatar_url(),
    }
}

/// The author's ledger store, signing them in on first use.
pub async fn ledger_for(ctx: Context<'_>) -> Result<LedgerHandle> {
    ctx.data().sessions.sign_in(author_identity(ctx)).await
}

/// Dispatches `command` on the author's ledger.
///
/// Rejections and persistence failures are reported to the user and yield
/// `None`; any other error is propagated to the framework.
pub async fn run_command(ctx: Context<'_>, command: Command) -> Result<Option<(Outcome, Arc<Ledger>)>> {
    let handle = ledger_for(ctx).await?;
    match handle.dispatch(command).await {
        Ok(outcome) => Ok(Some((outcome, handle.snapshot()))),
        Err(e) if e.is_rejection() => {
            ctx.say(format!("❌ {e}")).await?;
            Ok(None)
        }
        Err(e @ Error::PersistenceFailed { .. }) => {
            warn!(user_id = %handle.identity().id, error = %e, "Reply sent without persistence");
            ctx.say("⚠️ Change applied but not saved yet. It will be written with your next change.")
                .await?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Parses an optional `YYYY-MM` argument, defaulting to the current month.
pub fn parse_month(month: Option<&str>) -> Result<MonthKey> {
    month.map_or_else(|| Ok(MonthKey::current()), str::parse)
}

/// Parses an amount typed by the user. Unreadable text counts as 0.
#[must_use]
pub fn parse_amount(amount: &str) -> f64 {
    money::coerce_amount(amount)
}

/// Parses a recurring item kind: `fixed`, `mandatory`, `secondary` or `amortized`.
pub fn parse_item_kind(kind: &str) -> Result<ItemKind> {
    match kind.trim().to_lowercase().as_str() {
        "fixed" => Ok(ItemKind::Fixed),
        "mandatory" | "mandatoryenvelope" => Ok(ItemKind::MandatoryEnvelope),
        "secondary" | "secondaryenvelope" => Ok(ItemKind::SecondaryEnvelope),
        "amortized" => Ok(ItemKind::Amortized),
        _ => Err(Error::Config {
            message: format!("Unknown kind `{kind}`, use fixed, mandatory, secondary or amortized"),
        }),
    }
}

/// Parses an envelope category: `mandatory` or `secondary`.
pub fn parse_envelope_category(category: &str) -> Result<EnvelopeCategory> {
    match category.trim().to_lowercase().as_str() {
        "mandatory" => Ok(EnvelopeCategory::Mandatory),
        "secondary" => Ok(EnvelopeCategory::Secondary),
        _ => Err(Error::Config {
            message: format!("Unknown envelope category `{category}`, use mandatory or secondary"),
        }),
    }
}

/// Parses an account category: `current`, `savings` or `provision`.
pub fn parse_account_category(category: &str) -> Result<AccountCategory> {
    match category.trim().to_lowercase().as_str() {
        "current" => Ok(AccountCategory::Current),
        "savings" => Ok(AccountCategory::Savings),
        "provision" => Ok(AccountCategory::Provision),
        _ => Err(Error::Config {
            message: format!("Unknown account category `{category}`, use current, savings or provision"),
        }),
    }
}

/// Id of the recurring item with this label (case-insensitive).
pub fn poste_id(ledger: &Ledger, label: &str) -> Result<String> {
    ledger
        .config
        .postes
        .iter()
        .find(|p| p.label.eq_ignore_ascii_case(label))
        .map(|p| p.id.clone())
        .ok_or_else(|| Error::not_found("recurring item", label))
}

/// Id of the envelope with this label (case-insensitive).
pub fn envelope_id(ledger: &Ledger, label: &str) -> Result<String> {
    ledger
        .config
        .envelopes
        .iter()
        .find(|e| e.label.eq_ignore_ascii_case(label))
        .map(|e| e.id.clone())
        .ok_or_else(|| Error::not_found("envelope", label))
}

/// Id of the project with this label (case-insensitive).
pub fn project_id(ledger: &Ledger, label: &str) -> Result<String> {
    ledger
        .config
        .projects
        .iter()
        .find(|p| p.label.eq_ignore_ascii_case(label))
        .map(|p| p.id.clone())
        .ok_or_else(|| Error::not_found("project", label))
}

/// Id of the account with this label (case-insensitive).
pub fn account_id(ledger: &Ledger, label: &str) -> Result<String> {
    ledger
        .config
        .accounts
        .iter()
        .find(|a| a.label.eq_ignore_ascii_case(label))
        .map(|a| a.id.clone())
        .ok_or_else(|| Error::not_found("account", label))
}

/// Id of the provision item of `year` with this label (case-insensitive).
pub fn provision_id(ledger: &Ledger, year: i32, label: &str) -> Result<String> {
    ledger
        .config
        .provisions_for(year)
        .iter()
        .find(|p| p.label.eq_ignore_ascii_case(label))
        .map(|p| p.id.clone())
        .ok_or_else(|| Error::not_found("provision item", label))
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            let reply = if error.is_rejection() {
                format!("❌ {error}")
            } else {
                error!("Error in command `{}`: {error:?}", ctx.command().name);
                format!("An error occurred: {error}")
            };
            if let Err(e) = ctx.say(reply).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// All slash commands exposed by the bot.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::help(),
        commands::status(),
        commands::signout(),
        commands::reset(),
        commands::income_add(),
        commands::income_edit(),
        commands::income_remove(),
        commands::month_summary(),
        commands::close_month(),
        commands::reopen_month(),
        commands::year_summary(),
        commands::envelopes(),
        commands::fund(),
        commands::spend(),
        commands::unspend(),
        commands::provision_toggle(),
        commands::provision_spend(),
        commands::fixed_validate(),
        commands::fixed_amount(),
        commands::flex_spend(),
        commands::flex_remove(),
        commands::note(),
        commands::unfund(),
        commands::provision_unspend(),
        commands::save(),
        commands::retrieve(),
        commands::fund_project(),
        commands::earmark(),
        commands::allocation_remove(),
        commands::projects(),
        commands::poste_add(),
        commands::poste_amount(),
        commands::poste_remove(),
        commands::envelope_add(),
        commands::envelope_target(),
        commands::envelope_remove(),
        commands::account_add(),
        commands::account_balance(),
        commands::account_assign(),
        commands::provision_add(),
        commands::provision_planned(),
        commands::provision_remove(),
        commands::project_add(),
        commands::project_target(),
        commands::project_remove(),
        commands::flex_target(),
    ]
}

/// Connects to Discord and serves commands until the client stops.
#[instrument(skip(token, sessions))]
pub async fn run_bot(token: String, sessions: SessionRegistry<SeaOrmGateway>) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(BotData::new(sessions))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await?;
    Ok(())
}

pub use commands::*;
pub use handlers::*;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_label_lookups_ignore_case() {
        let ledger = sample_ledger();
        assert_eq!(envelope_id(&ledger, "courses").unwrap(), GROCERIES_ID);
        assert_eq!(project_id(&ledger, "VOYAGE").unwrap(), PROJECT_ID);
        assert_eq!(account_id(&ledger, "ldd").unwrap(), LDD_ID);
        assert_eq!(
            provision_id(&ledger, 2026, "assurance auto").unwrap(),
            INSURANCE_ID
        );
    }

    #[test]
    fn test_unknown_labels_are_not_found() {
        let ledger = sample_ledger();
        assert!(matches!(
            envelope_id(&ledger, "Vacances"),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            provision_id(&ledger, 2027, "Assurance auto"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_parse_month_argument() {
        assert_eq!(parse_month(Some("2026-03")).unwrap(), month("2026-03"));
        assert_eq!(parse_month(None).unwrap(), MonthKey::current());
        assert!(matches!(
            parse_month(Some("March")),
            Err(Error::InvalidMonthKey { .. })
        ));
    }

    #[test]
    fn test_command_names_are_unique() {
        let commands = all_commands();
        let mut names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), commands.len());
        for name in [
            "fund_project",
            "fixed_validate",
            "flex_spend",
            "envelope_add",
            "envelope_remove",
            "provision_add",
            "unfund",
            "provision_unspend",
            "allocation_remove",
        ] {
            assert!(names.contains(&name), "missing /{name}");
        }
    }

    #[test]
    fn test_poste_lookup_ignores_case() {
        let ledger = sample_ledger();
        assert_eq!(poste_id(&ledger, "LOYER").unwrap(), RENT_ID);
        assert!(matches!(
            poste_id(&ledger, "Internet"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_parse_categories() {
        assert_eq!(parse_item_kind("Fixed").unwrap(), ItemKind::Fixed);
        assert_eq!(
            parse_item_kind("mandatoryEnvelope").unwrap(),
            ItemKind::MandatoryEnvelope
        );
        assert_eq!(
            parse_envelope_category(" secondary ").unwrap(),
            EnvelopeCategory::Secondary
        );
        assert_eq!(
            parse_account_category("savings").unwrap(),
            AccountCategory::Savings
        );
        assert!(matches!(parse_item_kind("monthly"), Err(Error::Config { .. })));
        assert!(matches!(
            parse_account_category("checking"),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_parse_amount_coerces() {
        assert_eq!(parse_amount("12.5"), 12.5);
        assert_eq!(parse_amount("abc"), 0.0);
    }
}
