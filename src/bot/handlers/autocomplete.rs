//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions come from the author's own ledger, so opening an autocomplete
//! signs the author in like any other command.

use crate::{
    bot::{Context, ledger_for},
    core::{model::Ledger, month::MonthKey},
};

/// Discord autocomplete limit
const MAX_SUGGESTIONS: usize = 25;

/// Labels containing `partial` (case-insensitive), sorted alphabetically.
fn matching<'a>(labels: impl Iterator<Item = &'a str>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = labels
        .filter(|label| label.to_lowercase().contains(&partial_lower))
        .map(str::to_string)
        .take(MAX_SUGGESTIONS)
        .collect();
    matching.sort();
    matching
}

async fn suggest(ctx: Context<'_>, partial: &str, labels: fn(&Ledger) -> Vec<String>) -> Vec<String> {
    let Ok(handle) = ledger_for(ctx).await else {
        return Vec::new();
    };
    let ledger = handle.snapshot();
    let labels = labels(&ledger);
    matching(labels.iter().map(String::as_str), partial)
}

/// Suggests recurring item labels.
pub async fn autocomplete_poste(ctx: Context<'_>, partial: &str) -> Vec<String> {
    suggest(ctx, partial, |ledger| {
        ledger.config.postes.iter().map(|p| p.label.clone()).collect()
    })
    .await
}

/// Suggests envelope labels.
pub async fn autocomplete_envelope(ctx: Context<'_>, partial: &str) -> Vec<String> {
    suggest(ctx, partial, |ledger| {
        ledger.config.envelopes.iter().map(|e| e.label.clone()).collect()
    })
    .await
}

/// Suggests project labels.
pub async fn autocomplete_project(ctx: Context<'_>, partial: &str) -> Vec<String> {
    suggest(ctx, partial, |ledger| {
        ledger.config.projects.iter().map(|p| p.label.clone()).collect()
    })
    .await
}

/// Suggests account labels.
pub async fn autocomplete_account(ctx: Context<'_>, partial: &str) -> Vec<String> {
    suggest(ctx, partial, |ledger| {
        ledger.config.accounts.iter().map(|a| a.label.clone()).collect()
    })
    .await
}

/// Suggests provision item labels of the current year.
pub async fn autocomplete_provision(ctx: Context<'_>, partial: &str) -> Vec<String> {
    suggest(ctx, partial, |ledger| {
        ledger
            .config
            .provisions_for(MonthKey::current().year())
            .iter()
            .map(|p| p.label.clone())
            .collect()
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_filters_and_sorts() {
        let labels = ["Loisirs", "Courses", "Cadeaux", "Essence"];
        let result = matching(labels.into_iter(), "c");
        assert_eq!(result, vec!["Cadeaux", "Courses", "Essence"]);
    }

    #[test]
    fn test_matching_caps_suggestions() {
        let labels: Vec<String> = (0..40).map(|i| format!("Env {i}")).collect();
        let result = matching(labels.iter().map(String::as_str), "env");
        assert_eq!(result.len(), MAX_SUGGESTIONS);
    }
}
