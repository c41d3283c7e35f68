//! First-run budget defaults loaded from config.toml
//!
//! The configuration written for a user who has no ledger document yet. Accounts
//! are referenced by label in the file; ids are generated when the file is
//! turned into a [`BudgetConfig`].

use crate::{
    core::{
        config_ops::{self, EnvelopeDraft, ProjectDraft, ProvisionDraft, RecurringItemDraft},
        model::{AccountCategory, BudgetConfig, EnvelopeCategory, ItemKind},
    },
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    /// Label of the account receiving the monthly provision transfer
    #[serde(default)]
    pub provision_account: Option<String>,
    /// Label of the account receiving savings transfers
    #[serde(default)]
    pub savings_account: Option<String>,
    /// Monthly target for variable spending
    #[serde(default)]
    pub flexible_target: f64,
    /// Bank accounts, exactly one of which must be `current`
    pub accounts: Vec<AccountConfig>,
    /// Recurring expense categories
    #[serde(default)]
    pub postes: Vec<PosteConfig>,
    /// Envelopes, all starting at a zero balance
    #[serde(default)]
    pub envelopes: Vec<EnvelopeConfig>,
    /// Provision items for the current year
    #[serde(default)]
    pub provisions: Vec<ProvisionConfig>,
    /// Savings projects, starting without allocations
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
}

/// A bank account
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Display label, also used to reference the account
    pub label: String,
    /// `current`, `savings` or `provision`
    pub category: AccountCategory,
    /// Opening balance
    #[serde(default)]
    pub initial: f64,
}

/// A recurring item
#[derive(Debug, Clone, Deserialize)]
pub struct PosteConfig {
    /// Display label
    pub label: String,
    /// `fixed`, `mandatoryEnvelope`, `secondaryEnvelope` or `amortized`
    pub kind: ItemKind,
    /// Monthly amount
    pub amount: f64,
}

/// An envelope
#[derive(Debug, Clone, Deserialize)]
pub struct EnvelopeConfig {
    /// Display label
    pub label: String,
    /// `mandatory` or `secondary`
    pub category: EnvelopeCategory,
    /// Monthly funding target
    pub target: f64,
}

/// An annual provision item
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionConfig {
    /// Display label
    pub label: String,
    /// Planned yearly amount
    pub planned: f64,
}

/// A savings project
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Display label
    pub label: String,
    /// Amount to reach
    pub target: f64,
}

impl DefaultsConfig {
    /// Defaults used when no config.toml is available: empty current,
    /// savings and provision accounts with nothing else configured.
    #[must_use]
    pub fn builtin() -> Self {
        let account = |label: &str, category| AccountConfig {
            label: label.to_string(),
            category,
            initial: 0.0,
        };
        Self {
            provision_account: Some("Provisions".to_string()),
            savings_account: Some("Épargne".to_string()),
            flexible_target: 0.0,
            accounts: vec![
                account("Compte courant", AccountCategory::Current),
                account("Épargne", AccountCategory::Savings),
                account("Provisions", AccountCategory::Provision),
            ],
            postes: Vec::new(),
            envelopes: Vec::new(),
            provisions: Vec::new(),
            projects: Vec::new(),
        }
    }

    /// Builds the ledger configuration, placing provisions in `year`.
    ///
    /// # Errors
    /// Returns [`Error::Config`] when there is not exactly one current account,
    /// when an account reference does not match any account label, or when a
    /// label is empty.
    pub fn into_budget_config(self, year: i32) -> Result<BudgetConfig> {
        let current_accounts = self
            .accounts
            .iter()
            .filter(|a| a.category == AccountCategory::Current)
            .count();
        if current_accounts != 1 {
            return Err(Error::Config {
                message: format!("Expected exactly one current account, found {current_accounts}"),
            });
        }

        let mut config = BudgetConfig::default();
        let mut account_ids = Vec::with_capacity(self.accounts.len());
        for account in &self.accounts {
            let (next, id) =
                config_ops::add_account(&config, &account.label, account.category, account.initial)?;
            config = next;
            account_ids.push((account.label.clone(), id));
        }
        let resolve = |label: &str| {
            account_ids
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, id)| id.clone())
                .ok_or_else(|| Error::Config {
                    message: format!("Unknown account '{label}' in config.toml"),
                })
        };

        if let Some(label) = &self.provision_account {
            config = config_ops::set_provision_account(&config, &resolve(label)?)?;
        }
        if let Some(label) = &self.savings_account {
            config = config_ops::set_savings_account(&config, &resolve(label)?)?;
        }

        for poste in self.postes {
            let draft = RecurringItemDraft {
                label: poste.label,
                kind: poste.kind,
                amount: poste.amount,
            };
            config = config_ops::add_recurring_item(&config, draft)?.0;
        }
        for envelope in self.envelopes {
            let draft = EnvelopeDraft {
                label: envelope.label,
                category: envelope.category,
                target: envelope.target,
            };
            config = config_ops::add_envelope(&config, draft)?.0;
        }
        for provision in self.provisions {
            let draft = ProvisionDraft {
                label: provision.label,
                planned: provision.planned,
            };
            config = config_ops::add_provision_item(&config, year, draft)?.0;
        }
        for project in self.projects {
            let draft = ProjectDraft {
                label: project.label,
                target: project.target,
            };
            config = config_ops::add_project(&config, draft)?.0;
        }

        debug!(
            accounts = config.accounts.len(),
            envelopes = config.envelopes.len(),
            "Built default budget configuration"
        );
        Ok(config_ops::set_flexible_target(&config, self.flexible_target))
    }
}

/// Loads budget defaults from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DefaultsConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads budget defaults from the default location (./config.toml)
pub fn load_default_config() -> Result<DefaultsConfig> {
    load_config("config.toml")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    const SAMPLE: &str = r#"
        provision_account = "Provisions"
        savings_account = "LDD"
        flexible_target = 300.0

        [[accounts]]
        label = "Compte courant"
        category = "current"
        initial = 5000.0

        [[accounts]]
        label = "LDD"
        category = "savings"
        initial = 3000.0

        [[accounts]]
        label = "Provisions"
        category = "provision"

        [[postes]]
        label = "Loyer"
        kind = "fixed"
        amount = 880.0

        [[envelopes]]
        label = "Courses"
        category = "mandatory"
        target = 400.0

        [[provisions]]
        label = "Assurance auto"
        planned = 600.0

        [[projects]]
        label = "Voyage"
        target = 10000.0
    "#;

    #[test]
    fn test_parse_defaults_config() {
        let config: DefaultsConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.accounts.len(), 3);
        assert_eq!(config.accounts[2].initial, 0.0);
        assert_eq!(config.postes[0].kind, ItemKind::Fixed);
        assert_eq!(config.envelopes[0].category, EnvelopeCategory::Mandatory);
        assert_eq!(config.savings_account.as_deref(), Some("LDD"));
    }

    #[test]
    fn test_into_budget_config_resolves_accounts() {
        let config: DefaultsConfig = toml::from_str(SAMPLE).unwrap();
        let budget = config.into_budget_config(2026).unwrap();

        let current = budget.current_account().unwrap();
        assert_eq!(current.initial, 5000.0);
        let savings = budget.account(budget.savings_account_id.as_deref().unwrap()).unwrap();
        assert_eq!(savings.label, "LDD");
        let provisions = budget
            .account(budget.provision_account_id.as_deref().unwrap())
            .unwrap();
        assert_eq!(provisions.category, AccountCategory::Provision);

        assert_eq!(budget.provisions_for(2026).len(), 1);
        assert!(budget.provisions_for(2027).is_empty());
        assert_eq!(budget.envelopes[0].balance, 0.0);
        assert!(budget.projects[0].allocations.is_empty());
        assert_eq!(budget.flexible_budget.target, 300.0);
    }

    #[test]
    fn test_requires_exactly_one_current_account() {
        let mut config: DefaultsConfig = toml::from_str(SAMPLE).unwrap();
        config.accounts.retain(|a| a.category != AccountCategory::Current);
        assert!(matches!(
            config.into_budget_config(2026),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_unknown_account_reference() {
        let mut config: DefaultsConfig = toml::from_str(SAMPLE).unwrap();
        config.savings_account = Some("Livret A".to_string());
        assert!(matches!(
            config.into_budget_config(2026),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_builtin_defaults_are_valid() {
        let budget = DefaultsConfig::builtin().into_budget_config(2026).unwrap();
        assert!(budget.current_account().is_some());
        assert!(budget.savings_account_id.is_some());
        assert!(budget.provision_account_id.is_some());
    }
}
