use dotenvy::dotenv;
use household_budget::{
    bot,
    config::{self, defaults::DefaultsConfig},
    core::{gateway::SeaOrmGateway, month::MonthKey, session::SessionRegistry},
    errors::{Error, Result},
};
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. First-run defaults, falling back to the built-in set
    let defaults = config::defaults::load_default_config()
        .inspect(|_| info!("Loaded budget defaults from config.toml"))
        .unwrap_or_else(|e| {
            warn!("Using built-in defaults: {e}");
            DefaultsConfig::builtin()
        })
        .into_budget_config(MonthKey::current().year())
        .inspect_err(|e| error!("Invalid budget defaults: {e}"))?;

    // 4. Database and persistence gateway
    let db = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&db).await?;
    info!("Database initialized successfully.");
    let gateway = Arc::new(SeaOrmGateway::new(db));
    let sessions = SessionRegistry::new(gateway, defaults);

    // 5. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, sessions).await
}
