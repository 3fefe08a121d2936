//! Document portal CLI: operator tasks run against the configured record store.
//!
//! Reads the same environment as the API server (`.env` supported).

use anyhow::Context;
use clap::{Parser, Subcommand};
use docportal_cli::{config_summary, init_tracing};
use docportal_core::Config;
use docportal_services::PortalServices;

#[derive(Parser)]
#[command(name = "docportal", about = "Document portal operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the first platform admin. Refused once any admin exists.
    BootstrapAdmin {
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long, default_value = "Administrator")]
        name: String,
        /// Initial password
        #[arg(long, env = "DOCPORTAL_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Validate configuration and print the non-secret settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    match cli.command {
        Commands::BootstrapAdmin {
            email,
            name,
            password,
        } => {
            let store = docportal_store::create_record_store(&config)
                .await
                .context("Failed to open record store")?;
            let services = PortalServices::from_config(&config, store)
                .context("Failed to initialize portal services")?;
            let account = services
                .accounts
                .bootstrap_admin(&email, &password, &name)
                .await
                .map_err(|e| anyhow::anyhow!("Bootstrap failed: {}", e))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&account).context("Serialize account")?
            );
        }
        Commands::CheckConfig => {
            println!(
                "{}",
                serde_json::to_string_pretty(&config_summary(&config))
                    .context("Serialize summary")?
            );
        }
    }

    Ok(())
}
