pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::config::config;
use crate::database::{DatabaseManager, PgProvider, RepositoryFactory};

#[derive(Parser)]
#[command(name = "jsonrepo")]
#[command(about = "jsonrepo - query JSON columns of relational entities")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Database name (defaults to the one in DATABASE_URL)")]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the devices, announcements and users tables")]
    Init,

    #[command(about = "Check database connectivity")]
    Health,

    #[command(about = "Device management and property queries")]
    Device {
        #[command(subcommand)]
        cmd: commands::device::DeviceCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Connection state shared by the commands of one invocation
pub struct Context {
    pub manager: DatabaseManager,
    pub pool: PgPool,
}

impl Context {
    pub async fn connect(database: Option<&str>) -> anyhow::Result<Self> {
        let manager = DatabaseManager::new(config().database.clone());
        let pool = match database {
            Some(name) => manager.pool(name).await?,
            None => manager.default_pool().await?,
        };
        Ok(Self { manager, pool })
    }

    pub fn factory(&self) -> RepositoryFactory<PgProvider> {
        RepositoryFactory::new(
            PgProvider::new(self.pool.clone(), config().database.clone()),
            config().json.clone(),
        )
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let context = Context::connect(cli.database.as_deref()).await?;

    let result = match cli.command {
        Commands::Init => commands::init::handle(&context, output_format).await,
        Commands::Health => commands::health::handle(&context, output_format).await,
        Commands::Device { cmd } => commands::device::handle(cmd, &context, output_format).await,
    };

    context.manager.close_all().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["jsonrepo", "device", "count-key", "color", "--json", "--database", "lab"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        assert_eq!(cli.database.as_deref(), Some("lab"));
    }

    #[test]
    fn text_output_by_default() {
        let cli = Cli::try_parse_from(["jsonrepo", "health"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Text));
        assert!(matches!(cli.command, Commands::Health));
    }
}
