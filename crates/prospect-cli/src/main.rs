//! Operator command line for the Prospect progression engine.
//!
//! Runs one command against the player store and prints the result as
//! JSON. Chat front ends call the same engine operations; this binary is
//! for operators and for poking at an economy by hand.
//!
//! # Startup Sequence
//!
//! 1. Parse the command line
//! 2. Load configuration from `PROSPECT_CONFIG` or `prospect-config.yaml`
//! 3. Initialize structured logging (tracing)
//! 4. Connect to `PostgreSQL` unless the command runs offline
//! 5. Run the command and print its result

mod command;
mod error;
mod output;

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use prospect_core::config::LoggingConfig;
use prospect_core::{DropTable, EquipmentCatalog, ProgressionEngine, ProspectConfig};
use prospect_db::{PgPlayerStore, PostgresConfig, PostgresPool};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::command::Command;
use crate::error::CliError;
use crate::output::{LedgerView, ShopView};

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "prospect-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let command = Command::parse(std::env::args().skip(1))?;

    let config_path = config_path();
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    init_logging(&config.logging);
    info!(
        config = %config_path.display(),
        found = config_path.exists(),
        ?command,
        "prospect starting"
    );

    if !command.needs_store() {
        return run_offline(&command).context("running command");
    }

    let pool = PostgresPool::connect(&PostgresConfig::from_infrastructure(&config.infrastructure))
        .await
        .context("connecting to PostgreSQL")?;

    let result = if command == Command::Migrate {
        pool.run_migrations().await.map_err(CliError::from)
    } else {
        let engine = ProgressionEngine::new(pool.player_store(), config.progression);
        run(&engine, command).await
    };

    pool.close().await;
    result.context("running command")
}

fn config_path() -> PathBuf {
    std::env::var_os("PROSPECT_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration, falling back to defaults when the file is absent.
fn load_config(path: &Path) -> Result<ProspectConfig, CliError> {
    if path.exists() {
        Ok(ProspectConfig::from_file(path)?)
    } else {
        let mut config = ProspectConfig::default();
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run_offline(command: &Command) -> Result<(), CliError> {
    match command {
        Command::Shop => {
            let shop = ShopView::new(&EquipmentCatalog::standard(), &DropTable::standard());
            output::print(&shop)?;
        }
        other => {
            return Err(CliError::usage(format!("{other:?} needs the database")));
        }
    }
    Ok(())
}

async fn run(engine: &ProgressionEngine<PgPlayerStore>, command: Command) -> Result<(), CliError> {
    match command {
        Command::Migrate | Command::Shop => {}
        Command::Register(player) => {
            output::print(&engine.register(player, Utc::now()).await?)?;
        }
        Command::Collect(player) => {
            let mut rng = rand::rng();
            output::print(&engine.collect(player, Utc::now(), &mut rng).await?)?;
        }
        Command::Status(player) => {
            output::print(&engine.status(player, Utc::now()).await?)?;
        }
        Command::PreviewRebirth(player) => {
            output::print(&engine.preview_rebirth(player).await?)?;
        }
        Command::Rebirth {
            player,
            confirmed: false,
        } => {
            output::print(&engine.preview_rebirth(player).await?)?;
            eprintln!("rebirth resets level, experience and gear; rerun with --confirm to proceed");
        }
        Command::Rebirth {
            player,
            confirmed: true,
        } => {
            output::print(&engine.rebirth(player).await?)?;
        }
        Command::Buy { player, gear } => {
            output::print(&engine.purchase_equipment(player, gear).await?)?;
        }
        Command::Sell {
            player,
            resource,
            amount,
        } => {
            output::print(&engine.sell(player, resource, amount).await?)?;
        }
        Command::Ledger(player) => {
            let rows = engine.store().ledger_entries(player).await?;
            let views: Vec<LedgerView> = rows.into_iter().map(LedgerView::from).collect();
            output::print(&views)?;
        }
    }
    Ok(())
}
