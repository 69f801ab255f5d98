mod args;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;

use shelflife_infra::{InventoryService, JsonFileInventoryRepository, ShelflifeConfig};
use shelflife_inventory::stock;

use crate::args::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ShelflifeConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(path) = cli.data_file {
        config.store.data_file = path;
    }
    shelflife_observability::init(&config.log);

    let repo = JsonFileInventoryRepository::open(&config.store.data_file)
        .with_context(|| format!("failed to open {}", config.store.data_file.display()))?;
    tracing::debug!(data_file = %config.store.data_file.display(), "inventory store ready");

    let service = InventoryService::new(repo, config.alerts.thresholds());
    let stdout = std::io::stdout();
    commands::run(&service, cli.command, stock::today(), &mut stdout.lock())
}
