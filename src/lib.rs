pub mod cli;
pub mod core;
pub mod deployment;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{Address, WithdrawStrategy};
use crate::deployment::Deployment;
use crate::store::disk::DiskStore;
use anyhow::Result;
use tracing::{debug, info};

/// A ledger operation requested from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Fund { from: Address, amount: String },
    Withdraw { from: Address, strategy: WithdrawStrategy },
    Status,
    Price,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fundme starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let price_feed = providers::price_feed_from_config(&config.price_feed);
    let store = DiskStore::open(&config.default_data_path()?)?;
    let deployment = Deployment::open(&config, price_feed, Box::new(store))?;

    match command {
        AppCommand::Fund { from, amount } => cli::fund::run(&deployment, &from, &amount).await,
        AppCommand::Withdraw { from, strategy } => {
            cli::withdraw::run(&deployment, &from, strategy).await
        }
        AppCommand::Status => cli::status::run(&deployment).await,
        AppCommand::Price => cli::price::run(&deployment).await,
    }
}
