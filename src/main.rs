use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fundme::core::log::init_logging;
use fundme::core::{Address, WithdrawStrategy};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an example configuration
    Setup,
    /// Contribute native value to the ledger
    Fund {
        /// Contributing account
        #[arg(long)]
        from: Address,
        /// Amount in native units, e.g. 0.05
        amount: String,
    },
    /// Send the held balance to the owner and reset all contributions
    Withdraw {
        /// Calling account; must be the owner
        #[arg(long)]
        from: Address,
        /// Clear records with a single bulk reset
        #[arg(long)]
        cheaper: bool,
    },
    /// Show contributors and the held balance
    Status,
    /// Show the current feed rate and the minimum contribution
    Price,
}

impl From<Commands> for fundme::AppCommand {
    fn from(cmd: Commands) -> fundme::AppCommand {
        match cmd {
            Commands::Fund { from, amount } => fundme::AppCommand::Fund { from, amount },
            Commands::Withdraw { from, cheaper } => fundme::AppCommand::Withdraw {
                from,
                strategy: if cheaper {
                    WithdrawStrategy::Optimized
                } else {
                    WithdrawStrategy::Naive
                },
            },
            Commands::Status => fundme::AppCommand::Status,
            Commands::Price => fundme::AppCommand::Price,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fundme::cli::setup::setup_at_path(path),
            None => fundme::cli::setup::setup(),
        },
        Some(cmd) => fundme::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}
