//! Ledger transaction tracker CLI.
//!
//! Builds a transfer, stake or unstake, then follows it through the ledger
//! service until it settles, printing every lifecycle event.

use alloy::primitives::U256;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use ledger_tracker::config::{load_config, TrackerConfig};
use ledger_tracker::gateway::{HttpGateway, InMemoryLedger, LedgerGateway};
use ledger_tracker::ledger::{
    AccountAddress, Amount, ResourceId, StakeTokensInput, TransferTokensInput, UnstakeTokensInput,
    ValidatorAddress,
};
use ledger_tracker::observability::{logging, metrics};
use ledger_tracker::signer::local::PRIVATE_KEY_ENV_VAR;
use ledger_tracker::signer::LocalKeySigner;
use ledger_tracker::tracking::{ManualConfirmation, TrackerSettings, UserConfirmation};
use ledger_tracker::{LedgerClient, MakeTransactionOptions, Shutdown, Tracker};

#[derive(Parser)]
#[command(name = "ledger-tracker")]
#[command(about = "Submit a ledger transaction and track it until it settles", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the in-process simulated ledger instead of the configured service
    #[arg(long)]
    simulate: bool,

    /// Sign without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transfer tokens to another account
    Transfer {
        to: String,
        #[arg(value_parser = parse_amount)]
        amount: Amount,
        /// Resource to transfer (defaults to the native token)
        #[arg(long)]
        resource: Option<String>,
        /// Plaintext message attached to the transaction
        #[arg(long)]
        message: Option<String>,
    },
    /// Stake native tokens with a validator
    Stake {
        validator: String,
        #[arg(value_parser = parse_amount)]
        amount: Amount,
    },
    /// Unstake an amount or a percentage from a validator
    Unstake {
        validator: String,
        #[arg(long, value_parser = parse_amount)]
        amount: Option<Amount>,
        #[arg(long)]
        percentage: Option<u8>,
    },
}

fn parse_amount(s: &str) -> Result<Amount, String> {
    s.parse::<U256>()
        .map_err(|e| format!("invalid amount '{}': {}", s, e))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TrackerConfig::default(),
    };

    logging::init(&config.observability)?;
    tracing::info!("ledger-tracker v0.1.0 starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let gateway: Arc<dyn LedgerGateway> = if cli.simulate {
        tracing::info!("Using simulated ledger");
        Arc::new(InMemoryLedger::default())
    } else {
        Arc::new(HttpGateway::new(&config.gateway)?)
    };

    let signer = match LocalKeySigner::from_env() {
        Ok(signer) => signer,
        Err(_) if cli.simulate => {
            tracing::warn!("{} not set, signing with a throwaway key", PRIVATE_KEY_ENV_VAR);
            LocalKeySigner::random()
        }
        Err(e) => return Err(e.into()),
    };

    let sender = if config.account.address.is_empty() {
        AccountAddress(signer.address().to_string())
    } else {
        AccountAddress(config.account.address.clone())
    };

    let tracker = Tracker::new(gateway, Arc::new(signer), TrackerSettings::from_config(&config));
    let client = LedgerClient::new(tracker, sender);

    let shutdown = Shutdown::new();
    let mut options = MakeTransactionOptions {
        cancel_on: Some(shutdown.subscribe()),
        ..Default::default()
    };
    if !cli.yes {
        let (confirmation, requests) = UserConfirmation::manual();
        options.user_confirmation = confirmation;
        tokio::spawn(prompt_for_confirmation(requests));
    }

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_shutdown.trigger();
        }
    });

    let mut tracking = match cli.command {
        Commands::Transfer {
            to,
            amount,
            resource,
            message,
        } => {
            let resource = resource
                .map(ResourceId)
                .unwrap_or_else(|| client.native_token().clone());
            client.transfer_tokens(
                TransferTokensInput {
                    to: AccountAddress(to),
                    amount,
                    resource,
                },
                message,
                options,
            )
        }
        Commands::Stake { validator, amount } => client.stake_tokens(
            StakeTokensInput {
                validator: ValidatorAddress(validator),
                amount,
            },
            options,
        ),
        Commands::Unstake {
            validator,
            amount,
            percentage,
        } => client.unstake_tokens(
            UnstakeTokensInput {
                validator: ValidatorAddress(validator),
                amount,
                percentage,
            },
            options,
        ),
    };

    tracing::info!(pipeline = %tracking.id, "Tracking transaction");
    while let Some(event) = tracking.events.next().await {
        println!("{}", event);
    }

    let tx_id = tracking.completion.await?;
    println!("Transaction {} confirmed", tx_id);
    Ok(())
}

/// Ask on stdin for every manual confirmation request.
async fn prompt_for_confirmation(mut requests: mpsc::UnboundedReceiver<ManualConfirmation>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(request) = requests.recv().await {
        println!(
            "Fee for this transaction is {}. Sign and submit? [y/N]",
            request.tx_to_confirm().fee
        );
        match lines.next_line().await {
            Ok(Some(answer)) if answer.trim().eq_ignore_ascii_case("y") => request.confirm(),
            _ => println!("Not confirmed"),
        }
    }
}
