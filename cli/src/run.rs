//! `splithub` command-line entrypoint.
//!
//! Drives the payment flows against a live relay and chain, with chips
//! emulated by private keys.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `batch` | Collect one chip signature per amount, then settle them as one batch |
//! | `pay` | Pay a recipient from the connected wallet with one tap |
//! | `typed-data` | Print the EIP-712 typed data a chip is asked to sign |
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.json`)
//! - `WALLET_ADDRESS` - The connected wallet: batch recipient, single-flow payer
//! - `CHIP_KEYS` - comma-separated chip private keys for `batch`, one per slot
//! - `CHIP_KEY` - chip private key for `pay`
//! - `RUST_LOG` - log filter (with the `telemetry` feature, default `info`)

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use splithub_eip155::{
    LocalChip, PaymentAuth, PaymentsReader, RpcPaymentsReader, TypedPaymentAuth, payments_domain,
};
use splithub_flow::{BatchSettleFlow, ConnectedWallet, FlowServices, SettleFlow};
use splithub_relay::HttpRelay;
use splithub_types::amount::parse_units;
use splithub_types::timestamp::UnixTimestamp;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::chips::ChipRack;
use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "splithub", version, about = "SplitHub chip payments from the terminal")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
    /// Address of the connected wallet.
    #[arg(long, env = "WALLET_ADDRESS")]
    wallet: Address,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Collect one chip signature per amount and settle them as one batch.
    Batch {
        /// Expected contribution of each participant, e.g. `--amount 10.00 --amount 20.00`.
        #[arg(long = "amount", required = true)]
        amounts: Vec<String>,
        /// One chip key per participant, in slot order.
        #[arg(long = "chip-key", env = "CHIP_KEYS", value_delimiter = ',', required = true, hide_env_values = true)]
        chip_keys: Vec<String>,
    },
    /// Pay a recipient from the connected wallet with one chip tap.
    Pay {
        #[arg(long)]
        recipient: Address,
        #[arg(long)]
        amount: String,
        #[arg(long = "chip-key", env = "CHIP_KEY", hide_env_values = true)]
        chip_key: String,
    },
    /// Print the EIP-712 typed data of a placeholder authorization.
    TypedData {
        /// Defaults to the connected wallet.
        #[arg(long)]
        recipient: Option<Address>,
        #[arg(long)]
        amount: String,
    },
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env variables
    dotenv().ok();

    #[cfg(feature = "telemetry")]
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let wallet = ConnectedWallet::new(cli.wallet, config.chain);
    let reader = RpcPaymentsReader::connect_http(config.rpc_url.clone());
    let mut relay = HttpRelay::new(config.relay_url.clone());
    if let Some(timeout) = config.relay_timeout() {
        relay = relay.with_timeout(timeout);
    }
    #[cfg(feature = "telemetry")]
    tracing::info!(chain = %config.chain, wallet = %wallet.address, relay = %relay.base_url(), "Configured");

    match cli.command {
        Command::Batch { amounts, chip_keys } => {
            let chips = chip_keys
                .iter()
                .map(|key| key.parse::<LocalChip>())
                .collect::<Result<Vec<_>, _>>()?;
            let rack = Arc::new(ChipRack::new(chips));
            if rack.len() < amounts.len() {
                return Err(format!(
                    "{} amounts but only {} chip keys",
                    amounts.len(),
                    rack.len()
                )
                .into());
            }
            let services = FlowServices::new(
                Arc::clone(&rack),
                reader,
                relay,
                config.deployments.clone(),
            )
            .with_config(config.flow_config());
            let mut flow = BatchSettleFlow::new(services, &amounts)?.with_wallet(wallet);
            #[cfg(feature = "telemetry")]
            tokio::spawn(log_batch_progress(flow.subscribe()));

            let cancel = shutdown_token();
            println!(
                "Collecting {} signatures, total {}",
                flow.total_count(),
                flow.total_amount()
            );
            for index in 0..flow.total_count() {
                rack.present(index);
                flow.sign_slot_cancellable(index, &cancel).await?;
                if let Some(signed) = flow.participant(index).and_then(|slot| slot.signature.as_ref()) {
                    println!("Slot {index}: signed by {} for payer {}", signed.chip_address, signed.payer());
                }
            }
            let tx_hash = flow.submit_batch().await?;
            println!("Batch settled: {tx_hash}");
        }
        Command::Pay {
            recipient,
            amount,
            chip_key,
        } => {
            let chip: LocalChip = chip_key.parse()?;
            let services = FlowServices::new(chip, reader, relay, config.deployments.clone())
                .with_config(config.flow_config());
            let mut flow = SettleFlow::new(services).with_wallet(wallet);
            let cancel = shutdown_token();
            let tx_hash = flow.pay_cancellable(recipient, &amount, &cancel).await?;
            println!("Payment settled: {tx_hash}");
            if let Some(nonce) = flow.current_nonce() {
                println!("Next nonce: {nonce}");
            }
        }
        Command::TypedData { recipient, amount } => {
            let deployment = config.deployment()?;
            let decimals = reader.decimals(deployment.token).await?;
            let units = parse_units(&amount, decimals)?;
            let deadline = UnixTimestamp::now() + config.flow_config().deadline_window;
            let typed = TypedPaymentAuth::new(
                payments_domain(config.chain, deployment.payments),
                PaymentAuth::placeholder(
                    recipient.unwrap_or(wallet.address),
                    deployment.token,
                    units,
                    deadline,
                ),
            );
            println!("{}", serde_json::to_string_pretty(&typed.to_typed_data_json())?);
        }
    }

    Ok(())
}

/// Cancelled on Ctrl-C.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    token
}

#[cfg(feature = "telemetry")]
async fn log_batch_progress(
    mut updates: tokio::sync::watch::Receiver<splithub_flow::BatchSnapshot>,
) {
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        tracing::info!(
            state = %snapshot.flow_state,
            signed = snapshot.signed_count,
            total = snapshot.total_count,
            signing = ?snapshot.current_signing_index,
            "Batch progress"
        );
    }
}
