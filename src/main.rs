//! btcdelay CLI
//!
//! Offline checks over recorded claims. Reports go to stdout as JSON, logs
//! go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use btcdelay::common::init_from_config;
use btcdelay::{
    build_proof_package, compute_txid, strip_witness_data, AppConfig, ClaimEvaluator,
    ClaimRequest, RecordedClaim, TransactionRecord,
};

#[derive(Parser)]
#[command(name = "btcdelay")]
#[command(about = "Verify Bitcoin delay-insurance claims")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the txid of a raw transaction (witness is stripped first)
    Txid {
        /// Transaction hex, optionally 0x-prefixed
        tx_hex: String,
    },

    /// Build the inclusion proof package for a recorded claim
    Proof {
        /// Recorded claim JSON
        file: PathBuf,
    },

    /// Run the full claim evaluation over a recorded claim
    Assess {
        /// Recorded claim JSON
        file: PathBuf,

        /// Claimed broadcast height (overrides the recording)
        #[arg(short, long)]
        broadcast_height: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_from_config(&config) {
        eprintln!("{}", e);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Txid { tx_hex } => print_txid(&tx_hex),
        Commands::Proof { file } => print_proof(&file),
        Commands::Assess {
            file,
            broadcast_height,
        } => assess(&config, &file, broadcast_height).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_txid(tx_hex: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stripped = strip_witness_data(tx_hex)?;
    println!("{}", compute_txid(&stripped)?);
    Ok(())
}

fn print_proof(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let claim = RecordedClaim::from_file(file)?;
    let record = TransactionRecord::try_from(claim.transaction.clone())?;

    let package = build_proof_package(
        &claim.txid,
        &claim.tx_hex,
        record.block_height,
        &claim.header_hex,
        &claim.merkle_proof.clone().into(),
    )?;

    println!("{}", serde_json::to_string_pretty(&package)?);
    Ok(())
}

async fn assess(
    config: &AppConfig,
    file: &Path,
    broadcast_height: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let claim = RecordedClaim::from_file(file)?;

    let request = ClaimRequest {
        txid: claim.txid.clone(),
        user_broadcast_height: broadcast_height.or(claim.broadcast_height),
        policy: config.policy,
    };

    let evaluator = ClaimEvaluator::new(claim.clone(), claim, config.delay);

    match evaluator.evaluate(&request).await {
        Ok(report) => {
            tracing::info!(
                correlation_id = %report.correlation_id,
                eligible = report.verdict.is_eligible,
                "claim assessed"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(failure) => {
            let body = serde_json::json!({
                "correlation_id": failure.correlation_id,
                "txid": request.txid,
                "completed": failure.completed,
                "error": {
                    "code": failure.error.error_code(),
                    "message": failure.error.to_string(),
                    "retryable": failure.error.is_retryable(),
                },
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Err(failure.into())
        }
    }
}
