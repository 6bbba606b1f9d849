//! Courier - send a memo-tagged transfer on a Substrate chain and follow it
//! to finality.
//!
//! # Usage
//!
//! ```bash
//! # Alice sends 100000 planck to Bob on a local dev node
//! courier
//!
//! # Environment overrides
//! WS_URL=ws://localhost:9944 AMOUNT=2500000 MEMO="invoice 42" courier
//!
//! # Machine-readable receipt on stdout
//! courier --output json --json-logs
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use courier_core::metrics::init_metrics;
use courier_core::models::Party;
use courier_core::ports::SigningIdentity;
use courier_core::services::{
    FinalityPolicy, SessionConfig, SessionReport, TokenFormat, TransferConfig, TransferSession,
};
use courier_substrate::{SubstrateClient, SubstrateClientConfig, SubstrateIdentity, parse_party};

/// Courier CLI - memo-tagged transfers for Substrate chains.
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(about = "Send a memo-tagged transfer and wait for finalization")]
#[command(version)]
struct Cli {
    /// Substrate node WebSocket URL.
    #[arg(long, env = "WS_URL", default_value = "ws://127.0.0.1:9944")]
    ws_url: String,

    /// Secret URI of the sender (dev path or mnemonic).
    #[arg(long, env = "SENDER_SEED", default_value = "//Alice", hide_env_values = true)]
    sender_seed: String,

    /// Secret URI used to derive the recipient address.
    #[arg(long, env = "RECIPIENT_SEED", default_value = "//Bob", hide_env_values = true)]
    recipient_seed: String,

    /// SS58 address of the recipient. Takes precedence over --recipient-seed.
    #[arg(long, env = "RECIPIENT")]
    recipient: Option<String>,

    /// Amount to transfer, in planck.
    #[arg(long, env = "AMOUNT", default_value = "100000")]
    amount: u128,

    /// Memo attached to the transfer (at most 32 bytes).
    #[arg(long, env = "MEMO", default_value = "Example transfer with memo")]
    memo: String,

    /// Token decimals used for display.
    #[arg(long, env = "TOKEN_DECIMALS", default_value = "12", value_parser = clap::value_parser!(u8).range(0..=38))]
    decimals: u8,

    /// Token symbol used for display.
    #[arg(long, env = "TOKEN_SYMBOL", default_value = "UNIT")]
    symbol: String,

    /// Give up waiting for finalization after this many seconds.
    #[arg(long, env = "FINALIZATION_TIMEOUT_SECS", default_value = "300")]
    finalization_timeout_secs: u64,

    /// Require an explicit success event at finalization.
    ///
    /// By default a finalized block without `System.ExtrinsicFailed` counts
    /// as success.
    #[arg(long, env = "STRICT_FINALITY")]
    strict_finality: bool,

    /// Abort before submitting when the sender balance is below the amount.
    #[arg(long, env = "ABORT_ON_INSUFFICIENT")]
    abort_on_insufficient: bool,

    /// Skip the balance report after the transfer.
    #[arg(long)]
    no_final_balances: bool,

    /// Final report format: text (logs only) or json (receipt on stdout).
    #[arg(long, env = "OUTPUT", default_value = "text", value_parser = parse_output_format)]
    output: OutputFormat,

    /// Prometheus metrics port (disabled when unset).
    #[arg(long, env = "METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

/// Parse output format from string.
fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_lowercase().as_str() {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!("Invalid output format '{}'. Use 'text' or 'json'.", s)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    if let Some(port) = cli.metrics_port {
        init_metrics_exporter(port);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 📡 CONNECTION
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Courier");
    debug!(ws_url = %mask_password(&cli.ws_url), "Substrate endpoint");

    let connected = tokio::select! {
        result = connect(&cli) => result,
        _ = shutdown_signal() => {
            info!("🛑 Interrupted while connecting");
            return ExitCode::SUCCESS;
        }
    };
    let client = match connected {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %format!("{:#}", e), "❌ Connection failed");
            return ExitCode::FAILURE;
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 💸 SESSION
    // ─────────────────────────────────────────────────────────────────────────
    let finished = tokio::select! {
        result = run_session(&cli, client.clone()) => Some(result),
        _ = shutdown_signal() => None,
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🛑 SHUTDOWN
    // ─────────────────────────────────────────────────────────────────────────
    close_connection(client);

    match finished {
        None => {
            warn!("🛑 Interrupted, not waiting for finalization");
            ExitCode::SUCCESS
        }
        Some(Ok(report)) => {
            if cli.output == OutputFormat::Json {
                print_json_report(&report);
            }
            info!("✅ Done");
            ExitCode::SUCCESS
        }
        Some(Err(e)) => {
            error!(error = %format!("{:#}", e), "❌ Transfer session failed");
            ExitCode::FAILURE
        }
    }
}

/// Open the node connection.
async fn connect(cli: &Cli) -> Result<SubstrateClient> {
    info!("📡 Connecting to Substrate node...");
    let config = SubstrateClientConfig {
        ws_url: cli.ws_url.clone(),
    };
    SubstrateClient::connect(config)
        .await
        .context("Failed to connect to Substrate node")
}

/// Derive identities and run one transfer session over `client`.
async fn run_session(cli: &Cli, client: Arc<SubstrateClient>) -> Result<SessionReport> {
    let sender = SubstrateIdentity::from_uri(&cli.sender_seed).context("Invalid sender seed")?;
    let recipient = recipient_party(cli)?;
    let sender_label = seed_label(&cli.sender_seed, "Sender");

    info!(
        sender = %sender.address(),
        recipient = %recipient.address,
        "🔑 Identities ready"
    );

    let session_config = SessionConfig {
        amount: cli.amount,
        memo: cli.memo.clone(),
        token: TokenFormat {
            decimals: cli.decimals,
            symbol: cli.symbol.clone(),
        },
        abort_on_insufficient: cli.abort_on_insufficient,
        report_final_balances: !cli.no_final_balances,
    };
    let transfer_config = TransferConfig {
        finalization_timeout: Duration::from_secs(cli.finalization_timeout_secs),
        finality_policy: if cli.strict_finality {
            FinalityPolicy::RequireSuccessEvent
        } else {
            FinalityPolicy::AbsenceOfFailure
        },
    };

    let session = TransferSession::new(session_config, transfer_config, client.clone(), client);
    let report = session.run(&sender, &sender_label, &recipient).await?;
    Ok(report)
}

/// Recipient from an explicit address, or derived from its seed.
fn recipient_party(cli: &Cli) -> Result<Party> {
    match &cli.recipient {
        Some(address) => parse_party("Recipient", address).context("Invalid recipient address"),
        None => {
            let identity = SubstrateIdentity::from_uri(&cli.recipient_seed)
                .context("Invalid recipient seed")?;
            Ok(identity.party(&seed_label(&cli.recipient_seed, "Recipient")))
        }
    }
}

/// Display label for a dev seed (`//Alice` → `Alice`), `fallback` otherwise.
fn seed_label(seed: &str, fallback: &str) -> String {
    seed.strip_prefix("//")
        .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

/// Release the connection once every session handle is gone.
fn close_connection(client: Arc<SubstrateClient>) {
    match Arc::try_unwrap(client) {
        Ok(client) => client.close(),
        Err(_) => warn!("⚠️  Connection still in use, closing on drop"),
    }
}

/// Machine-readable summary of a finished session.
fn json_report(report: &SessionReport) -> serde_json::Value {
    serde_json::json!({
        "genesis_hash": report.chain.genesis_hash,
        "spec_version": report.chain.spec_version,
        "memo": report.memo.as_text(),
        "memo_hex": report.memo.to_hex(),
        "fee": report.fee.to_string(),
        "receipt": report.receipt,
    })
}

/// Print the receipt as JSON on stdout.
fn print_json_report(report: &SessionReport) {
    match serde_json::to_string_pretty(&json_report(report)) {
        Ok(out) => println!("{}", out),
        Err(e) => error!(error = %e, "❌ Failed to serialize report"),
    }
}

/// Start the Prometheus exporter. Failures don't stop the transfer.
fn init_metrics_exporter(port: u16) {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            init_metrics();
            info!("📊 Metrics on http://localhost:{}/metrics", port);
        }
        Err(e) => warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask credentials in the node URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
