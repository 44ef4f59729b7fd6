//! Limit order scanner CLI
//!
//! Reports on-chain limit orders for the configured tokens, either from a
//! live RPC node or from a saved `getProgramAccounts` dump.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use limit_order_core::Pubkey;
use order_scanner::{
    AccountSource, CachedTokenRegistry, FileAccountSource, LightRpcClient, OrderProcessor,
    OrderScanner, OutputFormat, RpcAccountSource, ScannerConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "order-scanner")]
#[command(about = "Decode and classify on-chain limit orders")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "scanner.toml")]
    config: PathBuf,

    /// Override the RPC endpoint
    #[arg(long)]
    rpc_url: Option<String>,

    /// Read accounts from a saved getProgramAccounts response instead of RPC
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Override the output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    /// Validate config and exit
    #[arg(long)]
    dry_run: bool,

    /// Classify against this Unix timestamp instead of the wall clock
    #[arg(long)]
    now: Option<i64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Report orders for every configured token (default)
    Scan {
        /// Include a per-field dump of every order
        #[arg(long)]
        detailed: bool,
    },
    /// Decode a single order account
    Inspect {
        /// Order account address
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let mut config = if config_found {
        ScannerConfig::load(&cli.config)?
    } else {
        ScannerConfig::default()
    };

    if let Some(url) = cli.rpc_url {
        config.rpc.url = url;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(path) = cli.output {
        config.output.path = Some(path);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(Command::Scan { detailed: true }) = cli.command {
        config.output.detailed = true;
    }

    init_logging(&config)?;

    if !config_found {
        warn!("Config file not found, using defaults: {}", cli.config.display());
    }
    info!("Starting order scanner");
    info!("Program ID: {}", config.program_id);

    config.check()?;
    info!("Configuration validated successfully");

    if cli.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        return Ok(());
    }

    let client = Arc::new(LightRpcClient::new(
        config.rpc.url.clone(),
        config.rpc.commitment_level()?,
        config.rpc.timeout(),
    ));

    let source: Arc<dyn AccountSource> = match &cli.fixture {
        Some(path) => {
            info!("Reading accounts from {}", path.display());
            Arc::new(FileAccountSource::from_file(config.program_id, path)?)
        }
        None => {
            info!("RPC endpoint: {}", config.rpc.url);
            Arc::new(RpcAccountSource::new(
                client.clone(),
                config.program_id,
                config.retry.clone(),
            ))
        }
    };

    let mut registry = CachedTokenRegistry::new(config.static_registry(), config.retry.clone());
    // A fixture run stays offline
    if cli.fixture.is_none() {
        registry = registry.with_lookup(client);
    }
    let registry = Arc::new(registry);

    let tokens = config.enabled_tokens().into_iter().cloned().collect();
    let scanner = OrderScanner::new(source, registry, config.program_id, tokens)
        .detailed(config.output.detailed);

    let now = cli
        .now
        .unwrap_or_else(|| OrderProcessor::at_current_time().now());

    let rendered = match cli.command {
        Some(Command::Inspect { address }) => {
            let address: Pubkey = address
                .parse()
                .with_context(|| format!("Invalid order address: {}", address))?;
            let inspected = scanner.inspect(&address, now).await?;
            match config.output.format {
                OutputFormat::Json => serde_json::to_string_pretty(&inspected.order)?,
                OutputFormat::Text => {
                    let mut out = format!(
                        "Order: {}\nStatus: {}\nFilled: {}%\n",
                        address, inspected.order.status, inspected.order.percent_filled
                    );
                    for field in &inspected.fields {
                        out.push_str(&format!("  {}: {}\n", field.name, field.value));
                        if let Some(decimal) = &field.decimal {
                            out.push_str(&format!("    decimal value: {}\n", decimal));
                        }
                        if let Some(utc) = &field.utc {
                            out.push_str(&format!("    date: {}\n", utc));
                        }
                    }
                    out
                }
            }
        }
        Some(Command::Scan { .. }) | None => {
            let report = scanner.scan(now).await?;
            match config.output.format {
                OutputFormat::Json => report.to_json()?,
                OutputFormat::Text => report.render_text(),
            }
        }
    };

    match &config.output.path {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Output written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn init_logging(config: &ScannerConfig) -> Result<()> {
    let log_level = config
        .logging
        .level
        .parse()
        .unwrap_or(tracing::Level::INFO);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("order_scanner={},limit_order_core={}", log_level, log_level).into()
    });

    // Logs go to stderr so stdout carries only the report
    if config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
