//! `calculator-server`: serves `CalculatorService` until Ctrl+C or SIGTERM.
//!
//! Configuration is layered defaults < `--config` YAML < `CALC__*` env < CLI flags.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use calc_bootstrap::{AppConfig, CliArgs, init_logging, wait_for_shutdown};
use calc_transport_grpc::bind_tcp;
use calculator::{CalculatorConfig, MODULE_NAME};
use clap::Parser;
use tokio_util::sync::CancellationToken;

/// Calculator gRPC server
#[derive(Parser)]
#[command(name = "calculator-server", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `server.listen_addr`
    #[arg(long)]
    listen: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&CliArgs {
        listen_addr: cli.listen,
        verbose: cli.verbose,
        ..Default::default()
    });

    if cli.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    init_logging(&config.logging)?;

    let module_config: CalculatorConfig = config.module_config_or_default(MODULE_NAME)?;
    tracing::info!(seed = ?module_config.find_maximum_seed, "calculator configured");

    let addr: SocketAddr = config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address '{}'", config.server.listen_addr))?;
    let listener = bind_tcp(addr).await?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown().await {
            tracing::error!(error = %e, "signal handling failed, shutting down");
        }
        shutdown.cancel();
    });

    listener
        .serve(calculator::routes(&module_config), cancel)
        .await
}
