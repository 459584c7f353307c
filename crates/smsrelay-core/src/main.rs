//! smsrelay CLI
//!
//! Command-line interface for the alert-to-SMS relay.

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use smsrelay::config::LoggingConfig;
use smsrelay::provider::SendOutcome;
use smsrelay::{Config, Relay};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// smsrelay - Alertmanager to SMS relay
#[derive(Parser)]
#[command(name = "smsrelay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        env = "SMSRELAY_CONFIG",
        default_value = "config.yaml"
    )]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook receiver
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(long, env = "SMSRELAY_HOST")]
        host: Option<String>,

        /// HTTP port (overrides server.port)
        #[arg(long, env = "SMSRELAY_PORT")]
        port: Option<u16>,
    },

    /// Load and validate the configuration
    CheckConfig,

    /// Send a message to a recipient group immediately
    Send {
        /// Recipient group name
        #[arg(long)]
        recipient: String,

        /// Message text
        #[arg(long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Error reading .env file: {e}");
        }
    }

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging, cli.verbose);

    // Execute command
    let result = match cli.command {
        Commands::Serve { host, port } => run_serve(config, host, port).await,
        Commands::CheckConfig => {
            run_check_config(&config, &cli.config);
            Ok(())
        }
        Commands::Send { recipient, message } => run_send(config, &recipient, &message).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder unavailable, /metrics disabled");
            None
        }
    };

    info!(
        host = %config.server.host,
        port = config.server.port,
        simulation = config.smsrelay.simulation,
        "Starting smsrelay"
    );

    let relay = Relay::new(config).context("failed to build relay")?;
    relay.start(metrics).await?;
    Ok(())
}

fn run_check_config(config: &Config, path: &str) {
    let relay = &config.smsrelay;
    let members: usize = relay.recipients.iter().map(|r| r.members.len()).sum();

    println!("Configuration OK: {path}");
    println!("   Provider:     {}", relay.provider.url);
    println!("   Content type: {}", relay.provider.content_type);
    println!("   Timeout:      {}", humantime::format_duration(relay.provider.timeout));
    println!("   Simulation:   {}", relay.simulation);
    println!(
        "   Recipients:   {} group(s), {} member(s)",
        relay.recipients.len(),
        members
    );
    println!(
        "   Webhook:      http://{}:{}{}",
        config.server.host, config.server.port, config.server.path
    );
}

async fn run_send(config: Config, recipient: &str, message: &str) -> anyhow::Result<()> {
    let relay = Relay::new(config).context("failed to build relay")?;
    let report = relay.send_once(recipient, message).await;

    if report.deliveries.is_empty() {
        anyhow::bail!("recipient group '{recipient}' has no members");
    }

    for delivery in &report.deliveries {
        match &delivery.result {
            Ok(SendOutcome::Simulated) => println!("{}: simulated", delivery.member),
            Ok(SendOutcome::Delivered { .. }) => println!("{}: delivered", delivery.member),
            Err(e) => println!("{}: failed ({e})", delivery.member),
        }
    }

    if report.failed() > 0 {
        anyhow::bail!("{} of {} message(s) failed", report.failed(), report.deliveries.len());
    }
    Ok(())
}
