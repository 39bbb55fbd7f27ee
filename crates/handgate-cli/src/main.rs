//! handgate CLI - run the OSC gateway or check a running one

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use handgate_bridge::{check_connection, CheckConfig, CheckOutcome, GatewayEvent, OscGateway};
use handgate_core::{ControlResponse, EntryKind, GateMode, Route};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::Config;

/// handgate - validating OSC gateway for hand-tracking peers
#[derive(Parser)]
#[command(name = "handgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway
    Serve {
        /// Address to receive peer messages on
        #[arg(short, long)]
        bind: Option<String>,

        /// Where control responses are sent
        #[arg(short = 'C', long)]
        control: Option<String>,

        /// Where tracking samples are sent
        #[arg(short, long)]
        data: Option<String>,

        /// Gate each hand on its own visibility flag
        #[arg(long)]
        per_hand_gate: bool,

        /// Only print errors and forwarded samples
        #[arg(short, long)]
        quiet: bool,
    },

    /// Send a /connect handshake to a running gateway
    Check {
        /// Gateway address
        #[arg(short, long, default_value = "127.0.0.1:7400")]
        target: String,

        /// Local address the response arrives on
        #[arg(short, long, default_value = "0.0.0.0:7401")]
        bind: String,

        /// Response timeout in milliseconds
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,
    },

    /// Show version and configured address patterns
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli.log_level, cli.json_logs)?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            bind,
            control,
            data,
            per_hand_gate,
            quiet,
        } => {
            let mut config = config;
            if let Some(bind) = bind {
                config.gateway.bind_addr = bind;
            }
            if let Some(control) = control {
                config.gateway.control_addr = control;
            }
            if data.is_some() {
                config.gateway.data_addr = data;
            }
            if per_hand_gate {
                config.gateway.gate = GateMode::PerHand;
            }

            // Handle Ctrl+C
            let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Received shutdown signal");
                    let _ = shutdown_tx.send(()).await;
                }
            });

            run_gateway(config, quiet, &mut shutdown_rx).await?;
        }

        Commands::Check {
            target,
            bind,
            timeout_ms,
        } => {
            let check = CheckConfig {
                bind_addr: bind,
                target,
                timeout: Duration::from_millis(timeout_ms),
                ..Default::default()
            };
            run_check(&check).await?;
        }

        Commands::Info => {
            print_info(&config)?;
        }
    }

    Ok(())
}

fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to parse log level")?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).compact())
            .init();
    }

    Ok(())
}

async fn run_gateway(
    config: Config,
    quiet: bool,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    let registry = config.schema.registry()?;
    let mut gateway = OscGateway::new(config.gateway.clone(), registry);
    let mut event_rx = gateway
        .start()
        .await
        .context("Failed to start OSC gateway")?;

    println!(
        "{} Gateway on {} (control -> {}, data -> {}, gate: {:?})",
        "HANDGATE".cyan().bold(),
        config.gateway.bind_addr,
        config.gateway.control_addr,
        config
            .gateway
            .data_addr
            .as_deref()
            .unwrap_or(&config.gateway.control_addr),
        config.gateway.gate
    );
    println!("  Press Ctrl+C to stop");

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                match event {
                    Some(event) => print_event(&event, quiet),
                    None => break,
                }
            }
            _ = shutdown_rx.recv() => {
                gateway.stop().await?;
                break;
            }
        }
    }

    println!("{}", "Gateway stopped".yellow());
    Ok(())
}

fn print_event(event: &GatewayEvent, quiet: bool) {
    match event {
        GatewayEvent::Started { local_addr } => {
            println!("{} Listening on {}", "OK".green().bold(), local_addr);
        }
        GatewayEvent::Routed { peer, route } => match route {
            Route::Control(msg) => {
                let is_error = matches!(msg.response(), Ok(ControlResponse::Errors { .. }));
                if !quiet || is_error {
                    println!("{} {} {} {}", "CTRL".cyan(), peer, msg.address, msg.payload);
                }
            }
            Route::Data(sample) => {
                println!(
                    "{} {} {} ({}, {}, {}, {})",
                    "DATA".green(),
                    sample.address,
                    sample.key,
                    sample.i,
                    sample.x,
                    sample.y,
                    sample.z
                );
            }
            Route::LatchUpdated { side, visible } => {
                if !quiet {
                    println!("{} {} hand visible = {}", "LATCH".magenta(), side, visible);
                }
            }
            Route::Dropped { side } => {
                if !quiet {
                    println!("{} {} hand sample (no hand visible)", "DROP".yellow(), side);
                }
            }
        },
        GatewayEvent::Error(e) => {
            println!("{} {}", "ERROR".red().bold(), e);
        }
        GatewayEvent::Stopped => {}
    }
}

async fn run_check(check: &CheckConfig) -> Result<()> {
    println!(
        "{} Checking gateway at {} (replies on {})",
        "HANDGATE".cyan().bold(),
        check.target,
        check.bind_addr
    );

    let outcome = check_connection(check)
        .await
        .context("Connection check failed")?;

    match outcome {
        CheckOutcome::Connected => {
            println!("{} Gateway reports connected", "OK".green().bold());
            Ok(())
        }
        CheckOutcome::Disconnected => {
            anyhow::bail!("gateway at {} reports not connected", check.target)
        }
        CheckOutcome::Rejected(errors) => {
            for error in &errors {
                println!("{} {}", "ERROR".red().bold(), error);
            }
            anyhow::bail!("gateway rejected the handshake")
        }
    }
}

fn print_info(config: &Config) -> Result<()> {
    println!("{}", "handgate - validating OSC gateway".cyan().bold());
    println!();
    println!("Version:    {}", env!("CARGO_PKG_VERSION"));
    println!("Platform:   {}", std::env::consts::OS);
    println!("Arch:       {}", std::env::consts::ARCH);
    println!();
    println!("{}", "Gateway:".green());
    println!("  bind      {}", config.gateway.bind_addr);
    println!("  control   {}", config.gateway.control_addr);
    if let Some(data) = &config.gateway.data_addr {
        println!("  data      {}", data);
    }
    println!("  gate      {:?}", config.gateway.gate);
    println!();
    println!("{}", "Address patterns:".green());
    for entry in config.schema.registry()?.entries() {
        match entry.kind {
            EntryKind::Connect => println!("  /{:<16} connected: bool", entry.name),
            EntryKind::Tracked { side } => println!(
                "  /{:<16} {} hand: visible: bool | {{i, x, y, z}}",
                entry.name, side
            ),
        }
    }
    println!();
    println!("{}", "Examples:".green());
    println!("  handgate serve --control 127.0.0.1:7401   # Run the gateway");
    println!("  handgate check --target 127.0.0.1:7400    # Handshake with a gateway");
    Ok(())
}
