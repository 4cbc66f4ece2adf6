//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `domain_monitor` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;

use domain_monitor::config::{Command, Opt};
use domain_monitor::initialization::{init_crypto_provider, init_logger_with};
use domain_monitor::status_server::start_status_server;
use domain_monitor::{run_scheduler, Config, MonitorService, RegisterOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // This allows setting WHOIS_API_KEY in .env without exporting it manually
    // Try loading from current directory first, then from the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();
    let config = Config::from(&opt);

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    // Initialize crypto provider for TLS operations
    init_crypto_provider();

    if let Err(e) = run(opt.command, &config).await {
        eprintln!("domain_monitor error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<()> {
    let service = MonitorService::open(config).await?;

    match command {
        Command::Run { job } => {
            let report = service.trigger_job(job).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            println!(
                "{} job: {} result{} ({} succeeded, {} failed)",
                report.job_type,
                report.summary.total,
                if report.summary.total == 1 { "" } else { "s" },
                report.summary.successful,
                report.summary.failed
            );
        }
        Command::Check { domain } => {
            let data = service.realtime(&domain).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Command::Add {
            domain,
            owner,
            no_monitoring,
        } => {
            let options = RegisterOptions {
                monitoring_enabled: !no_monitoring,
                ..RegisterOptions::default()
            };
            let domain = service.register_domain(&owner, &domain, options).await?;
            println!(
                "Registered {} (id {}) for {}: registrar {}, SSL {}",
                domain.name,
                domain.id,
                domain.owner_id,
                domain.registrar.as_deref().unwrap_or("unknown"),
                domain.ssl_status
            );
        }
        Command::Serve { port, no_scheduler } => serve(service, port, no_scheduler).await?,
    }
    Ok(())
}

async fn serve(service: MonitorService, port: u16, no_scheduler: bool) -> Result<()> {
    let shutdown = CancellationToken::new();

    let scheduler = if no_scheduler {
        None
    } else {
        Some(tokio::spawn(run_scheduler(
            service.job_context().clone(),
            shutdown.clone(),
        )))
    };

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Shutdown requested");
        }
        ctrl_c.cancel();
    });

    let served = start_status_server(port, service, shutdown.clone()).await;
    shutdown.cancel();
    if let Some(scheduler) = scheduler {
        let _ = scheduler.await;
    }
    served
}
