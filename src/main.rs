mod collectors;
mod config;
mod exec;
mod ntp;
mod render;
mod status;

use clap::Parser;
use collectors::{collect_all, Family, Probe};
use config::Config;
use exec::SystemExecutor;
use ntp::NtpClient;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hostcheck")]
#[command(version, about = "Run local host health checks and print a summary table")]
struct Cli {
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    print_default_config: bool,
    /// Exit with status 1 if any check reports Error or Unknown.
    #[arg(long)]
    strict: bool,
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let mut cfg = match cli.config.as_deref() {
        Some(path) => match Config::load_from_file(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                error!(error = %err, "failed to load configuration");
                std::process::exit(2);
            }
        },
        None => Config::default(),
    };
    if cli.strict {
        cfg.strict = true;
    }
    if cli.no_color {
        cfg.output.color = false;
    }
    if !cfg.output.color {
        colored::control::set_override(false);
    }

    let ntp = NtpClient::new(cfg.ntp.server.clone(), cfg.ntp.timeout());
    info!(
        ntp_server = ntp.server(),
        ntp_timeout = ?ntp.timeout(),
        strict = cfg.strict,
        "running host checks"
    );

    let probe = Arc::new(Probe::new(Arc::new(SystemExecutor), Arc::new(ntp)));
    let started = Instant::now();
    let table = render::render_results(collect_all(probe, &Family::ALL)).await;
    print!("{}", table.render(cfg.output.color));

    let summary = table.summary();
    info!(
        total = summary.total(),
        warnings = summary.warning,
        errors = summary.error,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "host checks finished"
    );

    if cfg.strict && summary.has_failures() {
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
