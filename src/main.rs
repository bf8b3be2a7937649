//! `alma` binary: runs one ALMA Matrix session in the terminal, or serves
//! sessions over a line-delimited JSON socket.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use alma_matrix::{
    AlmaApp, AlmaConfig, AlmaRuntime, CliDriver, FileSink, Logger, RuntimeConfig, Size,
    SocketDriver,
};
use clap::Parser;

/// ALMA Matrix terminal session
#[derive(Parser)]
#[command(name = "alma")]
#[command(about = "ALMA Matrix - entities, AI chat stand-ins and app launches in one session", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long, env = "ALMA_CONFIG")]
    config: Option<PathBuf>,

    /// Serve sessions over TCP instead of the terminal. Without an address
    /// the configured `socket.listen_addr` is used.
    #[arg(long, num_args = 0..=1, value_name = "ADDR")]
    socket: Option<Option<SocketAddr>>,

    /// Seed for entity positions, ports and canned replies
    #[arg(long)]
    seed: Option<u64>,

    /// Stop the socket server after this many sessions
    #[arg(long)]
    max_sessions: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("alma: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AlmaConfig::resolve(cli.config.as_deref())?;
    if cli.seed.is_some() {
        config.rng_seed = cli.seed;
    }

    let mut runtime_config = RuntimeConfig::from_config(&config);
    if let Some(path) = config.logging.path.as_ref() {
        let sink = FileSink::new(path, config.logging.max_bytes)?;
        runtime_config = runtime_config
            .with_logger(Logger::new(sink).with_min_level(config.logging.level));
    }
    runtime_config.enable_metrics();

    let app = AlmaApp::from_config(&config);

    match cli.socket {
        Some(addr) => {
            let addr = addr.unwrap_or(config.socket.listen_addr);
            let runtime = AlmaRuntime::new(app, runtime_config, Size::new(100, 30));
            let driver = SocketDriver::bind(addr, runtime)?
                .with_max_sessions(cli.max_sessions.or(config.socket.max_sessions));
            eprintln!("alma: listening on {}", driver.local_addr()?);
            driver.run()?;
        }
        None => {
            let (width, height) = crossterm::terminal::size().unwrap_or((100, 30));
            let runtime = AlmaRuntime::new(app, runtime_config, Size::new(width, height));
            CliDriver::new(runtime).run()?;
        }
    }
    Ok(())
}
