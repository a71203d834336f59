//! The mudstone daemon.
//!
//! Exit codes: 0 on graceful shutdown, 1 on boot failure.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use mudstone_server::{boot, ServerConfig};

fn main() -> ExitCode {
    // First argument overrides the config path.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("mudstone.toml"), PathBuf::from);

    let config = match ServerConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mudstone: config {}: {e}", config_path.display());
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config);

    let mut game = match boot(config) {
        Ok(game) => game,
        Err(e) => {
            tracing::error!(error = %e, "boot failed");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("mudstone is ready to rock");
    match mudstone_server::run(&mut game) {
        Ok(()) => {
            tracing::info!("normal termination");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "heartbeat died");
            ExitCode::FAILURE
        }
    }
}

/// Stderr logging with ISO timestamps, tee'd into the configured log
/// file when one is set. Each record is flushed as a unit so a tailing
/// process never sees partial lines.
fn init_logging(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match &config.data.log_file {
        Some(path) => {
            match std::fs::OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => {
                    let tee = Tee {
                        file: std::sync::Arc::new(std::sync::Mutex::new(file)),
                    };
                    tracing_subscriber::fmt()
                        .with_env_filter(filter)
                        .with_writer(move || tee.clone())
                        .init();
                }
                Err(e) => {
                    eprintln!("mudstone: cannot open log file {}: {e}", path.display());
                    tracing_subscriber::fmt().with_env_filter(filter).init();
                }
            }
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

/// Mirrors every log record to stderr and the log file, flushing per
/// record so partial lines never land on disk.
#[derive(Clone)]
struct Tee {
    file: std::sync::Arc<std::sync::Mutex<std::fs::File>>,
}

impl std::io::Write for Tee {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        use std::io::Write as _;
        let _ = std::io::stderr().lock().write_all(buf);
        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        use std::io::Write as _;
        let _ = std::io::stderr().lock().flush();
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
        Ok(())
    }
}
