//! natter server - Broadcast chat relay daemon

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use natter_utils::{init_logging_with_config, LogConfig, Result};

mod config;
mod registry;
mod session;
mod state;
mod tcp;

use config::{ConfigLoader, ServerConfig};
use state::SharedState;

/// natter-server - broadcast chat relay daemon
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    ///
    /// Defaults to the standard config location when omitted. A missing
    /// default file is fine; a missing explicit path is an error.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(long, short = 'p', env = "NATTER_PORT")]
    port: Option<u16>,

    /// Address to listen on (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Log to stderr at debug level instead of the log file
    #[arg(long, default_value_t = false)]
    log_stderr: bool,
}

impl Args {
    /// Resolve the effective configuration from file and flags
    fn load_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from_path(path)?,
            None => ConfigLoader::load()?,
        };

        if let Some(port) = self.port {
            config.listen.port = port;
        }
        if let Some(host) = &self.host {
            config.listen.host = host.clone();
        }

        ConfigLoader::validate(&config)?;
        Ok(config)
    }
}

/// Run the relay daemon until interrupted
async fn run_daemon(config: ServerConfig) -> Result<()> {
    info!("natter server starting");

    let shared = SharedState::new(config);

    // Ctrl-C feeds the shutdown broadcast every task listens on
    let interrupt_state = shared.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            interrupt_state.signal_shutdown();
        }
    });

    tcp::run_accept_loop(shared).await?;

    info!("natter server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_config = if args.log_stderr {
        LogConfig::development()
    } else {
        LogConfig::server()
    };
    init_logging_with_config(log_config)?;

    let config = args.load_config()?;

    if let Err(e) = run_daemon(config).await {
        error!("Server error: {}", e);
        eprintln!("Error: {}", e);
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["natter-server"]);
        assert!(args.config.is_none());
        assert!(args.port.is_none());
        assert!(args.host.is_none());
        assert!(!args.log_stderr);
    }

    #[test]
    fn test_port_flag() {
        let args = Args::parse_from(["natter-server", "--port", "4242"]);
        assert_eq!(args.port, Some(4242));

        let args = Args::parse_from(["natter-server", "-p", "4243"]);
        assert_eq!(args.port, Some(4243));
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[listen]\nport = 4242\n").unwrap();

        let args = Args::parse_from(["natter-server", "--config", path.to_str().unwrap()]);

        let config = args.load_config().unwrap();
        assert_eq!(config.listen.port, 4242);
    }

    #[test]
    fn test_port_flag_beats_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[listen]\nport = 4242\n").unwrap();

        let args = Args::parse_from([
            "natter-server",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "5000",
        ]);

        let config = args.load_config().unwrap();
        assert_eq!(config.listen.port, 5000);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let args = Args::parse_from(["natter-server", "--config", "/nonexistent/config.toml"]);
        assert!(args.load_config().is_err());
    }

    #[test]
    fn test_invalid_host_rejected() {
        let args = Args::parse_from(["natter-server", "--host", "not an address"]);
        assert!(args.load_config().is_err());
    }
}
