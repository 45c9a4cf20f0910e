//! proton-send: open AMQP senders against an in-process peer.
//!
//! Builds a client container and a peer container, wires their transports
//! back to back, opens a sender per address, waits until every link is
//! attached on both sides, then closes the connection and waits until the
//! engine has reclaimed it.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

mod config;
mod driver;
mod logging;

use config::SendConfig;

/// Open senders against an in-process AMQP peer
#[derive(Parser, Debug)]
#[command(name = "proton-send", version, about = "Open AMQP senders against an in-process peer")]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to open a sender on (repeatable)
    #[arg(short, long = "address")]
    address: Vec<String>,

    /// Hostname announced to the peer
    #[arg(long)]
    hostname: Option<String>,

    /// Client container id
    #[arg(long)]
    container_id: Option<String>,

    /// Local idle timeout, e.g. 30s
    #[arg(long)]
    idle_timeout: Option<humantime::Duration>,

    /// Pump rounds allowed for attaching and for closing
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Log level (trace, debug, info, warn, error); defaults to PROTON_LOG, then info
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Flags override file and environment values
    fn apply(self, config: &mut SendConfig) {
        if !self.address.is_empty() {
            config.addresses = self.address;
        }
        if let Some(hostname) = self.hostname {
            config.hostname = hostname;
        }
        if let Some(container_id) = self.container_id {
            config.container_id = Some(container_id);
        }
        if let Some(idle_timeout) = self.idle_timeout {
            config.idle_timeout = Some(idle_timeout.to_string());
        }
        if let Some(max_rounds) = self.max_rounds {
            config.max_rounds = max_rounds;
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = logging::level_from(args.log_level.as_deref(), |key| std::env::var(key).ok());
    logging::init("send", &level)?;
    info!("Starting proton-send v{}", env!("CARGO_PKG_VERSION"));

    let mut config = SendConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;
    component_info!(
        "config",
        "Addresses {:?}, hostname {}, idle timeout {:?}",
        config.addresses,
        config.hostname,
        config.idle_timeout
    );

    let report = tokio::select! {
        report = driver::run(&config) => report?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, shutting down");
            return Ok(());
        }
    };

    if !report.failed.is_empty() {
        anyhow::bail!(
            "{} of {} senders failed to attach: {:?}",
            report.failed.len(),
            report.attached.len() + report.failed.len(),
            report.failed
        );
    }
    if report.leaked > 0 {
        warn!("{} senders were not reclaimed", report.leaked);
    }
    info!("proton-send finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "proton-send",
            "-a",
            "one",
            "--address",
            "two",
            "--hostname",
            "peer",
            "--idle-timeout",
            "1m 30s",
            "--max-rounds",
            "4",
        ]);
        let mut config = SendConfig::default();
        args.apply(&mut config);

        assert_eq!(config.addresses, vec!["one", "two"]);
        assert_eq!(config.hostname, "peer");
        assert_eq!(
            config.idle_timeout().unwrap(),
            Some(std::time::Duration::from_secs(90))
        );
        assert_eq!(config.max_rounds, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = Args::parse_from(["proton-send"]);
        let mut config = SendConfig {
            hostname: "from-file".to_string(),
            ..SendConfig::default()
        };
        args.apply(&mut config);
        assert_eq!(config.hostname, "from-file");
        assert_eq!(config.addresses, vec!["examples"]);
    }
}
