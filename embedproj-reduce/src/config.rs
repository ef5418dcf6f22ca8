//! Plugin configuration: command-line arguments with environment fallbacks.

use std::net::SocketAddr;

use clap::Parser;
use thiserror::Error;
use tracing::Level;

/// Max port retries when the requested port is occupied (multi-session conflicts).
pub const MAX_PORT_RETRIES: u16 = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("invalid log level '{0}', expected one of: debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("max message size must be at least 1 MiB")]
    MessageSizeTooSmall,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "embedproj-reduce")]
#[command(about = "Embedding projection plugin (reduce, normalize, place)")]
#[command(version)]
pub struct Args {
    /// gRPC server port
    #[arg(short, long, env = "EMBEDPROJ_PORT", default_value = "9002")]
    pub port: u16,

    /// gRPC server address (overrides port)
    #[arg(short, long, env = "EMBEDPROJ_ADDRESS")]
    pub address: Option<String>,

    /// Log level (debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, env = "EMBEDPROJ_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum gRPC message size in MiB
    #[arg(long, env = "EMBEDPROJ_MAX_MESSAGE_MB", default_value = "16")]
    pub max_message_mb: usize,
}

/// Where the server should listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenTarget {
    /// Exact address, no retry
    Address(SocketAddr),
    /// Port on all interfaces, retried upward when taken
    Port(u16),
}

impl ListenTarget {
    /// Ports to try in order for [`ListenTarget::Port`]: the requested one,
    /// then upward, at most [`MAX_PORT_RETRIES`] in total. Stops at 65535.
    pub fn candidate_ports(start: u16) -> impl Iterator<Item = u16> {
        std::iter::successors(Some(start), |port| port.checked_add(1))
            .take(MAX_PORT_RETRIES as usize)
    }
}

/// Validated plugin configuration.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub listen: ListenTarget,
    pub log_level: Level,
    pub max_message_bytes: usize,
}

impl TryFrom<Args> for PluginConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let listen = match args.address {
            Some(address) => {
                let addr = address
                    .parse()
                    .map_err(|source| ConfigError::InvalidAddress { address, source })?;
                ListenTarget::Address(addr)
            }
            None => ListenTarget::Port(args.port),
        };

        let log_level = match args.log_level.to_lowercase().as_str() {
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => return Err(ConfigError::InvalidLogLevel(args.log_level)),
        };

        if args.max_message_mb == 0 {
            return Err(ConfigError::MessageSizeTooSmall);
        }

        Ok(Self {
            listen,
            log_level,
            max_message_bytes: args.max_message_mb * 1024 * 1024,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<PluginConfig, ConfigError> {
        let argv = std::iter::once("embedproj-reduce").chain(argv.iter().copied());
        let args = Args::try_parse_from(argv).expect("arguments should parse");
        PluginConfig::try_from(args)
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.listen, ListenTarget::Port(9002));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.max_message_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn address_overrides_port() {
        let config = parse(&["--port", "7000", "--address", "127.0.0.1:7100"]).unwrap();
        assert_eq!(
            config.listen,
            ListenTarget::Address("127.0.0.1:7100".parse().unwrap())
        );
    }

    #[test]
    fn rejects_bad_address() {
        let err = parse(&["--address", "localhost"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress { .. }));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = parse(&["--log-level", "verbose"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(level) if level == "verbose"));
    }

    #[test]
    fn rejects_zero_message_size() {
        let err = parse(&["--max-message-mb", "0"]).unwrap_err();
        assert!(matches!(err, ConfigError::MessageSizeTooSmall));
    }

    #[test]
    fn candidate_ports_count_upward() {
        let ports: Vec<u16> = ListenTarget::candidate_ports(9002).collect();
        assert_eq!(ports.len(), MAX_PORT_RETRIES as usize);
        assert_eq!(ports.first(), Some(&9002));
        assert_eq!(ports.last(), Some(&9011));
    }

    #[test]
    fn candidate_ports_stop_at_max_port() {
        let ports: Vec<u16> = ListenTarget::candidate_ports(65534).collect();
        assert_eq!(ports, vec![65534, 65535]);
    }
}
