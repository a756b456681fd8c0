//! Configuration schema structs

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use natter_protocol::DEFAULT_PORT;
use natter_utils::{NatterError, Result};

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: ListenConfig,
    pub limits: LimitsConfig,
}

/// Listening socket settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// IP address to bind (default: all interfaces)
    pub host: String,
    /// TCP port (default: 11111)
    pub port: u16,
    /// Pending-connection backlog handed to listen() (default: 10)
    pub backlog: u32,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            backlog: 10,
        }
    }
}

impl ListenConfig {
    /// Full socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().map_err(|_| {
            NatterError::config(format!("listen.host is not an IP address: {}", self.host))
        })
    }
}

/// Delivery limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Chunks buffered per client before senders to it wait (default: 64)
    pub outbound_queue: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { outbound_queue: 64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen.host, "0.0.0.0");
        assert_eq!(config.listen.port, 11111);
        assert_eq!(config.listen.backlog, 10);
        assert_eq!(config.limits.outbound_queue, 64);
    }

    #[test]
    fn test_socket_addr() {
        let listen = ListenConfig {
            host: "127.0.0.1".into(),
            port: 4000,
            backlog: 10,
        };
        let addr = listen.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:4000");
    }

    #[test]
    fn test_socket_addr_rejects_hostname() {
        let listen = ListenConfig {
            host: "not an ip".into(),
            ..ListenConfig::default()
        };
        assert!(listen.socket_addr().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [listen]
            port = 4242
            "#,
        )
        .unwrap();

        assert_eq!(config.listen.port, 4242);
        assert_eq!(config.listen.host, "0.0.0.0");
        assert_eq!(config.limits.outbound_queue, 64);
    }
}
