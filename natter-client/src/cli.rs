//! Command-line argument parsing for the natter client
//!
//! Uses clap for argument parsing with derive macros.

use clap::Parser;

/// natter - terminal chat client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server address to connect to (host:port)
    ///
    /// Defaults to a relay on the local machine.
    #[arg(long, env = "NATTER_ADDR", default_value_t = default_addr())]
    pub addr: String,

    /// Display name to join with
    ///
    /// When omitted, the client prompts for one before connecting.
    #[arg(long, short = 'n')]
    pub name: Option<String>,
}

fn default_addr() -> String {
    format!("127.0.0.1:{}", natter_protocol::DEFAULT_PORT)
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["natter"]);
        assert_eq!(args.addr, "127.0.0.1:11111");
        assert!(args.name.is_none());
    }

    #[test]
    fn test_addr_flag() {
        let args = Args::parse_from(["natter", "--addr", "10.0.0.7:2222"]);
        assert_eq!(args.addr, "10.0.0.7:2222");
    }

    #[test]
    fn test_name_flag() {
        let args = Args::parse_from(["natter", "--name", "alice"]);
        assert_eq!(args.name.as_deref(), Some("alice"));

        let args = Args::parse_from(["natter", "-n", "bob"]);
        assert_eq!(args.name.as_deref(), Some("bob"));
    }

    #[test]
    fn test_combined_flags() {
        let args = Args::parse_from(["natter", "--addr", "example.org:11111", "-n", "carol"]);
        assert_eq!(args.addr, "example.org:11111");
        assert_eq!(args.name.as_deref(), Some("carol"));
    }
}
