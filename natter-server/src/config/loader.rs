//! Configuration loader

use std::path::Path;

use natter_utils::{config_file, NatterError, Result};

use super::ServerConfig;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the default location
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load() -> Result<ServerConfig> {
        let path = config_file();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(ServerConfig::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<ServerConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| NatterError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, path: &Path) -> Result<ServerConfig> {
        toml::from_str(content).map_err(|e| NatterError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(config: &ServerConfig) -> Result<()> {
        if config.listen.backlog == 0 {
            return Err(NatterError::config("listen.backlog must be at least 1"));
        }

        if config.limits.outbound_queue == 0 {
            return Err(NatterError::config("limits.outbound_queue must be at least 1"));
        }

        config.listen.socket_addr()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file() {
        let config = ConfigLoader::load();
        assert!(config.is_ok());
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(
            &path,
            r#"
            [listen]
            port = 4242
            backlog = 32
            "#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.listen.port, 4242);
        assert_eq!(config.listen.backlog, 32);
    }

    #[test]
    fn test_load_from_missing_path() {
        let result = ConfigLoader::load_from_path(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(NatterError::FileRead { .. })));
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = ConfigLoader::parse("invalid { toml", Path::new("test.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_defaults() {
        let config = ServerConfig::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_backlog() {
        let mut config = ServerConfig::default();
        config.listen.backlog = 0;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_zero_outbound_queue() {
        let mut config = ServerConfig::default();
        config.limits.outbound_queue = 0;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_bad_host() {
        let mut config = ServerConfig::default();
        config.listen.host = "relay.example.com".into();

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
    }
}
