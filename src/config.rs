use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub scraper: ScraperConfig,
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Timing constants and site identity for the browser-driven scraper. The
/// base URL doubles as the origin boundary: references resolved off a listing
/// page must stay on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub base_url: String,
    pub user_agent: String,
    pub headless: bool,
    pub chrome_path: Option<String>,
    pub navigation_timeout_secs: u64,
    pub selector_timeout_secs: u64,
    pub settle_delay_ms: u64,
}

impl ScraperConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.selector_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub max_retries: usize,
    pub retry_delay_secs: u64,
    pub queue_capacity: usize,
}

impl OrchestratorConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default"))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix "YARNSCOUT"
            .add_source(Environment::with_prefix("YARNSCOUT").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Add Chrome path from environment if not set
        if config.scraper.chrome_path.is_none() {
            config.scraper.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message(
                "Server port must be greater than 0".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "Database max_connections must be greater than 0".into(),
            ));
        }

        if Url::parse(&self.scraper.base_url).is_err() {
            return Err(ConfigError::Message("Invalid scraper base URL".into()));
        }

        if self.scraper.user_agent.trim().is_empty() {
            return Err(ConfigError::Message(
                "Scraper user_agent must not be empty".into(),
            ));
        }

        if self.scraper.navigation_timeout_secs == 0 || self.scraper.selector_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "Scraper timeouts must be greater than 0".into(),
            ));
        }

        if self.orchestrator.queue_capacity == 0 {
            return Err(ConfigError::Message(
                "Orchestrator queue_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 5,
            },
            scraper: ScraperConfig {
                base_url: "https://www.wollplatz.de".to_string(),
                user_agent: "YarnScout/1.0".to_string(),
                headless: true,
                chrome_path: None,
                navigation_timeout_secs: 30,
                selector_timeout_secs: 10,
                settle_delay_ms: 2000,
            },
            orchestrator: OrchestratorConfig {
                max_retries: 3,
                retry_delay_secs: 10,
                queue_capacity: 32,
            },
        }
    }

    #[test]
    fn test_config_validation_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_port() {
        let mut config = valid_config();
        config.server.port = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("port must be greater than 0")
        );
    }

    #[test]
    fn test_config_validation_invalid_base_url() {
        let mut config = valid_config();
        config.scraper.base_url = "not-a-valid-url".to_string();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("base URL"));
    }

    #[test]
    fn test_config_validation_zero_connections() {
        let mut config = valid_config();
        config.database.max_connections = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeouts() {
        let mut config = valid_config();
        config.scraper.selector_timeout_secs = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_queue_capacity() {
        let mut config = valid_config();
        config.orchestrator.queue_capacity = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_helpers() {
        let config = valid_config();
        assert_eq!(config.scraper.navigation_timeout(), Duration::from_secs(30));
        assert_eq!(config.scraper.selector_timeout(), Duration::from_secs(10));
        assert_eq!(config.scraper.settle_delay(), Duration::from_millis(2000));
        assert_eq!(config.orchestrator.retry_delay(), Duration::from_secs(10));
    }
}
