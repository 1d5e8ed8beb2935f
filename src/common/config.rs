//! Configuration file handling

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// WebDriver connection settings
    #[serde(default)]
    pub webdriver: WebDriverConfig,

    /// Poll and wait timing
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Screenshot and log output
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
}

/// WebDriver connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct WebDriverConfig {
    /// Base URL of the WebDriver server (chromedriver by default)
    #[serde(default = "default_webdriver_url")]
    pub url: String,

    /// Application binary handed to the driver as `goog:chromeOptions.binary`
    #[serde(default)]
    pub app: Option<PathBuf>,

    /// Extra command-line arguments for the application
    #[serde(default)]
    pub app_args: Vec<String>,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: default_webdriver_url(),
            app: None,
            app_args: Vec::new(),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

/// Timing settings in milliseconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Delay between two checks of a polled condition
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Bound used by waits that don't pass an explicit timeout
    #[serde(default = "default_wait")]
    pub default_wait_ms: u64,
}

impl Timeouts {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn default_wait(&self) -> Duration {
        Duration::from_millis(self.default_wait_ms)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            default_wait_ms: default_wait(),
        }
    }
}

fn default_poll_interval() -> u64 {
    250
}
fn default_wait() -> u64 {
    10_000
}

/// Artifact output settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ArtifactsConfig {
    /// Parent of the per-run screenshot and log directories; the user data dir when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    super::Error::FileRead {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    }
                })?;
                return Self::parse(&content);
            }
        }
        Ok(Self::default())
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.timeouts.poll_interval_ms == 0 {
            return Err(super::Error::Config(
                "timeouts.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.webdriver.url, "http://localhost:9515");
        assert_eq!(config.timeouts.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.timeouts.default_wait(), Duration::from_secs(10));
        assert!(config.artifacts.dir.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [webdriver]
            app = "/opt/itch/itch"
            app_args = ["--no-sandbox"]

            [timeouts]
            default_wait_ms = 5000
            "#,
        )
        .unwrap();
        assert_eq!(config.webdriver.app, Some(PathBuf::from("/opt/itch/itch")));
        assert_eq!(config.webdriver.app_args, vec!["--no-sandbox".to_string()]);
        assert_eq!(config.timeouts.default_wait_ms, 5000);
        assert_eq!(config.timeouts.poll_interval_ms, 250);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = Config::parse("[timeouts]\npoll_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, super::super::Error::Config(_)));
    }
}
