use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for RepoBridge
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Project service backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Bearer credential settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Interactive console behavior
    #[serde(default)]
    pub ui: UiConfig,

    /// Granted action uids for this operator
    #[serde(default)]
    pub permissions: PermissionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Project service backend configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackendConfig {
    /// Base URL of the project service, including the plugin mount path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Bearer credential configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// Credential source
    #[serde(default = "default_auth_method")]
    pub method: String, // "auto", "inline", "env", "file"

    /// Inline token (discouraged outside local setups)
    pub token: Option<String>,

    /// Environment variable holding the token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// File holding the token (shell-expanded)
    pub token_file: Option<String>,
}

/// Interactive console configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UiConfig {
    /// Seconds before a transient alert is dismissed
    #[serde(default = "default_alert_dismiss_secs")]
    pub alert_dismiss_secs: u64,

    /// Ask for confirmation before deleting projects
    #[serde(default = "default_true")]
    pub confirm_delete: bool,
}

/// Granted action uids
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PermissionConfig {
    /// Action uids this operator may use
    #[serde(default = "default_granted")]
    pub granted: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String, // "compact"

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:1337/github-projects".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_auth_method() -> String {
    "auto".to_string()
}
fn default_token_env() -> String {
    "REPOBRIDGE_TOKEN".to_string()
}
fn default_alert_dismiss_secs() -> u64 {
    5
}
fn default_true() -> bool {
    true
}
fn default_granted() -> Vec<String> {
    vec![
        "use".to_string(),
        "repos.read".to_string(),
        "projects.read".to_string(),
        "projects.create".to_string(),
        "projects.delete".to_string(),
    ]
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}

// Default implementations
impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            method: default_auth_method(),
            token: None,
            token_env: default_token_env(),
            token_file: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            alert_dismiss_secs: default_alert_dismiss_secs(),
            confirm_delete: default_true(),
        }
    }
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            granted: default_granted(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            // Create default config
            let config = Self::default();

            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            // Save default config
            config.save(&config_path)?;

            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repobridge").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        if let Some(token_file) = &self.auth.token_file {
            self.auth.token_file = Some(
                shellexpand::full(token_file)
                    .context("Failed to expand token_file path")?
                    .into_owned(),
            );
        }

        Ok(())
    }

    /// Delay before a transient alert is dismissed by the UI
    pub fn alert_dismiss(&self) -> Duration {
        Duration::from_secs(self.ui.alert_dismiss_secs)
    }

    /// Request timeout for project service calls
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            auth: AuthConfig::default(),
            ui: UiConfig::default(),
            permissions: PermissionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
