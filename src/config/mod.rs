//! Configuration management for topocache

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Accounts to cache
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,

    /// Globally configured base-image projects
    #[serde(default)]
    pub base_image_projects: Vec<String>,

    /// Reload schedule and request settings
    #[serde(default)]
    pub reload: ReloadSettings,

    /// Topology fixture backing the file provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture: Option<PathBuf>,
}

/// One cloud account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account name used as the cache key
    pub name: String,

    /// The account's own project
    pub project: String,

    /// Extra projects the account pulls images from
    #[serde(default)]
    pub image_projects: Vec<String>,

    /// Region allow-list; empty means every region the provider reports
    #[serde(default)]
    pub regions: Vec<String>,
}

impl AccountConfig {
    /// Create an account with no extra image projects and no region filter.
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            image_projects: Vec::new(),
            regions: Vec::new(),
        }
    }

    /// Whether the region passes this account's allow-list.
    pub fn includes_region(&self, region: &str) -> bool {
        self.regions.is_empty() || self.regions.iter().any(|r| r == region)
    }
}

/// Reload schedule settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadSettings {
    /// Seconds between full reloads
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Seconds to wait after startup before the first reload
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,

    /// Upper bound on in-flight provider calls within one batch
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_startup_delay_secs() -> u64 {
    5
}

fn default_max_concurrent_requests() -> usize {
    16
}

impl Default for ReloadSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            startup_delay_secs: default_startup_delay_secs(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

impl ReloadSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".topocache").join("config.yaml"))
    }

    /// Load configuration from an explicit path, or the default location
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(PathBuf::from(p)),
            None => Self::load_from(Self::default_path()?),
        }
    }

    /// Load configuration from a specific path
    ///
    /// A relative `fixture` path is resolved against the config file's directory.
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let mut config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        if let (Some(fixture), Some(dir)) = (config.fixture.as_ref(), path.parent())
            && fixture.is_relative()
        {
            config.fixture = Some(dir.join(fixture));
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate account names and reload settings
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for account in &self.accounts {
            if account.name.trim().is_empty() {
                return Err(ConfigError::Invalid("account name must not be empty".to_string()).into());
            }
            if !seen.insert(account.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate account name '{}'",
                    account.name
                ))
                .into());
            }
        }

        if self.reload.interval_secs == 0 {
            return Err(ConfigError::Invalid("reload.interval_secs must be positive".to_string()).into());
        }
        if self.reload.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid(
                "reload.max_concurrent_requests must be positive".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
