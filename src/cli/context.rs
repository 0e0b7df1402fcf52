//! Command execution context
//!
//! Loads the config, builds the fixture-backed provider and wraps both in a
//! [`TopologyCache`] so command handlers start from a ready cache.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use log::debug;

use crate::cache::{ReloadReport, TopologyCache};
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::provider::FixtureProvider;

/// Context for command execution containing config, cache, and runtime options.
pub struct CommandContext {
    pub config: Config,
    pub cache: Arc<TopologyCache<FixtureProvider>>,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load the config and build the cache.
    ///
    /// # Errors
    /// Returns error if the config cannot be loaded or no fixture is configured.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = Config::load_at(opts.config_ref())?;

        let fixture = opts
            .fixture_ref()
            .map(PathBuf::from)
            .or_else(|| config.fixture.clone())
            .ok_or_else(|| {
                ConfigError::Invalid(
                    "no topology fixture configured (set `fixture` or pass --fixture)".to_string(),
                )
            })?;
        debug!("Using topology fixture {}", fixture.display());

        let provider = Arc::new(FixtureProvider::from_path(&fixture)?);
        let cache = Arc::new(TopologyCache::new(provider, &config));

        Ok(Self {
            config,
            cache,
            format: opts.format,
        })
    }

    /// Run one full reload, warning on stderr about any account left out.
    pub async fn load(&self) -> Result<ReloadReport> {
        let report = self.cache.reload().await?;
        for (account, error) in &report.failed_accounts {
            eprintln!("{} account {} skipped: {}", "⚠".yellow(), account.bold(), error);
        }
        Ok(report)
    }
}
