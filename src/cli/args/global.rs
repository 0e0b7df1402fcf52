//! Global CLI options shared across all commands

use crate::cli::{Cli, OutputFormat};

/// Global CLI options passed to all command handlers.
///
/// Captures the flag/env layer; config file values are resolved later in
/// `CommandContext`.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Output format (table, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.topocache/config.yaml)
    pub config: Option<String>,

    /// Topology fixture override
    pub fixture: Option<String>,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            fixture: cli.fixture.clone(),
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    pub fn fixture_ref(&self) -> Option<&str> {
        self.fixture.as_deref()
    }
}
