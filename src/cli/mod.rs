//! CLI command definitions and handlers

use clap::{Parser, Subcommand};

pub mod args;
pub mod context;
pub mod load_balancer;
pub mod refresh;
pub mod topology;
pub mod watch;

pub use args::OutputFormat;
pub use context::CommandContext;

/// topocache - in-memory cloud topology snapshot cache
#[derive(Parser, Debug)]
#[command(name = "topocache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json)
    #[arg(
        long,
        global = true,
        env = "TOPOCACHE_FORMAT",
        default_value = "table",
        hide_env = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "TOPOCACHE_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override the topology fixture named in the config
    #[arg(long, global = true, env = "TOPOCACHE_FIXTURE", hide_env = true)]
    pub fixture: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "TOPOCACHE_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every account and list applications, clusters and server groups
    Snapshot,

    /// Load every account and list load balancers with their server groups
    #[command(visible_alias = "lb")]
    LoadBalancers {
        /// Only this account
        #[arg(long, short = 'a')]
        account: Option<String>,
    },

    /// Show one instance and its health observations
    Instance {
        /// Account name
        account: String,

        /// Instance name
        id: String,
    },

    /// Show server groups by name
    ServerGroups {
        /// Account name
        account: String,

        /// Server group names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Re-derive one server group after a change
    #[command(after_help = "EXAMPLES:\n  \
        topocache refresh --account prod --region us-east1 --zone us-east1-b app-v002\n  \
        topocache refresh --account prod --region us-east1 app-v003   # regional group")]
    Refresh {
        #[arg(long, short = 'a')]
        account: String,

        #[arg(long, short = 'r')]
        region: String,

        /// Zone, for zonal server groups
        #[arg(long, short = 'z')]
        zone: Option<String>,

        /// Server group name
        server_group: String,
    },

    /// Keep reloading on the configured interval until Ctrl-C
    Watch {
        /// Reload interval in seconds (overrides the config)
        #[arg(long)]
        interval: Option<u64>,
    },
}
