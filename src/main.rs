//! topocache - in-memory, queryable snapshot cache of cloud compute topology

use clap::Parser;
use log::LevelFilter;

mod cache;
mod cli;
mod config;
mod error;
mod model;
mod naming;
mod output;
mod provider;

use cache::ResourceChange;
use cli::args::GlobalOptions;
use cli::{Cli, Commands};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `--debug` forces debug level; otherwise RUST_LOG applies, defaulting to info.
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Snapshot => cli::topology::snapshot(&opts).await,
        Commands::LoadBalancers { account } => {
            cli::load_balancer::list(&opts, account.as_deref()).await
        }
        Commands::Instance { account, id } => cli::topology::instance(&opts, &account, &id).await,
        Commands::ServerGroups { account, names } => {
            cli::topology::server_groups(&opts, &account, &names).await
        }
        Commands::Refresh {
            account,
            region,
            zone,
            server_group,
        } => {
            let change = ResourceChange::new(account, region, zone.as_deref(), server_group);
            cli::refresh::run(&opts, change).await
        }
        Commands::Watch { interval } => cli::watch::run(&opts, interval).await,
    }
}
