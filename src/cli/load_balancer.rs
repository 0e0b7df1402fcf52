//! Load balancer command

use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::cli::context::CommandContext;
use crate::error::Result;
use crate::model::LoadBalancer;
use crate::output::display::LoadBalancerRow;
use crate::output::{Formattable, json};

/// Reload once and print load balancers with their server-group summaries.
///
/// Without `account`, every configured account is listed.
pub async fn list(opts: &GlobalOptions, account: Option<&str>) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    ctx.load().await?;

    let accounts: Vec<String> = match account {
        Some(a) => vec![a.to_string()],
        None => ctx.cache.accounts().into_iter().map(|a| a.name).collect(),
    };
    let load_balancers: Vec<LoadBalancer> = accounts
        .iter()
        .flat_map(|a| ctx.cache.load_balancers(a))
        .collect();

    let generation = ctx.cache.snapshot().generation;
    match ctx.format {
        OutputFormat::Table => {
            let rows: Vec<LoadBalancerRow> =
                load_balancers.iter().flat_map(LoadBalancerRow::rows).collect();
            rows.print(ctx.format, generation)?;
        }
        OutputFormat::Json => println!("{}", json::format_json(&load_balancers, generation)?),
    }
    Ok(())
}
