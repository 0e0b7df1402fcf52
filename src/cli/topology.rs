//! Snapshot, server group and instance commands

use colored::Colorize;
use log::debug;

use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::cli::context::CommandContext;
use crate::error::{Error, Result};
use crate::output::display::{HealthRow, ServerGroupRow, server_group_rows};
use crate::output::{Formattable, json, table};

/// Reload once and print every server group in the snapshot.
pub async fn snapshot(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let report = ctx.load().await?;
    let snapshot = ctx.cache.snapshot();

    match ctx.format {
        OutputFormat::Table => {
            println!(
                "{} generation {} | {} applications | {} server groups | {} accounts",
                "Snapshot".bold(),
                snapshot.generation,
                snapshot.applications.len(),
                snapshot.server_group_count(),
                report.accounts_refreshed.len()
            );
            println!("{}", table::format_table(&server_group_rows(&snapshot)));
        }
        OutputFormat::Json => {
            println!("{}", json::format_json(&*snapshot, snapshot.generation)?);
        }
    }
    Ok(())
}

/// Reload once and print the named server groups of one account.
pub async fn server_groups(opts: &GlobalOptions, account: &str, names: &[String]) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    ctx.load().await?;

    let groups = ctx.cache.server_groups(account, names);
    debug!("Found {} of {} server groups in {}", groups.len(), names.len(), account);

    let generation = ctx.cache.snapshot().generation;
    match ctx.format {
        OutputFormat::Table => {
            let rows: Vec<ServerGroupRow> = groups.iter().map(ServerGroupRow::from).collect();
            rows.print(ctx.format, generation)?;
        }
        OutputFormat::Json => println!("{}", json::format_json(&groups, generation)?),
    }
    Ok(())
}

/// Reload once and print one instance with its health observations.
pub async fn instance(opts: &GlobalOptions, account: &str, id: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    ctx.load().await?;

    let instance = ctx
        .cache
        .instance(account, id)
        .ok_or_else(|| Error::Other(format!("instance {} not found in account {}", id, account)))?;
    let generation = ctx.cache.snapshot().generation;

    match ctx.format {
        OutputFormat::Table => {
            let owner = instance
                .server_group
                .clone()
                .unwrap_or_else(|| "(standalone)".to_string());
            let launched = instance
                .launch_time
                .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{}",
                table::format_details(&[
                    ("Name", instance.name.clone()),
                    ("Account", instance.account.clone()),
                    ("Zone", instance.zone.clone()),
                    ("Status", instance.status.clone()),
                    ("Server group", owner),
                    ("Launched", launched),
                ])
            );
            let health: Vec<HealthRow> = instance.health.iter().map(HealthRow::from).collect();
            println!("{}", table::format_table(&health));
        }
        OutputFormat::Json => println!("{}", json::format_json(&instance, generation)?),
    }
    Ok(())
}
