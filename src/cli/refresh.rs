//! Single server group refresh command

use colored::Colorize;
use serde::Serialize;

use crate::cache::{RefreshOutcome, ResourceChange};
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::cli::context::CommandContext;
use crate::error::Result;
use crate::model::ServerGroup;
use crate::naming::parse_resource_name;
use crate::output::display::ServerGroupRow;
use crate::output::{json, table};

#[derive(Serialize)]
struct RefreshResult {
    #[serde(flatten)]
    outcome: RefreshOutcome,
    server_group: String,
    cluster: Vec<ServerGroup>,
}

/// Reload, refresh one server group, then print the outcome and its cluster.
pub async fn run(opts: &GlobalOptions, change: ResourceChange) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    ctx.load().await?;

    let outcome = ctx.cache.refresh_server_group(&change).await?;

    let snapshot = ctx.cache.snapshot();
    let names = parse_resource_name(&change.server_group);
    let cluster: Vec<ServerGroup> = snapshot
        .applications
        .get(&names.app)
        .and_then(|app| app.cluster(&change.account, &names.cluster))
        .map(|c| c.server_groups.clone())
        .unwrap_or_default();

    match ctx.format {
        OutputFormat::Table => {
            let status = match outcome {
                RefreshOutcome::Refreshed { generation } => {
                    format!("{} (generation {})", "Refreshed".green(), generation)
                }
                RefreshOutcome::Removed { generation } => {
                    format!("{} (generation {})", "Removed".yellow(), generation)
                }
                RefreshOutcome::Skipped => format!("{} (store busy)", "Skipped".dimmed()),
            };
            println!("{} {}", status, change.to_string().bold());

            let rows: Vec<ServerGroupRow> = cluster.iter().map(ServerGroupRow::from).collect();
            println!("{}", table::format_table(&rows));
        }
        OutputFormat::Json => {
            let result = RefreshResult {
                outcome,
                server_group: change.to_string(),
                cluster,
            };
            println!("{}", json::format_json(&result, snapshot.generation)?);
        }
    }
    Ok(())
}
