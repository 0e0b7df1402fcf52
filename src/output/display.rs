//! Display rows for table and JSON output
//!
//! Rows flatten the entity graph into one line per server group, load
//! balancer attachment, or health observation.

use serde::Serialize;
use tabled::Tabled;

use crate::model::{HealthEntry, HealthSource, LoadBalancer, ServerGroup, Topology};
use crate::naming::parse_resource_name;

/// Server group row
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ServerGroupRow {
    #[tabled(rename = "APP")]
    pub application: String,

    #[tabled(rename = "ACCOUNT")]
    pub account: String,

    #[tabled(rename = "CLUSTER")]
    pub cluster: String,

    #[tabled(rename = "SERVER GROUP")]
    pub name: String,

    #[tabled(rename = "LOCATION")]
    pub location: String,

    #[tabled(rename = "INSTANCES")]
    pub instances: usize,

    /// min/desired/max
    #[tabled(rename = "CAPACITY")]
    pub capacity: String,

    #[tabled(rename = "LOAD BALANCERS")]
    pub load_balancers: String,

    #[tabled(rename = "DISABLED")]
    pub disabled: bool,
}

impl From<&ServerGroup> for ServerGroupRow {
    fn from(sg: &ServerGroup) -> Self {
        let names = parse_resource_name(&sg.name);
        let load_balancers = if sg.load_balancers.is_empty() {
            "-".to_string()
        } else {
            sg.load_balancers
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        };

        Self {
            application: names.app,
            account: sg.account.clone(),
            cluster: names.cluster,
            name: sg.name.clone(),
            location: sg.location().to_string(),
            instances: sg.instances.len(),
            capacity: format!(
                "{}/{}/{}",
                sg.capacity.min, sg.capacity.desired, sg.capacity.max
            ),
            load_balancers,
            disabled: sg.disabled,
        }
    }
}

/// Every server group in the snapshot, in application/account/cluster order.
pub fn server_group_rows(topology: &Topology) -> Vec<ServerGroupRow> {
    topology.server_groups().map(ServerGroupRow::from).collect()
}

/// One load balancer, or one of its server-group attachments
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct LoadBalancerRow {
    #[tabled(rename = "ACCOUNT")]
    pub account: String,

    #[tabled(rename = "REGION")]
    pub region: String,

    #[tabled(rename = "LOAD BALANCER")]
    pub name: String,

    #[tabled(rename = "IP")]
    pub ip_address: String,

    #[tabled(rename = "SERVER GROUP")]
    pub server_group: String,

    /// Attached instances as `id (state)`
    #[tabled(rename = "ATTACHED")]
    pub attached: String,

    #[tabled(rename = "DETACHED")]
    pub detached: String,
}

impl LoadBalancerRow {
    /// One row per server-group summary; a load balancer with none gets a single row.
    pub fn rows(lb: &LoadBalancer) -> Vec<Self> {
        let base = |server_group: String, attached: String, detached: String| Self {
            account: lb.account.clone(),
            region: lb.region.clone(),
            name: lb.name.clone(),
            ip_address: lb.ip_address.clone().unwrap_or_else(|| "-".to_string()),
            server_group,
            attached,
            detached,
        };

        if lb.server_groups.is_empty() {
            return vec![base("-".to_string(), "-".to_string(), "-".to_string())];
        }

        lb.server_groups
            .iter()
            .map(|summary| {
                let attached: Vec<String> = summary
                    .instances
                    .iter()
                    .map(|i| format!("{} ({})", i.id, i.health.state))
                    .collect();
                base(
                    summary.name.clone(),
                    join_or_dash(&attached),
                    join_or_dash(&summary.detached_instances),
                )
            })
            .collect()
    }
}

/// One health observation on an instance
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct HealthRow {
    #[tabled(rename = "SOURCE")]
    pub source: String,

    #[tabled(rename = "STATE")]
    pub state: String,

    #[tabled(rename = "DESCRIPTION")]
    pub description: String,
}

impl From<&HealthEntry> for HealthRow {
    fn from(entry: &HealthEntry) -> Self {
        let source = match &entry.source {
            HealthSource::Platform => "platform".to_string(),
            HealthSource::LoadBalancer { name } => format!("lb:{}", name),
        };
        Self {
            source,
            state: entry.state.to_string(),
            description: entry.description.clone(),
        }
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
