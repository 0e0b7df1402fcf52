//! Entity model for the cached compute topology
//!
//! Entities are keyed by natural composite keys (account, region/zone, name)
//! rather than surrogate ids. Applications and clusters are never created
//! directly; they appear when the first server group that names them is
//! inserted into a [`Topology`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod health;
pub mod topology;

pub use health::{HealthEntry, HealthSource, HealthState, LoadBalancerHealth};
pub use topology::Topology;

/// Server group capacity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    pub min: u32,
    pub max: u32,
    pub desired: u32,
}

impl Capacity {
    /// Capacity pinned to a single size.
    pub fn fixed(size: u32) -> Self {
        Self {
            min: size,
            max: size,
            desired: size,
        }
    }
}

/// Autoscaler policy attached to a server group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoscalingPolicy {
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub cool_down_secs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_utilization_target: Option<f64>,
}

/// Instance template a server group launches from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub instance_template: String,
    pub machine_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(default)]
    pub network_tags: Vec<String>,
}

/// Build provenance recorded on a server group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_number: Option<String>,
}

/// A single compute instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub account: String,
    pub region: String,
    pub zone: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_time: Option<DateTime<Utc>>,
    pub health: Vec<HealthEntry>,
    pub tags: Vec<String>,
    /// Owning server group, if one claims this instance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_group: Option<String>,
}

impl Instance {
    /// First health entry reported by the named load balancer.
    pub fn load_balancer_health(&self, lb_name: &str) -> Option<&HealthEntry> {
        self.health.iter().find(|h| h.is_from_load_balancer(lb_name))
    }
}

/// A regionally or zonally scoped group of homogeneous instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerGroup {
    pub name: String,
    pub account: String,
    pub region: String,
    /// Zone for zonal groups; `None` for regional groups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    pub zones: Vec<String>,
    pub launch_config: LaunchConfig,
    pub capacity: Capacity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscaling_policy: Option<AutoscalingPolicy>,
    pub disabled: bool,
    /// Load balancers referenced by name
    pub load_balancers: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildInfo>,
    pub instances: Vec<Instance>,
}

impl ServerGroup {
    /// Zone for zonal groups, region otherwise.
    pub fn location(&self) -> &str {
        self.zone.as_deref().unwrap_or(&self.region)
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.name == name)
    }
}

/// Server groups sharing (account, application, cluster name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub account: String,
    pub application: String,
    /// Ordered by (region, name)
    pub server_groups: Vec<ServerGroup>,
}

impl Cluster {
    pub(crate) fn new(account: &str, application: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            account: account.to_string(),
            application: application.to_string(),
            server_groups: Vec::new(),
        }
    }

    /// Insert keeping (region, name) order.
    pub(crate) fn insert(&mut self, server_group: ServerGroup) {
        let pos = self.server_groups.partition_point(|sg| {
            (sg.region.as_str(), sg.name.as_str())
                <= (server_group.region.as_str(), server_group.name.as_str())
        });
        self.server_groups.insert(pos, server_group);
    }

    /// Remove every server group with this name, returning them.
    pub(crate) fn remove_named(&mut self, name: &str) -> Vec<ServerGroup> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.server_groups)
            .into_iter()
            .partition(|sg| sg.name == name);
        self.server_groups = kept;
        removed
    }
}

/// Clusters grouped under one naming-convention app name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    /// account -> cluster name -> cluster
    pub clusters: BTreeMap<String, BTreeMap<String, Cluster>>,
}

impl Application {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            clusters: BTreeMap::new(),
        }
    }

    pub fn cluster(&self, account: &str, name: &str) -> Option<&Cluster> {
        self.clusters.get(account)?.get(name)
    }
}

/// A load balancer and its derived server-group summaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub name: String,
    pub account: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<String>,
    /// Names of instances currently registered
    pub members: BTreeSet<String>,
    /// Rebuilt by the relationship indexer every cycle
    pub server_groups: Vec<LoadBalancerServerGroup>,
}

/// Summary of one server group behind a load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerServerGroup {
    pub name: String,
    pub disabled: bool,
    pub instances: Vec<LoadBalancerInstance>,
    pub detached_instances: Vec<String>,
}

/// An attached instance as seen by one load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerInstance {
    pub id: String,
    pub zone: String,
    pub health: LoadBalancerHealth,
}

/// An image descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub name: String,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
}
