//! Provider descriptors
//!
//! Plain data returned by a [`CloudProvider`](super::CloudProvider).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{BuildInfo, HealthState, LaunchConfig};

/// Server groups found in one region
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionResources {
    pub region: String,
    #[serde(default)]
    pub server_groups: Vec<ServerGroupDescriptor>,
}

/// A managed instance group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerGroupDescriptor {
    pub name: String,
    pub region: String,
    /// Set for zonal groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Distribution zones of a regional group
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default)]
    pub launch_config: LaunchConfig,
    #[serde(default)]
    pub target_size: u32,
    #[serde(default)]
    pub load_balancers: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
    /// Names of member instances
    #[serde(default)]
    pub instances: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildInfo>,
}

impl ServerGroupDescriptor {
    /// Whether this group claims the named instance.
    pub fn claims(&self, instance: &str) -> bool {
        self.instances.iter().any(|i| i == instance)
    }
}

/// An autoscaler and the server group it targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoscalerDescriptor {
    pub name: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Target server group name
    pub target: String,
    pub min_replicas: u32,
    pub max_replicas: u32,
    #[serde(default)]
    pub cool_down_secs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_utilization_target: Option<f64>,
}

impl AutoscalerDescriptor {
    /// Whether this autoscaler targets the given server group.
    pub fn targets(&self, server_group: &ServerGroupDescriptor) -> bool {
        self.target == server_group.name
            && self.region == server_group.region
            && self.zone == server_group.zone
    }
}

/// A load balancer with current membership and health
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerDescriptor {
    pub name: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<String>,
    /// Names of registered instances
    #[serde(default)]
    pub instances: Vec<String>,
    #[serde(default)]
    pub health: Vec<InstanceHealthStatus>,
}

/// Health of one registered instance as reported by a load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceHealthStatus {
    pub instance: String,
    pub state: HealthState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A compute instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDescriptor {
    pub name: String,
    pub zone: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_status() -> String {
    "RUNNING".to_string()
}
