//! Test fixtures and builders for descriptors and entities
//!
//! Import via `use crate::provider::fixtures::*` in test modules.

#![allow(dead_code)]

use std::collections::BTreeSet;

use crate::model::{Capacity, HealthEntry, Instance, LaunchConfig, ServerGroup};

use super::{
    AutoscalerDescriptor, InstanceDescriptor, InstanceHealthStatus, LoadBalancerDescriptor,
    ServerGroupDescriptor,
};
use crate::model::HealthState;

// ============================================================================
// Entities
// ============================================================================

/// An empty server group entity.
pub fn server_group(account: &str, region: &str, name: &str) -> ServerGroup {
    ServerGroup {
        name: name.to_string(),
        account: account.to_string(),
        region: region.to_string(),
        zone: None,
        zones: Vec::new(),
        launch_config: LaunchConfig::default(),
        capacity: Capacity::default(),
        autoscaling_policy: None,
        disabled: false,
        load_balancers: BTreeSet::new(),
        build: None,
        instances: Vec::new(),
    }
}

/// A running instance entity with platform health only.
pub fn instance(account: &str, zone: &str, name: &str) -> Instance {
    Instance {
        name: name.to_string(),
        account: account.to_string(),
        region: super::region_of_zone(zone).to_string(),
        zone: zone.to_string(),
        status: "RUNNING".to_string(),
        launch_time: None,
        health: vec![HealthEntry::platform("RUNNING")],
        tags: Vec::new(),
        server_group: None,
    }
}

// ============================================================================
// ServerGroupBuilder
// ============================================================================

/// Builder for server group descriptors.
///
/// # Example
/// ```ignore
/// let sg = ServerGroupBuilder::zonal("app-v001", "us-east1-b")
///     .load_balancer("lb-x")
///     .instances(&["i-1", "i-2"])
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ServerGroupBuilder {
    descriptor: ServerGroupDescriptor,
}

impl ServerGroupBuilder {
    /// A zonal group; the region is derived from the zone.
    pub fn zonal(name: &str, zone: &str) -> Self {
        let mut builder = Self::regional(name, super::region_of_zone(zone));
        builder.descriptor.zone = Some(zone.to_string());
        builder.descriptor.zones = vec![zone.to_string()];
        builder
    }

    pub fn regional(name: &str, region: &str) -> Self {
        Self {
            descriptor: ServerGroupDescriptor {
                name: name.to_string(),
                region: region.to_string(),
                zone: None,
                zones: Vec::new(),
                launch_config: LaunchConfig {
                    instance_template: format!("{}-template", name),
                    machine_type: "e2-medium".to_string(),
                    source_image: None,
                    network_tags: Vec::new(),
                },
                target_size: 0,
                load_balancers: Vec::new(),
                disabled: false,
                instances: Vec::new(),
                build: None,
            },
        }
    }

    pub fn load_balancer(mut self, name: &str) -> Self {
        self.descriptor.load_balancers.push(name.to_string());
        self
    }

    pub fn instances(mut self, names: &[&str]) -> Self {
        self.descriptor.instances = names.iter().map(|n| n.to_string()).collect();
        self.descriptor.target_size = names.len() as u32;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.descriptor.disabled = true;
        self
    }

    pub fn build(self) -> ServerGroupDescriptor {
        self.descriptor
    }
}

// ============================================================================
// Other descriptors
// ============================================================================

pub fn instance_descriptor(name: &str, zone: &str) -> InstanceDescriptor {
    InstanceDescriptor {
        name: name.to_string(),
        zone: zone.to_string(),
        status: "RUNNING".to_string(),
        launch_time: None,
        tags: Vec::new(),
    }
}

/// A load balancer with the given members, each reported Up.
pub fn load_balancer_descriptor(name: &str, region: &str, members: &[&str]) -> LoadBalancerDescriptor {
    LoadBalancerDescriptor {
        name: name.to_string(),
        region: region.to_string(),
        ip_address: Some("10.0.0.1".to_string()),
        port_range: Some("80-80".to_string()),
        health_check: Some(format!("{}-hc", name)),
        instances: members.iter().map(|m| m.to_string()).collect(),
        health: members
            .iter()
            .map(|m| InstanceHealthStatus {
                instance: m.to_string(),
                state: HealthState::Up,
                description: None,
            })
            .collect(),
    }
}

pub fn autoscaler_descriptor(target: &ServerGroupDescriptor, min: u32, max: u32) -> AutoscalerDescriptor {
    AutoscalerDescriptor {
        name: format!("{}-autoscaler", target.name),
        region: target.region.clone(),
        zone: target.zone.clone(),
        target: target.name.clone(),
        min_replicas: min,
        max_replicas: max,
        cool_down_secs: 60,
        cpu_utilization_target: Some(0.6),
    }
}
