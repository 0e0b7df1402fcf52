//! Descriptor-to-entity conversion
//!
//! Shared by the full reload and the single server group refresh so both
//! derive a server group the same way.

use std::collections::HashMap;

use crate::model::{
    AutoscalingPolicy, Capacity, HealthEntry, Instance, LoadBalancer, ServerGroup,
};
use crate::provider::{
    AutoscalerDescriptor, InstanceDescriptor, LoadBalancerDescriptor, ServerGroupDescriptor,
    region_of_zone,
};

/// Load-balancer-sourced health entries keyed by instance name
#[derive(Debug, Default)]
pub(crate) struct LoadBalancerHealthIndex {
    entries: HashMap<String, Vec<HealthEntry>>,
}

impl LoadBalancerHealthIndex {
    pub(crate) fn new(load_balancers: &[LoadBalancerDescriptor]) -> Self {
        let mut entries: HashMap<String, Vec<HealthEntry>> = HashMap::new();
        for lb in load_balancers {
            for status in &lb.health {
                entries
                    .entry(status.instance.clone())
                    .or_default()
                    .push(HealthEntry::load_balancer(
                        &lb.name,
                        status.state,
                        status.description.clone().unwrap_or_default(),
                    ));
            }
        }
        Self { entries }
    }

    fn for_instance(&self, name: &str) -> &[HealthEntry] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Build an instance entity with platform health plus any load balancer observations.
pub(crate) fn build_instance(
    account: &str,
    descriptor: &InstanceDescriptor,
    lb_health: &LoadBalancerHealthIndex,
    server_group: Option<&str>,
) -> Instance {
    let mut health = vec![HealthEntry::platform(&descriptor.status)];
    health.extend(lb_health.for_instance(&descriptor.name).iter().cloned());

    Instance {
        name: descriptor.name.clone(),
        account: account.to_string(),
        region: region_of_zone(&descriptor.zone).to_string(),
        zone: descriptor.zone.clone(),
        status: descriptor.status.clone(),
        launch_time: descriptor.launch_time,
        health,
        tags: descriptor.tags.clone(),
        server_group: server_group.map(str::to_string),
    }
}

/// Build a server group entity from its descriptor, autoscalers and instances.
pub(crate) fn build_server_group(
    account: &str,
    descriptor: &ServerGroupDescriptor,
    autoscalers: &[AutoscalerDescriptor],
    instances: Vec<Instance>,
) -> ServerGroup {
    let autoscaler = autoscalers.iter().find(|a| a.targets(descriptor));

    let capacity = match autoscaler {
        Some(a) => Capacity {
            min: a.min_replicas,
            max: a.max_replicas,
            desired: descriptor.target_size,
        },
        None => Capacity::fixed(descriptor.target_size),
    };

    let zones = if descriptor.zones.is_empty() {
        descriptor.zone.iter().cloned().collect()
    } else {
        descriptor.zones.clone()
    };

    ServerGroup {
        name: descriptor.name.clone(),
        account: account.to_string(),
        region: descriptor.region.clone(),
        zone: descriptor.zone.clone(),
        zones,
        launch_config: descriptor.launch_config.clone(),
        capacity,
        autoscaling_policy: autoscaler.map(|a| AutoscalingPolicy {
            min_replicas: a.min_replicas,
            max_replicas: a.max_replicas,
            cool_down_secs: a.cool_down_secs,
            cpu_utilization_target: a.cpu_utilization_target,
        }),
        disabled: descriptor.disabled,
        load_balancers: descriptor.load_balancers.iter().cloned().collect(),
        build: descriptor.build.clone(),
        instances,
    }
}

pub(crate) fn build_load_balancer(account: &str, descriptor: &LoadBalancerDescriptor) -> LoadBalancer {
    LoadBalancer {
        name: descriptor.name.clone(),
        account: account.to_string(),
        region: descriptor.region.clone(),
        ip_address: descriptor.ip_address.clone(),
        port_range: descriptor.port_range.clone(),
        health_check: descriptor.health_check.clone(),
        members: descriptor.instances.iter().cloned().collect(),
        server_groups: Vec::new(),
    }
}

/// Copy load-balancer health from the replaced records onto same-named fresh instances.
///
/// Entries are appended without deduplication.
pub(crate) fn migrate_load_balancer_health(previous: &[ServerGroup], fresh: &mut ServerGroup) {
    for instance in &mut fresh.instances {
        let migrated: Vec<HealthEntry> = previous
            .iter()
            .filter_map(|sg| sg.instance(&instance.name))
            .flat_map(|old| old.health.iter().filter(|h| h.is_load_balancer()).cloned())
            .collect();
        instance.health.extend(migrated);
    }
}
