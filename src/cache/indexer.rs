//! Load balancer relationship indexing
//!
//! Server groups name their load balancers; load balancers do not point back.
//! After a candidate graph is assembled this pass rebuilds every load
//! balancer's server-group summaries from scratch, so nothing computed in an
//! earlier cycle survives.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{
    LoadBalancerHealth, LoadBalancerInstance, LoadBalancerServerGroup, ServerGroup, Topology,
};

/// Rebuild `server_groups` on every load balancer in the topology.
pub fn index_load_balancers(topology: &mut Topology) {
    let Topology {
        applications,
        load_balancers,
        ..
    } = topology;

    for lb in load_balancers.values_mut().flat_map(|r| r.values_mut()).flatten() {
        lb.server_groups.clear();
    }

    // (account, load balancer name) -> referencing server groups
    let mut index: BTreeMap<(&str, &str), Vec<&ServerGroup>> = BTreeMap::new();
    for server_group in applications
        .values()
        .flat_map(|app| app.clusters.values())
        .flat_map(|clusters| clusters.values())
        .flat_map(|cluster| cluster.server_groups.iter())
    {
        for lb_name in &server_group.load_balancers {
            index
                .entry((server_group.account.as_str(), lb_name.as_str()))
                .or_default()
                .push(server_group);
        }
    }

    let mut summaries = 0usize;
    for ((account, lb_name), server_groups) in index {
        for server_group in server_groups {
            // A missing load balancer, or one in another region, is skipped.
            let Some(lb) = load_balancers
                .get_mut(account)
                .and_then(|regions| regions.get_mut(&server_group.region))
                .and_then(|lbs| lbs.iter_mut().find(|lb| lb.name == lb_name))
            else {
                continue;
            };

            let summary = summarize(lb_name, &lb.members, server_group);
            lb.server_groups.push(summary);
            summaries += 1;
        }
    }

    log::debug!("Indexed {} load balancer server-group summaries", summaries);
}

/// Split a server group's instances into attached and detached for one load balancer.
fn summarize(
    lb_name: &str,
    members: &BTreeSet<String>,
    server_group: &ServerGroup,
) -> LoadBalancerServerGroup {
    let mut instances = Vec::new();
    let mut detached_instances = Vec::new();

    for instance in &server_group.instances {
        if members.contains(&instance.name) {
            let health = instance
                .load_balancer_health(lb_name)
                .map(LoadBalancerHealth::from)
                .unwrap_or_else(LoadBalancerHealth::unknown);
            instances.push(LoadBalancerInstance {
                id: instance.name.clone(),
                zone: instance.zone.clone(),
                health,
            });
        } else {
            detached_instances.push(instance.name.clone());
        }
    }

    LoadBalancerServerGroup {
        name: server_group.name.clone(),
        disabled: server_group.disabled,
        instances,
        detached_instances,
    }
}
