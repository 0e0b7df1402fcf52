//! The complete entity graph for every cached account

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Application, Cluster, Image, Instance, LoadBalancer, ServerGroup};
use crate::naming::parse_resource_name;

/// A full topology graph.
///
/// Used both as a privately built candidate and, once wrapped in an `Arc`
/// by the snapshot store, as the immutable published snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Topology {
    /// app name -> application
    pub applications: BTreeMap<String, Application>,
    /// account -> instances no server group claims
    pub standalone_instances: BTreeMap<String, Vec<Instance>>,
    /// account -> images visible to that account
    pub images: BTreeMap<String, Vec<Image>>,
    /// account -> region -> load balancers
    pub load_balancers: BTreeMap<String, BTreeMap<String, Vec<LoadBalancer>>>,
    /// Incremented on every publish
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cluster at Application -> account -> Cluster, created on first use.
    pub fn cluster_entry(&mut self, account: &str, app: &str, cluster: &str) -> &mut Cluster {
        self.applications
            .entry(app.to_string())
            .or_insert_with(|| Application::new(app))
            .clusters
            .entry(account.to_string())
            .or_default()
            .entry(cluster.to_string())
            .or_insert_with(|| Cluster::new(account, app, cluster))
    }

    /// Insert a server group under the application and cluster its name decodes to.
    pub fn insert_server_group(&mut self, server_group: ServerGroup) {
        let names = parse_resource_name(&server_group.name);
        let account = server_group.account.clone();
        self.cluster_entry(&account, &names.app, &names.cluster)
            .insert(server_group);
    }

    /// Drop a cluster left without server groups, and its application if that empties too.
    pub fn prune_cluster(&mut self, account: &str, app: &str, cluster: &str) {
        let Some(application) = self.applications.get_mut(app) else {
            return;
        };
        if let Some(clusters) = application.clusters.get_mut(account) {
            if clusters
                .get(cluster)
                .is_some_and(|c| c.server_groups.is_empty())
            {
                clusters.remove(cluster);
            }
            if clusters.is_empty() {
                application.clusters.remove(account);
            }
        }
        if application.clusters.is_empty() {
            self.applications.remove(app);
        }
    }

    /// Fold another account's subgraph into this one.
    ///
    /// Accounts are disjoint, so account-keyed maps never collide.
    pub fn merge(&mut self, other: Topology) {
        for (name, app) in other.applications {
            let target = self
                .applications
                .entry(name)
                .or_insert_with_key(|n| Application::new(n));
            for (account, clusters) in app.clusters {
                target.clusters.entry(account).or_default().extend(clusters);
            }
        }
        self.standalone_instances.extend(other.standalone_instances);
        self.images.extend(other.images);
        self.load_balancers.extend(other.load_balancers);
    }

    /// Every server group in the graph.
    pub fn server_groups(&self) -> impl Iterator<Item = &ServerGroup> {
        self.applications
            .values()
            .flat_map(|app| app.clusters.values())
            .flat_map(|clusters| clusters.values())
            .flat_map(|cluster| cluster.server_groups.iter())
    }

    /// Server groups in an account whose names appear in `names`.
    pub fn find_server_groups(&self, account: &str, names: &[String]) -> Vec<&ServerGroup> {
        self.server_groups()
            .filter(|sg| sg.account == account && names.iter().any(|n| *n == sg.name))
            .collect()
    }

    /// An instance by account and name, owned or standalone.
    pub fn find_instance(&self, account: &str, id: &str) -> Option<&Instance> {
        self.server_groups()
            .filter(|sg| sg.account == account)
            .flat_map(|sg| sg.instances.iter())
            .find(|i| i.name == id)
            .or_else(|| {
                self.standalone_instances
                    .get(account)?
                    .iter()
                    .find(|i| i.name == id)
            })
    }

    pub fn load_balancer(&self, account: &str, region: &str, name: &str) -> Option<&LoadBalancer> {
        self.load_balancers
            .get(account)?
            .get(region)?
            .iter()
            .find(|lb| lb.name == name)
    }

    /// All load balancers in an account, across regions.
    pub fn account_load_balancers(&self, account: &str) -> Vec<&LoadBalancer> {
        self.load_balancers
            .get(account)
            .map(|regions| regions.values().flatten().collect())
            .unwrap_or_default()
    }

    pub fn server_group_count(&self) -> usize {
        self.server_groups().count()
    }
}
