//! Cloud provider interface
//!
//! The cache never talks to a cloud SDK directly. Everything it needs comes
//! through [`CloudProvider`], which returns plain descriptors; turning those
//! into entities is the cache's job.

use async_trait::async_trait;

use crate::config::AccountConfig;
use crate::error::Result;
use crate::model::Image;

pub mod batch;
#[cfg(test)]
pub mod fixtures;
pub mod fixture_provider;
#[cfg(test)]
pub mod mock;
pub mod models;

pub use batch::Batch;
pub use fixture_provider::{FixtureProvider, TopologyFixture};
#[cfg(test)]
pub use mock::MockProvider;
pub use models::{
    AutoscalerDescriptor, InstanceDescriptor, InstanceHealthStatus, LoadBalancerDescriptor,
    RegionResources, ServerGroupDescriptor,
};

/// Cloud provider resource API
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Regions available to the account
    async fn list_regions(&self, account: &AccountConfig) -> Result<Vec<String>>;

    /// Server groups (managed instance groups) in one region, zonal and regional
    async fn list_region_resources(
        &self,
        account: &AccountConfig,
        region: &str,
    ) -> Result<RegionResources>;

    /// Images published in a project
    async fn list_images(&self, account: &AccountConfig, project: &str) -> Result<Vec<Image>>;

    /// Aggregated autoscaler listing across every region and zone
    async fn list_autoscalers(&self, account: &AccountConfig) -> Result<Vec<AutoscalerDescriptor>>;

    /// Aggregated load balancer listing with membership and per-instance health
    async fn list_load_balancers(
        &self,
        account: &AccountConfig,
    ) -> Result<Vec<LoadBalancerDescriptor>>;

    /// Aggregated instance listing
    async fn list_instances(&self, account: &AccountConfig) -> Result<Vec<InstanceDescriptor>>;

    /// One server group by key; `ProviderError::NotFound` when it does not exist
    async fn get_server_group(
        &self,
        account: &AccountConfig,
        region: &str,
        zone: Option<&str>,
        name: &str,
    ) -> Result<ServerGroupDescriptor>;

    /// Instances belonging to one server group
    async fn list_server_group_instances(
        &self,
        account: &AccountConfig,
        server_group: &ServerGroupDescriptor,
    ) -> Result<Vec<InstanceDescriptor>>;
}

/// Region a zone belongs to (`us-east1-b` -> `us-east1`).
pub fn region_of_zone(zone: &str) -> &str {
    zone.rsplit_once('-').map(|(region, _)| region).unwrap_or(zone)
}

/// Base-image projects worth listing for an account.
///
/// Drops duplicates, the account's own project and projects the account
/// already declares, keeping configuration order.
pub fn prune_base_image_projects(base: &[String], account: &AccountConfig) -> Vec<String> {
    let mut pruned: Vec<String> = Vec::new();
    for project in base {
        let already_listed = *project == account.project
            || account.image_projects.contains(project)
            || pruned.contains(project);
        if !already_listed {
            pruned.push(project.clone());
        }
    }
    pruned
}
