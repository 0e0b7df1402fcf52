//! File-backed provider
//!
//! Serves the [`CloudProvider`] interface from a YAML topology document.
//! Used by the CLI and by tests that want a deterministic account layout.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    AutoscalerDescriptor, CloudProvider, InstanceDescriptor, LoadBalancerDescriptor,
    RegionResources, ServerGroupDescriptor,
};
use crate::config::AccountConfig;
use crate::error::{ConfigError, ProviderError, Result};
use crate::model::Image;

/// Whole-topology fixture document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyFixture {
    /// account name -> resources
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountFixture>,
}

/// Resources visible to one account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountFixture {
    /// region -> server groups
    #[serde(default)]
    pub regions: BTreeMap<String, Vec<ServerGroupDescriptor>>,
    #[serde(default)]
    pub load_balancers: Vec<LoadBalancerDescriptor>,
    #[serde(default)]
    pub autoscalers: Vec<AutoscalerDescriptor>,
    #[serde(default)]
    pub instances: Vec<InstanceDescriptor>,
    /// project -> images
    #[serde(default)]
    pub images: BTreeMap<String, Vec<Image>>,
}

impl TopologyFixture {
    /// Read a fixture document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }
        let contents = std::fs::read_to_string(path)?;
        let fixture = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        Ok(fixture)
    }

    /// Resources for an account; an unknown account is an authorization failure.
    pub fn account(&self, name: &str) -> Result<&AccountFixture> {
        self.accounts
            .get(name)
            .ok_or_else(|| ProviderError::Unauthorized.into())
    }

    pub fn account_mut(&mut self, name: &str) -> &mut AccountFixture {
        self.accounts.entry(name.to_string()).or_default()
    }
}

impl AccountFixture {
    pub fn region_resources(&self, region: &str) -> Result<RegionResources> {
        let server_groups = self
            .regions
            .get(region)
            .ok_or_else(|| ProviderError::NotFound(format!("region {}", region)))?;
        if let Some(stray) = server_groups.iter().find(|sg| sg.region != region) {
            return Err(ProviderError::InvalidResponse(format!(
                "server group {} listed under {} but declares region {}",
                stray.name, region, stray.region
            ))
            .into());
        }
        Ok(RegionResources {
            region: region.to_string(),
            server_groups: server_groups.clone(),
        })
    }

    pub fn server_group(
        &self,
        region: &str,
        zone: Option<&str>,
        name: &str,
    ) -> Result<ServerGroupDescriptor> {
        self.regions
            .get(region)
            .and_then(|groups| {
                groups
                    .iter()
                    .find(|sg| sg.name == name && sg.zone.as_deref() == zone)
            })
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("server group {}", name)).into())
    }

    pub fn instances_of(&self, server_group: &ServerGroupDescriptor) -> Vec<InstanceDescriptor> {
        self.instances
            .iter()
            .filter(|i| server_group.claims(&i.name))
            .cloned()
            .collect()
    }

    /// Drop a server group, as a destroy operation would.
    pub fn remove_server_group(&mut self, name: &str) {
        for groups in self.regions.values_mut() {
            groups.retain(|sg| sg.name != name);
        }
    }
}

/// Provider backed by a [`TopologyFixture`]
pub struct FixtureProvider {
    fixture: TopologyFixture,
}

impl FixtureProvider {
    pub fn new(fixture: TopologyFixture) -> Self {
        Self { fixture }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(TopologyFixture::load(path)?))
    }
}

#[async_trait]
impl CloudProvider for FixtureProvider {
    async fn list_regions(&self, account: &AccountConfig) -> Result<Vec<String>> {
        let fixture = self.fixture.account(&account.name)?;
        Ok(fixture.regions.keys().cloned().collect())
    }

    async fn list_region_resources(
        &self,
        account: &AccountConfig,
        region: &str,
    ) -> Result<RegionResources> {
        self.fixture.account(&account.name)?.region_resources(region)
    }

    async fn list_images(&self, account: &AccountConfig, project: &str) -> Result<Vec<Image>> {
        let fixture = self.fixture.account(&account.name)?;
        Ok(fixture.images.get(project).cloned().unwrap_or_default())
    }

    async fn list_autoscalers(&self, account: &AccountConfig) -> Result<Vec<AutoscalerDescriptor>> {
        Ok(self.fixture.account(&account.name)?.autoscalers.clone())
    }

    async fn list_load_balancers(
        &self,
        account: &AccountConfig,
    ) -> Result<Vec<LoadBalancerDescriptor>> {
        Ok(self.fixture.account(&account.name)?.load_balancers.clone())
    }

    async fn list_instances(&self, account: &AccountConfig) -> Result<Vec<InstanceDescriptor>> {
        Ok(self.fixture.account(&account.name)?.instances.clone())
    }

    async fn get_server_group(
        &self,
        account: &AccountConfig,
        region: &str,
        zone: Option<&str>,
        name: &str,
    ) -> Result<ServerGroupDescriptor> {
        self.fixture
            .account(&account.name)?
            .server_group(region, zone, name)
    }

    async fn list_server_group_instances(
        &self,
        account: &AccountConfig,
        server_group: &ServerGroupDescriptor,
    ) -> Result<Vec<InstanceDescriptor>> {
        Ok(self.fixture.account(&account.name)?.instances_of(server_group))
    }
}
