//! Mock cloud provider for testing
//!
//! Serves a mutable [`TopologyFixture`] and records calls, with hooks to fail
//! whole accounts or hold `get_server_group` open until a test releases it.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, Semaphore};

use super::fixture_provider::{AccountFixture, TopologyFixture};
use super::{
    AutoscalerDescriptor, CloudProvider, InstanceDescriptor, LoadBalancerDescriptor,
    RegionResources, ServerGroupDescriptor,
};
use crate::config::AccountConfig;
use crate::error::{ProviderError, Result};
use crate::model::Image;

/// Tracks provider call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub list_regions: usize,
    pub list_region_resources: usize,
    pub list_images: usize,
    pub list_autoscalers: usize,
    pub list_load_balancers: usize,
    pub list_instances: usize,
    pub get_server_group: usize,
    pub list_server_group_instances: usize,
}

/// Mock provider for testing.
///
/// # Example
/// ```ignore
/// let mock = MockProvider::new()
///     .with_server_group("acct1", ServerGroupBuilder::zonal("app-v001", "us-east1-b").build());
/// ```
#[derive(Default)]
pub struct MockProvider {
    fixture: Mutex<TopologyFixture>,
    failing_accounts: Mutex<HashSet<String>>,
    call_count: Mutex<CallCounts>,
    /// When set, `get_server_group` waits for a permit
    gate: Mutex<Option<Arc<Semaphore>>>,
    /// Signalled when a gated `get_server_group` call starts waiting
    gate_entered: Arc<Notify>,
    /// When set, the next `list_regions` call panics
    panic_next: AtomicBool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn account_fixture(&mut self, account: &str) -> &mut AccountFixture {
        self.fixture.get_mut().account_mut(account)
    }

    /// Add a server group under its region.
    pub fn with_server_group(mut self, account: &str, server_group: ServerGroupDescriptor) -> Self {
        let region = server_group.region.clone();
        self.account_fixture(account)
            .regions
            .entry(region)
            .or_default()
            .push(server_group);
        self
    }

    pub fn with_load_balancer(mut self, account: &str, lb: LoadBalancerDescriptor) -> Self {
        self.account_fixture(account).load_balancers.push(lb);
        self
    }

    pub fn with_instance(mut self, account: &str, instance: InstanceDescriptor) -> Self {
        self.account_fixture(account).instances.push(instance);
        self
    }

    pub fn with_autoscaler(mut self, account: &str, autoscaler: AutoscalerDescriptor) -> Self {
        self.account_fixture(account).autoscalers.push(autoscaler);
        self
    }

    pub fn with_image(mut self, account: &str, image: Image) -> Self {
        self.account_fixture(account)
            .images
            .entry(image.project.clone())
            .or_default()
            .push(image);
        self
    }

    /// Make every call for this account fail with a network error.
    pub async fn fail_account(&self, account: &str) {
        self.failing_accounts.lock().await.insert(account.to_string());
    }

    pub async fn recover_account(&self, account: &str) {
        self.failing_accounts.lock().await.remove(account);
    }

    /// Mutate the served topology in place.
    pub async fn update<F: FnOnce(&mut TopologyFixture)>(&self, f: F) {
        let mut fixture = self.fixture.lock().await;
        f(&mut fixture);
    }

    pub async fn counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    /// Hold every `get_server_group` call until [`release_server_group_fetch`](Self::release_server_group_fetch).
    ///
    /// Returns a notifier that fires when a held call starts waiting.
    pub async fn hold_server_group_fetch(&self) -> Arc<Notify> {
        *self.gate.lock().await = Some(Arc::new(Semaphore::new(0)));
        self.gate_entered.clone()
    }

    pub async fn release_server_group_fetch(&self) {
        if let Some(gate) = self.gate.lock().await.take() {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    /// Panic inside the next `list_regions` call.
    pub fn panic_on_next_reload(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    async fn check_account(&self, account: &AccountConfig) -> Result<()> {
        if self.failing_accounts.lock().await.contains(&account.name) {
            return Err(ProviderError::Unauthorized.into());
        }
        Ok(())
    }
}

#[async_trait]
impl CloudProvider for MockProvider {
    async fn list_regions(&self, account: &AccountConfig) -> Result<Vec<String>> {
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("injected provider panic");
        }
        self.call_count.lock().await.list_regions += 1;
        self.check_account(account).await?;

        let fixture = self.fixture.lock().await;
        Ok(fixture.account(&account.name)?.regions.keys().cloned().collect())
    }

    async fn list_region_resources(
        &self,
        account: &AccountConfig,
        region: &str,
    ) -> Result<RegionResources> {
        self.call_count.lock().await.list_region_resources += 1;
        self.check_account(account).await?;

        let fixture = self.fixture.lock().await;
        fixture.account(&account.name)?.region_resources(region)
    }

    async fn list_images(&self, account: &AccountConfig, project: &str) -> Result<Vec<Image>> {
        self.call_count.lock().await.list_images += 1;
        self.check_account(account).await?;

        let fixture = self.fixture.lock().await;
        Ok(fixture
            .account(&account.name)?
            .images
            .get(project)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_autoscalers(&self, account: &AccountConfig) -> Result<Vec<AutoscalerDescriptor>> {
        self.call_count.lock().await.list_autoscalers += 1;
        self.check_account(account).await?;

        let fixture = self.fixture.lock().await;
        Ok(fixture.account(&account.name)?.autoscalers.clone())
    }

    async fn list_load_balancers(
        &self,
        account: &AccountConfig,
    ) -> Result<Vec<LoadBalancerDescriptor>> {
        self.call_count.lock().await.list_load_balancers += 1;
        self.check_account(account).await?;

        let fixture = self.fixture.lock().await;
        Ok(fixture.account(&account.name)?.load_balancers.clone())
    }

    async fn list_instances(&self, account: &AccountConfig) -> Result<Vec<InstanceDescriptor>> {
        self.call_count.lock().await.list_instances += 1;
        self.check_account(account).await?;

        let fixture = self.fixture.lock().await;
        Ok(fixture.account(&account.name)?.instances.clone())
    }

    async fn get_server_group(
        &self,
        account: &AccountConfig,
        region: &str,
        zone: Option<&str>,
        name: &str,
    ) -> Result<ServerGroupDescriptor> {
        self.call_count.lock().await.get_server_group += 1;

        let gate = self.gate.lock().await.clone();
        if let Some(gate) = gate {
            self.gate_entered.notify_one();
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        }

        self.check_account(account).await?;
        let fixture = self.fixture.lock().await;
        fixture
            .account(&account.name)?
            .server_group(region, zone, name)
    }

    async fn list_server_group_instances(
        &self,
        account: &AccountConfig,
        server_group: &ServerGroupDescriptor,
    ) -> Result<Vec<InstanceDescriptor>> {
        self.call_count.lock().await.list_server_group_instances += 1;
        self.check_account(account).await?;

        let fixture = self.fixture.lock().await;
        Ok(fixture.account(&account.name)?.instances_of(server_group))
    }
}
