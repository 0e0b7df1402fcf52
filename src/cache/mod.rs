//! Topology cache
//!
//! Keeps an in-memory snapshot of every configured account's compute
//! topology. Two pipelines write it:
//!
//! - [`TopologyCache::reload`] rebuilds every account from scratch, waiting
//!   for the write lock if it has to.
//! - [`TopologyCache::refresh_server_group`] re-derives one server group on
//!   a copy of the current snapshot, and gives up at once if the lock is busy.
//!
//! Readers use [`TopologyCache::snapshot`] and the lookup helpers, which never
//! wait on either pipeline.

use std::sync::{Arc, PoisonError, RwLock};

use log::{info, warn};
use tokio::task::JoinHandle;

use crate::config::{AccountConfig, Config};
use crate::error::{ConfigError, Result};
use crate::model::{Instance, LoadBalancer, ServerGroup, Topology};
use crate::provider::CloudProvider;

mod derive;
pub mod indexer;
pub mod reload;
pub mod scheduler;
pub mod store;
pub mod update;

pub use reload::ReloadReport;
pub use scheduler::ReloadScheduler;
pub use store::SnapshotStore;
pub use update::{RefreshOutcome, ResourceChange};

/// In-memory topology cache over a [`CloudProvider`]
pub struct TopologyCache<P: CloudProvider> {
    provider: Arc<P>,
    store: SnapshotStore,
    accounts: RwLock<Vec<AccountConfig>>,
    base_image_projects: Vec<String>,
    max_concurrent_requests: usize,
}

impl<P: CloudProvider + 'static> TopologyCache<P> {
    pub fn new(provider: Arc<P>, config: &Config) -> Self {
        Self {
            provider,
            store: SnapshotStore::new(),
            accounts: RwLock::new(config.accounts.clone()),
            base_image_projects: config.base_image_projects.clone(),
            max_concurrent_requests: config.reload.max_concurrent_requests,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Replace the account list. Takes effect on the next reload.
    pub fn set_accounts(&self, accounts: Vec<AccountConfig>) {
        let mut current = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        *current = accounts;
    }

    pub fn accounts(&self) -> Vec<AccountConfig> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn account(&self, name: &str) -> Result<AccountConfig> {
        self.accounts()
            .into_iter()
            .find(|a| a.name == name)
            .ok_or_else(|| ConfigError::UnknownAccount(name.to_string()).into())
    }

    /// The published snapshot.
    pub fn snapshot(&self) -> Arc<Topology> {
        self.store.snapshot()
    }

    /// An instance by account and name, whether owned by a server group or standalone.
    pub fn instance(&self, account: &str, id: &str) -> Option<Instance> {
        self.snapshot().find_instance(account, id).cloned()
    }

    /// Server groups in an account matching any of `names`.
    pub fn server_groups(&self, account: &str, names: &[String]) -> Vec<ServerGroup> {
        self.snapshot()
            .find_server_groups(account, names)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every load balancer in an account.
    pub fn load_balancers(&self, account: &str) -> Vec<LoadBalancer> {
        self.snapshot()
            .account_load_balancers(account)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Refresh one server group in the background.
    ///
    /// Returns the task handle; callers may drop it.
    pub fn on_resource_changed(self: &Arc<Self>, change: ResourceChange) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            match cache.refresh_server_group(&change).await {
                Ok(RefreshOutcome::Skipped) => {}
                Ok(outcome) => info!("Refreshed {}: {:?}", change, outcome),
                Err(err) => warn!("Failed to refresh {}: {}", change, err),
            }
        })
    }
}
