//! Single server group refresh
//!
//! Best-effort path run after a deploy or destroy. It never waits for the
//! write lock: if a full reload holds it, the refresh is skipped and the
//! next reload converges instead.

use std::collections::HashSet;
use std::fmt;

use log::{debug, info};
use serde::Serialize;

use super::TopologyCache;
use super::derive::{
    LoadBalancerHealthIndex, build_instance, build_server_group, migrate_load_balancer_health,
};
use crate::error::Result;
use crate::naming::parse_resource_name;
use crate::provider::CloudProvider;

/// Notification that one server group changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceChange {
    pub account: String,
    pub region: String,
    /// Set for zonal server groups
    pub zone: Option<String>,
    pub server_group: String,
}

impl ResourceChange {
    pub fn new(
        account: impl Into<String>,
        region: impl Into<String>,
        zone: Option<&str>,
        server_group: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
            zone: zone.map(str::to_string),
            server_group: server_group.into(),
        }
    }
}

impl fmt::Display for ResourceChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.zone.as_deref().unwrap_or(&self.region);
        write!(f, "{}/{}/{}", self.account, location, self.server_group)
    }
}

/// Result of [`TopologyCache::refresh_server_group`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RefreshOutcome {
    /// The server group was re-derived and published
    Refreshed { generation: u64 },
    /// The provider no longer knows the server group; it was dropped
    Removed { generation: u64 },
    /// Another writer held the lock
    Skipped,
}

impl<P: CloudProvider + 'static> TopologyCache<P> {
    /// Re-derive one server group and publish it on a copy of the snapshot.
    ///
    /// Load balancer summaries are not re-indexed here; the next full
    /// reload brings them up to date.
    pub async fn refresh_server_group(&self, change: &ResourceChange) -> Result<RefreshOutcome> {
        let Some(guard) = self.store.try_lock() else {
            info!("Could not refresh {} now: a reload is in progress", change);
            return Ok(RefreshOutcome::Skipped);
        };

        let account = self.account(&change.account)?;
        let provider = self.provider.as_ref();

        let descriptor = match provider
            .get_server_group(
                &account,
                &change.region,
                change.zone.as_deref(),
                &change.server_group,
            )
            .await
        {
            Ok(descriptor) => Some(descriptor),
            Err(err) if err.is_not_found() => {
                debug!("{} not found; treating as deleted", change);
                None
            }
            Err(err) => return Err(err),
        };

        let fresh = match descriptor {
            Some(descriptor) => {
                let autoscalers = provider.list_autoscalers(&account).await?;
                let no_lb_health = LoadBalancerHealthIndex::default();
                let instances = provider
                    .list_server_group_instances(&account, &descriptor)
                    .await?
                    .iter()
                    .map(|i| {
                        build_instance(&account.name, i, &no_lb_health, Some(&descriptor.name))
                    })
                    .collect();
                Some(build_server_group(
                    &account.name,
                    &descriptor,
                    &autoscalers,
                    instances,
                ))
            }
            None => None,
        };

        let names = parse_resource_name(&change.server_group);
        let mut candidate = (*guard.current()).clone();
        let cluster = candidate.cluster_entry(&account.name, &names.app, &names.cluster);
        let previous = cluster.remove_named(&change.server_group);

        let removed = fresh.is_none();
        match fresh {
            Some(mut server_group) => {
                migrate_load_balancer_health(&previous, &mut server_group);
                let claimed: HashSet<String> =
                    server_group.instances.iter().map(|i| i.name.clone()).collect();
                cluster.insert(server_group);
                // Instances claimed by the group are no longer standalone.
                if let Some(standalone) = candidate.standalone_instances.get_mut(&account.name) {
                    standalone.retain(|i| !claimed.contains(&i.name));
                }
            }
            None => candidate.prune_cluster(&account.name, &names.app, &names.cluster),
        }

        let generation = guard.publish(candidate).generation;
        Ok(if removed {
            RefreshOutcome::Removed { generation }
        } else {
            RefreshOutcome::Refreshed { generation }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::tests::{config, scenario_provider};
    use crate::model::{HealthEntry, HealthSource, HealthState};
    use crate::provider::MockProvider;
    use crate::provider::fixtures::{ServerGroupBuilder, autoscaler_descriptor, instance_descriptor};

    fn change(name: &str) -> ResourceChange {
        ResourceChange::new("acct1", "us-east1", Some("us-east1-b"), name)
    }

    async fn loaded_cache() -> (Arc<MockProvider>, TopologyCache<MockProvider>) {
        let provider = Arc::new(scenario_provider());
        let cache = TopologyCache::new(provider.clone(), &config(&["acct1"]));
        cache.reload().await.unwrap();
        (provider, cache)
    }

    #[test]
    fn test_resource_change_display() {
        assert_eq!(change("app-v001").to_string(), "acct1/us-east1-b/app-v001");
        let regional = ResourceChange::new("acct1", "us-east1", None, "app-v002");
        assert_eq!(regional.to_string(), "acct1/us-east1/app-v002");
    }

    #[tokio::test]
    async fn test_refresh_migrates_load_balancer_health() {
        let (_provider, cache) = loaded_cache().await;

        let outcome = cache.refresh_server_group(&change("app-v001")).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Refreshed { generation: 2 });

        let i1 = cache.instance("acct1", "i-1").unwrap();
        assert_eq!(i1.health[0].source, HealthSource::Platform);
        let lb = i1.load_balancer_health("lb-x").unwrap();
        assert_eq!(lb.state, HealthState::Up);

        let i2 = cache.instance("acct1", "i-2").unwrap();
        assert!(i2.health.iter().all(|h| !h.is_load_balancer()));
    }

    #[tokio::test]
    async fn test_repeated_refresh_carries_health_forward() {
        let (_provider, cache) = loaded_cache().await;

        cache.refresh_server_group(&change("app-v001")).await.unwrap();
        cache.refresh_server_group(&change("app-v001")).await.unwrap();

        let i1 = cache.instance("acct1", "i-1").unwrap();
        let from_lb: Vec<&HealthEntry> = i1
            .health
            .iter()
            .filter(|h| h.is_from_load_balancer("lb-x"))
            .collect();
        assert_eq!(from_lb.len(), 1);
        assert_eq!(cache.snapshot().generation, 3);
    }

    #[tokio::test]
    async fn test_refresh_picks_up_new_instances_and_autoscaler() {
        let (provider, cache) = loaded_cache().await;
        provider
            .update(|fixture| {
                let account = fixture.account_mut("acct1");
                let descriptor = ServerGroupBuilder::zonal("app-v001", "us-east1-b")
                    .load_balancer("lb-x")
                    .instances(&["i-1", "i-2", "i-3"])
                    .build();
                account.autoscalers.push(autoscaler_descriptor(&descriptor, 2, 6));
                account.remove_server_group("app-v001");
                account.regions.entry("us-east1".to_string()).or_default().push(descriptor);
                account.instances.push(instance_descriptor("i-3", "us-east1-b"));
            })
            .await;

        cache.refresh_server_group(&change("app-v001")).await.unwrap();

        let groups = cache.server_groups("acct1", &["app-v001".to_string()]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].instances.len(), 3);
        assert_eq!(groups[0].capacity.min, 2);
        assert_eq!(groups[0].capacity.max, 6);
        assert_eq!(provider.counts().await.list_autoscalers, 2);
    }

    #[tokio::test]
    async fn test_refresh_claims_standalone_instance() {
        let (provider, cache) = loaded_cache().await;
        provider
            .update(|fixture| {
                let account = fixture.account_mut("acct1");
                account.remove_server_group("app-v001");
                account.regions.entry("us-east1".to_string()).or_default().push(
                    ServerGroupBuilder::zonal("app-v001", "us-east1-b")
                        .instances(&["i-1", "i-2", "bastion"])
                        .build(),
                );
            })
            .await;

        cache.refresh_server_group(&change("app-v001")).await.unwrap();

        let snapshot = cache.snapshot();
        assert!(snapshot.standalone_instances["acct1"].is_empty());
        let bastion = cache.instance("acct1", "bastion").unwrap();
        assert_eq!(bastion.server_group.as_deref(), Some("app-v001"));
        let copies = snapshot
            .server_groups()
            .flat_map(|sg| sg.instances.iter())
            .filter(|i| i.name == "bastion")
            .count();
        assert_eq!(copies, 1);
    }

    #[tokio::test]
    async fn test_not_found_removes_server_group() {
        let (provider, cache) = loaded_cache().await;
        let before = cache.snapshot();
        provider
            .update(|fixture| fixture.account_mut("acct1").remove_server_group("app-v001"))
            .await;

        let outcome = cache.refresh_server_group(&change("app-v001")).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Removed { generation: 2 });

        let after = cache.snapshot();
        assert!(!after.applications.contains_key("app"));
        assert_eq!(after.standalone_instances, before.standalone_instances);
        assert_eq!(after.load_balancers, before.load_balancers);
        assert_eq!(after.images, before.images);
    }

    #[tokio::test]
    async fn test_not_found_keeps_sibling_server_groups() {
        let provider = Arc::new(scenario_provider().with_server_group(
            "acct1",
            ServerGroupBuilder::zonal("app-v002", "us-east1-b").build(),
        ));
        let cache = TopologyCache::new(provider.clone(), &config(&["acct1"]));
        cache.reload().await.unwrap();
        provider
            .update(|fixture| fixture.account_mut("acct1").remove_server_group("app-v002"))
            .await;

        cache.refresh_server_group(&change("app-v002")).await.unwrap();

        let snapshot = cache.snapshot();
        let cluster = snapshot.applications["app"].cluster("acct1", "app").unwrap();
        let names: Vec<_> = cluster.server_groups.iter().map(|sg| sg.name.as_str()).collect();
        assert_eq!(names, vec!["app-v001"]);
    }

    #[tokio::test]
    async fn test_refresh_of_unknown_group_creates_cluster() {
        let (provider, cache) = loaded_cache().await;
        provider
            .update(|fixture| {
                fixture
                    .account_mut("acct1")
                    .regions
                    .entry("us-east1".to_string())
                    .or_default()
                    .push(ServerGroupBuilder::zonal("orders-prod-v001", "us-east1-b").build());
            })
            .await;

        cache
            .refresh_server_group(&change("orders-prod-v001"))
            .await
            .unwrap();

        let snapshot = cache.snapshot();
        let cluster = snapshot.applications["orders"]
            .cluster("acct1", "orders-prod")
            .unwrap();
        assert_eq!(cluster.server_groups.len(), 1);
    }

    #[tokio::test]
    async fn test_held_lock_skips_without_touching_store() {
        let (provider, cache) = loaded_cache().await;
        let before = cache.snapshot();
        let guard = cache.store().lock().await;

        let outcome = cache.refresh_server_group(&change("app-v001")).await.unwrap();

        assert_eq!(outcome, RefreshOutcome::Skipped);
        assert_eq!(provider.counts().await.get_server_group, 0);
        drop(guard);
        assert!(Arc::ptr_eq(&before, &cache.snapshot()));
    }

    #[tokio::test]
    async fn test_provider_error_leaves_store_untouched() {
        let (provider, cache) = loaded_cache().await;
        let before = cache.snapshot();
        provider.fail_account("acct1").await;

        let err = cache.refresh_server_group(&change("app-v001")).await.unwrap_err();

        assert!(!err.is_not_found());
        assert!(Arc::ptr_eq(&before, &cache.snapshot()));
        assert!(!cache.store().is_locked());
    }

    #[tokio::test]
    async fn test_full_reload_waits_for_running_refresh() {
        let provider = Arc::new(scenario_provider());
        let cache = Arc::new(TopologyCache::new(provider.clone(), &config(&["acct1"])));
        cache.reload().await.unwrap();

        let entered = provider.hold_server_group_fetch().await;
        let refresh = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.refresh_server_group(&change("app-v001")).await })
        };
        entered.notified().await;

        let reload = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.reload().await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!reload.is_finished());
        assert_eq!(cache.snapshot().generation, 1);

        provider.release_server_group_fetch().await;
        let outcome = refresh.await.unwrap().unwrap();
        assert_eq!(outcome, RefreshOutcome::Refreshed { generation: 2 });
        let report = reload.await.unwrap().unwrap();
        assert_eq!(report.generation, 3);
    }
}
