//! Full reload pipeline
//!
//! Rebuilds every account into a fresh candidate graph, indexes load
//! balancer relationships and publishes the result. Accounts are processed
//! one after another; an account that fails is left out of the candidate
//! entirely and does not stop the others.

use std::collections::{BTreeMap, HashMap};

use log::{debug, error, info};
use serde::Serialize;

use super::TopologyCache;
use super::derive::{
    LoadBalancerHealthIndex, build_instance, build_load_balancer, build_server_group,
};
use super::indexer::index_load_balancers;
use crate::config::AccountConfig;
use crate::error::{Error, Result};
use crate::model::{Image, LoadBalancer, Topology};
use crate::provider::{
    AutoscalerDescriptor, Batch, CloudProvider, LoadBalancerDescriptor, RegionResources,
    prune_base_image_projects, region_of_zone,
};

/// Summary of one full reload
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReloadReport {
    /// Generation published by this reload
    pub generation: u64,
    pub accounts_refreshed: Vec<String>,
    /// (account, error) for every account left out of this cycle
    pub failed_accounts: Vec<(String, String)>,
    /// True when no accounts were configured and applications were flushed
    pub flushed: bool,
}

/// Responses of the aggregated per-account listings
enum Aggregated {
    Autoscalers(Vec<AutoscalerDescriptor>),
    LoadBalancers(Vec<LoadBalancerDescriptor>),
}

impl<P: CloudProvider + 'static> TopologyCache<P> {
    /// Rebuild the whole snapshot from the provider.
    ///
    /// Waits for the store's write lock. With no accounts configured the
    /// application map is flushed. If every account fails, nothing is
    /// published and the previous snapshot stays in place.
    pub async fn reload(&self) -> Result<ReloadReport> {
        let accounts = self.accounts();

        if accounts.is_empty() {
            let guard = self.store.lock().await;
            let mut flushed = (*guard.current()).clone();
            flushed.applications.clear();
            let published = guard.publish(flushed);
            info!("No accounts configured; flushed cached applications");
            return Ok(ReloadReport {
                generation: published.generation,
                flushed: true,
                ..ReloadReport::default()
            });
        }

        let guard = self.store.lock().await;
        debug!("Full reload started for {} accounts", accounts.len());

        let mut candidate = Topology::new();
        let mut report = ReloadReport::default();

        for account in &accounts {
            match self.build_account(account).await {
                Ok(account_topology) => {
                    candidate.merge(account_topology);
                    report.accounts_refreshed.push(account.name.clone());
                }
                Err(err) => {
                    let err = Error::for_account(&account.name, err);
                    error!("Dropping account from this reload: {}", err);
                    report
                        .failed_accounts
                        .push((account.name.clone(), err.to_string()));
                }
            }
        }

        if report.accounts_refreshed.is_empty() {
            return Err(Error::Other(format!(
                "every account failed to load ({}); keeping previous snapshot",
                report.failed_accounts.len()
            )));
        }

        index_load_balancers(&mut candidate);
        let published = guard.publish(candidate);
        drop(guard);

        report.generation = published.generation;
        info!(
            "Full reload published generation {}: {} accounts, {} failed, {} server groups",
            report.generation,
            report.accounts_refreshed.len(),
            report.failed_accounts.len(),
            published.server_group_count()
        );
        Ok(report)
    }

    /// Build one account's subgraph.
    async fn build_account(&self, account: &AccountConfig) -> Result<Topology> {
        let provider = self.provider.as_ref();
        let max_concurrent = self.max_concurrent_requests;

        let regions: Vec<String> = provider
            .list_regions(account)
            .await?
            .into_iter()
            .filter(|r| account.includes_region(r))
            .collect();

        let mut region_batch: Batch<'_, RegionResources> =
            Batch::new(format!("{}/regions", account.name), max_concurrent);
        for region in &regions {
            region_batch.queue(provider.list_region_resources(account, region));
        }

        let mut image_projects = vec![account.project.clone()];
        image_projects.extend(account.image_projects.iter().cloned());
        image_projects.extend(prune_base_image_projects(&self.base_image_projects, account));

        let mut image_batch: Batch<'_, Vec<Image>> =
            Batch::new(format!("{}/images", account.name), max_concurrent);
        for project in &image_projects {
            image_batch.queue(provider.list_images(account, project));
        }

        let mut aggregated_batch: Batch<'_, Aggregated> =
            Batch::new(format!("{}/aggregated", account.name), max_concurrent);
        aggregated_batch.queue(async move {
            provider
                .list_autoscalers(account)
                .await
                .map(Aggregated::Autoscalers)
        });
        aggregated_batch.queue(async move {
            provider
                .list_load_balancers(account)
                .await
                .map(Aggregated::LoadBalancers)
        });

        let region_resources = region_batch.execute_if_non_empty().await?;
        let images: Vec<Image> = image_batch
            .execute_if_non_empty()
            .await?
            .into_iter()
            .flatten()
            .collect();

        let mut autoscalers = Vec::new();
        let mut load_balancers = Vec::new();
        for response in aggregated_batch.execute_if_non_empty().await? {
            match response {
                Aggregated::Autoscalers(found) => autoscalers.extend(found),
                Aggregated::LoadBalancers(found) => load_balancers.extend(
                    found
                        .into_iter()
                        .filter(|lb| account.includes_region(&lb.region)),
                ),
            }
        }

        let mut instance_batch = Batch::new(format!("{}/instances", account.name), max_concurrent);
        instance_batch.queue(provider.list_instances(account));
        let instances: Vec<_> = instance_batch
            .execute_if_non_empty()
            .await?
            .into_iter()
            .flatten()
            .filter(|i| account.includes_region(region_of_zone(&i.zone)))
            .collect();

        // Attach instances to the group claiming them, or leave them standalone.
        let descriptors: Vec<_> = region_resources
            .iter()
            .flat_map(|r| r.server_groups.iter())
            .collect();
        let mut owners: HashMap<&str, usize> = HashMap::new();
        for (idx, descriptor) in descriptors.iter().enumerate() {
            for name in &descriptor.instances {
                owners.entry(name.as_str()).or_insert(idx);
            }
        }

        let lb_health = LoadBalancerHealthIndex::new(&load_balancers);
        let mut owned: Vec<Vec<_>> = vec![Vec::new(); descriptors.len()];
        let mut standalone = Vec::new();
        for descriptor in &instances {
            match owners.get(descriptor.name.as_str()) {
                Some(&idx) => owned[idx].push(build_instance(
                    &account.name,
                    descriptor,
                    &lb_health,
                    Some(&descriptors[idx].name),
                )),
                None => standalone.push(build_instance(&account.name, descriptor, &lb_health, None)),
            }
        }

        let mut topology = Topology::new();
        for (descriptor, instances) in descriptors.into_iter().zip(owned) {
            topology.insert_server_group(build_server_group(
                &account.name,
                descriptor,
                &autoscalers,
                instances,
            ));
        }

        let mut by_region: BTreeMap<String, Vec<LoadBalancer>> = BTreeMap::new();
        for descriptor in &load_balancers {
            by_region
                .entry(descriptor.region.clone())
                .or_default()
                .push(build_load_balancer(&account.name, descriptor));
        }

        debug!(
            "Account {}: {} regions, {} server groups, {} standalone instances, {} load balancers, {} images",
            account.name,
            regions.len(),
            topology.server_group_count(),
            standalone.len(),
            load_balancers.len(),
            images.len()
        );

        topology.load_balancers.insert(account.name.clone(), by_region);
        topology
            .standalone_instances
            .insert(account.name.clone(), standalone);
        topology.images.insert(account.name.clone(), images);
        Ok(topology)
    }
}
