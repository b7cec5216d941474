use anyhow::Result;
use async_trait::async_trait;
use kube::api::ListParams;
use kube::{Api, Client};
use tracing::debug;

use crate::core::client::kube_resources::Pod;
use crate::core::client::pod_lister_trait::PodListerTrait;

/// Page size for pod list calls; larger clusters are walked with continue tokens.
pub const POD_LIST_PAGE_SIZE: u32 = 500;

async fn list_all_pages(api: &Api<Pod>) -> Result<Vec<Pod>> {
    let mut items = Vec::new();
    let mut lp = ListParams::default().limit(POD_LIST_PAGE_SIZE);

    loop {
        let page = api.list(&lp).await?;
        items.extend(page.items);

        match page.metadata.continue_ {
            Some(token) if !token.is_empty() => lp = lp.continue_token(&token),
            _ => break,
        }
    }

    Ok(items)
}

/// Fetch all pods in the cluster
pub async fn fetch_pods(client: &Client) -> Result<Vec<Pod>> {
    let pods: Api<Pod> = Api::all(client.clone());
    let items = list_all_pages(&pods).await?;

    debug!("Discovered {} pod(s)", items.len());
    Ok(items)
}

/// Fetch pods in a specific namespace
pub async fn fetch_pods_by_namespace(client: &Client, namespace: &str) -> Result<Vec<Pod>> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let items = list_all_pages(&pods).await?;

    debug!("Discovered {} pod(s) in namespace '{}'", items.len(), namespace);
    Ok(items)
}

/// Names of the given pods, in order. Unnamed pods are skipped.
pub fn pod_names(pods: Vec<Pod>) -> Vec<String> {
    pods.into_iter().filter_map(|p| p.metadata.name).collect()
}

/// `PodListerTrait` over a live cluster.
pub struct KubePodLister {
    client: Client,
}

impl KubePodLister {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PodListerTrait for KubePodLister {
    async fn list_pod_names(&self, namespace: Option<&str>) -> Result<Vec<String>> {
        let pods = match namespace {
            Some(ns) => fetch_pods_by_namespace(&self.client, ns).await?,
            None => fetch_pods(&self.client).await?,
        };
        Ok(pod_names(pods))
    }
}
