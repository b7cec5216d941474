use anyhow::Result;
use async_trait::async_trait;

/// Read-only enumeration of pod names.
#[async_trait]
pub trait PodListerTrait: Send + Sync {
    /// `None` lists every namespace the caller can see.
    async fn list_pod_names(&self, namespace: Option<&str>) -> Result<Vec<String>>;
}
