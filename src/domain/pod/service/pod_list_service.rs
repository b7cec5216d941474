use anyhow::Result;
use tracing::info;

use crate::core::client::pod_lister_trait::PodListerTrait;

/// `[Pod Name <index>]<name>`
pub fn format_pod_line(index: usize, name: &str) -> String {
    format!("[Pod Name {}]{}", index, name)
}

/// List pod names and render one output line per pod.
pub async fn list_pod_lines<L>(lister: &L, namespace: Option<&str>) -> Result<Vec<String>>
where
    L: PodListerTrait + ?Sized,
{
    let names = lister.list_pod_names(namespace).await?;
    info!(
        "Listed {} pod(s) in {}",
        names.len(),
        namespace.map(|ns| format!("namespace '{}'", ns)).unwrap_or_else(|| "all namespaces".into())
    );

    Ok(names
        .iter()
        .enumerate()
        .map(|(i, name)| format_pod_line(i, name))
        .collect())
}
