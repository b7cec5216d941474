use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

/// `$HOME/.kube/config`, when a home directory is known.
pub fn default_kubeconfig_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(|home| PathBuf::from(home).join(".kube").join("config"))
}

/// Creates a Kubernetes client from a kubeconfig file, or in-cluster/environment config
/// when no usable file is given.
pub async fn build_kube_client(kubeconfig: Option<&Path>) -> Result<Client> {
    let config = match kubeconfig.filter(|p| p.is_file()) {
        Some(path) => {
            debug!("Using kubeconfig at {:?}", path);
            let kc = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {:?}", path))?;
            Config::from_custom_kubeconfig(kc, &KubeConfigOptions::default())
                .await
                .context("Failed to load kubeconfig")?
        }
        None => {
            debug!("No kubeconfig file; inferring configuration");
            Config::infer()
                .await
                .context("Failed to infer Kubernetes configuration")?
        }
    };

    let client = Client::try_from(config).context("Failed to build Kubernetes client")?;
    debug!("Kubernetes client initialized successfully");
    Ok(client)
}
