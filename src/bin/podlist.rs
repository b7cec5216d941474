//! One-shot listing of pod names in a Kubernetes cluster.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::error;

use cloud_client_samples::core::client::kube_client::{build_kube_client, default_kubeconfig_path};
use cloud_client_samples::core::client::pods::KubePodLister;
use cloud_client_samples::core::logging::init_logging;
use cloud_client_samples::domain::pod::service::pod_list_service::list_pod_lines;

#[derive(Debug, Parser)]
#[command(name = "podlist", about = "List pod names in the cluster")]
struct Args {
    /// kubeconfig config file (defaults to $HOME/.kube/config)
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Only list pods in this namespace (defaults to all namespaces)
    #[arg(long, short)]
    namespace: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let _log_guard = init_logging("podlist");
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let kubeconfig = match args.kubeconfig {
        Some(path) if !path.is_file() => bail!("kubeconfig {:?} does not exist", path),
        Some(path) => Some(path),
        None => default_kubeconfig_path(),
    };

    let client = build_kube_client(kubeconfig.as_deref()).await?;
    let lister = KubePodLister::new(client);

    for line in list_pod_lines(&lister, args.namespace.as_deref()).await? {
        println!("{}", line);
    }
    Ok(())
}
