//! Read-modify-write of a single record: fetch it, replace its value, persist it,
//! and print the transition.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, warn};

use cloud_client_samples::core::config::store_config::StoreConfig;
use cloud_client_samples::core::logging::init_logging;
use cloud_client_samples::core::persistence::record::record_entity::{RecordKey, DEFAULT_KIND};
use cloud_client_samples::domain::record::service::record_update_service::run_record_update;

#[derive(Debug, Parser)]
#[command(name = "datastore-update", about = "Update one entity's value in a keyed store")]
struct Args {
    /// Project id / store namespace (overrides DATASTORE_PROJECT_ID)
    #[arg(long)]
    project: Option<String>,

    /// Entity kind
    #[arg(long, default_value = DEFAULT_KIND)]
    kind: String,

    /// Entity name
    #[arg(long, default_value = "stringID")]
    id: String,

    /// New value to store
    #[arg(long, default_value = "Hello World!")]
    value: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let _log_guard = init_logging("datastore-update");
    let args = Args::parse();

    let outcome = tokio::select! {
        res = run(args) => res,
        _ = tokio::signal::ctrl_c() => {
            // dropping the run future drops the store handle, which releases it
            warn!("Interrupted; record update abandoned");
            return ExitCode::from(130);
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = StoreConfig::from_env()?;
    if let Some(project) = args.project {
        config = config.with_namespace(project);
    }

    let key = RecordKey::new(args.kind, args.id)?;
    let transition = run_record_update(&config, &key, &args.value).await?;

    println!("{}", transition.report());
    Ok(())
}
