use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use rankline::api::ApiClient;
use rankline::config::Config;
use rankline::{logging, pipeline, store::Store};

/// Pause before restarting after a failed cycle, so a persistently broken
/// upstream doesn't turn the loop into a hot spin.
const FAILED_CYCLE_PAUSE: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    rankline::config::load_dotenv();
    logging::init("rankline=info,info")?;

    let cfg = Config::from_env();
    info!(
        api_root = %cfg.api_root,
        db = %cfg.db_name,
        roster_size = cfg.roster_size,
        pace_delay_ms = cfg.pace_delay_ms,
        "starting"
    );

    let store = Store::connect(&cfg.mongo_url, &cfg.db_name)
        .await
        .context("failed to connect to the document store")?;
    let api = ApiClient::new(&cfg).context("failed to build the API client")?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("stop signal received, exiting at the end of this cycle");
                stop.store(true, Ordering::SeqCst);
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("stop signal received a second time, forcing exit");
                    std::process::exit(1);
                }
            }
        });
    }

    while !stop.load(Ordering::SeqCst) {
        if let Err(err) = pipeline::run_cycle(&store, &api, &cfg).await {
            error!(error = %format!("{err:#}"), "cycle failed");
            tokio::time::sleep(FAILED_CYCLE_PAUSE).await;
        }
    }

    info!("exiting");
    Ok(())
}
