//! The synchronization-and-aggregation pipeline. One cycle runs the stages
//! below to completion, in order; each stage returns an immutable result set
//! consumed by the next.

pub mod boards;
pub mod country_stats;
pub mod profile_stats;
pub mod ranks;
pub mod roster;
pub mod snapshots;
pub mod sync;

use anyhow::Result;
use chrono::Utc;
use tokio::time::Instant;
use tracing::info;

use crate::api::ScoreSource;
use crate::config::Config;
use crate::store::Store;

pub async fn run_cycle<S: ScoreSource>(store: &Store, source: &S, cfg: &Config) -> Result<()> {
    let started = Instant::now();

    info!("refreshing player list");
    let profiles = roster::refresh(store, source, cfg).await?;

    info!("updating player scores");
    let (maps, scores) = sync::run(store, source, &profiles).await?;

    info!("generating ranks");
    let ranked = ranks::run(store, scores, &maps, &profiles).await?;

    info!("generating profile data");
    let profile_datas = profile_stats::run(store, &ranked, &maps, &profiles).await?;

    info!("generating country data");
    let country_datas = country_stats::run(store, &profile_datas, &profiles).await?;

    info!("generating leaderboards");
    let leaderboards = boards::run(store, &profile_datas, &country_datas).await?;

    info!("generating snapshots");
    snapshots::run(store, &leaderboards, Utc::now().date_naive()).await?;

    info!(elapsed = ?started.elapsed(), "cycle finished");
    Ok(())
}
