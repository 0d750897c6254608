//! Snapshot scheduler: one dated copy of every leaderboard per calendar
//! day, with snapshots pruned once they are exactly the retention window
//! old.

use anyhow::Result;
use chrono::{Days, NaiveDate};
use tokio::time::Instant;
use tracing::info;

use crate::models::{Leaderboard, Snapshot};
use crate::store::Store;

pub const RETENTION_DAYS: u64 = 7;

pub fn snapshots_for(leaderboards: &[Leaderboard], date: NaiveDate) -> Vec<Snapshot> {
    leaderboards
        .iter()
        .map(|board| Snapshot::of(board, date))
        .collect()
}

/// The date whose snapshots fall out of the retention window today.
pub fn prune_date(today: NaiveDate) -> NaiveDate {
    today - Days::new(RETENTION_DAYS)
}

/// What one scheduler invocation should do: nothing when today's set
/// already exists, otherwise prune the expired date and insert today's
/// capture. Pure, so the once-per-day rule is testable on its own.
pub fn plan(
    already_snapshotted: bool,
    leaderboards: &[Leaderboard],
    today: NaiveDate,
) -> Option<(NaiveDate, Vec<Snapshot>)> {
    if already_snapshotted {
        return None;
    }
    Some((prune_date(today), snapshots_for(leaderboards, today)))
}

/// Idempotent per day: if today's snapshot set already exists this is a
/// no-op, otherwise the expired day is pruned and today's set is inserted.
pub async fn run(store: &Store, leaderboards: &[Leaderboard], today: NaiveDate) -> Result<()> {
    let started = Instant::now();

    let already_snapshotted = store.snapshot_exists(today).await?;
    let Some((expired, snapshots)) = plan(already_snapshotted, leaderboards, today) else {
        info!(%today, "a snapshot has already been made today, skipping");
        return Ok(());
    };

    let pruned = store.prune_snapshots(expired).await?;
    store.insert_snapshots(&snapshots).await?;

    info!(
        elapsed = ?started.elapsed(),
        %today,
        captured = snapshots.len(),
        pruned,
        "snapshot generated"
    );
    Ok(())
}
