//! Profile directory: refresh the set of known players from the paginated
//! roster of the top `roster_size` ranked players.

use anyhow::Result;
use tokio::time::Instant;
use tracing::info;

use crate::api::models::RosterEntry;
use crate::api::ScoreSource;
use crate::config::{Config, ROSTER_PAGE_SIZE};
use crate::models::Profile;
use crate::store::Store;

/// A persistence action derived from one roster entry.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterAction {
    Insert(Profile),
    UpdateIdentity {
        ssid: String,
        nickname: String,
        avatar_path: String,
    },
}

/// Merge one roster page into the in-memory profile list and return the
/// store writes it implies. Unknown players are inserted with no `last`
/// timestamp; known players get a field-level identity update when their
/// nickname or avatar changed. Profiles are never deleted.
pub fn apply_roster_entries(
    profiles: &mut Vec<Profile>,
    entries: Vec<RosterEntry>,
) -> Vec<RosterAction> {
    let mut actions = Vec::new();

    for entry in entries {
        match profiles.iter_mut().find(|p| p.ssid == entry.player_id) {
            Some(existing) => {
                if existing.nickname != entry.player_name || existing.avatar_path != entry.avatar {
                    existing.nickname = entry.player_name.clone();
                    existing.avatar_path = entry.avatar.clone();
                    actions.push(RosterAction::UpdateIdentity {
                        ssid: existing.ssid.clone(),
                        nickname: entry.player_name,
                        avatar_path: entry.avatar,
                    });
                }
            }
            None => {
                let profile = Profile {
                    ssid: entry.player_id,
                    nickname: entry.player_name,
                    avatar_path: entry.avatar,
                    country: entry.country,
                    last: None,
                };
                profiles.push(profile.clone());
                actions.push(RosterAction::Insert(profile));
            }
        }
    }

    actions
}

pub async fn refresh<S: ScoreSource>(
    store: &Store,
    source: &S,
    cfg: &Config,
) -> Result<Vec<Profile>> {
    let started = Instant::now();
    let mut profiles = store.load_profiles().await?;
    let pages = cfg.roster_size / ROSTER_PAGE_SIZE;

    for page in 1..=pages {
        let roster = source.roster_page(page).await?;
        for action in apply_roster_entries(&mut profiles, roster.players) {
            match action {
                RosterAction::Insert(profile) => store.insert_profile(&profile).await?,
                RosterAction::UpdateIdentity {
                    ssid,
                    nickname,
                    avatar_path,
                } => {
                    store
                        .update_profile_identity(&ssid, &nickname, &avatar_path)
                        .await?
                }
            }
        }
    }

    info!(
        elapsed = ?started.elapsed(),
        profiles = profiles.len(),
        "player list refreshed"
    );
    Ok(profiles)
}
