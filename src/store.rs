//! Thin wrapper over the document store: one collection per entity kind.
//! Every write the pipeline performs goes through here, so the
//! replace-semantics upsert (delete then insert by key) lives in one place.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client, Collection, Database};
use tracing::info;

use crate::models::{CountryData, Leaderboard, Map, Profile, ProfileData, Score, Snapshot};

pub struct Store {
    db: Database,
}

impl Store {
    pub async fn connect(url: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(url).await?;
        let db = client.database(db_name);
        info!(db = db_name, "connected to document store");
        Ok(Self { db })
    }

    fn profiles(&self) -> Collection<Profile> {
        self.db.collection("profiles")
    }

    fn maps(&self) -> Collection<Map> {
        self.db.collection("maps")
    }

    fn scores(&self) -> Collection<Score> {
        self.db.collection("scores")
    }

    fn profile_datas(&self) -> Collection<ProfileData> {
        self.db.collection("profileDatas")
    }

    fn country_datas(&self) -> Collection<CountryData> {
        self.db.collection("countryDatas")
    }

    fn leaderboards(&self) -> Collection<Leaderboard> {
        self.db.collection("leaderboards")
    }

    fn snapshots(&self) -> Collection<Snapshot> {
        self.db.collection("snapshots")
    }

    pub async fn load_profiles(&self) -> Result<Vec<Profile>> {
        Ok(self.profiles().find(doc! {}).await?.try_collect().await?)
    }

    pub async fn load_maps(&self) -> Result<Vec<Map>> {
        Ok(self.maps().find(doc! {}).await?.try_collect().await?)
    }

    pub async fn load_scores(&self) -> Result<Vec<Score>> {
        Ok(self.scores().find(doc! {}).await?.try_collect().await?)
    }

    pub async fn insert_profile(&self, profile: &Profile) -> Result<()> {
        self.profiles().insert_one(profile).await?;
        Ok(())
    }

    /// Field-level update of display identity; country and `last` untouched.
    pub async fn update_profile_identity(
        &self,
        ssid: &str,
        nickname: &str,
        avatar_path: &str,
    ) -> Result<()> {
        self.profiles()
            .update_one(
                doc! { "ssid": ssid },
                doc! { "$set": { "nickname": nickname, "avatarPath": avatar_path } },
            )
            .await?;
        Ok(())
    }

    pub async fn update_profile_last(&self, ssid: &str, last: DateTime<Utc>) -> Result<()> {
        let value = mongodb::bson::to_bson(&last)?;
        self.profiles()
            .update_one(doc! { "ssid": ssid }, doc! { "$set": { "last": value } })
            .await?;
        Ok(())
    }

    pub async fn insert_map(&self, map: &Map) -> Result<()> {
        self.maps().insert_one(map).await?;
        Ok(())
    }

    /// Replace-semantics upsert keyed by (ssid, ldid).
    pub async fn replace_score(&self, score: &Score) -> Result<()> {
        let filter = doc! { "ssid": &score.ssid, "ldid": &score.ldid };
        self.scores().delete_one(filter).await?;
        self.scores().insert_one(score).await?;
        Ok(())
    }

    pub async fn replace_profile_data(&self, data: &ProfileData) -> Result<()> {
        self.profile_datas()
            .delete_one(doc! { "ssid": &data.ssid })
            .await?;
        self.profile_datas().insert_one(data).await?;
        Ok(())
    }

    pub async fn replace_country_data(&self, data: &CountryData) -> Result<()> {
        self.country_datas()
            .delete_one(doc! { "country": &data.country })
            .await?;
        self.country_datas().insert_one(data).await?;
        Ok(())
    }

    /// The leaderboard collection is replaced wholesale each cycle.
    pub async fn replace_leaderboards(&self, boards: &[Leaderboard]) -> Result<()> {
        self.leaderboards().drop().await?;
        if !boards.is_empty() {
            self.leaderboards().insert_many(boards).await?;
        }
        Ok(())
    }

    pub async fn snapshot_exists(&self, date: NaiveDate) -> Result<bool> {
        Ok(self
            .snapshots()
            .find_one(doc! { "date": date.to_string() })
            .await?
            .is_some())
    }

    pub async fn prune_snapshots(&self, date: NaiveDate) -> Result<u64> {
        let result = self
            .snapshots()
            .delete_many(doc! { "date": date.to_string() })
            .await?;
        Ok(result.deleted_count)
    }

    pub async fn insert_snapshots(&self, snapshots: &[Snapshot]) -> Result<()> {
        if !snapshots.is_empty() {
            self.snapshots().insert_many(snapshots).await?;
        }
        Ok(())
    }
}
