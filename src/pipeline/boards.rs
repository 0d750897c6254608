//! Leaderboard builder: 32 fixed categories assembled from the player and
//! country aggregates. Categories are described, not hand-indexed, so the
//! set is iterated uniformly.

use std::cmp::Ordering;

use anyhow::Result;
use tokio::time::Instant;
use tracing::info;

use crate::models::{CountryData, Leaderboard, LeaderboardEntry, ProfileData};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Lower is better (rank-like metrics).
    Ascending,
    /// Higher is better (pp, percentages, counts).
    Descending,
}

/// Where a category's entries come from and which field feeds them.
#[derive(Clone, Copy)]
pub enum Metric {
    Player(fn(&ProfileData) -> f64),
    Country(fn(&CountryData) -> f64),
}

pub struct Category {
    pub name: &'static str,
    pub metric: Metric,
    pub direction: Direction,
}

/// The full fixed category set: 20 player-scoped, 12 country-scoped.
pub const CATEGORIES: &[Category] = &[
    Category {
        name: "weightedPP",
        metric: Metric::Player(|d| d.weighted_pp),
        direction: Direction::Descending,
    },
    Category {
        name: "rawPP",
        metric: Metric::Player(|d| d.raw_pp),
        direction: Direction::Descending,
    },
    Category {
        name: "weightedAverageScorePercentage",
        metric: Metric::Player(|d| d.weighted_average_score_percentage),
        direction: Direction::Descending,
    },
    Category {
        name: "averageScorePercentage",
        metric: Metric::Player(|d| d.average_score_percentage),
        direction: Direction::Descending,
    },
    Category {
        name: "weightedAverageRank",
        metric: Metric::Player(|d| d.weighted_average_rank),
        direction: Direction::Ascending,
    },
    Category {
        name: "averageRank",
        metric: Metric::Player(|d| d.average_rank),
        direction: Direction::Ascending,
    },
    Category {
        name: "weightedAverageCountryRank",
        metric: Metric::Player(|d| d.weighted_average_country_rank),
        direction: Direction::Ascending,
    },
    Category {
        name: "averageCountryRank",
        metric: Metric::Player(|d| d.average_country_rank),
        direction: Direction::Ascending,
    },
    Category {
        name: "topPP",
        metric: Metric::Player(|d| d.top_pp),
        direction: Direction::Descending,
    },
    Category {
        name: "highest96",
        metric: Metric::Player(|d| d.highest_96),
        direction: Direction::Descending,
    },
    Category {
        name: "highest97",
        metric: Metric::Player(|d| d.highest_97),
        direction: Direction::Descending,
    },
    Category {
        name: "highest98",
        metric: Metric::Player(|d| d.highest_98),
        direction: Direction::Descending,
    },
    Category {
        name: "highest99",
        metric: Metric::Player(|d| d.highest_99),
        direction: Direction::Descending,
    },
    Category {
        name: "nbOfRankedDiffPlayed",
        metric: Metric::Player(|d| d.ranked_played as f64),
        direction: Direction::Descending,
    },
    Category {
        name: "nbOf95",
        metric: Metric::Player(|d| d.above_95 as f64),
        direction: Direction::Descending,
    },
    Category {
        name: "bestRank",
        metric: Metric::Player(|d| d.best_rank as f64),
        direction: Direction::Ascending,
    },
    Category {
        name: "nbOf325",
        metric: Metric::Player(|d| d.above_325 as f64),
        direction: Direction::Descending,
    },
    Category {
        name: "nbOfCountryFirst",
        metric: Metric::Player(|d| d.country_firsts as f64),
        direction: Direction::Descending,
    },
    Category {
        name: "nbOfFirst",
        metric: Metric::Player(|d| d.firsts as f64),
        direction: Direction::Descending,
    },
    Category {
        name: "nbOfTop10",
        metric: Metric::Player(|d| d.top_tens as f64),
        direction: Direction::Descending,
    },
    Category {
        name: "countryWeightedPPaverage",
        metric: Metric::Country(|d| d.weighted_pp_average),
        direction: Direction::Descending,
    },
    Category {
        name: "countryRawPPAverage",
        metric: Metric::Country(|d| d.raw_pp_average),
        direction: Direction::Descending,
    },
    Category {
        name: "countryAverageScorePercentage",
        metric: Metric::Country(|d| d.average_score_percentage),
        direction: Direction::Descending,
    },
    Category {
        name: "countryAverageOfbestRanks",
        metric: Metric::Country(|d| d.best_rank_average),
        direction: Direction::Ascending,
    },
    Category {
        name: "countryWeightedRankAverage",
        metric: Metric::Country(|d| d.weighted_rank_average),
        direction: Direction::Ascending,
    },
    Category {
        name: "countryRankAverage",
        metric: Metric::Country(|d| d.rank_average),
        direction: Direction::Ascending,
    },
    Category {
        name: "countryWeightedAverageScorePercentage",
        metric: Metric::Country(|d| d.weighted_average_score_percentage),
        direction: Direction::Descending,
    },
    Category {
        name: "countryTopPPAverage",
        metric: Metric::Country(|d| d.top_pp_average),
        direction: Direction::Descending,
    },
    Category {
        name: "countrySumOfRankedDiffPlayed",
        metric: Metric::Country(|d| d.ranked_played_sum as f64),
        direction: Direction::Descending,
    },
    Category {
        name: "countrySumOf95",
        metric: Metric::Country(|d| d.above_95_sum as f64),
        direction: Direction::Descending,
    },
    Category {
        name: "countrySumOf325",
        metric: Metric::Country(|d| d.above_325_sum as f64),
        direction: Direction::Descending,
    },
    Category {
        name: "countrySumOfTop10",
        metric: Metric::Country(|d| d.top_tens_sum as f64),
        direction: Direction::Descending,
    },
];

pub fn build_leaderboards(
    profile_datas: &[ProfileData],
    country_datas: &[CountryData],
) -> Vec<Leaderboard> {
    CATEGORIES
        .iter()
        .map(|category| {
            let mut entries: Vec<LeaderboardEntry> = match category.metric {
                Metric::Player(get) => profile_datas
                    .iter()
                    .map(|d| LeaderboardEntry {
                        id: d.ssid.clone(),
                        value: get(d),
                    })
                    .collect(),
                Metric::Country(get) => country_datas
                    .iter()
                    .map(|d| LeaderboardEntry {
                        id: d.country.clone(),
                        value: get(d),
                    })
                    .collect(),
            };

            entries.sort_by(|a, b| {
                let ord = a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal);
                match category.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });

            Leaderboard {
                category: category.name.to_string(),
                entries,
            }
        })
        .collect()
}

/// Build all categories and replace the stored collection atomically
/// (drop then bulk-insert).
pub async fn run(
    store: &Store,
    profile_datas: &[ProfileData],
    country_datas: &[CountryData],
) -> Result<Vec<Leaderboard>> {
    let started = Instant::now();
    let leaderboards = build_leaderboards(profile_datas, country_datas);
    store.replace_leaderboards(&leaderboards).await?;
    info!(
        elapsed = ?started.elapsed(),
        categories = leaderboards.len(),
        "leaderboards generated"
    );
    Ok(leaderboards)
}
