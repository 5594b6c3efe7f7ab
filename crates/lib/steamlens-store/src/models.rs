use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Operating system a game can declare support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Mac,
    Linux,
}

impl Platform {
    pub const ALL: [Self; 3] = [Self::Windows, Self::Mac, Self::Linux];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Mac => "mac",
            Self::Linux => "linux",
        }
    }

    /// Support flag column on `games`.
    #[must_use]
    pub const fn column(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Share of positive reviews, or `None` for a game nobody reviewed.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn positive_ratio(positive: i64, negative: i64) -> Option<f64> {
    let total = positive.checked_add(negative)?;
    if total <= 0 {
        return None;
    }
    Some(positive as f64 / total as f64)
}

/// Full row of the `games` fact table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Game {
    pub app_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_owners: Option<String>,
    pub peak_ccu: i64,
    pub required_age: i64,
    pub price: f64,
    pub discount: i64,
    pub dlc_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_the_game: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_languages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub windows: bool,
    pub mac: bool,
    pub linux: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metacritic_score: Option<i64>,
    pub user_score: i64,
    pub positive_reviews: i64,
    pub negative_reviews: i64,
    pub achievements: i64,
    pub recommendations: i64,
    pub avg_playtime_forever: i64,
    pub avg_playtime_2weeks: i64,
    pub median_playtime_forever: i64,
    pub median_playtime_2weeks: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

/// Lightweight projection of a game used by list results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct GameSummary {
    pub app_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    pub price: f64,
    pub positive_reviews: i64,
    pub negative_reviews: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishers: Option<String>,
    pub windows: bool,
    pub mac: bool,
    pub linux: bool,
}

/// A game with its taxonomy resolved through the association tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct GameDetail {
    #[serde(flatten)]
    pub game: Game,
    pub genre_names: Vec<String>,
    pub tag_names: Vec<String>,
    pub category_names: Vec<String>,
}

/// Game ranked by its share of positive reviews.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TopRatedGame {
    #[serde(flatten)]
    pub game: GameSummary,
    pub total_reviews: i64,
    pub positive_ratio: f64,
}

/// Game counts per fixed price range.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct PriceBuckets {
    /// Price exactly zero.
    pub free: i64,
    /// Above 0, up to 5.
    pub up_to_5: i64,
    /// Above 5, up to 20.
    pub from_5_to_20: i64,
    /// Above 20, up to 60.
    pub from_20_to_60: i64,
    /// Above 60.
    pub above_60: i64,
}

impl PriceBuckets {
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.free + self.up_to_5 + self.from_5_to_20 + self.from_20_to_60 + self.above_60
    }
}

/// Price distribution over a (possibly scoped) set of games.
///
/// Mean, median, min and max are `None` when the set is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PriceStatistics {
    pub game_count: i64,
    pub mean_price: Option<f64>,
    pub median_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub buckets: PriceBuckets,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct YearPriceTrend {
    pub year: i32,
    pub game_count: i64,
    pub mean_price: f64,
    /// Difference between this year's mean and the mean over all plotted years.
    pub diff_from_overall: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct GenreStatistics {
    pub genre: String,
    pub game_count: i64,
    pub mean_price: f64,
    pub mean_playtime_minutes: f64,
    pub mean_positive_reviews: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct GenrePlaytime {
    pub genre: String,
    pub game_count: i64,
    pub mean_playtime_hours: f64,
    pub mean_price: f64,
    /// Mean price divided by mean hours played; `None` when nobody played.
    pub price_per_hour: Option<f64>,
}

/// Review figures for games supporting one platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PlatformReviews {
    pub platform: Platform,
    pub game_count: i64,
    /// Games with at least one review; only these contribute to the ratio.
    pub reviewed_games: i64,
    pub mean_positive_ratio: Option<f64>,
    pub mean_positive_reviews: Option<f64>,
    pub mean_negative_reviews: Option<f64>,
}

/// Recommendation figures for games within one positive-ratio band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RatioBucket {
    pub label: String,
    pub lower_ratio: f64,
    pub upper_ratio: f64,
    pub game_count: i64,
    pub mean_recommendations: f64,
    pub mean_positive_ratio: f64,
    pub mean_positive_reviews: f64,
    pub mean_negative_reviews: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PublisherSatisfaction {
    pub publisher: String,
    pub game_count: i64,
    pub mean_positive_ratio: f64,
    pub mean_price: f64,
    pub mean_positive_reviews: f64,
}

/// Discount figures for games within one age band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct DiscountBand {
    pub label: String,
    pub min_age: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i32>,
    pub game_count: i64,
    pub mean_discount: f64,
    /// Games discounted by more than half.
    pub large_discounts: i64,
    pub mean_price: f64,
}

/// Dataset-wide totals and means. Means are `None` on an empty dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct DatasetSummary {
    pub total_games: i64,
    pub total_genres: i64,
    pub total_tags: i64,
    pub total_categories: i64,
    pub free_games: i64,
    pub windows_games: i64,
    pub mac_games: i64,
    pub linux_games: i64,
    pub earliest_release: Option<String>,
    pub latest_release: Option<String>,
    pub earliest_year: Option<i32>,
    pub latest_year: Option<i32>,
    pub mean_price: Option<f64>,
    pub mean_positive_ratio: Option<f64>,
    pub mean_playtime_hours: Option<f64>,
    pub mean_metacritic: Option<f64>,
}
