use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use steamlens_store::{
    DatasetSummary,
    GenrePlaytime,
    GenreStatistics,
    PlatformReviews,
    PublisherSatisfaction,
    RatioBucket,
};
use tracing::debug;

use super::{ControlError, SteamControlPlane, invalid, non_negative, resolve_limit};

const DEFAULT_PLAYTIME_MIN_GAMES: i64 = 50;
const DEFAULT_PLAYTIME_LIMIT: i64 = 20;
const DEFAULT_PUBLISHER_MIN_GAMES: i64 = 5;
const DEFAULT_PUBLISHER_TOP_N: i64 = 20;
const DEFAULT_PUBLISHER_MIN_REVIEWS: i64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GenreStatisticsRequest {
    /// Keeps only the largest genres; every genre is returned when absent.
    pub top_n: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GenrePlaytimeRequest {
    /// Minimum played games per genre; defaults to 50.
    pub min_games: Option<i64>,
    /// Defaults to 20, capped at 100.
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PublisherSatisfactionRequest {
    /// Minimum qualifying games per publisher; defaults to 5.
    pub min_games: Option<i64>,
    /// Defaults to 20, capped at 100.
    pub top_n: Option<i64>,
    /// Minimum total reviews for a game to count; defaults to 10, raised to 1.
    pub min_reviews: Option<i64>,
}

impl SteamControlPlane {
    /// Per-genre counts, prices, playtime and reviews, largest genres first.
    ///
    /// # Errors
    /// Returns `ControlError` if `top_n` is invalid or the store query fails.
    pub async fn genre_statistics(
        &self,
        request: GenreStatisticsRequest,
    ) -> Result<Vec<GenreStatistics>, ControlError> {
        const OPERATION: &str = "genre_statistics";
        let top_n = request
            .top_n
            .map(|top_n| match usize::try_from(top_n) {
                Ok(top_n) if top_n > 0 => Ok(top_n),
                _ => Err(invalid(OPERATION, "top_n", format!("must be positive, got {top_n}"))),
            })
            .transpose()?;
        let genres = self.store.genre_statistics(top_n).await?;
        debug!(operation = OPERATION, ?top_n, rows = genres.len(), "query completed");
        Ok(genres)
    }

    /// Genres ranked by mean hours played, over games somebody played.
    ///
    /// # Errors
    /// Returns `ControlError` if an argument is invalid or the store query fails.
    pub async fn genre_playtime_analysis(
        &self,
        request: GenrePlaytimeRequest,
    ) -> Result<Vec<GenrePlaytime>, ControlError> {
        const OPERATION: &str = "genre_playtime_analysis";
        let limit = resolve_limit(OPERATION, "limit", request.limit, DEFAULT_PLAYTIME_LIMIT)?;
        let min_games = non_negative(OPERATION, "min_games", request.min_games)?
            .unwrap_or(DEFAULT_PLAYTIME_MIN_GAMES);
        let genres = self.store.genre_playtime(min_games, limit).await?;
        debug!(operation = OPERATION, min_games, rows = genres.len(), "query completed");
        Ok(genres)
    }

    /// Review figures for Windows, Mac and Linux games.
    ///
    /// # Errors
    /// Returns `ControlError` if the store query fails.
    pub async fn compare_platform_reviews(&self) -> Result<Vec<PlatformReviews>, ControlError> {
        let platforms = self.store.platform_reviews().await?;
        debug!(operation = "compare_platform_reviews", rows = platforms.len(), "query completed");
        Ok(platforms)
    }

    /// Recommendations per positive-ratio quartile.
    ///
    /// # Errors
    /// Returns `ControlError` if the store query fails.
    pub async fn reviews_vs_recommendations(&self) -> Result<Vec<RatioBucket>, ControlError> {
        let buckets = self.store.ratio_buckets().await?;
        debug!(operation = "reviews_vs_recommendations", rows = buckets.len(), "query completed");
        Ok(buckets)
    }

    /// Publishers ranked by the mean positive ratio of their games.
    ///
    /// # Errors
    /// Returns `ControlError` if an argument is invalid or the store query fails.
    pub async fn publisher_satisfaction(
        &self,
        request: PublisherSatisfactionRequest,
    ) -> Result<Vec<PublisherSatisfaction>, ControlError> {
        const OPERATION: &str = "publisher_satisfaction";
        let top_n = resolve_limit(OPERATION, "top_n", request.top_n, DEFAULT_PUBLISHER_TOP_N)?;
        let min_games = non_negative(OPERATION, "min_games", request.min_games)?
            .unwrap_or(DEFAULT_PUBLISHER_MIN_GAMES);
        let min_reviews = non_negative(OPERATION, "min_reviews", request.min_reviews)?
            .unwrap_or(DEFAULT_PUBLISHER_MIN_REVIEWS)
            .max(1);

        let publishers = self
            .store
            .publisher_satisfaction(min_reviews, min_games, top_n)
            .await?;
        debug!(
            operation = OPERATION,
            min_games,
            min_reviews,
            rows = publishers.len(),
            "query completed"
        );
        Ok(publishers)
    }

    /// Dataset-wide totals and means.
    ///
    /// # Errors
    /// Returns `ControlError` if the store query fails.
    pub async fn dataset_summary(&self) -> Result<DatasetSummary, ControlError> {
        let summary = self.store.dataset_summary().await?;
        debug!(operation = "dataset_summary", games = summary.total_games, "query completed");
        Ok(summary)
    }
}
