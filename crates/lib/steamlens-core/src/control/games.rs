use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use steamlens_store::{GameDetail, GameSummary, Platform, TopRatedGame};
use tracing::debug;

use crate::store::{Filter, Predicate};

use super::{
    ControlError,
    SteamControlPlane,
    invalid,
    non_blank,
    non_negative,
    price_bound,
    resolve_limit,
};

const DEFAULT_SEARCH_LIMIT: i64 = 20;
const DEFAULT_TOP_RATED_LIMIT: i64 = 20;
const DEFAULT_TOP_RATED_MIN_REVIEWS: i64 = 100;

/// Filters for a game search. Absent fields impose no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SearchGamesRequest {
    /// Case-insensitive fragment of the game name.
    pub name: Option<String>,
    /// Exact genre name, case-insensitive.
    pub genre: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_positive_reviews: Option<i64>,
    pub platform: Option<Platform>,
    /// Defaults to 20, capped at 100.
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TopRatedRequest {
    /// Minimum positive plus negative reviews; defaults to 100.
    pub min_reviews: Option<i64>,
    pub genre: Option<String>,
    /// Defaults to 20, capped at 100.
    pub limit: Option<i64>,
}

impl SteamControlPlane {
    /// Searches games by name, genre, price, reviews and platform.
    ///
    /// # Errors
    /// Returns `ControlError` if an argument is invalid or the store query fails.
    pub async fn search_games(
        &self,
        request: SearchGamesRequest,
    ) -> Result<Vec<GameSummary>, ControlError> {
        const OPERATION: &str = "search_games";
        let limit = resolve_limit(OPERATION, "limit", request.limit, DEFAULT_SEARCH_LIMIT)?;
        let min_price = price_bound(OPERATION, "min_price", request.min_price)?;
        let max_price = price_bound(OPERATION, "max_price", request.max_price)?;
        if let (Some(min), Some(max)) = (min_price, max_price)
            && min > max
        {
            return Err(invalid(
                OPERATION,
                "min_price",
                format!("min_price {min} exceeds max_price {max}"),
            ));
        }
        let min_positive =
            non_negative(OPERATION, "min_positive_reviews", request.min_positive_reviews)?;

        let filter = Filter::new()
            .and_maybe(non_blank(request.name.as_deref()), |name| {
                Predicate::NameContains(name.to_string())
            })
            .and_maybe(non_blank(request.genre.as_deref()), |genre| {
                Predicate::Genre(genre.to_string())
            })
            .and_maybe(min_price, Predicate::MinPrice)
            .and_maybe(max_price, Predicate::MaxPrice)
            .and_maybe(min_positive, Predicate::MinPositiveReviews)
            .and_maybe(request.platform, Predicate::Platform);

        let games = self.store.search_games(&filter, limit).await?;
        debug!(
            operation = OPERATION,
            predicates = filter.predicates().len(),
            rows = games.len(),
            "query completed"
        );
        Ok(games)
    }

    /// Fetches one game with its genre, tag and category names.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` when no game has the id, or another
    /// `ControlError` if the id is invalid or the store query fails.
    pub async fn get_game_details(&self, app_id: i64) -> Result<GameDetail, ControlError> {
        const OPERATION: &str = "get_game_details";
        if app_id <= 0 {
            return Err(invalid(OPERATION, "app_id", format!("must be positive, got {app_id}")));
        }
        let detail = self
            .store
            .get_game_detail(app_id)
            .await?
            .ok_or(ControlError::NotFound {
                operation: OPERATION,
                app_id,
            })?;
        debug!(operation = OPERATION, app_id, "query completed");
        Ok(detail)
    }

    /// Lists the best reviewed games among those with enough reviews.
    ///
    /// # Errors
    /// Returns `ControlError` if an argument is invalid or the store query fails.
    pub async fn top_rated_games(
        &self,
        request: TopRatedRequest,
    ) -> Result<Vec<TopRatedGame>, ControlError> {
        const OPERATION: &str = "top_rated_games";
        let limit = resolve_limit(OPERATION, "limit", request.limit, DEFAULT_TOP_RATED_LIMIT)?;
        let min_reviews = non_negative(OPERATION, "min_reviews", request.min_reviews)?
            .unwrap_or(DEFAULT_TOP_RATED_MIN_REVIEWS);

        let games = self
            .store
            .top_rated_games(min_reviews, non_blank(request.genre.as_deref()), limit)
            .await?;
        debug!(operation = OPERATION, min_reviews, rows = games.len(), "query completed");
        Ok(games)
    }
}
