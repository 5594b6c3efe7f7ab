use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use steamlens_store::{DiscountBand, PriceStatistics, YearPriceTrend};
use tracing::debug;

use crate::store::{Filter, Predicate};

use super::{ControlError, SteamControlPlane, current_year, invalid, non_blank};

/// Earliest release year considered by the price trend.
pub const FIRST_TREND_YEAR: i32 = 1970;

/// Optional scope for price statistics; both fields may be combined.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PriceStatisticsRequest {
    pub genre: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PriceTrendRequest {
    /// Leaves free games out of the yearly counts and means.
    pub exclude_free: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DiscountPatternsRequest {
    /// Year ages are measured from; defaults to the current year.
    pub as_of_year: Option<i32>,
}

impl SteamControlPlane {
    /// Summarizes prices over all games or a genre/year scope.
    ///
    /// # Errors
    /// Returns `ControlError` if the year is invalid or the store query fails.
    pub async fn price_statistics(
        &self,
        request: PriceStatisticsRequest,
    ) -> Result<PriceStatistics, ControlError> {
        const OPERATION: &str = "price_statistics";
        if let Some(year) = request.year
            && year <= 0
        {
            return Err(invalid(OPERATION, "year", format!("must be positive, got {year}")));
        }
        let filter = Filter::new()
            .and_maybe(non_blank(request.genre.as_deref()), |genre| {
                Predicate::Genre(genre.to_string())
            })
            .and_maybe(request.year, Predicate::ReleaseYear);

        let stats = self.store.price_statistics(&filter).await?;
        debug!(operation = OPERATION, games = stats.game_count, "query completed");
        Ok(stats)
    }

    /// Streams the mean price per release year from 1970 to the current year.
    ///
    /// The statement runs when the stream is first polled.
    #[must_use]
    pub fn price_trend_by_year(
        &self,
        request: PriceTrendRequest,
    ) -> BoxStream<'_, Result<YearPriceTrend, ControlError>> {
        let years = FIRST_TREND_YEAR..=current_year();
        debug!(
            operation = "price_trend_by_year",
            first_year = years.start(),
            last_year = years.end(),
            exclude_free = request.exclude_free,
            "streaming"
        );
        self.store
            .price_trend_by_year(years, request.exclude_free)
            .map_err(ControlError::from)
            .boxed()
    }

    /// Discount figures per release-age band.
    ///
    /// # Errors
    /// Returns `ControlError` if the reference year is invalid or the store query fails.
    pub async fn discount_patterns(
        &self,
        request: DiscountPatternsRequest,
    ) -> Result<Vec<DiscountBand>, ControlError> {
        const OPERATION: &str = "discount_patterns";
        let as_of_year = request.as_of_year.unwrap_or_else(current_year);
        if as_of_year <= 0 {
            return Err(invalid(
                OPERATION,
                "as_of_year",
                format!("must be positive, got {as_of_year}"),
            ));
        }
        let bands = self.store.discount_patterns(as_of_year).await?;
        debug!(operation = OPERATION, as_of_year, rows = bands.len(), "query completed");
        Ok(bands)
    }
}
