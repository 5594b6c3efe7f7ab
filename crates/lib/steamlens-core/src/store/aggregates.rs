use std::ops::RangeInclusive;

use futures::StreamExt;
use futures::stream::BoxStream;
use sqlx::any::AnyRow;
use sqlx::{Any, QueryBuilder};
use steamlens_store::{DatasetSummary, DiscountBand, PriceBuckets, PriceStatistics, YearPriceTrend};

use super::filter::Filter;
use super::sql::{
    SqlStore,
    StoreResult,
    failed,
    get_f64,
    get_i64,
    get_opt_f64,
    get_opt_i32,
    get_opt_i64,
    get_text,
};

/// A range of game ages in whole years, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBand {
    pub label: &'static str,
    pub min_age: i32,
    /// `None` for the open-ended oldest band.
    pub max_age: Option<i32>,
}

pub const AGE_BANDS: [AgeBand; 4] = [
    AgeBand {
        label: "0 years",
        min_age: 0,
        max_age: Some(0),
    },
    AgeBand {
        label: "1-2 years",
        min_age: 1,
        max_age: Some(2),
    },
    AgeBand {
        label: "3-5 years",
        min_age: 3,
        max_age: Some(5),
    },
    AgeBand {
        label: "6+ years",
        min_age: 6,
        max_age: None,
    },
];

const TREND_SQL: &str = "SELECT CAST(release_year AS SIGNED) AS trend_year, \
     COUNT(*) AS game_count, \
     CAST(AVG(CAST(price AS DOUBLE)) AS DOUBLE) AS mean_price, \
     CAST(AVG(CAST(price AS DOUBLE)) - (SELECT AVG(CAST(p.price AS DOUBLE)) FROM games p \
       WHERE p.release_year BETWEEN ? AND ? AND p.price > ?) AS DOUBLE) AS diff_from_overall \
     FROM games WHERE release_year BETWEEN ? AND ? AND price > ? \
     GROUP BY release_year ORDER BY release_year ASC";

const SUMMARY_SQL: &str = "SELECT COUNT(*) AS total_games, \
     CAST(SUM(CASE WHEN price = 0 THEN 1 ELSE 0 END) AS SIGNED) AS free_games, \
     CAST(SUM(CASE WHEN windows <> 0 THEN 1 ELSE 0 END) AS SIGNED) AS windows_games, \
     CAST(SUM(CASE WHEN mac <> 0 THEN 1 ELSE 0 END) AS SIGNED) AS mac_games, \
     CAST(SUM(CASE WHEN linux <> 0 THEN 1 ELSE 0 END) AS SIGNED) AS linux_games, \
     CAST(MIN(release_date) AS CHAR) AS earliest_release, \
     CAST(MAX(release_date) AS CHAR) AS latest_release, \
     CAST(MIN(CASE WHEN release_year > 0 THEN release_year END) AS SIGNED) AS earliest_year, \
     CAST(MAX(CASE WHEN release_year > 0 THEN release_year END) AS SIGNED) AS latest_year, \
     CAST(AVG(CAST(price AS DOUBLE)) AS DOUBLE) AS mean_price, \
     CAST(AVG(CASE WHEN positive_reviews + negative_reviews > 0 \
       THEN CAST(positive_reviews AS DOUBLE) / (positive_reviews + negative_reviews) END) AS DOUBLE) \
       AS mean_positive_ratio, \
     CAST(AVG(CAST(avg_playtime_forever AS DOUBLE)) / 60 AS DOUBLE) AS mean_playtime_hours, \
     CAST(AVG(CASE WHEN metacritic_score > 0 THEN CAST(metacritic_score AS DOUBLE) END) AS DOUBLE) \
       AS mean_metacritic \
     FROM games";

impl SqlStore {
    /// Computes the price distribution of the games matching the filter.
    ///
    /// The median is read as the one or two central rows of the price order.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn price_statistics(&self, filter: &Filter) -> StoreResult<PriceStatistics> {
        let mut conn = self.pool.acquire().await.map_err(failed("price_statistics"))?;

        let mut qb = QueryBuilder::<Any>::new(
            "SELECT COUNT(*) AS game_count, \
             CAST(AVG(CAST(price AS DOUBLE)) AS DOUBLE) AS mean_price, \
             CAST(MIN(price) AS DOUBLE) AS min_price, \
             CAST(MAX(price) AS DOUBLE) AS max_price, \
             CAST(SUM(CASE WHEN price = 0 THEN 1 ELSE 0 END) AS SIGNED) AS bucket_free, \
             CAST(SUM(CASE WHEN price > 0 AND price <= 5 THEN 1 ELSE 0 END) AS SIGNED) AS bucket_5, \
             CAST(SUM(CASE WHEN price > 5 AND price <= 20 THEN 1 ELSE 0 END) AS SIGNED) AS bucket_20, \
             CAST(SUM(CASE WHEN price > 20 AND price <= 60 THEN 1 ELSE 0 END) AS SIGNED) AS bucket_60, \
             CAST(SUM(CASE WHEN price > 60 THEN 1 ELSE 0 END) AS SIGNED) AS bucket_above \
             FROM games",
        );
        filter.push_where(&mut qb);
        let row = qb
            .build()
            .fetch_one(&mut *conn)
            .await
            .map_err(failed("price_statistics"))?;
        let mut stats = price_statistics_from_row(&row).map_err(failed("price_statistics"))?;
        if stats.game_count == 0 {
            return Ok(PriceStatistics::default());
        }

        let (offset, take) = median_window(stats.game_count);
        let mut qb = QueryBuilder::<Any>::new("SELECT CAST(price AS DOUBLE) AS price FROM games");
        filter.push_where(&mut qb);
        qb.push(" ORDER BY price ASC LIMIT ");
        qb.push_bind(take);
        qb.push(" OFFSET ");
        qb.push_bind(offset);
        let rows = qb
            .build()
            .fetch_all(&mut *conn)
            .await
            .map_err(failed("price_statistics"))?;
        let central = rows
            .iter()
            .map(|row| get_f64(row, "price"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(failed("price_statistics"))?;
        stats.median_price = mean_of(&central);
        Ok(stats)
    }

    /// Streams the mean price per release year, oldest first.
    ///
    /// Rows are decoded as the caller polls; nothing runs until the first poll.
    #[must_use]
    pub fn price_trend_by_year(
        &self,
        years: RangeInclusive<i32>,
        exclude_free: bool,
    ) -> BoxStream<'_, StoreResult<YearPriceTrend>> {
        let (first, last) = years.into_inner();
        // price > -1 keeps free games, price > 0 drops them.
        let price_floor = if exclude_free { 0.0 } else { -1.0 };
        sqlx::query(TREND_SQL)
            .bind(first)
            .bind(last)
            .bind(price_floor)
            .bind(first)
            .bind(last)
            .bind(price_floor)
            .fetch(&self.pool)
            .map(|row| {
                row.and_then(|row| trend_from_row(&row))
                    .map_err(failed("price_trend_by_year"))
            })
            .boxed()
    }

    /// Groups games released up to `current_year` into [`AGE_BANDS`].
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn discount_patterns(&self, current_year: i32) -> StoreResult<Vec<DiscountBand>> {
        let mut qb = QueryBuilder::<Any>::new("SELECT CAST(band AS SIGNED) AS band, \
             COUNT(*) AS game_count, \
             CAST(AVG(CAST(discount AS DOUBLE)) AS DOUBLE) AS mean_discount, \
             CAST(SUM(CASE WHEN discount > 50 THEN 1 ELSE 0 END) AS SIGNED) AS large_discounts, \
             CAST(AVG(CAST(price AS DOUBLE)) AS DOUBLE) AS mean_price \
             FROM (SELECT CASE");
        for (index, band) in AGE_BANDS.iter().enumerate() {
            match band.max_age {
                Some(max_age) => {
                    qb.push(" WHEN release_year BETWEEN ");
                    qb.push_bind(current_year - max_age);
                    qb.push(" AND ");
                    qb.push_bind(current_year - band.min_age);
                }
                None => {
                    qb.push(" WHEN release_year <= ");
                    qb.push_bind(current_year - band.min_age);
                }
            }
            qb.push(" THEN ");
            qb.push(index.to_string());
        }
        qb.push(
            " END AS band, discount, price FROM games \
             WHERE release_year IS NOT NULL AND release_year > 0 AND release_year <= ",
        );
        qb.push_bind(current_year);
        qb.push(") banded WHERE band IS NOT NULL GROUP BY band ORDER BY band ASC");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(failed("discount_patterns"))?;
        let mut bands = Vec::with_capacity(rows.len());
        for row in &rows {
            let band = get_opt_i64(row, "band").map_err(failed("discount_patterns"))?;
            let Some(age_band) = band
                .and_then(|index| usize::try_from(index).ok())
                .and_then(|index| AGE_BANDS.get(index))
            else {
                continue;
            };
            bands.push(discount_band_from_row(age_band, row).map_err(failed("discount_patterns"))?);
        }
        Ok(bands)
    }

    /// Computes dataset-wide totals and means.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn dataset_summary(&self) -> StoreResult<DatasetSummary> {
        let mut conn = self.pool.acquire().await.map_err(failed("dataset_summary"))?;
        let row = sqlx::query(SUMMARY_SQL)
            .fetch_one(&mut *conn)
            .await
            .map_err(failed("dataset_summary"))?;
        let mut summary = summary_from_row(&row).map_err(failed("dataset_summary"))?;

        let row = sqlx::query(
            "SELECT (SELECT COUNT(*) FROM genres) AS total_genres, \
             (SELECT COUNT(*) FROM tags) AS total_tags, \
             (SELECT COUNT(*) FROM categories) AS total_categories",
        )
        .fetch_one(&mut *conn)
        .await
        .map_err(failed("dataset_summary"))?;
        summary.total_genres = get_i64(&row, "total_genres").map_err(failed("dataset_summary"))?;
        summary.total_tags = get_i64(&row, "total_tags").map_err(failed("dataset_summary"))?;
        summary.total_categories =
            get_i64(&row, "total_categories").map_err(failed("dataset_summary"))?;
        Ok(summary)
    }
}

/// Zero-based offset and row count of the central element(s) of `count` sorted rows.
const fn median_window(count: i64) -> (i64, i64) {
    let offset = (count - 1) / 2;
    let take = if count % 2 == 0 { 2 } else { 1 };
    (offset, take)
}

#[allow(clippy::cast_precision_loss)]
fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn price_statistics_from_row(row: &AnyRow) -> Result<PriceStatistics, sqlx::Error> {
    Ok(PriceStatistics {
        game_count: get_i64(row, "game_count")?,
        mean_price: get_opt_f64(row, "mean_price")?,
        median_price: None,
        min_price: get_opt_f64(row, "min_price")?,
        max_price: get_opt_f64(row, "max_price")?,
        buckets: PriceBuckets {
            free: get_i64(row, "bucket_free")?,
            up_to_5: get_i64(row, "bucket_5")?,
            from_5_to_20: get_i64(row, "bucket_20")?,
            from_20_to_60: get_i64(row, "bucket_60")?,
            above_60: get_i64(row, "bucket_above")?,
        },
    })
}

fn trend_from_row(row: &AnyRow) -> Result<YearPriceTrend, sqlx::Error> {
    Ok(YearPriceTrend {
        year: get_opt_i32(row, "trend_year")?.unwrap_or_default(),
        game_count: get_i64(row, "game_count")?,
        mean_price: get_f64(row, "mean_price")?,
        diff_from_overall: get_f64(row, "diff_from_overall")?,
    })
}

fn discount_band_from_row(band: &AgeBand, row: &AnyRow) -> Result<DiscountBand, sqlx::Error> {
    Ok(DiscountBand {
        label: band.label.to_string(),
        min_age: band.min_age,
        max_age: band.max_age,
        game_count: get_i64(row, "game_count")?,
        mean_discount: get_f64(row, "mean_discount")?,
        large_discounts: get_i64(row, "large_discounts")?,
        mean_price: get_f64(row, "mean_price")?,
    })
}

fn summary_from_row(row: &AnyRow) -> Result<DatasetSummary, sqlx::Error> {
    Ok(DatasetSummary {
        total_games: get_i64(row, "total_games")?,
        free_games: get_i64(row, "free_games")?,
        windows_games: get_i64(row, "windows_games")?,
        mac_games: get_i64(row, "mac_games")?,
        linux_games: get_i64(row, "linux_games")?,
        earliest_release: get_text(row, "earliest_release")?,
        latest_release: get_text(row, "latest_release")?,
        earliest_year: get_opt_i32(row, "earliest_year")?,
        latest_year: get_opt_i32(row, "latest_year")?,
        mean_price: get_opt_f64(row, "mean_price")?,
        mean_positive_ratio: get_opt_f64(row, "mean_positive_ratio")?,
        mean_playtime_hours: get_opt_f64(row, "mean_playtime_hours")?,
        mean_metacritic: get_opt_f64(row, "mean_metacritic")?,
        ..DatasetSummary::default()
    })
}
