use std::collections::{BTreeMap, BTreeSet};

use futures::TryStreamExt;
use sqlx::any::AnyRow;
use sqlx::{Any, QueryBuilder};
use steamlens_store::{
    GenrePlaytime,
    GenreStatistics,
    Platform,
    PlatformReviews,
    PublisherSatisfaction,
    RatioBucket,
    positive_ratio,
};

use super::sql::{
    SqlStore,
    StoreResult,
    failed,
    get_f64,
    get_i64,
    get_opt_f64,
    get_text,
    limit_to_i64,
};

/// Positive-ratio quartiles: label, inclusive lower bound, upper bound.
///
/// Upper bounds are exclusive except for the last band, which holds 1.0.
pub const RATIO_BUCKETS: [(&str, f64, f64); 4] = [
    ("0-25%", 0.0, 0.25),
    ("25-50%", 0.25, 0.5),
    ("50-75%", 0.5, 0.75),
    ("75-100%", 0.75, 1.0),
];

const RATIO_SQL: &str = "CAST(positive_reviews AS DOUBLE) / (positive_reviews + negative_reviews)";

/// Review figures of one game as read for the publisher ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedGame {
    pub publishers: String,
    pub positive_reviews: i64,
    pub negative_reviews: i64,
    pub price: f64,
}

#[derive(Debug, Default)]
struct PublisherTally {
    games: i64,
    ratio_sum: f64,
    price_sum: f64,
    positive_sum: i64,
}

impl SqlStore {
    /// Aggregates games per linked genre, largest genres first.
    ///
    /// Every genre with a linked game is returned unless `top_n` is given.
    ///
    /// # Errors
    /// Returns `StoreError` if the limit is invalid or the database query fails.
    pub async fn genre_statistics(
        &self,
        top_n: Option<usize>,
    ) -> StoreResult<Vec<GenreStatistics>> {
        let mut qb = QueryBuilder::<Any>::new(
            "SELECT CAST(gn.name AS CHAR) AS genre, COUNT(*) AS game_count, \
             CAST(AVG(CAST(g.price AS DOUBLE)) AS DOUBLE) AS mean_price, \
             CAST(AVG(CAST(g.avg_playtime_forever AS DOUBLE)) AS DOUBLE) AS mean_playtime, \
             CAST(AVG(CAST(g.positive_reviews AS DOUBLE)) AS DOUBLE) AS mean_positive \
             FROM genres gn \
             JOIN game_genres gg ON gg.genre_id = gn.id \
             JOIN games g ON g.app_id = gg.game_id \
             GROUP BY gn.id, gn.name \
             ORDER BY game_count DESC, gn.name ASC",
        );
        if let Some(top_n) = top_n {
            qb.push(" LIMIT ");
            qb.push_bind(limit_to_i64(top_n)?);
        }

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(failed("genre_statistics"))?;
        rows.iter()
            .map(|row| -> Result<GenreStatistics, sqlx::Error> {
                Ok(GenreStatistics {
                    genre: get_text(row, "genre")?.unwrap_or_default(),
                    game_count: get_i64(row, "game_count")?,
                    mean_price: get_f64(row, "mean_price")?,
                    mean_playtime_minutes: get_f64(row, "mean_playtime")?,
                    mean_positive_reviews: get_f64(row, "mean_positive")?,
                })
            })
            .collect::<Result<_, _>>()
            .map_err(failed("genre_statistics"))
    }

    /// Mean playtime per genre over played games, for genres with at least `min_games`.
    ///
    /// # Errors
    /// Returns `StoreError` if the limit is invalid or the database query fails.
    pub async fn genre_playtime(
        &self,
        min_games: i64,
        limit: usize,
    ) -> StoreResult<Vec<GenrePlaytime>> {
        let limit = limit_to_i64(limit)?;
        let mut qb = QueryBuilder::<Any>::new(
            "SELECT CAST(gn.name AS CHAR) AS genre, COUNT(*) AS game_count, \
             CAST(AVG(CAST(g.avg_playtime_forever AS DOUBLE)) / 60 AS DOUBLE) AS mean_hours, \
             CAST(AVG(CAST(g.price AS DOUBLE)) AS DOUBLE) AS mean_price \
             FROM genres gn \
             JOIN game_genres gg ON gg.genre_id = gn.id \
             JOIN games g ON g.app_id = gg.game_id \
             WHERE g.avg_playtime_forever > 0 \
             GROUP BY gn.id, gn.name HAVING COUNT(*) >= ",
        );
        qb.push_bind(min_games);
        qb.push(" ORDER BY mean_hours DESC, gn.name ASC LIMIT ");
        qb.push_bind(limit);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(failed("genre_playtime_analysis"))?;
        rows.iter()
            .map(|row| -> Result<GenrePlaytime, sqlx::Error> {
                let mean_playtime_hours = get_f64(row, "mean_hours")?;
                let mean_price = get_f64(row, "mean_price")?;
                Ok(GenrePlaytime {
                    genre: get_text(row, "genre")?.unwrap_or_default(),
                    game_count: get_i64(row, "game_count")?,
                    mean_playtime_hours,
                    mean_price,
                    price_per_hour: (mean_playtime_hours > 0.0)
                        .then(|| mean_price / mean_playtime_hours),
                })
            })
            .collect::<Result<_, _>>()
            .map_err(failed("genre_playtime_analysis"))
    }

    /// Review figures for each platform; a game counts toward every platform it supports.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn platform_reviews(&self) -> StoreResult<Vec<PlatformReviews>> {
        let mut conn = self.pool.acquire().await.map_err(failed("compare_platform_reviews"))?;
        let mut results = Vec::with_capacity(Platform::ALL.len());
        for platform in Platform::ALL {
            let sql = format!(
                "SELECT COUNT(*) AS game_count, \
                 CAST(SUM(CASE WHEN positive_reviews + negative_reviews > 0 THEN 1 ELSE 0 END) AS SIGNED) \
                   AS reviewed_games, \
                 CAST(AVG(CASE WHEN positive_reviews + negative_reviews > 0 THEN {RATIO_SQL} END) AS DOUBLE) \
                   AS mean_ratio, \
                 CAST(AVG(CAST(positive_reviews AS DOUBLE)) AS DOUBLE) AS mean_positive, \
                 CAST(AVG(CAST(negative_reviews AS DOUBLE)) AS DOUBLE) AS mean_negative \
                 FROM games WHERE {column} <> 0",
                column = platform.column(),
            );
            let row = sqlx::query(&sql)
                .fetch_one(&mut *conn)
                .await
                .map_err(failed("compare_platform_reviews"))?;
            results.push(
                platform_reviews_from_row(platform, &row)
                    .map_err(failed("compare_platform_reviews"))?,
            );
        }
        Ok(results)
    }

    /// Recommendation figures per positive-ratio quartile over reviewed games.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn ratio_buckets(&self) -> StoreResult<Vec<RatioBucket>> {
        let mut qb = QueryBuilder::<Any>::new(
            "SELECT CAST(bucket AS SIGNED) AS bucket, COUNT(*) AS game_count, \
             CAST(AVG(CAST(recommendations AS DOUBLE)) AS DOUBLE) AS mean_recommendations, \
             CAST(AVG(ratio) AS DOUBLE) AS mean_ratio, \
             CAST(AVG(CAST(positive_reviews AS DOUBLE)) AS DOUBLE) AS mean_positive, \
             CAST(AVG(CAST(negative_reviews AS DOUBLE)) AS DOUBLE) AS mean_negative \
             FROM (SELECT CASE",
        );
        let last = RATIO_BUCKETS.len() - 1;
        for (index, (_, _, upper)) in RATIO_BUCKETS.iter().enumerate().take(last) {
            qb.push(" WHEN ");
            qb.push(RATIO_SQL);
            qb.push(" < ");
            qb.push_bind(*upper);
            qb.push(" THEN ");
            qb.push(index.to_string());
        }
        qb.push(" ELSE ");
        qb.push(last.to_string());
        qb.push(" END AS bucket, ");
        qb.push(RATIO_SQL);
        qb.push(
            " AS ratio, recommendations, positive_reviews, negative_reviews FROM games \
             WHERE positive_reviews + negative_reviews > 0) rated \
             GROUP BY bucket ORDER BY bucket ASC",
        );

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(failed("reviews_vs_recommendations"))?;
        let mut buckets = Vec::with_capacity(rows.len());
        for row in &rows {
            let index = get_i64(row, "bucket").map_err(failed("reviews_vs_recommendations"))?;
            let Some((label, lower, upper)) = usize::try_from(index)
                .ok()
                .and_then(|index| RATIO_BUCKETS.get(index))
            else {
                continue;
            };
            buckets.push(
                ratio_bucket_from_row(label, *lower, *upper, row)
                    .map_err(failed("reviews_vs_recommendations"))?,
            );
        }
        Ok(buckets)
    }

    /// Ranks publishers by the mean positive ratio of their reviewed games.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn publisher_satisfaction(
        &self,
        min_reviews: i64,
        min_games: i64,
        top_n: usize,
    ) -> StoreResult<Vec<PublisherSatisfaction>> {
        let mut rows = sqlx::query(
            "SELECT CAST(publishers AS CHAR) AS publishers, \
             CAST(positive_reviews AS SIGNED) AS positive_reviews, \
             CAST(negative_reviews AS SIGNED) AS negative_reviews, \
             CAST(price AS DOUBLE) AS price \
             FROM games WHERE publishers IS NOT NULL AND publishers <> '' \
             AND positive_reviews + negative_reviews >= ?",
        )
        .bind(min_reviews)
        .fetch(&self.pool);

        let mut games = Vec::new();
        while let Some(row) = rows.try_next().await.map_err(failed("publisher_satisfaction"))? {
            games.push(published_game_from_row(&row).map_err(failed("publisher_satisfaction"))?);
        }
        Ok(rank_publishers(&games, min_games, top_n))
    }
}

/// Distinct trimmed, non-empty publisher names of a comma-separated field.
#[must_use]
pub fn split_publishers(field: &str) -> BTreeSet<&str> {
    field
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Aggregates games per publisher and keeps the `top_n` best rated publishers
/// having at least `min_games` games.
///
/// Order: mean ratio descending, then game count descending, then name.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rank_publishers(
    games: &[PublishedGame],
    min_games: i64,
    top_n: usize,
) -> Vec<PublisherSatisfaction> {
    let mut tallies: BTreeMap<&str, PublisherTally> = BTreeMap::new();
    for game in games {
        let Some(ratio) = positive_ratio(game.positive_reviews, game.negative_reviews) else {
            continue;
        };
        for publisher in split_publishers(&game.publishers) {
            let tally = tallies.entry(publisher).or_default();
            tally.games += 1;
            tally.ratio_sum += ratio;
            tally.price_sum += game.price;
            tally.positive_sum += game.positive_reviews;
        }
    }

    let mut ranked: Vec<PublisherSatisfaction> = tallies
        .into_iter()
        .filter(|(_, tally)| tally.games >= min_games.max(1))
        .map(|(publisher, tally)| {
            let games = tally.games as f64;
            PublisherSatisfaction {
                publisher: publisher.to_string(),
                game_count: tally.games,
                mean_positive_ratio: tally.ratio_sum / games,
                mean_price: tally.price_sum / games,
                mean_positive_reviews: tally.positive_sum as f64 / games,
            }
        })
        .collect();
    ranked.sort_by(|left, right| {
        right
            .mean_positive_ratio
            .total_cmp(&left.mean_positive_ratio)
            .then_with(|| right.game_count.cmp(&left.game_count))
            .then_with(|| left.publisher.cmp(&right.publisher))
    });
    ranked.truncate(top_n);
    ranked
}

fn platform_reviews_from_row(platform: Platform, row: &AnyRow) -> Result<PlatformReviews, sqlx::Error> {
    let reviewed_games = get_i64(row, "reviewed_games")?;
    Ok(PlatformReviews {
        platform,
        game_count: get_i64(row, "game_count")?,
        reviewed_games,
        mean_positive_ratio: if reviewed_games > 0 {
            get_opt_f64(row, "mean_ratio")?
        } else {
            None
        },
        mean_positive_reviews: get_opt_f64(row, "mean_positive")?,
        mean_negative_reviews: get_opt_f64(row, "mean_negative")?,
    })
}

fn ratio_bucket_from_row(
    label: &str,
    lower_ratio: f64,
    upper_ratio: f64,
    row: &AnyRow,
) -> Result<RatioBucket, sqlx::Error> {
    Ok(RatioBucket {
        label: label.to_string(),
        lower_ratio,
        upper_ratio,
        game_count: get_i64(row, "game_count")?,
        mean_recommendations: get_f64(row, "mean_recommendations")?,
        mean_positive_ratio: get_f64(row, "mean_ratio")?,
        mean_positive_reviews: get_f64(row, "mean_positive")?,
        mean_negative_reviews: get_f64(row, "mean_negative")?,
    })
}

fn published_game_from_row(row: &AnyRow) -> Result<PublishedGame, sqlx::Error> {
    Ok(PublishedGame {
        publishers: get_text(row, "publishers")?.unwrap_or_default(),
        positive_reviews: get_i64(row, "positive_reviews")?,
        negative_reviews: get_i64(row, "negative_reviews")?,
        price: get_f64(row, "price")?,
    })
}
