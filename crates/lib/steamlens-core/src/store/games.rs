use sqlx::AnyConnection;
use sqlx::any::AnyRow;
use sqlx::{Any, QueryBuilder};
use steamlens_store::schema::Taxonomy;
use steamlens_store::{Game, GameDetail, GameSummary, TopRatedGame};

use super::filter::{Filter, Predicate};
use super::sql::{
    SqlStore,
    StoreResult,
    failed,
    full_projection,
    get_f64,
    get_flag,
    get_i64,
    get_opt_i32,
    get_opt_i64,
    get_text,
    limit_to_i64,
    projection,
};

const SUMMARY_COLUMNS: &[&str] = &[
    "app_id",
    "name",
    "release_date",
    "release_year",
    "price",
    "positive_reviews",
    "negative_reviews",
    "genres",
    "developers",
    "publishers",
    "windows",
    "mac",
    "linux",
];

const POSITIVE_RATIO_SQL: &str =
    "CAST(positive_reviews AS DOUBLE) / (positive_reviews + negative_reviews)";

impl SqlStore {
    /// Searches games matching every predicate of the filter.
    ///
    /// # Errors
    /// Returns `StoreError` if the limit is invalid or the database query fails.
    pub async fn search_games(&self, filter: &Filter, limit: usize) -> StoreResult<Vec<GameSummary>> {
        let limit = limit_to_i64(limit)?;
        let mut qb = QueryBuilder::<Any>::new("SELECT ");
        qb.push(projection(SUMMARY_COLUMNS, None));
        qb.push(" FROM games");
        filter.push_where(&mut qb);
        qb.push(" ORDER BY positive_reviews DESC, app_id ASC LIMIT ");
        qb.push_bind(limit);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(failed("search_games"))?;
        rows.iter()
            .map(summary_from_row)
            .collect::<Result<_, _>>()
            .map_err(failed("search_games"))
    }

    /// Fetches a game with its genre, tag and category names.
    ///
    /// All reads run on a single pooled connection.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn get_game_detail(&self, app_id: i64) -> StoreResult<Option<GameDetail>> {
        let mut conn = self.pool.acquire().await.map_err(failed("get_game_details"))?;

        let sql = format!("SELECT {} FROM games WHERE app_id = ?", full_projection());
        let row = sqlx::query(&sql)
            .bind(app_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(failed("get_game_details"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let game = game_from_row(&row).map_err(failed("get_game_details"))?;

        let genre_names = taxonomy_names(&mut conn, Taxonomy::Genre, app_id).await?;
        let tag_names = taxonomy_names(&mut conn, Taxonomy::Tag, app_id).await?;
        let category_names = taxonomy_names(&mut conn, Taxonomy::Category, app_id).await?;
        Ok(Some(GameDetail {
            game,
            genre_names,
            tag_names,
            category_names,
        }))
    }

    /// Ranks reviewed games by share of positive reviews.
    ///
    /// # Errors
    /// Returns `StoreError` if the limit is invalid or the database query fails.
    pub async fn top_rated_games(
        &self,
        min_reviews: i64,
        genre: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<TopRatedGame>> {
        let limit = limit_to_i64(limit)?;
        let filter = Filter::new()
            .and(Predicate::Reviewed)
            .and(Predicate::MinTotalReviews(min_reviews))
            .and_maybe(genre, |genre| Predicate::Genre(genre.to_string()));

        let mut qb = QueryBuilder::<Any>::new("SELECT ");
        qb.push(projection(SUMMARY_COLUMNS, None));
        qb.push(", CAST(positive_reviews + negative_reviews AS SIGNED) AS total_reviews, CAST(");
        qb.push(POSITIVE_RATIO_SQL);
        qb.push(" AS DOUBLE) AS positive_ratio FROM games");
        filter.push_where(&mut qb);
        qb.push(" ORDER BY positive_ratio DESC, total_reviews DESC, app_id ASC LIMIT ");
        qb.push_bind(limit);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(failed("top_rated_games"))?;
        rows.iter()
            .map(|row| -> Result<TopRatedGame, sqlx::Error> {
                Ok(TopRatedGame {
                    game: summary_from_row(row)?,
                    total_reviews: get_i64(row, "total_reviews")?,
                    positive_ratio: get_f64(row, "positive_ratio")?,
                })
            })
            .collect::<Result<_, _>>()
            .map_err(failed("top_rated_games"))
    }
}

async fn taxonomy_names(
    conn: &mut AnyConnection,
    taxonomy: Taxonomy,
    app_id: i64,
) -> StoreResult<Vec<String>> {
    let sql = format!(
        "SELECT CAST(d.name AS CHAR) AS name FROM {table} d \
         JOIN {link} l ON l.{column} = d.id WHERE l.game_id = ? ORDER BY d.name",
        table = taxonomy.table(),
        link = taxonomy.link_table(),
        column = taxonomy.link_column(),
    );
    let rows = sqlx::query(&sql)
        .bind(app_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(failed("get_game_details"))?;
    let mut names = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(name) = get_text(row, "name").map_err(failed("get_game_details"))? {
            names.push(name);
        }
    }
    Ok(names)
}

fn summary_from_row(row: &AnyRow) -> Result<GameSummary, sqlx::Error> {
    Ok(GameSummary {
        app_id: get_i64(row, "app_id")?,
        name: get_text(row, "name")?.unwrap_or_default(),
        release_date: get_text(row, "release_date")?,
        release_year: get_opt_i32(row, "release_year")?,
        price: get_f64(row, "price")?,
        positive_reviews: get_i64(row, "positive_reviews")?,
        negative_reviews: get_i64(row, "negative_reviews")?,
        genres: get_text(row, "genres")?,
        developers: get_text(row, "developers")?,
        publishers: get_text(row, "publishers")?,
        windows: get_flag(row, "windows")?,
        mac: get_flag(row, "mac")?,
        linux: get_flag(row, "linux")?,
    })
}

fn game_from_row(row: &AnyRow) -> Result<Game, sqlx::Error> {
    Ok(Game {
        app_id: get_i64(row, "app_id")?,
        name: get_text(row, "name")?.unwrap_or_default(),
        release_date: get_text(row, "release_date")?,
        release_year: get_opt_i32(row, "release_year")?,
        estimated_owners: get_text(row, "estimated_owners")?,
        peak_ccu: get_i64(row, "peak_ccu")?,
        required_age: get_i64(row, "required_age")?,
        price: get_f64(row, "price")?,
        discount: get_i64(row, "discount")?,
        dlc_count: get_i64(row, "dlc_count")?,
        about_the_game: get_text(row, "about_the_game")?,
        supported_languages: get_text(row, "supported_languages")?,
        header_image: get_text(row, "header_image")?,
        website: get_text(row, "website")?,
        windows: get_flag(row, "windows")?,
        mac: get_flag(row, "mac")?,
        linux: get_flag(row, "linux")?,
        metacritic_score: get_opt_i64(row, "metacritic_score")?,
        user_score: get_i64(row, "user_score")?,
        positive_reviews: get_i64(row, "positive_reviews")?,
        negative_reviews: get_i64(row, "negative_reviews")?,
        achievements: get_i64(row, "achievements")?,
        recommendations: get_i64(row, "recommendations")?,
        avg_playtime_forever: get_i64(row, "avg_playtime_forever")?,
        avg_playtime_2weeks: get_i64(row, "avg_playtime_2weeks")?,
        median_playtime_forever: get_i64(row, "median_playtime_forever")?,
        median_playtime_2weeks: get_i64(row, "median_playtime_2weeks")?,
        developers: get_text(row, "developers")?,
        publishers: get_text(row, "publishers")?,
        categories: get_text(row, "categories")?,
        genres: get_text(row, "genres")?,
        tags: get_text(row, "tags")?,
    })
}
