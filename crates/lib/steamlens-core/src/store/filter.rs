//! Composable `WHERE` clauses over the `games` table.
//!
//! Every value is bound as a statement parameter; only fixed SQL fragments are
//! written into the statement text.

use sqlx::{Any, QueryBuilder};
use steamlens_store::Platform;

/// A single condition on a game row.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring of the name; LIKE wildcards in the fragment match literally.
    NameContains(String),
    /// Linked to the named genre, compared case-insensitively.
    Genre(String),
    MinPrice(f64),
    MaxPrice(f64),
    MinPositiveReviews(i64),
    /// Positive plus negative reviews at least this many.
    MinTotalReviews(i64),
    Reviewed,
    Platform(Platform),
    ReleaseYear(i32),
    /// Release year within the inclusive range.
    ReleaseYears(i32, i32),
    /// Excludes free games.
    Paid,
}

impl Predicate {
    fn render(&self, qb: &mut QueryBuilder<'_, Any>) {
        match self {
            Self::NameContains(fragment) => {
                qb.push("LOWER(name) LIKE LOWER(");
                qb.push_bind(like_pattern(fragment));
                qb.push(") ESCAPE '!'");
            }
            Self::Genre(genre) => {
                qb.push(
                    "app_id IN (SELECT gg.game_id FROM game_genres gg \
                     JOIN genres gn ON gn.id = gg.genre_id WHERE LOWER(gn.name) = LOWER(",
                );
                qb.push_bind(genre.clone());
                qb.push("))");
            }
            Self::MinPrice(price) => {
                qb.push("price >= ");
                qb.push_bind(*price);
            }
            Self::MaxPrice(price) => {
                qb.push("price <= ");
                qb.push_bind(*price);
            }
            Self::MinPositiveReviews(count) => {
                qb.push("positive_reviews >= ");
                qb.push_bind(*count);
            }
            Self::MinTotalReviews(count) => {
                qb.push("positive_reviews + negative_reviews >= ");
                qb.push_bind(*count);
            }
            Self::Reviewed => {
                qb.push("positive_reviews + negative_reviews > 0");
            }
            Self::Platform(platform) => {
                qb.push(platform.column());
                qb.push(" <> 0");
            }
            Self::ReleaseYear(year) => {
                qb.push("release_year = ");
                qb.push_bind(*year);
            }
            Self::ReleaseYears(first, last) => {
                qb.push("release_year BETWEEN ");
                qb.push_bind(*first);
                qb.push(" AND ");
                qb.push_bind(*last);
            }
            Self::Paid => {
                qb.push("price > 0");
            }
        }
    }
}

/// Conjunction of predicates. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Adds the predicate built from `value` when one is present.
    #[must_use]
    pub fn and_maybe<T>(self, value: Option<T>, build: impl FnOnce(T) -> Predicate) -> Self {
        match value {
            Some(value) => self.and(build(value)),
            None => self,
        }
    }

    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Appends ` WHERE a AND b ...`, or nothing for an empty filter.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Any>) {
        for (index, predicate) in self.predicates.iter().enumerate() {
            qb.push(if index == 0 { " WHERE " } else { " AND " });
            predicate.render(qb);
        }
    }
}

/// `%fragment%` with `!`, `%` and `_` escaped for `ESCAPE '!'`.
fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '!' | '%' | '_') {
            pattern.push('!');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
