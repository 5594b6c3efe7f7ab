use std::{error::Error, fmt};

use chrono::{Datelike, Utc};

use crate::config::StoreConfig;
use crate::store::{SqlStore, StoreError};

pub mod analytics;
pub mod games;
pub mod pricing;

pub use analytics::{GenrePlaytimeRequest, GenreStatisticsRequest, PublisherSatisfactionRequest};
pub use games::{SearchGamesRequest, TopRatedRequest};
pub use pricing::{DiscountPatternsRequest, PriceStatisticsRequest, PriceTrendRequest};

/// Upper bound applied to every `limit`/`top_n` argument.
pub const MAX_LIMIT: i64 = 100;

/// Four-way classification of a [`ControlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    StoreUnavailable,
    QueryFailure,
}

#[derive(Debug)]
pub enum ControlError {
    InvalidArgument {
        operation: &'static str,
        argument: &'static str,
        reason: String,
    },
    NotFound {
        operation: &'static str,
        app_id: i64,
    },
    Store(StoreError),
}

impl ControlError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } | Self::Store(StoreError::InvalidInput(_)) => {
                ErrorKind::InvalidArgument
            }
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Store(StoreError::Unavailable { .. }) => ErrorKind::StoreUnavailable,
            Self::Store(StoreError::Query { .. }) => ErrorKind::QueryFailure,
        }
    }

    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArgument { operation, .. } | Self::NotFound { operation, .. } => {
                Some(*operation)
            }
            Self::Store(err) => err.operation(),
        }
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument {
                operation,
                argument,
                reason,
            } => write!(f, "{operation}: invalid {argument}: {reason}"),
            Self::NotFound { operation, app_id } => {
                write!(f, "{operation}: no game with app_id {app_id}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ControlError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Validates analytical requests and runs them against the store.
#[derive(Clone)]
pub struct SteamControlPlane {
    store: SqlStore,
}

impl SteamControlPlane {
    #[must_use]
    pub const fn with_store(store: SqlStore) -> Self {
        Self { store }
    }

    /// Connects to the configured store.
    ///
    /// # Errors
    /// Returns `ControlError` if the store cannot be reached.
    pub async fn connect(config: &StoreConfig) -> Result<Self, ControlError> {
        Ok(Self::with_store(SqlStore::connect(config).await?))
    }

    #[must_use]
    pub const fn store(&self) -> &SqlStore {
        &self.store
    }
}

pub(crate) fn invalid(
    operation: &'static str,
    argument: &'static str,
    reason: impl Into<String>,
) -> ControlError {
    ControlError::InvalidArgument {
        operation,
        argument,
        reason: reason.into(),
    }
}

/// Applies the default, rejects non-positive values and clamps to [`MAX_LIMIT`].
pub(crate) fn resolve_limit(
    operation: &'static str,
    argument: &'static str,
    requested: Option<i64>,
    default: i64,
) -> Result<usize, ControlError> {
    let value = requested.unwrap_or(default);
    if value <= 0 {
        return Err(invalid(operation, argument, format!("must be positive, got {value}")));
    }
    usize::try_from(value.min(MAX_LIMIT))
        .map_err(|_| invalid(operation, argument, format!("out of range: {value}")))
}

pub(crate) fn non_negative(
    operation: &'static str,
    argument: &'static str,
    value: Option<i64>,
) -> Result<Option<i64>, ControlError> {
    match value {
        Some(value) if value < 0 => Err(invalid(
            operation,
            argument,
            format!("must not be negative, got {value}"),
        )),
        other => Ok(other),
    }
}

pub(crate) fn price_bound(
    operation: &'static str,
    argument: &'static str,
    value: Option<f64>,
) -> Result<Option<f64>, ControlError> {
    match value {
        Some(price) if !price.is_finite() || price < 0.0 => Err(invalid(
            operation,
            argument,
            format!("must be a non-negative amount, got {price}"),
        )),
        other => Ok(other),
    }
}

/// Trimmed text argument; blank input counts as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub(crate) fn current_year() -> i32 {
    Utc::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_default_reject_and_clamp() {
        assert_eq!(resolve_limit("op", "limit", None, 20).ok(), Some(20));
        assert_eq!(resolve_limit("op", "limit", Some(7), 20).ok(), Some(7));
        assert_eq!(resolve_limit("op", "limit", Some(5_000), 20).ok(), Some(100));

        let err = resolve_limit("search_games", "limit", Some(0), 20).err();
        assert!(matches!(
            err,
            Some(ControlError::InvalidArgument { operation: "search_games", argument: "limit", .. })
        ));
    }

    #[test]
    fn prices_must_be_finite_and_non_negative() {
        assert!(price_bound("op", "min_price", Some(-0.5)).is_err());
        assert!(price_bound("op", "min_price", Some(f64::NAN)).is_err());
        assert_eq!(price_bound("op", "min_price", Some(0.0)).ok(), Some(Some(0.0)));
        assert_eq!(price_bound("op", "min_price", None).ok(), Some(None));
    }

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(non_blank(Some("  Indie ")), Some("Indie"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn requests_accept_partial_json() {
        let request: SearchGamesRequest =
            serde_json::from_str(r#"{"genre":"Indie","platform":"linux"}"#)
                .expect("request should parse");
        assert_eq!(request.genre.as_deref(), Some("Indie"));
        assert_eq!(request.platform, Some(steamlens_store::Platform::Linux));
        assert!(request.limit.is_none());

        let request: PublisherSatisfactionRequest =
            serde_json::from_str("{}").expect("empty request should parse");
        assert!(request.min_games.is_none());
    }

    #[test]
    fn error_kinds_follow_the_variant() {
        let err = invalid("top_rated_games", "min_reviews", "must not be negative");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.operation(), Some("top_rated_games"));
        assert_eq!(
            err.to_string(),
            "top_rated_games: invalid min_reviews: must not be negative"
        );

        let err = ControlError::NotFound {
            operation: "get_game_details",
            app_id: 42,
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = ControlError::from(StoreError::from_sqlx(
            "dataset_summary",
            sqlx::Error::PoolClosed,
        ));
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert_eq!(err.operation(), Some("dataset_summary"));
    }
}
