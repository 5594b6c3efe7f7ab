use std::{error::Error, fmt};

use sqlx::any::{AnyPoolOptions, AnyRow, install_default_drivers};
use sqlx::{AnyPool, Row};
use steamlens_store::schema::{Column, Dialect, GAME_COLUMNS, create_statements};
use tracing::{debug, info};

use crate::config::StoreConfig;

#[derive(Debug)]
pub enum StoreError {
    /// The database could not be reached or the pool gave up.
    Unavailable {
        operation: &'static str,
        source: sqlx::Error,
    },
    /// A statement was rejected or its rows could not be decoded.
    Query {
        operation: &'static str,
        source: sqlx::Error,
    },
    InvalidInput(String),
}

impl StoreError {
    pub(crate) fn from_sqlx(operation: &'static str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Unavailable {
                operation,
                source: err,
            },
            other => Self::Query {
                operation,
                source: other,
            },
        }
    }

    /// Operation that produced the error, when known.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Unavailable { operation, .. } | Self::Query { operation, .. } => Some(*operation),
            Self::InvalidInput(_) => None,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { operation, source } => {
                write!(f, "{operation}: store unavailable: {source}")
            }
            Self::Query { operation, source } => write!(f, "{operation}: query failed: {source}"),
            Self::InvalidInput(message) => write!(f, "Invalid input: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable { source, .. } | Self::Query { source, .. } => Some(source),
            Self::InvalidInput(_) => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Maps a driver error onto the operation that raised it.
pub(crate) fn failed(operation: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |err| StoreError::from_sqlx(operation, err)
}

/// Read-only analytical access to the games dataset.
#[derive(Clone)]
pub struct SqlStore {
    pub(crate) pool: AnyPool,
    dialect: Dialect,
}

impl SqlStore {
    /// Opens a connection pool for the configured store.
    ///
    /// # Errors
    /// Returns `StoreError::Unavailable` if the first connection cannot be established.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        install_default_drivers();
        let dialect = config.dialect;
        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    if dialect == Dialect::Sqlite {
                        sqlx::query("PRAGMA foreign_keys = ON")
                            .execute(&mut *conn)
                            .await?;
                    }
                    Ok(())
                })
            })
            .connect(&config.url)
            .await
            .map_err(|err| match StoreError::from_sqlx("connect", err) {
                StoreError::Query { operation, source } => {
                    StoreError::Unavailable { operation, source }
                }
                other => other,
            })?;
        info!(
            url = %config.redacted_url(),
            %dialect,
            max_connections = config.max_connections,
            "connected to games store"
        );
        Ok(Self { pool, dialect })
    }

    #[must_use]
    pub const fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Creates any missing tables and indexes.
    ///
    /// # Errors
    /// Returns `StoreError` if a DDL statement fails.
    pub async fn apply_schema(&self) -> StoreResult<()> {
        let statements = create_statements(self.dialect);
        for statement in &statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(failed("apply_schema"))?;
        }
        debug!(statements = statements.len(), dialect = %self.dialect, "schema applied");
        Ok(())
    }
}

/// `CAST` projection of the named `games` columns, optionally alias-qualified.
pub(crate) fn projection(names: &[&str], alias: Option<&str>) -> String {
    let prefix = alias.map(|alias| format!("{alias}.")).unwrap_or_default();
    GAME_COLUMNS
        .iter()
        .filter(|column| names.contains(&column.name))
        .map(|column| cast_column(column, &prefix))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `CAST` projection of every `games` column.
pub(crate) fn full_projection() -> String {
    GAME_COLUMNS
        .iter()
        .map(|column| cast_column(column, ""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn cast_column(column: &Column, prefix: &str) -> String {
    format!(
        "CAST({prefix}{name} AS {target}) AS {name}",
        name = column.name,
        target = column.kind.cast_target()
    )
}

pub(crate) fn get_i64(row: &AnyRow, column: &str) -> Result<i64, sqlx::Error> {
    Ok(row.try_get::<Option<i64>, _>(column)?.unwrap_or(0))
}

pub(crate) fn get_opt_i64(row: &AnyRow, column: &str) -> Result<Option<i64>, sqlx::Error> {
    row.try_get::<Option<i64>, _>(column)
}

pub(crate) fn get_opt_i32(row: &AnyRow, column: &str) -> Result<Option<i32>, sqlx::Error> {
    get_opt_i64(row, column)?
        .map(|value| {
            i32::try_from(value).map_err(|err| sqlx::Error::ColumnDecode {
                index: column.to_string(),
                source: Box::new(err),
            })
        })
        .transpose()
}

pub(crate) fn get_f64(row: &AnyRow, column: &str) -> Result<f64, sqlx::Error> {
    Ok(get_opt_f64(row, column)?.unwrap_or(0.0))
}

pub(crate) fn get_opt_f64(row: &AnyRow, column: &str) -> Result<Option<f64>, sqlx::Error> {
    row.try_get::<Option<f64>, _>(column)
}

pub(crate) fn get_flag(row: &AnyRow, column: &str) -> Result<bool, sqlx::Error> {
    Ok(get_i64(row, column)? != 0)
}

/// Text column; MySQL reports some casts as binary strings.
pub(crate) fn get_text(row: &AnyRow, column: &str) -> Result<Option<String>, sqlx::Error> {
    match row.try_get::<Option<String>, _>(column) {
        Err(sqlx::Error::ColumnDecode { .. }) => Ok(row
            .try_get::<Option<Vec<u8>>, _>(column)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())),
        other => other,
    }
}

pub(crate) fn limit_to_i64(limit: usize) -> StoreResult<i64> {
    i64::try_from(limit)
        .map_err(|_| StoreError::InvalidInput("limit exceeds supported range".to_string()))
}
