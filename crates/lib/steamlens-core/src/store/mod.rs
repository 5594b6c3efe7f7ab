//! Store interfaces and the SQL implementation.
//!
//! The store layer turns analytical questions into parameterized statements
//! over the games schema and maps rows into result records.

pub mod aggregates;
pub mod filter;
pub mod games;
pub mod reviews;
pub mod sql;

pub use aggregates::{AGE_BANDS, AgeBand};
pub use filter::{Filter, Predicate};
pub use reviews::{PublishedGame, RATIO_BUCKETS, rank_publishers, split_publishers};
pub use sql::{SqlStore, StoreError, StoreResult};
