//! Storage models and schema helpers for steamlens.
//!
//! This crate defines the relational data model (the `games` fact table plus
//! the genre, tag and category dimensions) and the record types returned by
//! the query layer.

pub mod models;
pub mod schema;

pub use models::*;
