//! Core query layer for steamlens.
//!
//! This crate owns the pooled SQL store and its analytical statements, the
//! control plane that validates typed requests before they reach the store,
//! and the connection configuration a host process embeds.

pub mod config;
pub mod control;
pub mod store;
