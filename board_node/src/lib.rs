//! Message board and declaration signing backend.
//!
//! Records live in an external, chain-backed entity store. This crate owns
//! the merge of query results across partitions, the primary-then-companion
//! write protocol and the classification of write failures.

pub mod api;
pub mod classify;
pub mod config;
pub mod fields;
pub mod publish;
pub mod reconcile;
pub mod records;
pub mod store;
