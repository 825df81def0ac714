//! Versioned-content engine for the Quire wiki service.
//!
//! This crate has zero internal deps and performs no I/O of its own: storage
//! is reached only through the [`store::PageStore`] trait, so the same engine
//! backs the HTTP layer, the Postgres store, and the in-memory store used by
//! tests.

pub mod content;
pub mod diff;
pub mod error;
pub mod page;
pub mod pagination;
pub mod permissions;
pub mod query;
pub mod revision;
pub mod roles;
pub mod search;
pub mod store;
pub mod types;
