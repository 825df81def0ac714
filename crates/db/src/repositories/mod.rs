//! Repository layer.
//!
//! Repositories are zero-sized structs providing async methods that accept
//! `&PgPool` as the first argument.

pub mod page_repo;
