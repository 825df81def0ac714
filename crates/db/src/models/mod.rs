//! Row types for the `pages` table.

pub mod page;
