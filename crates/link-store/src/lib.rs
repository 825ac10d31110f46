//! # link-store
//!
//! SQLite-backed implementation of the `LinkStore` trait.
//!
//! One `payment_links` table, one row per link. Links are never deleted;
//! expired links simply become permanently unusable. Single-file (or
//! in-memory, for tests) database with no external dependency.

pub mod sqlite;

pub use sqlite::SqliteLinkStore;
