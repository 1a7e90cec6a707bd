//! Storage layer for reno
//!
//! This crate provides:
//! - SQLite database setup and schema
//! - Row models and their conversion into domain types
//! - The `MarketStore` implementation used by the engine

pub mod db;
pub mod error;
pub mod models;
mod queries;
mod store;

pub use db::Storage;
pub use error::{Result, StorageError};
