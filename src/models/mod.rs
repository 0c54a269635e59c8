// src/models/mod.rs

//! Domain models for the collection pipeline.
//!
//! This module contains the data structures moved through the pipeline
//! and the application configuration.

mod config;
mod entry;
mod post;

// Re-export all public types
pub use config::{
    ApiConfig, CacheConfig, CollectorConfig, Config, CredentialsConfig, MAX_PAGE_SIZE,
};
pub use entry::{PostEntry, validate_username};
pub use post::Post;
