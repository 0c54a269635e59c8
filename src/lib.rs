// src/lib.rs

//! Twinalysis Library
//!
//! Collects user timelines into a local cache and streams them into
//! analysis modules.

pub mod analysis;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
