//! Service layer for timeline collection.
//!
//! This module contains:
//! - The remote timeline seam (`TimelineClient`)
//! - Its HTTP implementation (`TwitterClient`)
//! - Incremental fetching with cache persistence (`TimelineFetcher`)

mod fetcher;
mod timeline;
mod twitter;

pub use fetcher::{FetchSummary, TimelineFetcher};
pub use timeline::{TimelineClient, TimelineQuery};
pub use twitter::TwitterClient;
