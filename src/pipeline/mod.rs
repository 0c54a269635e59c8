//! Pipeline entry points.
//!
//! - `Collector`: Replay cached posts and fetch new ones for many users
//! - `run_analysis`: Feed a collector's stream into an analysis module
//! - `run_module`: Wire the live API, local cache and a named module together

pub mod collect;
pub mod run;

pub use collect::{CollectSummary, Collector, UserSummary};
pub use run::{run_analysis, run_module};
