// src/pipeline/run.rs

//! Collect-and-analyze pipeline.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::analysis::{Analyzer, AnalyzerRegistry};
use crate::config::load_bearer_token;
use crate::error::Result;
use crate::models::{Config, validate_username};
use crate::pipeline::collect::{CollectSummary, Collector};
use crate::services::{TimelineClient, TwitterClient};
use crate::storage::{LocalCache, PostCache};
use crate::utils::http;

/// Run `analyzer` over the posts of `usernames`.
///
/// Collection and analysis run concurrently over a bounded stream. When both
/// fail, the analyzer's error is returned and the collection error is logged.
pub async fn run_analysis(
    collector: &Collector,
    analyzer: &dyn Analyzer,
    usernames: &[String],
    stream_capacity: usize,
) -> Result<CollectSummary> {
    let (tx, rx) = mpsc::channel(stream_capacity.max(1));

    log::info!("Running '{}' over {} users", analyzer.name(), usernames.len());

    let (collected, analyzed) =
        tokio::join!(collector.collect(usernames, tx), analyzer.analyze(rx));

    match (collected, analyzed) {
        (Ok(summary), Ok(())) => {
            log::info!(
                "Analysis complete: {} posts ({} new) in {}s",
                summary.total_entries(),
                summary.total_fetched(),
                (summary.finished_at - summary.started_at).num_seconds()
            );
            Ok(summary)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(_), Err(e)) => Err(e),
        (Err(collect_err), Err(analyze_err)) => {
            log::error!("Collection also failed: {}", collect_err);
            Err(analyze_err)
        }
    }
}

/// Run the named analysis module against the live API and local cache.
///
/// The module name and usernames are checked before any credentials are
/// read or any network or disk work starts.
pub async fn run_module(
    config: &Config,
    registry: &AnalyzerRegistry,
    module: &str,
    usernames: &[String],
) -> Result<CollectSummary> {
    let analyzer = registry.get(module)?;
    for username in usernames {
        validate_username(username)?;
    }

    let client = http::create_async_client(&config.api)?;
    let token = load_bearer_token(&client, &config.api.base_url, &config.credentials).await?;

    let timelines: Arc<dyn TimelineClient> =
        Arc::new(TwitterClient::with_client(client, &config.api, token)?);
    let cache: Arc<dyn PostCache> = Arc::new(LocalCache::from_config(&config.cache));
    let collector = Collector::new(timelines, cache, config.collector.clone());

    run_analysis(&collector, analyzer, usernames, config.collector.stream_capacity).await
}
