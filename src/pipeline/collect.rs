// src/pipeline/collect.rs

//! Multi-user collection.
//!
//! Each user is collected by an independent job: replay the cache onto the
//! output stream, then fetch whatever the API has beyond the cache watermark.
//! Jobs run concurrently and a failing job never cancels its siblings; the
//! first failure is reported once every job has finished.
//!
//! The collector takes the stream's sender by value and drops it only after
//! the last job is done. Consumers therefore see the stream close exactly
//! once, after the final entry.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::models::{CollectorConfig, PostEntry, validate_username};
use crate::services::{TimelineClient, TimelineFetcher};
use crate::storage::PostCache;

/// Outcome of a single user's collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub username: String,
    /// Entries replayed from the cache
    pub cached: usize,
    /// Entries fetched from the API
    pub fetched: usize,
    /// Largest cached identifier before this run
    pub watermark: u64,
}

/// Summary of a collection run.
#[derive(Debug, Clone)]
pub struct CollectSummary {
    /// Per-user outcomes, sorted by username
    pub users: Vec<UserSummary>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CollectSummary {
    /// Total entries written to the output stream.
    pub fn total_entries(&self) -> usize {
        self.users.iter().map(|u| u.cached + u.fetched).sum()
    }

    /// Total entries fetched from the API.
    pub fn total_fetched(&self) -> usize {
        self.users.iter().map(|u| u.fetched).sum()
    }
}

/// Collects timelines for many users onto one output stream.
pub struct Collector {
    client: Arc<dyn TimelineClient>,
    cache: Arc<dyn PostCache>,
    config: CollectorConfig,
}

impl Collector {
    pub fn new(
        client: Arc<dyn TimelineClient>,
        cache: Arc<dyn PostCache>,
        config: CollectorConfig,
    ) -> Self {
        Self {
            client,
            cache,
            config,
        }
    }

    /// Collect every user's posts onto `output`, closing it when done.
    ///
    /// Each user is one future, and the futures are polled together on the
    /// calling task. At most `max_concurrent` users are in flight at a time,
    /// so a long username list never opens more than that many timelines at
    /// once.
    ///
    /// Returns the first observed per-user failure, after all jobs have
    /// finished. Entries already delivered for other users are kept.
    pub async fn collect(
        &self,
        usernames: &[String],
        output: mpsc::Sender<PostEntry>,
    ) -> Result<CollectSummary> {
        let started_at = Utc::now();
        let usernames = Self::dedup(usernames);
        let concurrency = self.config.max_concurrent.max(1);

        log::info!("Collecting {} users ({} at a time)", usernames.len(), concurrency);

        let sender = &output;
        let mut jobs = stream::iter(usernames.iter().copied())
            .map(|username| async move {
                let result = self.collect_user(username, sender).await;
                (username, result)
            })
            .buffer_unordered(concurrency);

        let mut users = Vec::new();
        let mut failures = Vec::new();
        while let Some((username, result)) = jobs.next().await {
            match result {
                Ok(summary) => {
                    log::info!(
                        "Collected {}: {} cached, {} new",
                        summary.username,
                        summary.cached,
                        summary.fetched
                    );
                    users.push(summary);
                }
                Err(error) => {
                    log::error!("Collection failed for {}: {}", username, error);
                    failures.push(AppError::collect(username, error));
                }
            }
        }

        // Every job has finished; this closes the stream.
        drop(jobs);
        drop(output);

        if !failures.is_empty() {
            log::error!(
                "{} of {} users failed to collect",
                failures.len(),
                usernames.len()
            );
            return Err(failures.swap_remove(0));
        }

        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(CollectSummary {
            users,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Replay one user's cache, then fetch what is new.
    async fn collect_user(
        &self,
        username: &str,
        output: &mpsc::Sender<PostEntry>,
    ) -> Result<UserSummary> {
        validate_username(username)?;
        self.cache.ensure_directory(username).await?;

        let cached = self.cache.list_cached(username).await?;
        let cached_count = cached.len();
        let watermark = cached.watermark;
        for post in cached.posts {
            output
                .send(PostEntry::new(username, post))
                .await
                .map_err(|_| AppError::StreamClosed)?;
        }
        log::debug!(
            "Replayed {} cached posts for {} (watermark {})",
            cached_count,
            username,
            watermark
        );

        let fetch = TimelineFetcher::new(self.client.as_ref(), self.cache.as_ref())
            .fetch_new(username, watermark, output)
            .await?;

        Ok(UserSummary {
            username: username.to_string(),
            cached: cached_count,
            fetched: fetch.fetched,
            watermark,
        })
    }

    /// Drop repeated usernames so no two jobs share a cache directory.
    fn dedup(usernames: &[String]) -> Vec<&str> {
        let mut seen = HashSet::new();
        usernames
            .iter()
            .map(String::as_str)
            .filter(|name| {
                let first = seen.insert(*name);
                if !first {
                    log::warn!("Ignoring repeated username {}", name);
                }
                first
            })
            .collect()
    }
}
