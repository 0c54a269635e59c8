// src/services/fetcher.rs

//! Incremental timeline fetcher.
//!
//! Pages backward through a user's timeline from the most recent post and
//! stops at the cache watermark, so history already on disk is never
//! requested twice. Each new post is handed to two concurrent stages:
//!
//! - the network stage forwards it to the output stream;
//! - the persistence stage writes it to the cache.
//!
//! The stages are joined with `try_join!`, so the first failure of either
//! one cancels the other and fails the whole fetch.
//!
//! The remote API must return identifiers in strictly decreasing order,
//! within and across pages. Items that are not older than the last emitted
//! post are skipped; an item at or below the watermark ends the fetch.

use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::models::{Post, PostEntry};
use crate::services::{TimelineClient, TimelineQuery};
use crate::storage::PostCache;

/// Summary of one user's fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Pages requested from the API
    pub pages: usize,
    /// Posts forwarded to the output stream
    pub fetched: usize,
    /// Posts written to the cache
    pub saved: usize,
    /// Whether pagination stopped at the watermark rather than running out
    pub reached_watermark: bool,
}

#[derive(Debug, Default)]
struct Progress {
    pages: usize,
    fetched: usize,
    reached_watermark: bool,
}

/// Fetches posts newer than a watermark and caches them.
pub struct TimelineFetcher<'a> {
    client: &'a dyn TimelineClient,
    cache: &'a dyn PostCache,
}

impl<'a> TimelineFetcher<'a> {
    pub fn new(client: &'a dyn TimelineClient, cache: &'a dyn PostCache) -> Self {
        Self { client, cache }
    }

    /// Fetch every post newer than `watermark`, forwarding each to `output`
    /// and saving it to the cache.
    ///
    /// Records saved before a failure stay on disk.
    pub async fn fetch_new(
        &self,
        username: &str,
        watermark: u64,
        output: &mpsc::Sender<PostEntry>,
    ) -> Result<FetchSummary> {
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();

        let (progress, saved) = tokio::try_join!(
            self.paginate(username, watermark, persist_tx, output),
            self.persist(username, persist_rx),
        )?;

        log::debug!(
            "Fetched {} new posts for {} over {} pages",
            progress.fetched,
            username,
            progress.pages
        );

        Ok(FetchSummary {
            pages: progress.pages,
            fetched: progress.fetched,
            saved,
            reached_watermark: progress.reached_watermark,
        })
    }

    /// Network stage. Dropping `persist` on return ends the persistence stage.
    async fn paginate(
        &self,
        username: &str,
        watermark: u64,
        persist: mpsc::UnboundedSender<Post>,
        output: &mpsc::Sender<PostEntry>,
    ) -> Result<Progress> {
        let mut progress = Progress::default();
        let mut cursor: Option<u64> = None;

        loop {
            let query = TimelineQuery::new(username).with_max_id(cursor);
            let batch = self.client.user_timeline(&query).await?;
            progress.pages += 1;

            if batch.is_empty() {
                log::debug!("Timeline of {} exhausted", username);
                break;
            }

            let page_start = cursor;
            for post in batch {
                if post.id <= watermark {
                    progress.reached_watermark = true;
                    return Ok(progress);
                }
                if cursor.is_some_and(|max_id| post.id > max_id) {
                    log::warn!(
                        "Skipping out-of-order post {} for {} (cursor {:?})",
                        post.id,
                        username,
                        cursor
                    );
                    continue;
                }

                let id = post.id;
                persist
                    .send(post.clone())
                    .map_err(|_| AppError::task("persistence stage stopped"))?;
                output
                    .send(PostEntry::new(username, post))
                    .await
                    .map_err(|_| AppError::StreamClosed)?;

                progress.fetched += 1;
                // id > watermark >= 0
                cursor = Some(id - 1);
            }

            if cursor == page_start {
                log::warn!("Page for {} made no progress, stopping", username);
                break;
            }
            if cursor == Some(0) {
                break;
            }
        }

        Ok(progress)
    }

    /// Persistence stage.
    async fn persist(
        &self,
        username: &str,
        mut posts: mpsc::UnboundedReceiver<Post>,
    ) -> Result<usize> {
        let mut saved = 0;
        while let Some(post) = posts.recv().await {
            self.cache.save(username, &post).await?;
            saved += 1;
        }
        Ok(saved)
    }
}
