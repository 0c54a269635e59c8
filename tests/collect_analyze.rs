//! End-to-end collection into the averages module.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;

use twinalysis::analysis::{Analyzer, AnalyzerRegistry, Averages};
use twinalysis::error::Result;
use twinalysis::models::{CollectorConfig, Post};
use twinalysis::pipeline::{Collector, run_analysis};
use twinalysis::services::{TimelineClient, TimelineQuery};
use twinalysis::storage::{LocalCache, PostCache};

/// Serves fixed timelines two posts per page, newest first.
struct Timelines(HashMap<String, Vec<Post>>);

impl Timelines {
    fn new() -> Self {
        Self(HashMap::new())
    }

    /// Posts `1..=count`, each with `favorites` favorites and one retweet.
    fn user(mut self, username: &str, count: u64, favorites: u64) -> Self {
        let posts = (1..=count)
            .rev()
            .map(|id| {
                let mut post = Post::new(id);
                post.favorite_count = favorites;
                post.retweet_count = 1;
                post
            })
            .collect();
        self.0.insert(username.to_string(), posts);
        self
    }
}

#[async_trait]
impl TimelineClient for Timelines {
    async fn user_timeline(&self, query: &TimelineQuery) -> Result<Vec<Post>> {
        let posts = self.0.get(&query.screen_name).cloned().unwrap_or_default();
        Ok(posts
            .into_iter()
            .filter(|p| query.max_id.is_none_or(|max_id| p.id <= max_id))
            .take(2)
            .collect())
    }
}

fn usernames(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

async fn collect_and_tally(
    collector: &Collector,
    users: &[String],
) -> (usize, Vec<twinalysis::analysis::UserAverages>) {
    let (tx, rx) = mpsc::channel(4);
    let (summary, rows) = tokio::join!(collector.collect(users, tx), Averages::tally(rx));
    (summary.unwrap().total_entries(), rows)
}

#[tokio::test]
async fn test_collect_then_average() {
    let tmp = TempDir::new().unwrap();
    let cache = Arc::new(LocalCache::new(tmp.path().join("data")));
    let client = Arc::new(Timelines::new().user("jack", 5, 4).user("ev", 3, 10));
    let collector = Collector::new(client, cache.clone(), CollectorConfig::default());

    let (total, rows) = collect_and_tally(&collector, &usernames(&["jack", "ev"])).await;

    assert_eq!(total, 8);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].username, "ev");
    assert_eq!(rows[0].posts, 3);
    assert_eq!(rows[0].mean(rows[0].favorites), 10.0);
    assert_eq!(rows[1].username, "jack");
    assert_eq!(rows[1].posts, 5);
    assert_eq!(rows[1].mean(rows[1].retweets), 1.0);

    assert_eq!(cache.list_cached("jack").await.unwrap().len(), 5);
    assert!(cache.record_path("ev", 3).exists());
}

#[tokio::test]
async fn test_second_run_replays_cache_and_fetches_only_new() {
    let tmp = TempDir::new().unwrap();
    let cache = Arc::new(LocalCache::new(tmp.path().join("data")));
    let users = usernames(&["jack"]);

    let first = Collector::new(
        Arc::new(Timelines::new().user("jack", 3, 1)),
        cache.clone(),
        CollectorConfig::default(),
    );
    let (total, _) = collect_and_tally(&first, &users).await;
    assert_eq!(total, 3);

    // Two more posts appear upstream.
    let second = Collector::new(
        Arc::new(Timelines::new().user("jack", 5, 1)),
        cache.clone(),
        CollectorConfig::default(),
    );
    let (tx, rx) = mpsc::channel(4);
    let (summary, rows) = tokio::join!(second.collect(&users, tx), Averages::tally(rx));
    let summary = summary.unwrap();

    assert_eq!(summary.users[0].cached, 3);
    assert_eq!(summary.users[0].fetched, 2);
    assert_eq!(summary.users[0].watermark, 3);
    assert_eq!(rows[0].posts, 5);
    assert_eq!(cache.list_cached("jack").await.unwrap().watermark, 5);
}

#[tokio::test]
async fn test_registry_module_runs_through_pipeline() {
    let tmp = TempDir::new().unwrap();
    let collector = Collector::new(
        Arc::new(Timelines::new().user("jack", 4, 2)),
        Arc::new(LocalCache::new(tmp.path().join("data"))),
        CollectorConfig::default(),
    );
    let registry = AnalyzerRegistry::with_defaults();
    let analyzer: &dyn Analyzer = registry.get("averages").unwrap();

    let summary = run_analysis(&collector, analyzer, &usernames(&["jack"]), 2)
        .await
        .unwrap();

    assert_eq!(summary.total_entries(), 4);
    assert_eq!(summary.total_fetched(), 4);
}
