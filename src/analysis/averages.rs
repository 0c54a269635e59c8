//! Per-user engagement averages.

use std::collections::BTreeMap;

use async_trait::async_trait;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use tokio::sync::mpsc;

use crate::analysis::Analyzer;
use crate::error::Result;
use crate::models::{Post, PostEntry};

/// Engagement totals for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAverages {
    pub username: String,
    pub posts: u64,
    pub favorites: u64,
    pub retweets: u64,
    pub replies: u64,
    pub quotes: u64,
}

impl UserAverages {
    fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    // Totals saturate rather than wrap on absurd counters.
    fn add(&mut self, post: &Post) {
        self.posts = self.posts.saturating_add(1);
        self.favorites = self.favorites.saturating_add(post.favorite_count);
        self.retweets = self.retweets.saturating_add(post.retweet_count);
        self.replies = self.replies.saturating_add(post.reply_count);
        self.quotes = self.quotes.saturating_add(post.quote_count);
    }

    /// Per-post mean of a total; 0 for a user without posts.
    pub fn mean(&self, total: u64) -> f64 {
        if self.posts == 0 {
            0.0
        } else {
            total as f64 / self.posts as f64
        }
    }
}

/// Prints average favorites, retweets, replies and quotes per post.
#[derive(Debug, Default)]
pub struct Averages;

impl Averages {
    pub fn new() -> Self {
        Self
    }

    /// Drain the stream into per-user totals, sorted by username.
    pub async fn tally(mut entries: mpsc::Receiver<PostEntry>) -> Vec<UserAverages> {
        let mut by_user: BTreeMap<String, UserAverages> = BTreeMap::new();
        while let Some(entry) = entries.recv().await {
            by_user
                .entry(entry.username)
                .or_insert_with_key(|name| UserAverages::new(name.as_str()))
                .add(&entry.post);
        }
        by_user.into_values().collect()
    }

    /// Render totals as a table.
    pub fn render(rows: &[UserAverages]) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Username").fg(Color::Cyan),
            Cell::new("Posts").fg(Color::Cyan),
            Cell::new("Favorites").fg(Color::Cyan),
            Cell::new("Retweets").fg(Color::Cyan),
            Cell::new("Replies").fg(Color::Cyan),
            Cell::new("Quotes").fg(Color::Cyan),
        ]);

        for row in rows {
            let mean = |total| {
                Cell::new(format!("{:.2}", row.mean(total))).set_alignment(CellAlignment::Right)
            };
            table.add_row(vec![
                Cell::new(&row.username),
                Cell::new(row.posts).set_alignment(CellAlignment::Right),
                mean(row.favorites),
                mean(row.retweets),
                mean(row.replies),
                mean(row.quotes),
            ]);
        }

        table
    }
}

#[async_trait]
impl Analyzer for Averages {
    fn name(&self) -> &'static str {
        "averages"
    }

    fn description(&self) -> &'static str {
        "Average favorites, retweets, replies and quotes per post"
    }

    async fn analyze(&self, entries: mpsc::Receiver<PostEntry>) -> Result<()> {
        let rows = Self::tally(entries).await;
        if rows.is_empty() {
            log::warn!("No posts collected");
        }
        println!("{}", Self::render(&rows));
        Ok(())
    }
}
