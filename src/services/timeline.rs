//! Remote timeline API seam.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Post;

/// Parameters of a single timeline page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineQuery {
    /// Screen name whose timeline is read
    pub screen_name: String,
    /// Only return posts with an identifier at or below this one.
    /// `None` starts from the most recent post.
    pub max_id: Option<u64>,
    pub exclude_replies: bool,
    pub include_rts: bool,
    /// Request untruncated post text
    pub extended: bool,
}

impl TimelineQuery {
    /// Query for a user's timeline, starting from the most recent post.
    pub fn new(screen_name: impl Into<String>) -> Self {
        Self {
            screen_name: screen_name.into(),
            max_id: None,
            exclude_replies: false,
            include_rts: false,
            extended: true,
        }
    }

    /// Restrict the page to posts at or below `max_id`.
    pub fn with_max_id(mut self, max_id: Option<u64>) -> Self {
        self.max_id = max_id;
        self
    }
}

/// A paginated source of timeline posts.
///
/// Implementations return one page per call, newest first. An empty page
/// means the timeline is exhausted.
#[async_trait]
pub trait TimelineClient: Send + Sync {
    async fn user_timeline(&self, query: &TimelineQuery) -> Result<Vec<Post>>;
}
