//! Storage abstractions for post persistence.
//!
//! Every user gets a directory of individual post records. Records are only
//! ever appended; nothing here rewrites or deletes them.
//!
//! ## Directory Structure
//!
//! ```text
//! {root}/
//! └── data/
//!     ├── jack/
//!     │   ├── 20.json
//!     │   └── 1445078208190291968.json
//!     └── someone_else/
//!         └── 1212092628029698048.json
//! ```

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Post;

// Re-export for convenience
pub use local::LocalCache;

/// Contents of a user's cache at the start of a run.
#[derive(Debug, Clone, Default)]
pub struct CachedPosts {
    /// Cached records in directory-listing order
    pub posts: Vec<Post>,
    /// Largest cached identifier, 0 when the cache is empty
    pub watermark: u64,
}

impl CachedPosts {
    /// Build from records, computing the watermark.
    pub fn from_posts(posts: Vec<Post>) -> Self {
        let watermark = posts.iter().map(|p| p.id).max().unwrap_or(0);
        Self { posts, watermark }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Trait for post cache backends.
#[async_trait]
pub trait PostCache: Send + Sync {
    /// Create the user's cache directory if missing and return its path.
    async fn ensure_directory(&self, username: &str) -> Result<PathBuf>;

    /// Read every cached record for a user.
    ///
    /// Order is unspecified. A user with no directory has an empty cache.
    async fn list_cached(&self, username: &str) -> Result<CachedPosts>;

    /// Persist one record keyed by its identifier.
    async fn save(&self, username: &str, post: &Post) -> Result<()>;
}
