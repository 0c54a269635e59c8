//! Local filesystem cache implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {data_dir}/
//! └── {username}/           # created with mode 0755
//!     ├── {id}.json         # one serialized Post per file
//!     └── {id}.json.tmp     # in-flight write, ignored on replay
//! ```
//!
//! Writes go to a temporary file and are renamed into place, so a record is
//! either absent or complete under its final name.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{CacheConfig, Post};
use crate::storage::{CachedPosts, PostCache};

/// Extension of record files.
pub const RECORD_EXTENSION: &str = "json";

/// Permissions for user directories.
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Local filesystem cache backend.
#[derive(Debug, Clone)]
pub struct LocalCache {
    data_dir: PathBuf,
}

impl LocalCache {
    /// Create a LocalCache storing user directories under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Create a LocalCache from the `[cache]` configuration section.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.data_dir())
    }

    /// Root directory holding one subdirectory per user.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory for a single user's records.
    pub fn user_dir(&self, username: &str) -> PathBuf {
        self.data_dir.join(username)
    }

    /// Path of the record file for a post.
    pub fn record_path(&self, username: &str, id: u64) -> PathBuf {
        self.user_dir(username).join(format!("{id}.{RECORD_EXTENSION}"))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
        let tmp = path.with_extension(format!("{RECORD_EXTENSION}.tmp"));
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read and decode one record file.
    async fn read_record(path: &Path) -> Result<Post> {
        let bytes = tokio::fs::read(path).await?;
        Post::decode(&bytes).map_err(|source| AppError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    fn is_record(path: &Path) -> bool {
        path.extension().and_then(|ext| ext.to_str()) == Some(RECORD_EXTENSION)
    }
}

#[async_trait]
impl PostCache for LocalCache {
    async fn ensure_directory(&self, username: &str) -> Result<PathBuf> {
        let dir = self.user_dir(username);

        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(DIR_MODE);
        builder.create(&dir).await?;

        Ok(dir)
    }

    async fn list_cached(&self, username: &str) -> Result<CachedPosts> {
        let dir = self.user_dir(username);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No cache directory for {} at {}", username, dir.display());
                return Ok(CachedPosts::default());
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut posts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() || !Self::is_record(&path) {
                log::debug!("Skipping non-record cache entry {}", path.display());
                continue;
            }
            posts.push(Self::read_record(&path).await?);
        }

        let cached = CachedPosts::from_posts(posts);
        log::debug!(
            "Loaded {} cached posts for {} (watermark {})",
            cached.len(),
            username,
            cached.watermark
        );
        Ok(cached)
    }

    async fn save(&self, username: &str, post: &Post) -> Result<()> {
        let bytes = post.encode()?;
        Self::write_bytes(&self.record_path(username, post.id), &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn post_with_text(id: u64, text: &str) -> Post {
        let mut post = Post::new(id);
        post.favorite_count = id * 2;
        post.set_field("full_text", text);
        post
    }

    #[tokio::test]
    async fn test_ensure_directory_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let cache = LocalCache::new(tmp.path().join("data"));

        let first = cache.ensure_directory("jack").await.unwrap();
        let second = cache.ensure_directory("jack").await.unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
        assert_eq!(first, tmp.path().join("data").join("jack"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ensure_directory_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let cache = LocalCache::new(tmp.path());
        let dir = cache.ensure_directory("jack").await.unwrap();

        let mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        // umask may only remove bits
        assert_eq!(mode & !DIR_MODE, 0);
        assert_ne!(mode & 0o700, 0);
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        let cache = LocalCache::new(tmp.path());

        let cached = cache.list_cached("nobody").await.unwrap();
        assert!(cached.is_empty());
        assert_eq!(cached.watermark, 0);
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let tmp = TempDir::new().unwrap();
        let cache = LocalCache::new(tmp.path());
        cache.ensure_directory("jack").await.unwrap();

        for id in [3, 11, 7] {
            cache.save("jack", &post_with_text(id, "hello")).await.unwrap();
        }

        let cached = cache.list_cached("jack").await.unwrap();
        assert_eq!(cached.len(), 3);
        assert_eq!(cached.watermark, 11);

        let mut ids: Vec<u64> = cached.posts.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![3, 7, 11]);
        assert!(cache.record_path("jack", 11).is_file());
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let cache = LocalCache::new(tmp.path());
        cache.ensure_directory("jack").await.unwrap();

        let post = post_with_text(42, "same content");
        cache.save("jack", &post).await.unwrap();
        let first = std::fs::read(cache.record_path("jack", 42)).unwrap();
        cache.save("jack", &post).await.unwrap();
        let second = std::fs::read(cache.record_path("jack", 42)).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.list_cached("jack").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_skips_temporary_files() {
        let tmp = TempDir::new().unwrap();
        let cache = LocalCache::new(tmp.path());
        let dir = cache.ensure_directory("jack").await.unwrap();

        cache.save("jack", &Post::new(5)).await.unwrap();
        std::fs::write(dir.join("9.json.tmp"), b"{\"id\": 9").unwrap();

        let cached = cache.list_cached("jack").await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached.watermark, 5);
    }

    #[tokio::test]
    async fn test_list_rejects_corrupt_record() {
        let tmp = TempDir::new().unwrap();
        let cache = LocalCache::new(tmp.path());
        let dir = cache.ensure_directory("jack").await.unwrap();

        std::fs::write(dir.join("13.json"), b"not json at all").unwrap();

        let err = cache.list_cached("jack").await.unwrap_err();
        match err {
            AppError::Decode { path, .. } => assert_eq!(path, dir.join("13.json")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_users_are_partitioned() {
        let tmp = TempDir::new().unwrap();
        let cache = LocalCache::new(tmp.path());
        cache.ensure_directory("alice").await.unwrap();
        cache.ensure_directory("bob").await.unwrap();

        cache.save("alice", &Post::new(100)).await.unwrap();
        cache.save("bob", &Post::new(1)).await.unwrap();

        assert_eq!(cache.list_cached("alice").await.unwrap().watermark, 100);
        assert_eq!(cache.list_cached("bob").await.unwrap().watermark, 1);
    }
}
