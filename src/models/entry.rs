//! Tagged post entries and username handling.

use crate::error::{AppError, Result};
use crate::models::Post;

/// Longest screen name the API accepts.
const MAX_USERNAME_LEN: usize = 15;

/// A post paired with the user whose timeline it came from.
///
/// This is the unit carried on the output stream.
#[derive(Debug, Clone, PartialEq)]
pub struct PostEntry {
    pub username: String,
    pub post: Post,
}

impl PostEntry {
    pub fn new(username: impl Into<String>, post: Post) -> Self {
        Self {
            username: username.into(),
            post,
        }
    }
}

/// Check that a username is a valid screen name.
///
/// Usernames become cache directory names, so anything outside
/// `[A-Za-z0-9_]{1,15}` is rejected.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(AppError::validation("username is empty"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(AppError::validation(format!(
            "username '{username}' is longer than {MAX_USERNAME_LEN} characters"
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::validation(format!(
            "username '{username}' contains invalid characters"
        )));
    }
    Ok(())
}
