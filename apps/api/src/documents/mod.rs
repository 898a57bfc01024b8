//! Document publishing boundary.
//!
//! A publisher persists finished content and hands back a link that anyone
//! can open. The resume and cover-letter builders are the only callers.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub mod render;
pub mod s3;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Nothing to publish: {0}")]
    EmptyDocument(String),
}

/// Persists an artifact and returns a shareable URL.
#[async_trait]
pub trait DocumentPublisher: Send + Sync {
    /// Publishes `body` as a new document named `title`.
    async fn publish(&self, title: &str, body: &str) -> Result<String, PublishError>;

    /// Uploads a local file as a new document named `title`.
    async fn upload(&self, local_file: &Path, title: &str) -> Result<String, PublishError>;
}

/// Turns a document title into a storage-safe slug.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "document".to_string()
    } else {
        slug
    }
}
