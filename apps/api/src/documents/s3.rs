use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::config::ShareAccess;
use crate::documents::{slugify, DocumentPublisher, PublishError};

const CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

/// Publishes documents as objects in an S3-compatible bucket (AWS or MinIO).
pub struct S3Publisher {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
    access: ShareAccess,
}

impl S3Publisher {
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: String,
        public_base_url: String,
        access: ShareAccess,
    ) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
            access,
        }
    }

    fn object_key(title: &str) -> String {
        format!("documents/{}/{}.md", Uuid::new_v4(), slugify(title))
    }

    fn share_url(&self, key: &str) -> String {
        share_url(&self.public_base_url, &self.bucket, key)
    }

    async fn put(&self, title: &str, body: ByteStream) -> Result<String, PublishError> {
        let key = Self::object_key(title);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(CONTENT_TYPE)
            .metadata("title", title)
            .acl(canned_acl(self.access))
            .body(body)
            .send()
            .await
            .map_err(|e| PublishError::Storage(format!("put_object {key} failed: {e}")))?;

        let url = self.share_url(&key);
        info!("Published '{}' to {}", title, url);
        Ok(url)
    }
}

#[async_trait]
impl DocumentPublisher for S3Publisher {
    async fn publish(&self, title: &str, body: &str) -> Result<String, PublishError> {
        if body.trim().is_empty() {
            return Err(PublishError::EmptyDocument(title.to_string()));
        }
        let bytes = Bytes::copy_from_slice(body.as_bytes());
        self.put(title, ByteStream::from(bytes)).await
    }

    async fn upload(&self, local_file: &Path, title: &str) -> Result<String, PublishError> {
        let stream = ByteStream::from_path(local_file)
            .await
            .map_err(|e| PublishError::Storage(format!("cannot read {}: {e}", local_file.display())))?;
        self.put(title, stream).await
    }
}

fn canned_acl(access: ShareAccess) -> ObjectCannedAcl {
    match access {
        ShareAccess::Read => ObjectCannedAcl::PublicRead,
        ShareAccess::ReadWrite => ObjectCannedAcl::PublicReadWrite,
    }
}

/// Path-style URL for an object key.
fn share_url(base: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key)
}
