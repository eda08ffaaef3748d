// src/integrations/hosted/storage.rs

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header, Method};

use crate::error::AppResult;
use crate::infrastructure::{Bucket, ObjectStorage};
use crate::integrations::hosted::client::HostedClient;

/// Object storage under /storage/v1
pub struct HostedObjectStorage {
    client: Arc<HostedClient>,
}

impl HostedObjectStorage {
    pub fn new(client: Arc<HostedClient>) -> Self {
        Self { client }
    }
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or_default() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl ObjectStorage for HostedObjectStorage {
    async fn upload(&self, bucket: Bucket, path: &str, bytes: Vec<u8>, upsert: bool) -> AppResult<()> {
        let response = self
            .client
            .request(Method::POST, &self.client.object_url(bucket.as_str(), path))
            .header(header::CONTENT_TYPE, content_type_for(path))
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await?;
        HostedClient::check(response, &format!("upload {}/{}", bucket.as_str(), path)).await?;
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        self.client.public_object_url(bucket.as_str(), path)
    }
}
