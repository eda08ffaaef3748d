// src/infrastructure/object_storage.rs
//
// Object storage for cover images and avatars
//
// RULES:
// - Paths are `{user_id}/...` inside a bucket
// - Storage never touches entity rows; callers store the public URL

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    StoryCovers,
    Avatars,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::StoryCovers => "story-covers",
            Bucket::Avatars => "avatars",
        }
    }
}

/// A file picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Text after the last dot, lowercased; "bin" when nothing usable
    pub fn extension(&self) -> String {
        let ext: String = self
            .file_name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        if ext.is_empty() {
            "bin".to_string()
        } else {
            ext
        }
    }
}

/// `{user}/{unix_millis}.{ext}`: a fresh object per cover upload
pub fn cover_path(user_id: Uuid, upload: &Upload, now: DateTime<Utc>) -> String {
    format!("{}/{}.{}", user_id, now.timestamp_millis(), upload.extension())
}

/// `{user}/avatar.{ext}`: overwritten on every upload
pub fn avatar_path(user_id: Uuid, upload: &Upload) -> String {
    format!("{}/avatar.{}", user_id, upload.extension())
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `path`. Without `upsert`, an existing object is an error.
    async fn upload(&self, bucket: Bucket, path: &str, bytes: Vec<u8>, upsert: bool) -> AppResult<()>;

    fn public_url(&self, bucket: Bucket, path: &str) -> String;
}

/// Upload then resolve the public URL
pub async fn store_public(
    storage: &dyn ObjectStorage,
    bucket: Bucket,
    path: &str,
    upload: Upload,
    upsert: bool,
) -> AppResult<String> {
    storage.upload(bucket, path, upload.bytes, upsert).await?;
    log::debug!("uploaded {}/{}", bucket.as_str(), path);
    Ok(storage.public_url(bucket, path))
}

/// Filesystem-backed storage for the local backend
pub struct LocalObjectStorage {
    root: PathBuf,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, bucket: Bucket, path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, std::path::Component::Normal(_)));
        if !safe {
            return Err(AppError::invalid(format!("invalid object path: {}", path)));
        }
        Ok(self.root.join(bucket.as_str()).join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(&self, bucket: Bucket, path: &str, bytes: Vec<u8>, upsert: bool) -> AppResult<()> {
        let target = self.resolve(bucket, path)?;
        if !upsert && target.exists() {
            return Err(AppError::Other(format!(
                "object already exists: {}/{}",
                bucket.as_str(),
                path
            )));
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        format!("file://{}", self.root.join(bucket.as_str()).join(path).display())
    }
}
