// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Storage service for check-in and group photos.
//!
//! Photos are validated before anything is written. An upload failure is
//! returned to the caller, which must abort the database write that would
//! have referenced the photo.

use crate::error::AppError;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};

/// Maximum accepted photo size.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Accepted photo content types.
pub const ALLOWED_PHOTO_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// A photo received in a multipart form.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Check content type and size.
    pub fn validate(&self) -> Result<(), AppError> {
        if !ALLOWED_PHOTO_TYPES.contains(&self.content_type.as_str()) {
            return Err(AppError::validation(
                "photo",
                "Photo must be a JPEG, PNG, WEBP, or GIF.",
            ));
        }
        if self.bytes.len() > MAX_PHOTO_BYTES {
            return Err(AppError::validation(
                "photo",
                "Photo must be smaller than 5 MB.",
            ));
        }
        Ok(())
    }

    /// File extension taken from the uploaded file name, `jpg` if absent.
    pub fn extension(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.trim().to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "jpg".to_string())
    }
}

/// Photo storage backed by a Cloud Storage bucket.
#[derive(Clone)]
pub struct PhotoStorage {
    bucket: String,

    /// GCS client
    client: Option<std::sync::Arc<google_cloud_storage::client::Client>>,

    /// Mock only: fail every upload.
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    fail_uploads: bool,
}

impl PhotoStorage {
    /// Create a new storage service for `bucket`.
    pub async fn new(bucket: &str) -> Result<Self, AppError> {
        let config = google_cloud_storage::client::ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to create GCS auth config: {}", e))
            })?;

        let client = google_cloud_storage::client::Client::new(config);

        Ok(Self {
            bucket: bucket.to_string(),
            client: Some(std::sync::Arc::new(client)),
            fail_uploads: false,
        })
    }

    /// Create a mock storage service for testing (offline mode).
    /// Only available in debug/test builds.
    #[cfg(debug_assertions)]
    pub fn new_mock() -> Self {
        Self {
            bucket: "mock-bucket".to_string(),
            client: None,
            fail_uploads: false,
        }
    }

    /// Create a mock storage service whose uploads always fail.
    #[cfg(debug_assertions)]
    pub fn new_failing_mock() -> Self {
        Self {
            fail_uploads: true,
            ..Self::new_mock()
        }
    }

    /// Upload a photo under `folder` and return its public URL.
    ///
    /// The photo must already have passed [`PhotoUpload::validate`].
    pub async fn upload(&self, folder: &str, photo: &PhotoUpload) -> Result<String, AppError> {
        let object_name = format!(
            "{}/{}.{}",
            folder.trim_matches('/'),
            chrono::Utc::now().timestamp_millis(),
            photo.extension()
        );

        // Mock mode (Debug builds only)
        #[cfg(debug_assertions)]
        {
            if self.client.is_none() {
                if self.fail_uploads {
                    return Err(AppError::Storage("mock upload failure".to_string()));
                }
                return Ok(self.public_url(&object_name));
            }
        }

        let client = self
            .client
            .as_ref()
            .ok_or_else(|| AppError::Storage("storage client not connected".to_string()))?;

        let mut media = Media::new(object_name.clone());
        media.content_type = photo.content_type.clone().into();

        let request = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };

        client
            .upload_object(&request, photo.bytes.clone(), &UploadType::Simple(media))
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            object = %object_name,
            bytes = photo.bytes.len(),
            "Photo uploaded"
        );

        Ok(self.public_url(&object_name))
    }

    /// Public URL of an object in the bucket.
    fn public_url(&self, object_name: &str) -> String {
        let encoded: Vec<String> = object_name
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!(
            "https://storage.googleapis.com/{}/{}",
            self.bucket,
            encoded.join("/")
        )
    }
}
