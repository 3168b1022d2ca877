// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in write path.
//!
//! Handles the workflow:
//! 1. Validate the form (title required, counts clamped, photo checked)
//! 2. Verify the caller is a member of the group
//! 3. Upload the photo, if any
//! 4. Create the check-in for today's UTC date (create-only)

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::CheckIn;
use crate::services::storage::{PhotoStorage, PhotoUpload};
use crate::time_utils::utc_day;

/// Raw check-in form fields as submitted.
#[derive(Debug, Clone, Default)]
pub struct CheckInForm {
    pub title: Option<String>,
    pub book_title: Option<String>,
    pub notes: Option<String>,
    pub pages_read: Option<String>,
    pub chapters_read: Option<String>,
    pub photo: Option<PhotoUpload>,
}

/// A check-in form that passed validation.
#[derive(Debug, Clone)]
pub struct ValidCheckIn {
    pub title: String,
    pub book_title: Option<String>,
    pub notes: Option<String>,
    pub pages_read: u32,
    pub chapters_read: u32,
    pub photo: Option<PhotoUpload>,
}

impl CheckInForm {
    /// Validate before anything is written.
    pub fn validate(self) -> Result<ValidCheckIn> {
        let title = non_empty(self.title)
            .ok_or_else(|| AppError::validation("title", "A check-in title is required."))?;

        let photo = self.photo.filter(|p| !p.bytes.is_empty());
        if let Some(photo) = &photo {
            photo.validate()?;
        }

        Ok(ValidCheckIn {
            title,
            book_title: non_empty(self.book_title),
            notes: non_empty(self.notes),
            pages_read: parse_count(self.pages_read.as_deref()),
            chapters_read: parse_count(self.chapters_read.as_deref()),
            photo,
        })
    }
}

/// Trim a text field; blank becomes `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a page/chapter count leniently.
///
/// Leading digits are used (`"12 pages"` is 12). Missing, non-numeric and
/// negative input all become 0; huge values saturate.
pub fn parse_count(raw: Option<&str>) -> u32 {
    let Some(raw) = raw.map(str::trim) else {
        return 0;
    };
    if raw.starts_with('-') {
        return 0;
    }
    let digits: String = raw
        .trim_start_matches('+')
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<u32>().unwrap_or(u32::MAX)
}

/// Records daily check-ins.
pub struct CheckInService {
    db: FirestoreDb,
    storage: PhotoStorage,
}

impl CheckInService {
    pub fn new(db: FirestoreDb, storage: PhotoStorage) -> Self {
        Self { db, storage }
    }

    /// Record today's check-in for `user_id` in `group_id`.
    ///
    /// Non-members get `NotFound`. A second check-in on the same UTC day
    /// gets `Conflict`. A failed photo upload aborts before the write.
    pub async fn record(&self, user_id: &str, group_id: &str, form: CheckInForm) -> Result<CheckIn> {
        let input = form.validate()?;

        if self.db.get_membership(group_id, user_id).await?.is_none() {
            tracing::warn!(user_id, group_id, "Check-in attempt by non-member");
            return Err(AppError::NotFound(format!("Group {} not found", group_id)));
        }

        let now = chrono::Utc::now();
        let today = utc_day(now);

        // Skip the upload when the write is bound to fail. The create-only
        // write below still decides races.
        if self
            .db
            .get_check_in(group_id, user_id, today)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(AppError::ALREADY_CHECKED_IN.to_string()));
        }

        let photo_url = match &input.photo {
            Some(photo) => Some(
                self.storage
                    .upload(&format!("check-ins/{}/{}", user_id, group_id), photo)
                    .await?,
            ),
            None => None,
        };

        let check_in = CheckIn {
            id: CheckIn::document_id(group_id, user_id, today),
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            date: today,
            title: input.title,
            book_title: input.book_title,
            notes: input.notes,
            photo_url,
            pages_read: input.pages_read,
            chapters_read: input.chapters_read,
            created_at: now,
        };

        self.db.create_check_in(&check_in).await?;

        tracing::info!(
            user_id,
            group_id,
            date = %today,
            pages = check_in.pages_read,
            chapters = check_in.chapters_read,
            has_photo = check_in.photo_url.is_some(),
            "Check-in recorded"
        );

        Ok(check_in)
    }
}
