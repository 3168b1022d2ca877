// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Reading group and membership models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reading group ("club").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Random group ID (also used as document ID)
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Cover photo URL
    pub photo_url: Option<String>,
    /// Opaque token used in invite links
    pub invite_code: String,
    /// User ID of the creator; the only user allowed to edit the group
    pub created_by: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }
}

/// Membership of one user in one group.
///
/// Document ID is `{group_id}_{user_id}`, so a user can join a group at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: String,
    pub user_id: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub joined_at: DateTime<Utc>,
}

impl GroupMembership {
    /// Firestore document ID for a (group, user) pair.
    pub fn document_id(group_id: &str, user_id: &str) -> String {
        format!("{}_{}", group_id, user_id)
    }
}
