// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Daily reading check-in model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One user's reading record for one UTC day in one group.
///
/// Check-ins are immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
    /// Document ID: `{group_id}_{user_id}_{date}`
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    /// UTC calendar day, stored as `YYYY-MM-DD`
    pub date: NaiveDate,
    pub title: String,
    pub book_title: Option<String>,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
    pub pages_read: u32,
    pub chapters_read: u32,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl CheckIn {
    /// Firestore document ID for a (group, user, day) triple.
    ///
    /// Writing with a create-only operation makes this the uniqueness constraint.
    pub fn document_id(group_id: &str, user_id: &str, date: NaiveDate) -> String {
        format!("{}_{}_{}", group_id, user_id, date.format("%Y-%m-%d"))
    }

    /// The (user, day) pair used by the leaderboard.
    pub fn day(&self) -> CheckInDay {
        CheckInDay {
            user_id: self.user_id.clone(),
            date: self.date,
        }
    }
}

/// A (user, day) pair: the only part of a check-in the leaderboard needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInDay {
    pub user_id: String,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_is_per_day() {
        let day = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        assert_eq!(
            CheckIn::document_id("g1", "u1", day),
            "g1_u1_2026-02-03"
        );
        assert_ne!(
            CheckIn::document_id("g1", "u1", day),
            CheckIn::document_id("g1", "u1", day.succ_opt().unwrap())
        );
    }

    #[test]
    fn test_date_serializes_as_calendar_day() {
        let day = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        assert_eq!(serde_json::to_string(&day).unwrap(), "\"2026-02-03\"");
    }
}
