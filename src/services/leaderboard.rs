// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak and ranking computation for group leaderboards.
//!
//! Everything here is pure: the caller supplies the members, the
//! (user, day) check-in pairs and the current UTC day. Leaderboards are
//! recomputed on every read.

use crate::models::{CheckInDay, MemberProfile, RankingEntry};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Length of the run of consecutive days ending today or yesterday.
///
/// A streak is about recency: if the most recent check-in is older than
/// yesterday the streak is 0, not merely shorter.
pub fn compute_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut days = dates.to_vec();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some(&most_recent) = days.first() else {
        return 0;
    };

    if most_recent != today && Some(most_recent) != today.pred_opt() {
        return 0;
    }

    let mut streak = 0;
    let mut expected = Some(most_recent);
    for day in days {
        match expected {
            Some(e) if day == e => {
                streak += 1;
                expected = e.pred_opt();
            }
            // Sorted and deduplicated, so anything else is a gap
            _ => break,
        }
    }

    streak
}

/// Ranked members of one group.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    entries: Vec<RankingEntry>,
}

impl Leaderboard {
    /// Rank `members` by check-in count.
    ///
    /// `members` must be in membership order (earliest join first). The sort
    /// is stable, so members with equal counts keep that order, and ranks are
    /// assigned by position. Check-ins from non-members are ignored.
    pub fn compute(members: &[MemberProfile], check_ins: &[CheckInDay], today: NaiveDate) -> Self {
        let mut dates_by_user: HashMap<&str, Vec<NaiveDate>> = HashMap::new();
        for check_in in check_ins {
            dates_by_user
                .entry(check_in.user_id.as_str())
                .or_default()
                .push(check_in.date);
        }

        let mut entries: Vec<RankingEntry> = members
            .iter()
            .map(|member| {
                let dates = dates_by_user
                    .get(member.user_id.as_str())
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                RankingEntry {
                    user_id: member.user_id.clone(),
                    display_name: member.display_name.clone(),
                    check_ins: dates.len() as u32,
                    streak: compute_streak(dates, today),
                    rank: 0,
                }
            })
            .collect();

        entries.sort_by(|a, b| b.check_ins.cmp(&a.check_ins));
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = i as u32 + 1;
        }

        Self { entries }
    }

    /// All entries, rank 1 first.
    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<RankingEntry> {
        self.entries
    }

    /// The member with the most check-ins.
    pub fn leader(&self) -> Option<&RankingEntry> {
        self.entries.first()
    }

    /// Look up one member's entry by user ID.
    pub fn entry_for(&self, user_id: &str) -> Option<&RankingEntry> {
        self.entries.iter().find(|e| e.user_id == user_id)
    }
}
