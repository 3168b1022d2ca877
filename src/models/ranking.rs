//! Leaderboard entries derived from check-ins (never persisted).

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A group member as seen by the leaderboard.
#[derive(Debug, Clone)]
pub struct MemberProfile {
    pub user_id: String,
    pub display_name: String,
}

/// One member's position on a group leaderboard.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RankingEntry {
    pub user_id: String,
    pub display_name: String,
    /// Total check-ins in the group
    pub check_ins: u32,
    /// Consecutive days ending today or yesterday (UTC)
    pub streak: u32,
    /// 1 = most check-ins
    pub rank: u32,
}
