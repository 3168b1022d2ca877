//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const GROUPS: &str = "groups";
    /// Keyed by `{group_id}_{user_id}`
    pub const MEMBERSHIPS: &str = "memberships";
    /// Keyed by `{group_id}_{user_id}_{YYYY-MM-DD}`
    pub const CHECK_INS: &str = "check_ins";
}
