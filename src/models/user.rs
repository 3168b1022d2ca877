//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Google account subject (also used as document ID)
    pub id: String,
    /// Email address from the verified ID token
    pub email: String,
    /// Display name, if the Google profile has one
    pub name: Option<String>,
    /// Profile picture URL
    pub avatar_url: Option<String>,
    /// Whether the install-as-app tutorial was dismissed
    #[serde(default)]
    pub has_seen_pwa_tutorial: bool,
    /// When user first signed in
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last sign-in timestamp
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub last_active: DateTime<Utc>,
}

impl User {
    /// Name shown to other members: the profile name, else the email.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
            .to_string()
    }
}
