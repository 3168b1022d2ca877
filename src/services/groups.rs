// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reading group lifecycle: create, edit, join, leave.
//!
//! Read paths that need membership checks go through
//! [`GroupService::require_member`], which answers "not found" for groups
//! the caller does not belong to.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{CheckInDay, Group, GroupMembership, MemberProfile, User};
use crate::services::check_in::non_empty;
use crate::services::leaderboard::Leaderboard;
use crate::services::storage::{PhotoStorage, PhotoUpload};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::NaiveDate;
use ring::rand::{SecureRandom, SystemRandom};
use std::collections::HashMap;

/// Random bytes in a group ID (hex encoded).
const GROUP_ID_BYTES: usize = 16;

/// Random bytes in an invite code (base64url encoded, 12 chars).
const INVITE_CODE_BYTES: usize = 9;

/// Raw group form fields as submitted.
#[derive(Debug, Clone, Default)]
pub struct GroupForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub photo: Option<PhotoUpload>,
}

#[derive(Debug, Clone)]
pub struct ValidGroupForm {
    pub title: String,
    pub description: Option<String>,
    pub photo: Option<PhotoUpload>,
}

impl GroupForm {
    pub fn validate(self) -> Result<ValidGroupForm> {
        let title = non_empty(self.title)
            .ok_or_else(|| AppError::validation("title", "A group title is required."))?;

        let photo = self.photo.filter(|p| !p.bytes.is_empty());
        if let Some(photo) = &photo {
            photo.validate()?;
        }

        Ok(ValidGroupForm {
            title,
            description: non_empty(self.description),
            photo,
        })
    }
}

/// A group together with everything needed to rank its members.
pub struct GroupRoster {
    pub group: Group,
    /// Earliest join first
    pub memberships: Vec<GroupMembership>,
    pub users: HashMap<String, User>,
}

impl GroupRoster {
    /// Display name for a user, falling back for deleted profiles.
    pub fn display_name(&self, user_id: &str) -> String {
        self.users
            .get(user_id)
            .map(User::display_name)
            .unwrap_or_else(|| "Unknown reader".to_string())
    }

    /// Members in membership order, as the leaderboard expects them.
    pub fn member_profiles(&self) -> Vec<MemberProfile> {
        self.memberships
            .iter()
            .map(|m| MemberProfile {
                user_id: m.user_id.clone(),
                display_name: self.display_name(&m.user_id),
            })
            .collect()
    }

    pub fn leaderboard(&self, check_ins: &[CheckInDay], today: NaiveDate) -> Leaderboard {
        Leaderboard::compute(&self.member_profiles(), check_ins, today)
    }

    pub fn membership(&self, user_id: &str) -> Option<&GroupMembership> {
        self.memberships.iter().find(|m| m.user_id == user_id)
    }
}

/// Group operations on behalf of a signed-in user.
pub struct GroupService {
    db: FirestoreDb,
    storage: PhotoStorage,
}

impl GroupService {
    pub fn new(db: FirestoreDb, storage: PhotoStorage) -> Self {
        Self { db, storage }
    }

    /// Create a group owned by `user_id`. The owner becomes its first member.
    pub async fn create(&self, user_id: &str, form: GroupForm) -> Result<Group> {
        let input = form.validate()?;

        let photo_url = self.upload_cover(user_id, input.photo.as_ref()).await?;

        let now = chrono::Utc::now();
        let group = Group {
            id: hex::encode(random_bytes(GROUP_ID_BYTES)?),
            title: input.title,
            description: input.description,
            photo_url,
            invite_code: URL_SAFE_NO_PAD.encode(random_bytes(INVITE_CODE_BYTES)?),
            created_by: user_id.to_string(),
            created_at: now,
        };
        let owner = GroupMembership {
            group_id: group.id.clone(),
            user_id: user_id.to_string(),
            joined_at: now,
        };

        self.db.create_group_with_owner(&group, &owner).await?;

        Ok(group)
    }

    /// Edit a group's title, description and cover. Owner only.
    ///
    /// Without a new photo the existing cover is kept.
    pub async fn edit(&self, user_id: &str, group_id: &str, form: GroupForm) -> Result<Group> {
        let input = form.validate()?;

        let mut group = self.require_member(group_id, user_id).await?;
        if !group.is_owner(user_id) {
            return Err(AppError::Forbidden(
                "Only the group creator can edit this group.".to_string(),
            ));
        }

        if let Some(url) = self.upload_cover(user_id, input.photo.as_ref()).await? {
            group.photo_url = Some(url);
        }
        group.title = input.title;
        group.description = input.description;

        self.db.update_group(&group).await?;

        tracing::info!(group_id, user_id, "Group updated");

        Ok(group)
    }

    /// Join the group behind `invite_code`.
    ///
    /// Returns the group and whether a new membership was created. Joining a
    /// group twice is not an error.
    pub async fn join(&self, user_id: &str, invite_code: &str) -> Result<(Group, bool)> {
        let invite_code = invite_code.trim();
        if invite_code.is_empty() {
            return Err(AppError::BadRequest("Missing invite code".to_string()));
        }

        let group = self
            .db
            .get_group_by_invite_code(invite_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite not found".to_string()))?;

        let membership = GroupMembership {
            group_id: group.id.clone(),
            user_id: user_id.to_string(),
            joined_at: chrono::Utc::now(),
        };
        let joined = self.db.add_membership(&membership).await?;

        if joined {
            tracing::info!(group_id = %group.id, user_id, "Joined group");
        } else {
            tracing::debug!(group_id = %group.id, user_id, "Already a member");
        }

        Ok((group, joined))
    }

    /// Leave a group. The user's check-ins stay stored but drop out of rankings.
    pub async fn leave(&self, user_id: &str, group_id: &str) -> Result<()> {
        self.require_member(group_id, user_id).await?;
        self.db.delete_membership(group_id, user_id).await?;

        tracing::info!(group_id, user_id, "Left group");
        Ok(())
    }

    /// Load a group the caller belongs to.
    ///
    /// Missing groups and groups the caller is not a member of look the same.
    pub async fn require_member(&self, group_id: &str, user_id: &str) -> Result<Group> {
        let not_found = || AppError::NotFound(format!("Group {} not found", group_id));

        let (group, membership) = tokio::try_join!(
            self.db.get_group(group_id),
            self.db.get_membership(group_id, user_id)
        )?;

        match (group, membership) {
            (Some(group), Some(_)) => Ok(group),
            _ => Err(not_found()),
        }
    }

    /// Load a group's members and their profiles.
    pub async fn roster(&self, group: Group) -> Result<GroupRoster> {
        let memberships = self.db.list_group_memberships(&group.id).await?;
        let user_ids: Vec<String> = memberships.iter().map(|m| m.user_id.clone()).collect();
        let users = self.db.get_users(&user_ids).await?;

        Ok(GroupRoster {
            group,
            memberships,
            users,
        })
    }

    async fn upload_cover(
        &self,
        user_id: &str,
        photo: Option<&PhotoUpload>,
    ) -> Result<Option<String>> {
        match photo {
            Some(photo) => Ok(Some(
                self.storage
                    .upload(&format!("groups/{}", user_id), photo)
                    .await?,
            )),
            None => Ok(None),
        }
    }
}

/// Fill a buffer from the system CSPRNG.
fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System random generator failed")))?;
    Ok(bytes)
}
