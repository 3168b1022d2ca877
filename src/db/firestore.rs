// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Groups and memberships
//! - Check-ins (create-only, one per group/user/day)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{CheckIn, CheckInDay, Group, GroupMembership, User};
use chrono::NaiveDate;
use firestore::errors::FirestoreError;
use firestore::FirestoreQueryDirection;
use futures_util::{stream, StreamExt};
use std::collections::HashMap;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: User = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Fetch several users at once, keyed by ID. Unknown IDs are skipped.
    pub async fn get_users(&self, user_ids: &[String]) -> Result<HashMap<String, User>, AppError> {
        let client = self.get_client()?;

        let users = stream::iter(user_ids.to_vec())
            .map(|user_id| async move {
                client
                    .fluent()
                    .select()
                    .by_id_in(collections::USERS)
                    .obj::<User>()
                    .one(&user_id)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<User>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<User>>, AppError>>()?;

        Ok(users
            .into_iter()
            .flatten()
            .map(|user| (user.id.clone(), user))
            .collect())
    }

    // ─── Group Operations ────────────────────────────────────────

    /// Get a group by ID.
    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::GROUPS)
            .obj()
            .one(group_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Resolve an invite code to its group.
    pub async fn get_group_by_invite_code(
        &self,
        invite_code: &str,
    ) -> Result<Option<Group>, AppError> {
        let groups: Vec<Group> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::GROUPS)
            .filter(|q| q.for_all([q.field("invite_code").eq(invite_code)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(groups.into_iter().next())
    }

    /// Store a new group together with its creator's membership.
    ///
    /// Both documents are written in one transaction, so a group without an
    /// owner membership is never observable.
    pub async fn create_group_with_owner(
        &self,
        group: &Group,
        owner: &GroupMembership,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::GROUPS)
            .document_id(&group.id)
            .object(group)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add group to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::MEMBERSHIPS)
            .document_id(GroupMembership::document_id(&owner.group_id, &owner.user_id))
            .object(owner)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add membership to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            group_id = %group.id,
            owner = %owner.user_id,
            "Group created with owner membership"
        );

        Ok(())
    }

    /// Overwrite an existing group's editable fields.
    pub async fn update_group(&self, group: &Group) -> Result<(), AppError> {
        let _: Group = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::GROUPS)
            .document_id(&group.id)
            .object(group)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Membership Operations ───────────────────────────────────

    /// Get one user's membership in a group.
    pub async fn get_membership(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Option<GroupMembership>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::MEMBERSHIPS)
            .obj()
            .one(&GroupMembership::document_id(group_id, user_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a membership.
    ///
    /// Returns `false` if the user was already a member (nothing written).
    pub async fn add_membership(&self, membership: &GroupMembership) -> Result<bool, AppError> {
        let doc_id = GroupMembership::document_id(&membership.group_id, &membership.user_id);

        let result: Result<GroupMembership, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::MEMBERSHIPS)
            .document_id(&doc_id)
            .object(membership)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_already_exists(&e) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Remove a membership. Removing a missing membership is not an error.
    pub async fn delete_membership(&self, group_id: &str, user_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::MEMBERSHIPS)
            .document_id(GroupMembership::document_id(group_id, user_id))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All memberships of a group, earliest join first.
    pub async fn list_group_memberships(
        &self,
        group_id: &str,
    ) -> Result<Vec<GroupMembership>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MEMBERSHIPS)
            .filter(|q| q.for_all([q.field("group_id").eq(group_id)]))
            .order_by([("joined_at", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All groups a user belongs to, most recently joined first.
    pub async fn list_user_memberships(
        &self,
        user_id: &str,
    ) -> Result<Vec<GroupMembership>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MEMBERSHIPS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("joined_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Check-in Operations ─────────────────────────────────────

    /// Store a new check-in.
    ///
    /// This is a create-only write keyed by (group, user, day): if a check-in
    /// already exists for that day the write fails and
    /// `AppError::Conflict` is returned. Of two concurrent requests exactly
    /// one succeeds.
    pub async fn create_check_in(&self, check_in: &CheckIn) -> Result<(), AppError> {
        let result: Result<CheckIn, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::CHECK_INS)
            .document_id(&check_in.id)
            .object(check_in)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_already_exists(&e) => {
                tracing::info!(
                    group_id = %check_in.group_id,
                    user_id = %check_in.user_id,
                    date = %check_in.date,
                    "Duplicate check-in rejected"
                );
                Err(AppError::Conflict(AppError::ALREADY_CHECKED_IN.to_string()))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Get a user's check-in for one day.
    pub async fn get_check_in(
        &self,
        group_id: &str,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<CheckIn>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHECK_INS)
            .obj()
            .one(&CheckIn::document_id(group_id, user_id, date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All (user, day) pairs for a group, for leaderboard computation.
    pub async fn list_check_in_days(&self, group_id: &str) -> Result<Vec<CheckInDay>, AppError> {
        let check_ins: Vec<CheckIn> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CHECK_INS)
            .filter(|q| q.for_all([q.field("group_id").eq(group_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(check_ins.iter().map(CheckIn::day).collect())
    }

    /// Most recent check-ins in a group, newest first.
    pub async fn list_recent_check_ins(
        &self,
        group_id: &str,
        limit: u32,
    ) -> Result<Vec<CheckIn>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHECK_INS)
            .filter(|q| q.for_all([q.field("group_id").eq(group_id)]))
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Whether a create-only write failed because the document already exists.
fn is_already_exists(err: &FirestoreError) -> bool {
    matches!(err, FirestoreError::DataConflictError(_))
}
