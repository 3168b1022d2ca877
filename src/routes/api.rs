// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CheckIn, Group, RankingEntry, User};
use crate::services::{CheckInForm, CheckInService, GroupForm, GroupService, PhotoUpload};
use crate::time_utils::{format_utc_rfc3339, utc_today};
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use futures_util::future::try_join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Number of check-ins shown in a group's feed.
const RECENT_CHECK_INS: u32 = 20;

/// Request body limit for multipart routes: one photo plus form fields.
const MULTIPART_BODY_LIMIT: usize = 6 * 1024 * 1024;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/me/pwa-tutorial", post(dismiss_pwa_tutorial))
        .route("/api/groups", get(list_groups).post(create_group))
        .route("/api/groups/{group_id}", get(get_group).put(update_group))
        .route("/api/groups/{group_id}/members", get(get_members))
        .route("/api/groups/{group_id}/membership", delete(leave_group))
        .route("/api/groups/{group_id}/check-ins", post(create_check_in))
        .route("/api/invites/{invite_code}/join", post(join_group))
        .layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub has_seen_pwa_tutorial: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            display_name: user.display_name(),
            id: user.id,
            email: user.email,
            avatar_url: user.avatar_url,
            has_seen_pwa_tutorial: user.has_seen_pwa_tutorial,
            created_at: format_utc_rfc3339(user.created_at),
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = load_user(&state, &user.user_id).await?;
    Ok(Json(profile.into()))
}

/// Remember that the user has seen the install-as-app tutorial.
async fn dismiss_pwa_tutorial(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let mut profile = load_user(&state, &user.user_id).await?;

    if !profile.has_seen_pwa_tutorial {
        profile.has_seen_pwa_tutorial = true;
        state.db.upsert_user(&profile).await?;
    }

    Ok(Json(profile.into()))
}

async fn load_user(state: &AppState, user_id: &str) -> Result<User> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

// ─── Groups ──────────────────────────────────────────────────

/// A group as shown to its members.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GroupResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub invite_code: String,
    pub created_by: String,
    pub created_at: String,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            title: group.title,
            description: group.description,
            photo_url: group.photo_url,
            invite_code: group.invite_code,
            created_by: group.created_by,
            created_at: format_utc_rfc3339(group.created_at),
        }
    }
}

/// Dashboard card for one of the caller's groups.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GroupSummary {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub member_count: u32,
    pub is_owner: bool,
    pub joined_at: String,
}

/// List the caller's groups, most recently joined first.
async fn list_groups(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<GroupSummary>>> {
    let memberships = state.db.list_user_memberships(&user.user_id).await?;

    let summaries = try_join_all(memberships.into_iter().map(|membership| {
        let db = state.db.clone();
        async move {
            let (group, members) = tokio::try_join!(
                db.get_group(&membership.group_id),
                db.list_group_memberships(&membership.group_id)
            )?;
            Ok::<_, AppError>(group.map(|group| GroupSummary {
                is_owner: group.is_owner(&membership.user_id),
                id: group.id,
                title: group.title,
                description: group.description,
                photo_url: group.photo_url,
                member_count: members.len() as u32,
                joined_at: format_utc_rfc3339(membership.joined_at),
            }))
        }
    }))
    .await?;

    // A membership can briefly outlive a group that failed to load
    Ok(Json(summaries.into_iter().flatten().collect()))
}

/// Create a group from a multipart form.
async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<GroupResponse>)> {
    let form = read_form(multipart).await?;
    let service = GroupService::new(state.db.clone(), state.photo_storage.clone());

    let group = service.create(&user.user_id, form.into_group_form()).await?;

    Ok((StatusCode::CREATED, Json(group.into())))
}

/// Edit a group (owner only).
async fn update_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<GroupResponse>> {
    let form = read_form(multipart).await?;
    let service = GroupService::new(state.db.clone(), state.photo_storage.clone());

    let group = service
        .edit(&user.user_id, &group_id, form.into_group_form())
        .await?;

    Ok(Json(group.into()))
}

/// A check-in in a group's feed.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckInResponse {
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    pub author_name: String,
    /// UTC calendar day (YYYY-MM-DD)
    pub date: String,
    pub title: String,
    pub book_title: Option<String>,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
    pub pages_read: u32,
    pub chapters_read: u32,
    pub created_at: String,
}

impl CheckInResponse {
    fn new(check_in: CheckIn, author_name: String) -> Self {
        Self {
            id: check_in.id,
            group_id: check_in.group_id,
            user_id: check_in.user_id,
            author_name,
            date: check_in.date.to_string(),
            title: check_in.title,
            book_title: check_in.book_title,
            notes: check_in.notes,
            photo_url: check_in.photo_url,
            pages_read: check_in.pages_read,
            chapters_read: check_in.chapters_read,
            created_at: format_utc_rfc3339(check_in.created_at),
        }
    }
}

/// Everything the group page shows.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GroupPageResponse {
    pub group: GroupResponse,
    pub is_owner: bool,
    pub invite_url: String,
    pub member_count: u32,
    pub checked_in_today: bool,
    pub recent_check_ins: Vec<CheckInResponse>,
    pub rankings: Vec<RankingEntry>,
    pub leader: Option<RankingEntry>,
    pub my_entry: Option<RankingEntry>,
}

/// Group page: feed, leaderboard and the caller's standing.
async fn get_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupPageResponse>> {
    let service = GroupService::new(state.db.clone(), state.photo_storage.clone());
    let group = service.require_member(&group_id, &user.user_id).await?;

    let (roster, days, recent) = tokio::try_join!(
        service.roster(group),
        state.db.list_check_in_days(&group_id),
        state.db.list_recent_check_ins(&group_id, RECENT_CHECK_INS)
    )?;

    let today = utc_today();
    let checked_in_today = days
        .iter()
        .any(|d| d.user_id == user.user_id && d.date == today);
    let board = roster.leaderboard(&days, today);

    // Former members can still appear in the feed
    let missing: Vec<String> = recent
        .iter()
        .map(|c| c.user_id.clone())
        .filter(|id| !roster.users.contains_key(id))
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();
    let former: HashMap<String, User> = if missing.is_empty() {
        HashMap::new()
    } else {
        state.db.get_users(&missing).await?
    };

    let recent_check_ins = recent
        .into_iter()
        .map(|check_in| {
            let author = match former.get(&check_in.user_id) {
                Some(u) => u.display_name(),
                None => roster.display_name(&check_in.user_id),
            };
            CheckInResponse::new(check_in, author)
        })
        .collect();

    let invite_url = format!(
        "{}/invite/{}",
        state.config.frontend_url, roster.group.invite_code
    );

    Ok(Json(GroupPageResponse {
        is_owner: roster.group.is_owner(&user.user_id),
        invite_url,
        member_count: roster.memberships.len() as u32,
        checked_in_today,
        recent_check_ins,
        leader: board.leader().cloned(),
        my_entry: board.entry_for(&user.user_id).cloned(),
        rankings: board.into_entries(),
        group: roster.group.into(),
    }))
}

/// One row of the members page.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MemberResponse {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub joined_at: String,
    pub is_owner: bool,
    pub check_ins: u32,
    pub streak: u32,
    pub rank: u32,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MembersPageResponse {
    pub group_id: String,
    pub title: String,
    pub member_count: u32,
    /// Ranked, rank 1 first
    pub members: Vec<MemberResponse>,
}

/// Members page: every member ranked, with join date and owner badge.
async fn get_members(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<String>,
) -> Result<Json<MembersPageResponse>> {
    let service = GroupService::new(state.db.clone(), state.photo_storage.clone());
    let group = service.require_member(&group_id, &user.user_id).await?;

    let (roster, days) = tokio::try_join!(
        service.roster(group),
        state.db.list_check_in_days(&group_id)
    )?;

    let board = roster.leaderboard(&days, utc_today());

    let members = board
        .entries()
        .iter()
        .filter_map(|entry| {
            let membership = roster.membership(&entry.user_id)?;
            Some(MemberResponse {
                user_id: entry.user_id.clone(),
                display_name: entry.display_name.clone(),
                avatar_url: roster
                    .users
                    .get(&entry.user_id)
                    .and_then(|u| u.avatar_url.clone()),
                joined_at: format_utc_rfc3339(membership.joined_at),
                is_owner: roster.group.is_owner(&entry.user_id),
                check_ins: entry.check_ins,
                streak: entry.streak,
                rank: entry.rank,
            })
        })
        .collect();

    Ok(Json(MembersPageResponse {
        group_id: roster.group.id.clone(),
        title: roster.group.title.clone(),
        member_count: roster.memberships.len() as u32,
        members,
    }))
}

/// Leave a group.
async fn leave_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<String>,
) -> Result<StatusCode> {
    let service = GroupService::new(state.db.clone(), state.photo_storage.clone());
    service.leave(&user.user_id, &group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct JoinResponse {
    pub group_id: String,
    /// False if the caller was already a member
    pub joined: bool,
}

/// Join a group through its invite code.
async fn join_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(invite_code): Path<String>,
) -> Result<Json<JoinResponse>> {
    let service = GroupService::new(state.db.clone(), state.photo_storage.clone());
    let (group, joined) = service.join(&user.user_id, &invite_code).await?;

    Ok(Json(JoinResponse {
        group_id: group.id,
        joined,
    }))
}

// ─── Check-ins ───────────────────────────────────────────────

/// Record today's check-in.
async fn create_check_in(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CheckInResponse>)> {
    let form = read_form(multipart).await?;
    let service = CheckInService::new(state.db.clone(), state.photo_storage.clone());

    let check_in = service
        .record(&user.user_id, &group_id, form.into_check_in_form())
        .await?;

    let author = state
        .db
        .get_user(&user.user_id)
        .await?
        .map(|u| u.display_name())
        .unwrap_or_default();

    Ok((
        StatusCode::CREATED,
        Json(CheckInResponse::new(check_in, author)),
    ))
}

// ─── Multipart forms ─────────────────────────────────────────

/// Text fields and the optional `photo` part of a multipart form.
#[derive(Debug, Default)]
struct FormFields {
    text: HashMap<String, String>,
    photo: Option<PhotoUpload>,
}

impl FormFields {
    fn take(&mut self, name: &str) -> Option<String> {
        self.text.remove(name)
    }

    fn into_group_form(mut self) -> GroupForm {
        GroupForm {
            title: self.take("title"),
            description: self.take("description"),
            photo: self.photo,
        }
    }

    fn into_check_in_form(mut self) -> CheckInForm {
        CheckInForm {
            title: self.take("title"),
            book_title: self.take("book_title"),
            notes: self.take("notes"),
            pages_read: self.take("pages_read"),
            chapters_read: self.take("chapters_read"),
            photo: self.photo,
        }
    }
}

async fn read_form(mut multipart: Multipart) -> Result<FormFields> {
    let mut form = FormFields::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "photo" {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            form.photo = Some(PhotoUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.text.insert(name, value);
        }
    }

    Ok(form)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::validation("photo", "Photo must be smaller than 5 MB.")
    } else {
        AppError::BadRequest(format!("Invalid form data: {}", err.body_text()))
    }
}
