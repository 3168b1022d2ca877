// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public invite preview, shown before the visitor signs in.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/invites/{invite_code}", get(invite_preview))
}

/// What an invite link reveals about its group.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct InvitePreviewResponse {
    pub invite_code: String,
    pub title: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub owner_name: String,
    pub member_count: u32,
}

async fn invite_preview(
    State(state): State<Arc<AppState>>,
    Path(invite_code): Path<String>,
) -> Result<Json<InvitePreviewResponse>> {
    let group = state
        .db
        .get_group_by_invite_code(invite_code.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("Invite not found".to_string()))?;

    let (owner, members) = tokio::try_join!(
        state.db.get_user(&group.created_by),
        state.db.list_group_memberships(&group.id)
    )?;

    Ok(Json(InvitePreviewResponse {
        invite_code: group.invite_code,
        title: group.title,
        description: group.description,
        photo_url: group.photo_url,
        owner_name: owner
            .map(|u| u.display_name())
            .unwrap_or_else(|| "A reader".to_string()),
        member_count: members.len() as u32,
    }))
}
