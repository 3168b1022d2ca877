// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in and session routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_DAYS};
use crate::models::User;
use crate::routes::api::UserResponse;
use crate::services::{GoogleIdentity, OidcError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", post(google_sign_in))
        .route("/auth/logout", post(logout))
}

/// Sign-in request from the Google Identity Services button.
#[derive(Deserialize)]
pub struct GoogleSignInRequest {
    /// Google ID token
    credential: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    /// Session JWT, also set as an HttpOnly cookie
    pub token: String,
    pub user: UserResponse,
}

/// Exchange a Google ID token for a session.
async fn google_sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<GoogleSignInRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let identity = state
        .google_verifier
        .verify_id_token(&body.credential)
        .await
        .map_err(|e| match e {
            OidcError::Forbidden(reason) => {
                tracing::warn!(reason = %reason, "Rejected Google ID token");
                AppError::InvalidToken
            }
            OidcError::Transient(reason) => AppError::Internal(anyhow::anyhow!(
                "Google key retrieval failed: {}",
                reason
            )),
        })?;

    let existing = state.db.get_user(&identity.subject).await?;
    let user = merge_profile(existing, identity);
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, "User signed in");

    let token = create_jwt(&user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = session_cookie(
        token.clone(),
        state.config.secure_cookies(),
        time::Duration::days(SESSION_DAYS),
    );

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Refresh profile fields from Google, keeping what we own.
fn merge_profile(existing: Option<User>, identity: GoogleIdentity) -> User {
    let now = chrono::Utc::now();
    match existing {
        Some(user) => User {
            email: identity.email,
            name: identity.name,
            avatar_url: identity.picture,
            last_active: now,
            ..user
        },
        None => User {
            id: identity.subject,
            email: identity.email,
            name: identity.name,
            avatar_url: identity.picture,
            has_seen_pwa_tutorial: false,
            created_at: now,
            last_active: now,
        },
    }
}

/// Session cookie attributes. Removal must use the same ones.
fn session_cookie(value: String, secure: bool, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let cookie = session_cookie(
        String::new(),
        state.config.secure_cookies(),
        time::Duration::ZERO,
    );
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}
