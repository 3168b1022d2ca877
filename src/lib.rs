// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Bookclub Tracker: daily reading check-ins for small book clubs
//!
//! This crate provides the backend API for reading groups, daily check-ins,
//! and the streak/ranking leaderboard shown on each group page.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{GoogleIdTokenVerifier, PhotoStorage};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub google_verifier: Arc<GoogleIdTokenVerifier>,
    pub photo_storage: PhotoStorage,
}
