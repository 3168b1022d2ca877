// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod check_in;
pub mod google_oidc;
pub mod groups;
pub mod leaderboard;
pub mod storage;

pub use check_in::{CheckInForm, CheckInService};
pub use google_oidc::{GoogleIdTokenVerifier, GoogleIdentity, OidcError};
pub use groups::{GroupForm, GroupRoster, GroupService};
pub use leaderboard::{compute_streak, Leaderboard};
pub use storage::{PhotoStorage, PhotoUpload};
