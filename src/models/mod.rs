// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod check_in;
pub mod group;
pub mod ranking;
pub mod user;

pub use check_in::{CheckIn, CheckInDay};
pub use group::{Group, GroupMembership};
pub use ranking::{MemberProfile, RankingEntry};
pub use user::User;
