// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Club Portal: club-scoped data for the club management app
//!
//! This crate resolves the signed-in user's club on a hosted Supabase
//! backend, loads its members and events, derives the dashboard stats and
//! lets admins record event attendance.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod time_utils;

pub use backend::{ClubBackend, InMemoryBackend, SupabaseClient};
pub use store::{AuthListener, SliceStatus, WebsiteData, WebsiteStore};
