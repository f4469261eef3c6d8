// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Club (tenant) model.

use serde::{Deserialize, Serialize};

/// A club row from the `clubs` table. Read-only in this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: String,
    pub name: String,
    /// Public site subdomain (e.g. "chess" for chess.example.com)
    pub subdomain: String,

    // ─── Branding ────────────────────────────────────────────────
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub favicon_url: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub hero_headline: Option<String>,
    #[serde(default)]
    pub hero_subtext: Option<String>,
    #[serde(default)]
    pub hero_image_url: Option<String>,
    #[serde(default)]
    pub hero_image_small_url: Option<String>,
    #[serde(default)]
    pub hero_image_large_url: Option<String>,
    #[serde(default)]
    pub about_blurb: Option<String>,
    #[serde(default)]
    pub description: Option<String>,

    // ─── Contact ─────────────────────────────────────────────────
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub meeting_location: Option<String>,
    #[serde(default)]
    pub meeting_time: Option<String>,

    // ─── Metadata ────────────────────────────────────────────────
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub use_mock_content: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}
