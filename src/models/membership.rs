// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Club membership model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A person's association with a club (`memberships` table).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Membership {
    pub id: String,
    pub club_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Join timestamp (ISO 8601)
    #[serde(default)]
    pub joined_at: Option<String>,
    /// Free-form role ("member", "Organizer", ...)
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Membership {
    /// Case-insensitive match on the organizer role.
    pub fn is_organizer(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|r| r.to_lowercase() == "organizer")
    }

    /// Case-insensitive substring match on name or email.
    ///
    /// An empty query matches every member.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        [self.name.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&query))
    }
}
