// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Profile model: links an authenticated user to a club and a role.

use serde::{Deserialize, Serialize};

/// Role string that grants attendance updates.
pub const ADMIN_ROLE: &str = "admin";

/// A row from the `profiles` table, keyed by the auth user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Same as the session user id
    pub id: String,
    #[serde(default)]
    pub club_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Profile {
    /// Exact, case-sensitive match on the admin role.
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}
