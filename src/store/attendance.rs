// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Attendance updates: the store's only write.

use super::{WebsiteData, WebsiteStore};
use crate::error::{AppError, Result};
use crate::models::Attendance;

impl WebsiteData {
    /// Set attendance on the cached RSVP with `rsvp_id`. Returns whether it
    /// was found; no other RSVP is touched.
    pub(crate) fn patch_attendance(&mut self, rsvp_id: &str, attendance: Option<Attendance>) -> bool {
        match self
            .events
            .iter_mut()
            .flat_map(|e| e.rsvps.iter_mut())
            .find(|r| r.id == rsvp_id)
        {
            Some(rsvp) => {
                rsvp.attendance = attendance;
                true
            }
            None => false,
        }
    }

    /// Cached attendance of an RSVP, or `None` if the RSVP is not cached.
    pub fn attendance_of(&self, rsvp_id: &str) -> Option<Option<Attendance>> {
        self.events
            .iter()
            .flat_map(|e| e.rsvps.iter())
            .find(|r| r.id == rsvp_id)
            .map(|r| r.attendance)
    }
}

impl WebsiteStore {
    /// Set an RSVP's attendance. Admins only.
    ///
    /// The caller's identity and role are checked before any write is sent.
    /// Local state is patched only after the backend confirms the update;
    /// on any error it is left as it was and the error is returned for
    /// display.
    pub async fn update_attendance(
        &self,
        rsvp_id: &str,
        attendance: Option<Attendance>,
    ) -> Result<()> {
        let user = match self.backend.get_user().await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AppError::NotAuthenticated),
            Err(e) => {
                tracing::warn!(error = %e, "User lookup failed");
                return Err(AppError::NotAuthenticated);
            }
        };

        let profile = self.backend.get_profile(&user.id).await.map_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "Error fetching profile");
            AppError::PermissionCheck
        })?;

        if !profile.is_admin() {
            tracing::warn!(
                user_id = %user.id,
                role = ?profile.role,
                "User does not have admin role"
            );
            return Err(AppError::PermissionDenied);
        }

        tracing::info!(
            rsvp_id,
            attendance = ?attendance,
            user_id = %user.id,
            club_id = ?profile.club_id,
            "Updating attendance"
        );

        let rows = self
            .backend
            .update_rsvp_attendance(rsvp_id, attendance)
            .await
            .map_err(|e| {
                tracing::error!(rsvp_id, error = %e, "Attendance update rejected");
                e
            })?;

        if rows.is_empty() {
            tracing::warn!(rsvp_id, "Attendance update matched no rows");
            return Err(AppError::NotFound(format!("RSVP {}", rsvp_id)));
        }

        let patched = self
            .state
            .send_if_modified(|data| data.patch_attendance(rsvp_id, attendance));
        if !patched {
            tracing::debug!(rsvp_id, "Updated RSVP is not in the cached events");
        }
        Ok(())
    }

    /// Flip a cached RSVP between attended and not attended (unset counts
    /// as not attended). Returns the value written.
    pub async fn toggle_attendance(&self, rsvp_id: &str) -> Result<Attendance> {
        let current = self
            .state
            .borrow()
            .attendance_of(rsvp_id)
            .ok_or_else(|| AppError::NotFound(format!("RSVP {}", rsvp_id)))?;

        let next = Attendance::toggled(current);
        self.update_attendance(rsvp_id, Some(next)).await?;
        Ok(next)
    }
}
