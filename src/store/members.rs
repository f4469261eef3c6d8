// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member fetch and stats.

use chrono::Local;
use std::sync::atomic::Ordering;

use super::{Slice, SliceStatus, WebsiteStore};
use crate::models::MemberStats;

impl WebsiteStore {
    /// Fetch a club's memberships and recompute member stats.
    ///
    /// On failure the member slice is cleared and the error recorded.
    pub async fn fetch_members(&self, club_id: &str) {
        let epoch = self.epoch.load(Ordering::SeqCst);
        self.load_members(club_id, epoch).await;
    }

    /// Fetch on behalf of the session load that read `epoch`.
    pub(super) async fn load_members(&self, club_id: &str, epoch: u64) {
        let ticket = self.begin(Slice::Members, epoch);
        tracing::debug!(club_id, seq = ticket.seq, "Fetching members");

        match self.backend.list_memberships(club_id).await {
            Ok(members) => {
                let stats = MemberStats::from_memberships(&members, &Local::now());
                let applied = self.commit(Slice::Members, ticket, |data| {
                    data.members = members;
                    data.member_stats = stats.clone();
                    data.members_status = SliceStatus::Ready;
                });

                if applied {
                    tracing::info!(
                        club_id,
                        total = stats.total,
                        new_this_month = stats.new_this_month,
                        organizers = stats.organizers,
                        "Members loaded"
                    );
                } else {
                    tracing::debug!(club_id, seq = ticket.seq, "Discarding stale members response");
                }
            }
            Err(e) => {
                tracing::error!(club_id, error = %e, "Error fetching memberships");
                let message = e.to_string();
                self.commit(Slice::Members, ticket, |data| {
                    data.members.clear();
                    data.member_stats = MemberStats::default();
                    data.members_status = SliceStatus::Failed(message);
                });
            }
        }
    }
}
