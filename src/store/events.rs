// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event fetch, RSVP grouping and event stats.

use chrono::Utc;
use std::sync::atomic::Ordering;

use super::{Slice, SliceStatus, WebsiteStore};
use crate::models::{group_rsvps, EventStats, Rsvp};

impl WebsiteStore {
    /// Fetch a club's events and RSVPs, attach RSVPs to their events and
    /// recompute event stats.
    ///
    /// Events and RSVPs are requested concurrently; either failing clears
    /// the event slice and records the error.
    pub async fn fetch_events(&self, club_id: &str) {
        let epoch = self.epoch.load(Ordering::SeqCst);
        self.load_events(club_id, epoch).await;
    }

    /// Fetch on behalf of the session load that read `epoch`.
    pub(super) async fn load_events(&self, club_id: &str, epoch: u64) {
        let ticket = self.begin(Slice::Events, epoch);
        tracing::debug!(club_id, seq = ticket.seq, "Fetching events");

        let result = tokio::try_join!(
            self.backend.list_events(club_id),
            self.backend.list_rsvps(club_id),
        );

        match result {
            Ok((events, rows)) => {
                let rsvps: Vec<Rsvp> = rows.into_iter().map(Rsvp::from).collect();
                let events = group_rsvps(events, rsvps);
                let stats = EventStats::from_events(&events, Utc::now());

                let applied = self.commit(Slice::Events, ticket, |data| {
                    data.events = events;
                    data.event_stats = stats.clone();
                    data.events_status = SliceStatus::Ready;
                });

                if applied {
                    tracing::info!(
                        club_id,
                        events = stats.events_this_month,
                        upcoming = stats.upcoming_events,
                        rsvps = stats.total_rsvps,
                        "Events loaded"
                    );
                } else {
                    tracing::debug!(club_id, seq = ticket.seq, "Discarding stale events response");
                }
            }
            Err(e) => {
                tracing::error!(club_id, error = %e, "Error fetching events");
                let message = e.to_string();
                self.commit(Slice::Events, ticket, |data| {
                    data.events.clear();
                    data.event_stats = EventStats::default();
                    data.events_status = SliceStatus::Failed(message);
                });
            }
        }
    }
}
