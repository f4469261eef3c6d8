// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Club event model and RSVP grouping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{AttendanceSummary, Rsvp};

/// A row from the `events` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Event {
    pub id: String,
    pub club_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Event date (`YYYY-MM-DD`)
    pub event_date: String,
    /// Start time (`HH:MM[:SS]`)
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Profile id of the creator
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_small_url: Option<String>,
    #[serde(default)]
    pub image_large_url: Option<String>,
}

/// An event together with its RSVPs, oldest first. `rsvps` is always
/// present; events nobody answered carry an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventWithRsvps {
    #[serde(flatten)]
    pub event: Event,
    pub rsvps: Vec<Rsvp>,
}

impl EventWithRsvps {
    /// RSVPs whose name contains `query`, case-insensitively.
    pub fn search_rsvps<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Rsvp> + 'a {
        self.rsvps.iter().filter(move |r| r.matches_query(query))
    }

    pub fn attendance_summary(&self) -> AttendanceSummary {
        AttendanceSummary::from_rsvps(&self.rsvps)
    }
}

/// Attach each RSVP to the event it answers.
///
/// Single pass over `rsvps`, preserving their order within each event.
/// RSVPs that reference an event not in `events` are dropped.
pub fn group_rsvps(events: Vec<Event>, rsvps: Vec<Rsvp>) -> Vec<EventWithRsvps> {
    let mut by_event: HashMap<String, Vec<Rsvp>> = HashMap::new();
    for rsvp in rsvps {
        by_event.entry(rsvp.event_id.clone()).or_default().push(rsvp);
    }

    let grouped: Vec<EventWithRsvps> = events
        .into_iter()
        .map(|event| {
            let rsvps = by_event.remove(&event.id).unwrap_or_default();
            EventWithRsvps { event, rsvps }
        })
        .collect();

    if !by_event.is_empty() {
        tracing::debug!(
            orphaned_events = by_event.len(),
            "Dropping RSVPs for events outside the fetched set"
        );
    }

    grouped
}
