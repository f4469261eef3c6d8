//! Derived club statistics for the dashboard cards.
//!
//! Recomputed from scratch on every fetch; never persisted.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{EventWithRsvps, Membership};
use crate::time_utils::{parse_timestamp, start_of_month};

/// Placeholder until attendance rate is computed from recorded check-ins.
pub const ATTENDANCE_RATE_PLACEHOLDER: &str = "0%";

/// Membership counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MemberStats {
    pub total: usize,
    /// Joined on or after the first instant of the current month
    pub new_this_month: usize,
    pub organizers: usize,
}

impl MemberStats {
    /// Compute stats, bucketing "this month" in `now`'s time zone.
    ///
    /// Members without a parseable `joined_at` never count as new.
    pub fn from_memberships<Tz: TimeZone>(members: &[Membership], now: &DateTime<Tz>) -> Self {
        let month_start = start_of_month(now);

        Self {
            total: members.len(),
            new_this_month: members
                .iter()
                .filter_map(|m| m.joined_at.as_deref().and_then(parse_timestamp))
                .filter(|joined| *joined >= month_start)
                .count(),
            organizers: members.iter().filter(|m| m.is_organizer()).count(),
        }
    }
}

/// Event counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventStats {
    /// Events dated on or after now
    pub upcoming_events: usize,
    pub total_rsvps: usize,
    /// Always [`ATTENDANCE_RATE_PLACEHOLDER`] for now
    pub attendance_rate: String,
    /// Counts every fetched event, not only this month's. The dashboard
    /// label predates the field and existing screens rely on the total.
    pub events_this_month: usize,
}

impl Default for EventStats {
    fn default() -> Self {
        Self {
            upcoming_events: 0,
            total_rsvps: 0,
            attendance_rate: ATTENDANCE_RATE_PLACEHOLDER.to_string(),
            events_this_month: 0,
        }
    }
}

impl EventStats {
    pub fn from_events(events: &[EventWithRsvps], now: DateTime<Utc>) -> Self {
        Self {
            upcoming_events: events
                .iter()
                .filter_map(|e| parse_timestamp(&e.event.event_date))
                .filter(|date| *date >= now)
                .count(),
            total_rsvps: events.iter().map(|e| e.rsvps.len()).sum(),
            attendance_rate: ATTENDANCE_RATE_PLACEHOLDER.to_string(),
            events_this_month: events.len(),
        }
    }
}
