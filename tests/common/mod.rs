// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, Duration, Local, Utc};
use club_portal::models::{Club, Event, Membership, Profile, RsvpRow};
use club_portal::time_utils::{format_utc_rfc3339, start_of_month};
use club_portal::{InMemoryBackend, WebsiteData, WebsiteStore};
use std::sync::Arc;

#[allow(dead_code)]
pub const CLUB_ID: &str = "club-1";
#[allow(dead_code)]
pub const ADMIN_ID: &str = "admin-user";
#[allow(dead_code)]
pub const MEMBER_ID: &str = "member-user";

/// How long tests wait for background loads before failing.
const WAIT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Backend with one club, an admin profile and a plain member profile.
#[allow(dead_code)]
pub fn club_backend() -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    backend.insert_club(Club {
        id: CLUB_ID.to_string(),
        name: "Chess Club".to_string(),
        subdomain: "chess".to_string(),
        ..Default::default()
    });
    backend.insert_club(Club {
        id: "club-2".to_string(),
        name: "Other Club".to_string(),
        subdomain: "other".to_string(),
        ..Default::default()
    });
    backend.insert_profile(Profile {
        id: ADMIN_ID.to_string(),
        club_id: Some(CLUB_ID.to_string()),
        role: Some("admin".to_string()),
        name: Some("Admin".to_string()),
        created_at: None,
    });
    backend.insert_profile(Profile {
        id: MEMBER_ID.to_string(),
        club_id: Some(CLUB_ID.to_string()),
        role: Some("member".to_string()),
        name: Some("Member".to_string()),
        created_at: None,
    });
    backend
}

#[allow(dead_code)]
pub fn store_for(backend: &InMemoryBackend) -> WebsiteStore {
    WebsiteStore::new(Arc::new(backend.clone()))
}

#[allow(dead_code)]
pub fn iso(date: DateTime<Utc>) -> String {
    format_utc_rfc3339(date)
}

/// First instant of the current local month, in UTC.
#[allow(dead_code)]
pub fn month_start() -> DateTime<Utc> {
    start_of_month(&Local::now())
}

#[allow(dead_code)]
pub fn membership(id: &str, club_id: &str, joined_at: DateTime<Utc>, role: &str) -> Membership {
    Membership {
        id: id.to_string(),
        club_id: club_id.to_string(),
        name: Some(format!("Member {}", id)),
        email: Some(format!("{}@example.com", id)),
        joined_at: Some(iso(joined_at)),
        role: Some(role.to_string()),
        status: Some("active".to_string()),
    }
}

#[allow(dead_code)]
pub fn event(id: &str, club_id: &str, days_from_now: i64) -> Event {
    Event {
        id: id.to_string(),
        club_id: club_id.to_string(),
        title: format!("Event {}", id),
        event_date: (Utc::now() + Duration::days(days_from_now))
            .format("%Y-%m-%d")
            .to_string(),
        ..Default::default()
    }
}

/// RSVP row created `minutes` after a fixed base time.
#[allow(dead_code)]
pub fn rsvp(id: &str, event_id: &str, minutes: i64) -> RsvpRow {
    let base = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    RsvpRow {
        id: id.to_string(),
        event_id: event_id.to_string(),
        membership_id: None,
        avatar_url: None,
        created_at: iso(base + Duration::minutes(minutes)),
        name: Some(format!("Guest {}", id)),
        email: None,
        attendance: None,
        memberships: None,
    }
}

/// Wait until the store's state satisfies `predicate`.
#[allow(dead_code)]
pub async fn wait_until(store: &WebsiteStore, predicate: impl FnMut(&WebsiteData) -> bool) -> WebsiteData {
    let mut rx = store.subscribe();
    let result = tokio::time::timeout(WAIT_TIMEOUT, rx.wait_for(predicate)).await;
    match result {
        Ok(Ok(data)) => data.clone(),
        Ok(Err(_)) => panic!("store dropped while waiting"),
        Err(_) => panic!("timed out waiting for store state: {:?}", store.snapshot()),
    }
}

/// Both slices loaded for the club.
#[allow(dead_code)]
pub fn fully_loaded(data: &WebsiteData) -> bool {
    !data.loading
        && data.club_id.is_some()
        && data.members_status == club_portal::SliceStatus::Ready
        && data.events_status == club_portal::SliceStatus::Ready
}
