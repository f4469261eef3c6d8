// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory backend for offline demos and tests.
//!
//! Tables are plain vectors behind a mutex. Reads honour the same club
//! scoping and ordering as the hosted backend. Failures and latency can be
//! injected per table to exercise the store's error and race handling.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::auth::{AuthChange, AuthEvent, AuthNotifier, AuthUser, Session};
use crate::backend::{collections, ClubBackend};
use crate::error::{AppError, Result};
use crate::models::rsvp::LinkedMembership;
use crate::models::{Attendance, Club, Event, Membership, Profile, RsvpRow};
use crate::time_utils::{format_utc_rfc3339, parse_timestamp};

/// Pseudo-table name for injecting RSVP update failures.
pub const RSVP_UPDATES: &str = "rsvps.update";
/// Pseudo-table name for injecting event image upload failures.
pub const STORAGE: &str = "storage";

#[derive(Default)]
struct Tables {
    clubs: Vec<Club>,
    profiles: Vec<Profile>,
    memberships: Vec<Membership>,
    events: Vec<Event>,
    /// RSVP rows with the club they belong to
    rsvps: Vec<(String, RsvpRow)>,
    /// Uploaded objects: path -> (content type, bytes)
    objects: HashMap<String, (String, Vec<u8>)>,
    /// Injected failures: table -> error message
    failures: HashMap<String, String>,
    /// Injected latency per table
    latency: HashMap<String, Duration>,
}

/// Offline [`ClubBackend`] over in-memory tables.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    tables: Arc<Mutex<Tables>>,
    session: Arc<Mutex<Option<Session>>>,
    auth: AuthNotifier,
    writes: Arc<AtomicUsize>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A panicking test thread must not wedge the other tests.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn current_session(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_session(&self, session: Option<Session>) {
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = session;
    }

    // ─── Seeding ─────────────────────────────────────────────────

    pub fn insert_club(&self, club: Club) {
        self.tables().clubs.push(club);
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.tables().profiles.push(profile);
    }

    pub fn insert_membership(&self, membership: Membership) {
        self.tables().memberships.push(membership);
    }

    pub fn insert_event(&self, event: Event) {
        self.tables().events.push(event);
    }

    pub fn insert_rsvp(&self, club_id: &str, rsvp: RsvpRow) {
        self.tables().rsvps.push((club_id.to_string(), rsvp));
    }

    /// Remove every membership of a club.
    pub fn clear_memberships(&self, club_id: &str) {
        self.tables().memberships.retain(|m| m.club_id != club_id);
    }

    // ─── Fault injection ─────────────────────────────────────────

    /// Make reads of `table` (or [`RSVP_UPDATES`], [`STORAGE`]) fail with
    /// `message`.
    pub fn fail_table(&self, table: &str, message: &str) {
        self.tables()
            .failures
            .insert(table.to_string(), message.to_string());
    }

    pub fn clear_failure(&self, table: &str) {
        self.tables().failures.remove(table);
    }

    /// Delay responses for `table` by `delay`. The rows are captured before
    /// the delay, so a slow response carries the data as of the request.
    pub fn set_latency(&self, table: &str, delay: Duration) {
        self.tables().latency.insert(table.to_string(), delay);
    }

    // ─── Inspection ──────────────────────────────────────────────

    /// Number of RSVP update requests received.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Stored RSVP row by id.
    pub fn rsvp(&self, rsvp_id: &str) -> Option<RsvpRow> {
        self.tables()
            .rsvps
            .iter()
            .find(|(_, r)| r.id == rsvp_id)
            .map(|(_, r)| r.clone())
    }

    /// Stored object bytes by path.
    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.tables().objects.get(path).map(|(_, b)| b.clone())
    }

    // ─── Auth ────────────────────────────────────────────────────

    /// Start a session for `user_id` and emit `SIGNED_IN`.
    pub fn sign_in(&self, user_id: &str) -> Session {
        let session = Session {
            access_token: format!("memory-token-{}", user_id),
            refresh_token: None,
            expires_at: Some((Utc::now() + ChronoDuration::hours(1)).timestamp()),
            user: AuthUser {
                id: user_id.to_string(),
                email: None,
            },
        };
        self.set_session(Some(session.clone()));
        self.auth.notify(AuthEvent::SignedIn, Some(session.clone()));
        session
    }

    /// Drop the session and emit `SIGNED_OUT`.
    pub fn sign_out(&self) {
        self.set_session(None);
        self.auth.notify(AuthEvent::SignedOut, None);
    }

    /// Install a session without emitting anything, as if persisted from a
    /// previous run.
    pub fn persist_session(&self, user_id: &str) -> Session {
        let session = Session {
            access_token: format!("memory-token-{}", user_id),
            refresh_token: None,
            expires_at: None,
            user: AuthUser {
                id: user_id.to_string(),
                email: None,
            },
        };
        self.set_session(Some(session.clone()));
        session
    }

    /// Emit an arbitrary auth change without touching the session.
    pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
        self.auth.notify(event, session);
    }

    /// Apply the injected latency for `table`, then its injected error.
    async fn gate(&self, table: &str) -> Result<()> {
        let (failure, delay) = {
            let tables = self.tables();
            (
                tables.failures.get(table).cloned(),
                tables.latency.get(table).copied(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(message) => Err(AppError::Backend(message)),
            None => Ok(()),
        }
    }

    /// Fill the nested membership name the way the hosted select does.
    fn join_membership(tables: &Tables, mut row: RsvpRow) -> RsvpRow {
        row.memberships = row.membership_id.as_ref().and_then(|mid| {
            tables
                .memberships
                .iter()
                .find(|m| &m.id == mid)
                .map(|m| LinkedMembership {
                    name: m.name.clone(),
                })
        });
        row
    }

    /// A small club with an admin, a handful of members and events.
    pub fn demo() -> Self {
        let backend = Self::new();
        let now = Utc::now();
        let days = |n: i64| format_utc_rfc3339(now + ChronoDuration::days(n));
        let date = |n: i64| (now + ChronoDuration::days(n)).format("%Y-%m-%d").to_string();

        backend.insert_club(Club {
            id: "demo-club".to_string(),
            name: "Riverside Running Club".to_string(),
            subdomain: "riverside".to_string(),
            tagline: Some("Every pace welcome".to_string()),
            ..Default::default()
        });
        backend.insert_profile(Profile {
            id: "demo-admin".to_string(),
            club_id: Some("demo-club".to_string()),
            role: Some("admin".to_string()),
            name: Some("Demo Admin".to_string()),
            created_at: Some(days(-400)),
        });

        let members = [
            ("m1", "Ada Lovelace", "organizer", -300),
            ("m2", "Grace Hopper", "member", -45),
            ("m3", "Alan Turing", "member", -3),
            ("m4", "Katherine Johnson", "Organizer", -1),
        ];
        for (id, name, role, joined) in members {
            backend.insert_membership(Membership {
                id: id.to_string(),
                club_id: "demo-club".to_string(),
                name: Some(name.to_string()),
                email: Some(format!("{}@riverside.example", id)),
                joined_at: Some(days(joined)),
                role: Some(role.to_string()),
                status: Some("active".to_string()),
            });
        }

        let events = [
            ("e1", "Hill repeats", -14),
            ("e2", "Saturday long run", 2),
            ("e3", "Trail social", 20),
        ];
        for (id, title, offset) in events {
            backend.insert_event(Event {
                id: id.to_string(),
                club_id: "demo-club".to_string(),
                title: title.to_string(),
                event_date: date(offset),
                event_time: Some("08:00".to_string()),
                location_name: Some("Riverside Park".to_string()),
                status: Some("published".to_string()),
                created_by: Some("demo-admin".to_string()),
                ..Default::default()
            });
        }

        let rsvps = [
            ("r1", "e1", Some("m1"), Some(Attendance::Attended)),
            ("r2", "e1", Some("m2"), Some(Attendance::NotAttended)),
            ("r3", "e2", Some("m3"), None),
            ("r4", "e2", None, None),
        ];
        for (i, (id, event_id, membership_id, attendance)) in rsvps.into_iter().enumerate() {
            backend.insert_rsvp(
                "demo-club",
                RsvpRow {
                    id: id.to_string(),
                    event_id: event_id.to_string(),
                    membership_id: membership_id.map(String::from),
                    avatar_url: None,
                    created_at: days(-30 + i as i64),
                    name: membership_id.is_none().then(|| "Walk-in guest".to_string()),
                    email: None,
                    attendance,
                    memberships: None,
                },
            );
        }

        backend.persist_session("demo-admin");
        backend
    }
}

/// Sort key for optional timestamps; unparseable values sort first.
fn timestamp_key(value: Option<&str>) -> i64 {
    value
        .and_then(parse_timestamp)
        .map(|d| d.timestamp_micros())
        .unwrap_or(i64::MIN)
}

#[async_trait]
impl ClubBackend for InMemoryBackend {
    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.current_session())
    }

    async fn get_user(&self) -> Result<Option<AuthUser>> {
        Ok(self.current_session().map(|s| s.user))
    }

    fn subscribe_auth(&self) -> broadcast::Receiver<AuthChange> {
        self.auth.subscribe()
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        self.gate(collections::PROFILES).await?;
        self.tables()
            .profiles
            .iter()
            .find(|p| p.id == user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Profile {}", user_id)))
    }

    async fn get_club(&self, club_id: &str) -> Result<Club> {
        self.gate(collections::CLUBS).await?;
        self.tables()
            .clubs
            .iter()
            .find(|c| c.id == club_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Club {}", club_id)))
    }

    async fn list_memberships(&self, club_id: &str) -> Result<Vec<Membership>> {
        let mut rows: Vec<Membership> = self
            .tables()
            .memberships
            .iter()
            .filter(|m| m.club_id == club_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| std::cmp::Reverse(timestamp_key(m.joined_at.as_deref())));

        self.gate(collections::MEMBERSHIPS).await?;
        Ok(rows)
    }

    async fn list_events(&self, club_id: &str) -> Result<Vec<Event>> {
        let mut rows: Vec<Event> = self
            .tables()
            .events
            .iter()
            .filter(|e| e.club_id == club_id)
            .cloned()
            .collect();
        rows.sort_by_key(|e| timestamp_key(Some(e.event_date.as_str())));

        self.gate(collections::EVENTS).await?;
        Ok(rows)
    }

    async fn list_rsvps(&self, club_id: &str) -> Result<Vec<RsvpRow>> {
        let mut rows: Vec<RsvpRow> = {
            let tables = self.tables();
            tables
                .rsvps
                .iter()
                .filter(|(club, _)| club == club_id)
                .map(|(_, row)| Self::join_membership(&tables, row.clone()))
                .collect()
        };
        rows.sort_by_key(|r| timestamp_key(Some(r.created_at.as_str())));

        self.gate(collections::RSVPS).await?;
        Ok(rows)
    }

    async fn update_rsvp_attendance(
        &self,
        rsvp_id: &str,
        attendance: Option<Attendance>,
    ) -> Result<Vec<RsvpRow>> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.gate(RSVP_UPDATES).await?;

        let mut tables = self.tables();
        let updated = tables
            .rsvps
            .iter_mut()
            .find(|(_, r)| r.id == rsvp_id)
            .map(|(_, row)| {
                row.attendance = attendance;
                row.clone()
            });

        Ok(updated
            .map(|row| Self::join_membership(&tables, row))
            .into_iter()
            .collect())
    }

    async fn upload_event_image(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(AppError::BadRequest("Empty storage path".to_string()));
        }
        self.gate(STORAGE).await?;

        let mut tables = self.tables();
        if tables.objects.contains_key(path) {
            return Err(AppError::Backend(format!(
                "HTTP 409: The resource already exists: {}",
                path
            )));
        }
        tables
            .objects
            .insert(path.to_string(), (content_type.to_string(), bytes));
        Ok(format!("memory://event-images/{}", path))
    }
}
