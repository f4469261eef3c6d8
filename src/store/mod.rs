// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Club website data store.
//!
//! [`WebsiteStore`] owns the club-scoped dataset shown by the screens:
//! members, events with their RSVPs, and the derived dashboard stats.
//! State is published through a `watch` channel; every change goes through
//! a store operation.
//!
//! Each data slice carries a sequence number. A response is applied only if
//! it belongs to the latest fetch of its slice and to the current session
//! epoch, so a slow earlier fetch never overwrites a newer one and nothing
//! from before a sign-out repopulates the store.

mod attendance;
mod events;
pub mod listener;
mod members;

pub use listener::AuthListener;

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::backend::ClubBackend;
use crate::error::{AppError, Result};
use crate::models::{Club, EventStats, EventWithRsvps, MemberStats, Membership};

/// Fetch state of one data slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SliceStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl SliceStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, SliceStatus::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SliceStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Snapshot of everything the screens read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WebsiteData {
    pub club_id: Option<String>,
    pub club_name: String,
    /// A full session load is in progress
    pub loading: bool,
    /// Profile or club resolution failure
    pub error: Option<String>,

    // ─── Members ─────────────────────────────────────────────────
    pub members: Vec<Membership>,
    pub member_stats: MemberStats,
    pub members_status: SliceStatus,

    // ─── Events ──────────────────────────────────────────────────
    pub events: Vec<EventWithRsvps>,
    pub event_stats: EventStats,
    pub events_status: SliceStatus,
}

impl WebsiteData {
    pub fn find_event(&self, event_id: &str) -> Option<&EventWithRsvps> {
        self.events.iter().find(|e| e.event.id == event_id)
    }

    /// Members matching `query` on name or email, case-insensitively.
    pub fn search_members<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Membership> + 'a {
        self.members.iter().filter(move |m| m.matches_query(query))
    }
}

#[derive(Debug, Clone, Copy)]
enum Slice {
    Members,
    Events,
}

impl Slice {
    fn set_status(self, data: &mut WebsiteData, status: SliceStatus) {
        match self {
            Slice::Members => data.members_status = status,
            Slice::Events => data.events_status = status,
        }
    }
}

/// Identifies one fetch: the slice sequence and session epoch it started in.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    seq: u64,
    epoch: u64,
}

/// The club data store. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct WebsiteStore {
    backend: Arc<dyn ClubBackend>,
    state: Arc<watch::Sender<WebsiteData>>,
    members_seq: Arc<AtomicU64>,
    events_seq: Arc<AtomicU64>,
    /// Sequence of full session loads; only the latest clears `loading`.
    load_seq: Arc<AtomicU64>,
    /// Bumped on every reset to invalidate all in-flight work.
    epoch: Arc<AtomicU64>,
}

impl WebsiteStore {
    pub fn new(backend: Arc<dyn ClubBackend>) -> Self {
        let (state, _) = watch::channel(WebsiteData::default());
        Self {
            backend,
            state: Arc::new(state),
            members_seq: Arc::new(AtomicU64::new(0)),
            events_seq: Arc::new(AtomicU64::new(0)),
            load_seq: Arc::new(AtomicU64::new(0)),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn backend(&self) -> &Arc<dyn ClubBackend> {
        &self.backend
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> WebsiteData {
        self.state.borrow().clone()
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<WebsiteData> {
        self.state.subscribe()
    }

    /// Discard all data and invalidate in-flight fetches.
    pub fn reset(&self) {
        self.state.send_modify(|data| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            self.members_seq.fetch_add(1, Ordering::SeqCst);
            self.events_seq.fetch_add(1, Ordering::SeqCst);
            *data = WebsiteData::default();
        });
        tracing::debug!("Website data reset");
    }

    /// Resolve the session's club, then fetch members and events
    /// concurrently. Failures are recorded in state, never returned.
    pub async fn load_for_current_session(&self) {
        let epoch = self.epoch.load(Ordering::SeqCst);

        let session = match self.backend.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::debug!("No active session, clearing website data");
                self.reset();
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed, clearing website data");
                self.reset();
                return;
            }
        };

        let mut load = 0;
        let started = self.apply_in_epoch(epoch, |data| {
            load = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
            data.loading = true;
            data.error = None;
        });
        if !started {
            tracing::debug!("Session changed before load started, skipping");
            return;
        }

        match self.resolve_club(&session.user.id).await {
            Ok(club) => {
                let current = self.apply_in_epoch(epoch, |data| {
                    data.club_id = Some(club.id.clone());
                    data.club_name = club.name.clone();
                });
                if current {
                    tracing::info!(club_id = %club.id, user_id = %session.user.id, "Loading club data");
                    tokio::join!(
                        self.load_members(&club.id, epoch),
                        self.load_events(&club.id, epoch)
                    );
                } else {
                    tracing::debug!(club_id = %club.id, "Session changed during load, discarding");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, user_id = %session.user.id, "Failed to load website data");
                let message = e.to_string();
                self.apply_if_latest_load(epoch, load, |data| data.error = Some(message));
            }
        }

        self.apply_if_latest_load(epoch, load, |data| data.loading = false);
    }

    /// Profile → club for the signed-in user.
    async fn resolve_club(&self, user_id: &str) -> Result<Club> {
        let profile = self.backend.get_profile(user_id).await?;
        let club_id = profile
            .club_id
            .ok_or_else(|| AppError::NotFound(format!("Club for profile {}", user_id)))?;
        self.backend.get_club(&club_id).await
    }

    /// Re-run the member fetch for the resolved club; no-op without one.
    pub async fn refetch_members(&self) {
        let club_id = self.state.borrow().club_id.clone();
        match club_id {
            Some(club_id) => self.fetch_members(&club_id).await,
            None => tracing::debug!("No club resolved, skipping member refetch"),
        }
    }

    /// Re-run the event fetch for the resolved club; no-op without one.
    pub async fn refetch_events(&self) {
        let club_id = self.state.borrow().club_id.clone();
        match club_id {
            Some(club_id) => self.fetch_events(&club_id).await,
            None => tracing::debug!("No club resolved, skipping event refetch"),
        }
    }

    // ─── Sequencing ──────────────────────────────────────────────

    fn counter(&self, slice: Slice) -> &AtomicU64 {
        match slice {
            Slice::Members => &self.members_seq,
            Slice::Events => &self.events_seq,
        }
    }

    /// Start a fetch of `slice` on behalf of session `epoch`: take a new
    /// sequence number and mark the slice loading. If a reset happened
    /// since `epoch`, nothing changes and the ticket can never commit.
    fn begin(&self, slice: Slice, epoch: u64) -> Ticket {
        let mut ticket = Ticket { seq: 0, epoch };
        self.state.send_if_modified(|data| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            ticket.seq = self.counter(slice).fetch_add(1, Ordering::SeqCst) + 1;
            slice.set_status(data, SliceStatus::Loading);
            true
        });
        ticket
    }

    /// Apply `modify` if `ticket` is still the latest fetch of `slice`.
    /// Returns whether it was applied.
    fn commit(&self, slice: Slice, ticket: Ticket, modify: impl FnOnce(&mut WebsiteData)) -> bool {
        self.state.send_if_modified(|data| {
            let current = self.counter(slice).load(Ordering::SeqCst) == ticket.seq
                && self.epoch.load(Ordering::SeqCst) == ticket.epoch;
            if current {
                modify(data);
            }
            current
        })
    }

    /// Apply `modify` if `load` is the latest session load of `epoch`.
    fn apply_if_latest_load(&self, epoch: u64, load: u64, modify: impl FnOnce(&mut WebsiteData)) -> bool {
        self.state.send_if_modified(|data| {
            let current = self.epoch.load(Ordering::SeqCst) == epoch
                && self.load_seq.load(Ordering::SeqCst) == load;
            if current {
                modify(data);
            }
            current
        })
    }

    /// Apply `modify` if no reset happened since `epoch` was read.
    fn apply_in_epoch(&self, epoch: u64, modify: impl FnOnce(&mut WebsiteData)) -> bool {
        self.state.send_if_modified(|data| {
            let current = self.epoch.load(Ordering::SeqCst) == epoch;
            if current {
                modify(data);
            }
            current
        })
    }
}
