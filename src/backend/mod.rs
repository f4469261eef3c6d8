//! Backend layer: the remote data source behind the store.
//!
//! [`ClubBackend`] is the seam between the store and the hosted backend.
//! [`SupabaseClient`] talks to a real project over HTTP;
//! [`InMemoryBackend`] serves in-memory tables for tests and offline demos.

pub mod memory;
pub mod supabase;

pub use memory::InMemoryBackend;
pub use supabase::SupabaseClient;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::auth::{AuthChange, AuthUser, Session};
use crate::error::Result;
use crate::models::{Attendance, Club, Event, Membership, Profile, RsvpRow};

/// Table names as constants.
pub mod collections {
    pub const CLUBS: &str = "clubs";
    pub const PROFILES: &str = "profiles";
    pub const EVENTS: &str = "events";
    pub const MEMBERSHIPS: &str = "memberships";
    pub const RSVPS: &str = "rsvps";
}

/// Operations the store needs from the hosted backend.
///
/// List operations return rows already scoped to one club and ordered the
/// way the screens display them.
#[async_trait]
pub trait ClubBackend: Send + Sync {
    // ─── Auth ────────────────────────────────────────────────────

    /// Current session, if any.
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Current user as verified by the auth service.
    async fn get_user(&self) -> Result<Option<AuthUser>>;

    /// Subscribe to auth state changes.
    fn subscribe_auth(&self) -> broadcast::Receiver<AuthChange>;

    // ─── Rows ────────────────────────────────────────────────────

    async fn get_profile(&self, user_id: &str) -> Result<Profile>;

    async fn get_club(&self, club_id: &str) -> Result<Club>;

    /// Memberships of a club, newest `joined_at` first.
    async fn list_memberships(&self, club_id: &str) -> Result<Vec<Membership>>;

    /// Events of a club, earliest `event_date` first.
    async fn list_events(&self, club_id: &str) -> Result<Vec<Event>>;

    /// RSVPs of a club with the linked membership name, oldest first.
    async fn list_rsvps(&self, club_id: &str) -> Result<Vec<RsvpRow>>;

    /// Set one RSVP's attendance. Returns the updated rows; an empty list
    /// means no row was visible to the caller.
    async fn update_rsvp_attendance(
        &self,
        rsvp_id: &str,
        attendance: Option<Attendance>,
    ) -> Result<Vec<RsvpRow>>;

    // ─── Storage ─────────────────────────────────────────────────

    /// Upload an event image and return its public URL.
    async fn upload_event_image(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;
}
