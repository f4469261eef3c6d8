// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session types and the auth state change stream.
//!
//! Backends publish an [`AuthChange`] whenever the session changes; the
//! store's listener subscribes and reloads or resets accordingly.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Broadcast capacity; auth changes are rare, this only absorbs bursts.
const AUTH_CHANNEL_CAPACITY: usize = 16;

/// Authenticated user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An active session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token expiry (Unix timestamp)
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// Kind of auth state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    /// Emitted once when a persisted session is restored at startup
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl std::fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuthEvent::InitialSession => "INITIAL_SESSION",
            AuthEvent::SignedIn => "SIGNED_IN",
            AuthEvent::SignedOut => "SIGNED_OUT",
            AuthEvent::TokenRefreshed => "TOKEN_REFRESHED",
            AuthEvent::UserUpdated => "USER_UPDATED",
        };
        f.write_str(name)
    }
}

/// An auth state change together with the session after the change.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn user(&self) -> Option<&AuthUser> {
        self.session.as_ref().map(|s| &s.user)
    }
}

/// Fan-out of auth changes to any number of listeners.
#[derive(Debug, Clone)]
pub struct AuthNotifier {
    tx: broadcast::Sender<AuthChange>,
}

impl Default for AuthNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(AUTH_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.tx.subscribe()
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn notify(&self, event: AuthEvent, session: Option<Session>) {
        tracing::debug!(%event, has_session = session.is_some(), "Auth state change");
        let _ = self.tx.send(AuthChange { event, session });
    }
}
