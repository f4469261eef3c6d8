// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Long-lived auth listener that keeps the store in step with the session.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::WebsiteStore;
use crate::auth::{AuthChange, AuthEvent};

/// What the listener does in response to an auth change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Load,
    Reset,
    Ignore,
}

/// Decide how to react to `event`.
///
/// `has_fetched` is true once a load ran for the current sign-in; repeated
/// sign-in notifications for the same session do not reload.
pub fn react(event: AuthEvent, has_user: bool, has_fetched: bool) -> Reaction {
    match event {
        AuthEvent::SignedIn | AuthEvent::InitialSession if has_user && !has_fetched => {
            Reaction::Load
        }
        AuthEvent::SignedOut => Reaction::Reset,
        _ if !has_user => Reaction::Reset,
        _ => Reaction::Ignore,
    }
}

/// Handle to the spawned listener task. Dropping it deregisters the
/// listener.
pub struct AuthListener {
    handle: JoinHandle<()>,
}

impl AuthListener {
    /// Subscribe to auth changes, check the current session once, then
    /// follow changes until the backend's stream closes.
    pub fn spawn(store: WebsiteStore) -> Self {
        // Subscribe before the initial check so no change slips between them.
        let mut changes = store.backend().subscribe_auth();

        let handle = tokio::spawn(async move {
            let mut has_fetched = false;
            sync_with_session(&store, &mut has_fetched).await;

            loop {
                match changes.recv().await {
                    Ok(change) => handle_change(&store, &change, &mut has_fetched),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth listener lagged, resyncing with session");
                        has_fetched = false;
                        sync_with_session(&store, &mut has_fetched).await;
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Auth change stream closed, listener exiting");
                        break;
                    }
                }
            }
        });

        Self { handle }
    }

    /// Stop listening.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for AuthListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn handle_change(store: &WebsiteStore, change: &AuthChange, has_fetched: &mut bool) {
    let reaction = react(change.event, change.user().is_some(), *has_fetched);
    tracing::debug!(event = %change.event, ?reaction, "Auth change received");

    match reaction {
        Reaction::Load => {
            *has_fetched = true;
            spawn_load(store);
        }
        Reaction::Reset => {
            *has_fetched = false;
            store.reset();
        }
        Reaction::Ignore => {}
    }
}

/// Run a load in the background so a sign-out arriving meanwhile is handled
/// at once; the store discards the load's results after the reset.
fn spawn_load(store: &WebsiteStore) {
    let store = store.clone();
    tokio::spawn(async move { store.load_for_current_session().await });
}

/// Load if a session exists and nothing was loaded yet; reset if none.
async fn sync_with_session(store: &WebsiteStore, has_fetched: &mut bool) {
    match store.backend().get_session().await {
        Ok(Some(_)) if !*has_fetched => {
            *has_fetched = true;
            spawn_load(store);
        }
        Ok(Some(_)) => {}
        Ok(None) => store.reset(),
        Err(e) => {
            tracing::warn!(error = %e, "Initial session check failed");
            store.reset();
        }
    }
}
