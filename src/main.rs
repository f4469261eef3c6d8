// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Club Portal CLI
//!
//! Signs in, loads the club's members and events the same way the app does
//! on launch, and prints the resulting snapshot as JSON.

use club_portal::{
    backend::InMemoryBackend, config::Config, AuthListener, ClubBackend, SupabaseClient,
    WebsiteData, WebsiteStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on how long the initial load may take.
const LOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // CLUB_PORTAL_DEMO=1 runs against built-in sample data, no network
    let demo = std::env::var("CLUB_PORTAL_DEMO").is_ok_and(|v| v == "1");

    let (backend, supabase): (Arc<dyn ClubBackend>, Option<SupabaseClient>) = if demo {
        tracing::info!("Using in-memory demo backend");
        (Arc::new(InMemoryBackend::demo()), None)
    } else {
        let config = Config::from_env()?;
        tracing::info!(url = %config.supabase_url, "Using Supabase backend");
        let client = SupabaseClient::new(&config)?;
        (Arc::new(client.clone()), Some(client))
    };

    let store = WebsiteStore::new(backend);
    let mut updates = store.subscribe();
    let listener = AuthListener::spawn(store.clone());

    if let Some(client) = &supabase {
        let email = std::env::var("CLUB_PORTAL_EMAIL")?;
        let password = std::env::var("CLUB_PORTAL_PASSWORD")?;
        client.sign_in_with_password(&email, &password).await?;
    }

    let snapshot = match tokio::time::timeout(LOAD_TIMEOUT, updates.wait_for(load_settled)).await {
        Ok(Ok(data)) => data.clone(),
        Ok(Err(_)) => return Err("store closed before loading".into()),
        Err(_) => {
            tracing::warn!("Timed out waiting for club data, printing partial snapshot");
            store.snapshot()
        }
    };

    listener.shutdown();
    if let Some(client) = &supabase {
        client.sign_out().await?;
    }

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// A load finished: club resolved (or failed) and both slices settled.
fn load_settled(data: &WebsiteData) -> bool {
    if data.loading {
        return false;
    }
    data.error.is_some()
        || (data.club_id.is_some()
            && !data.members_status.is_loading()
            && !data.events_status.is_loading())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("club_portal=debug,info")),
        )
        .with(format)
        .init();
}
