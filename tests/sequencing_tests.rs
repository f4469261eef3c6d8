// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Overlapping fetches: only the latest response of a slice is applied,
//! and nothing from before a sign-out comes back.

use chrono::Duration as ChronoDuration;
use club_portal::backend::collections;
use club_portal::{AuthListener, SliceStatus, WebsiteData};
use std::time::Duration;

mod common;
use common::{
    club_backend, event, fully_loaded, membership, month_start, store_for, wait_until, ADMIN_ID,
    CLUB_ID,
};

const SLOW: Duration = Duration::from_millis(300);
/// Long enough for a spawned fetch to issue its request.
const SETTLE: Duration = Duration::from_millis(30);

#[tokio::test]
async fn test_slow_stale_fetch_does_not_overwrite_newer() {
    let backend = club_backend();
    backend.insert_membership(membership("a", CLUB_ID, month_start(), "member"));
    let store = store_for(&backend);

    backend.set_latency(collections::MEMBERSHIPS, SLOW);
    let slow = {
        let store = store.clone();
        tokio::spawn(async move { store.fetch_members(CLUB_ID).await })
    };
    tokio::time::sleep(SETTLE).await;
    assert!(store.snapshot().members_status.is_loading());

    backend.set_latency(collections::MEMBERSHIPS, Duration::ZERO);
    backend.insert_membership(membership(
        "b",
        CLUB_ID,
        month_start() + ChronoDuration::hours(2),
        "member",
    ));
    store.fetch_members(CLUB_ID).await;
    assert_eq!(store.snapshot().members.len(), 2);

    slow.await.unwrap();

    let data = store.snapshot();
    assert_eq!(data.members.len(), 2);
    assert_eq!(data.member_stats.total, 2);
    assert_eq!(data.members_status, SliceStatus::Ready);
}

#[tokio::test]
async fn test_stale_failure_does_not_clear_newer_data() {
    let backend = club_backend();
    backend.insert_event(event("e1", CLUB_ID, 1));
    let store = store_for(&backend);

    backend.fail_table(collections::EVENTS, "statement timeout");
    backend.set_latency(collections::EVENTS, SLOW);
    let slow = {
        let store = store.clone();
        tokio::spawn(async move { store.fetch_events(CLUB_ID).await })
    };
    tokio::time::sleep(SETTLE).await;

    backend.clear_failure(collections::EVENTS);
    backend.set_latency(collections::EVENTS, Duration::ZERO);
    store.fetch_events(CLUB_ID).await;
    slow.await.unwrap();

    let data = store.snapshot();
    assert_eq!(data.events_status, SliceStatus::Ready);
    assert_eq!(data.events.len(), 1);
}

#[tokio::test]
async fn test_slices_are_sequenced_independently() {
    let backend = club_backend();
    backend.insert_membership(membership("a", CLUB_ID, month_start(), "member"));
    backend.insert_event(event("e1", CLUB_ID, 1));
    let store = store_for(&backend);

    backend.set_latency(collections::MEMBERSHIPS, SLOW);
    let members = {
        let store = store.clone();
        tokio::spawn(async move { store.fetch_members(CLUB_ID).await })
    };
    tokio::time::sleep(SETTLE).await;

    // An events fetch in the meantime must not invalidate the member fetch
    store.fetch_events(CLUB_ID).await;
    members.await.unwrap();

    let data = store.snapshot();
    assert_eq!(data.members.len(), 1);
    assert_eq!(data.events.len(), 1);
}

#[tokio::test]
async fn test_sign_out_during_load_discards_results() {
    let backend = club_backend();
    backend.insert_membership(membership("a", CLUB_ID, month_start(), "member"));
    backend.insert_event(event("e1", CLUB_ID, 1));
    backend.set_latency(collections::MEMBERSHIPS, SLOW);
    backend.set_latency(collections::EVENTS, SLOW);
    let store = store_for(&backend);
    let _listener = AuthListener::spawn(store.clone());

    backend.sign_in(ADMIN_ID);
    wait_until(&store, |d| d.loading && d.club_id.is_some()).await;

    backend.sign_out();
    wait_until(&store, |d| d.club_id.is_none()).await;

    // Outlast the in-flight fetches
    tokio::time::sleep(SLOW * 2).await;
    assert_eq!(store.snapshot(), WebsiteData::default());
}

#[tokio::test]
async fn test_refetch_after_load_uses_resolved_club() {
    let backend = club_backend();
    backend.persist_session(ADMIN_ID);
    let store = store_for(&backend);
    store.load_for_current_session().await;
    assert!(fully_loaded(&store.snapshot()));
    assert!(store.snapshot().members.is_empty());

    backend.insert_membership(membership("late", CLUB_ID, month_start(), "member"));
    store.refetch_members().await;

    assert_eq!(store.snapshot().members.len(), 1);
}

#[tokio::test]
async fn test_overlapping_loads_keep_loading_until_latest_finishes() {
    let backend = club_backend();
    backend.insert_membership(membership("a", CLUB_ID, month_start(), "member"));
    backend.persist_session(ADMIN_ID);
    let store = store_for(&backend);

    backend.set_latency(collections::MEMBERSHIPS, SLOW);
    let first = {
        let store = store.clone();
        tokio::spawn(async move { store.load_for_current_session().await })
    };
    tokio::time::sleep(SETTLE).await;

    backend.set_latency(collections::MEMBERSHIPS, SLOW * 2);
    let second = {
        let store = store.clone();
        tokio::spawn(async move { store.load_for_current_session().await })
    };

    first.await.unwrap();
    assert!(store.snapshot().loading);

    second.await.unwrap();
    let data = store.snapshot();
    assert!(!data.loading);
    assert!(fully_loaded(&data));
    assert_eq!(data.members.len(), 1);
}
