use chrono::{Duration, Local, Utc};
use club_portal::models::{group_rsvps, Event, EventStats, MemberStats, Membership, Rsvp};
use club_portal::time_utils::format_utc_rfc3339;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;

const EVENTS: usize = 200;
const RSVPS_PER_EVENT: usize = 40;
const MEMBERS: usize = 5_000;

fn events() -> Vec<Event> {
    let now = Utc::now();
    (0..EVENTS)
        .map(|i| Event {
            id: format!("e{}", i),
            club_id: "club".to_string(),
            title: format!("Event {}", i),
            event_date: (now + Duration::days(i as i64 - 100))
                .format("%Y-%m-%d")
                .to_string(),
            ..Default::default()
        })
        .collect()
}

fn rsvps() -> Vec<Rsvp> {
    // Interleaved across events, as returned in creation order
    (0..EVENTS * RSVPS_PER_EVENT)
        .map(|i| Rsvp {
            id: format!("r{}", i),
            event_id: format!("e{}", i % EVENTS),
            membership_id: None,
            name: Some(format!("Guest {}", i)),
            email: None,
            attendance: None,
            avatar_url: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        })
        .collect()
}

fn members() -> Vec<Membership> {
    let now = Utc::now();
    (0..MEMBERS)
        .map(|i| Membership {
            id: format!("m{}", i),
            club_id: "club".to_string(),
            joined_at: Some(format_utc_rfc3339(now - Duration::hours(i as i64))),
            role: Some(if i % 50 == 0 { "organizer" } else { "member" }.to_string()),
            ..Default::default()
        })
        .collect()
}

fn benchmark_aggregation(c: &mut Criterion) {
    let events = events();
    let rsvps = rsvps();
    let members = members();
    let grouped = group_rsvps(events.clone(), rsvps.clone());

    let mut group = c.benchmark_group("aggregation");

    group.bench_function("group_rsvps", |b| {
        b.iter_batched(
            || (events.clone(), rsvps.clone()),
            |(events, rsvps)| group_rsvps(black_box(events), black_box(rsvps)),
            BatchSize::LargeInput,
        )
    });

    group.bench_function("event_stats", |b| {
        b.iter(|| EventStats::from_events(black_box(&grouped), Utc::now()))
    });

    group.bench_function("member_stats", |b| {
        b.iter(|| MemberStats::from_memberships(black_box(&members), &Local::now()))
    });

    group.finish();
}

criterion_group!(benches, benchmark_aggregation);
criterion_main!(benches);
