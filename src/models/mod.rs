// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models mirrored from the backend schema.

pub mod club;
pub mod event;
pub mod membership;
pub mod profile;
pub mod rsvp;
pub mod stats;

pub use club::Club;
pub use event::{group_rsvps, Event, EventWithRsvps};
pub use membership::Membership;
pub use profile::Profile;
pub use rsvp::{Attendance, AttendanceSummary, Rsvp, RsvpRow};
pub use stats::{EventStats, MemberStats};
