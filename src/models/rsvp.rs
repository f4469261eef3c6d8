// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! RSVP model and attendance tracking.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Recorded attendance for an RSVP. Unset is represented as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Attendance {
    Attended,
    NotAttended,
}

impl Attendance {
    /// Next value for the check-in toggle: `attended` flips to
    /// `not_attended`, anything else becomes `attended`.
    pub fn toggled(current: Option<Attendance>) -> Attendance {
        match current {
            Some(Attendance::Attended) => Attendance::NotAttended,
            _ => Attendance::Attended,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Attendance::Attended => "attended",
            Attendance::NotAttended => "not_attended",
        }
    }
}

/// An RSVP as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Rsvp {
    pub id: String,
    pub event_id: String,
    pub membership_id: Option<String>,
    /// RSVP name, falling back to the linked membership's name
    pub name: Option<String>,
    pub email: Option<String>,
    pub attendance: Option<Attendance>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

impl Rsvp {
    /// Case-insensitive substring match on the display name.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        self.name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&query.to_lowercase()))
    }
}

/// Nested `memberships(name)` object selected alongside an RSVP row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedMembership {
    #[serde(default)]
    pub name: Option<String>,
}

/// RSVP row as returned by the backend select with the nested membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsvpRow {
    pub id: String,
    pub event_id: String,
    #[serde(default)]
    pub membership_id: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub attendance: Option<Attendance>,
    #[serde(default)]
    pub memberships: Option<LinkedMembership>,
}

impl From<RsvpRow> for Rsvp {
    fn from(row: RsvpRow) -> Self {
        let name = non_empty(row.name).or_else(|| row.memberships.and_then(|m| non_empty(m.name)));
        Rsvp {
            id: row.id,
            event_id: row.event_id,
            membership_id: row.membership_id,
            name,
            email: row.email,
            attendance: row.attendance,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Attendance counters for one event's RSVP list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub attended: usize,
    pub not_attended: usize,
    /// RSVPs with no attendance recorded yet
    pub pending: usize,
}

impl AttendanceSummary {
    pub fn from_rsvps(rsvps: &[Rsvp]) -> Self {
        rsvps
            .iter()
            .fold(Self::default(), |mut summary, rsvp| {
                match rsvp.attendance {
                    Some(Attendance::Attended) => summary.attended += 1,
                    Some(Attendance::NotAttended) => summary.not_attended += 1,
                    None => summary.pending += 1,
                }
                summary
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: Option<&str>, linked: Option<&str>) -> RsvpRow {
        RsvpRow {
            id: "r1".to_string(),
            event_id: "e1".to_string(),
            membership_id: None,
            avatar_url: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            name: name.map(String::from),
            email: None,
            attendance: None,
            memberships: linked.map(|n| LinkedMembership {
                name: Some(n.to_string()),
            }),
        }
    }

    #[test]
    fn test_name_prefers_rsvp_then_membership() {
        assert_eq!(
            Rsvp::from(row(Some("Guest"), Some("Member"))).name.as_deref(),
            Some("Guest")
        );
        assert_eq!(
            Rsvp::from(row(None, Some("Member"))).name.as_deref(),
            Some("Member")
        );
        assert_eq!(
            Rsvp::from(row(Some(""), Some("Member"))).name.as_deref(),
            Some("Member")
        );
        assert_eq!(Rsvp::from(row(None, None)).name, None);
    }

    #[test]
    fn test_attendance_wire_format() {
        let parsed: RsvpRow = serde_json::from_str(
            r#"{"id":"r1","event_id":"e1","created_at":"x","attendance":"not_attended",
                "memberships":{"name":"Grace"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.attendance, Some(Attendance::NotAttended));

        let unset: RsvpRow =
            serde_json::from_str(r#"{"id":"r1","event_id":"e1","attendance":null}"#).unwrap();
        assert_eq!(unset.attendance, None);

        assert_eq!(
            serde_json::to_value(Attendance::Attended).unwrap(),
            serde_json::json!("attended")
        );
    }

    #[test]
    fn test_toggle() {
        assert_eq!(Attendance::toggled(None), Attendance::Attended);
        assert_eq!(
            Attendance::toggled(Some(Attendance::NotAttended)),
            Attendance::Attended
        );
        assert_eq!(
            Attendance::toggled(Some(Attendance::Attended)),
            Attendance::NotAttended
        );
    }

    #[test]
    fn test_attendance_summary() {
        let mut rsvps: Vec<Rsvp> = (0..4).map(|_| Rsvp::from(row(None, None))).collect();
        rsvps[0].attendance = Some(Attendance::Attended);
        rsvps[1].attendance = Some(Attendance::Attended);
        rsvps[2].attendance = Some(Attendance::NotAttended);

        assert_eq!(
            AttendanceSummary::from_rsvps(&rsvps),
            AttendanceSummary {
                attended: 2,
                not_attended: 1,
                pending: 1
            }
        );
    }
}
