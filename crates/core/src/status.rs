//! Referral lifecycle status.
//!
//! The status is a closed enumeration rather than a free-form string so that
//! the urgency-escalation rule can be expressed as a pure transition function
//! and unknown values are rejected at the API boundary.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a referral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferralStatus {
    /// Referral entered by the nursing station, not yet scheduled.
    Created,
    /// An appointment slot has been proposed.
    Scheduled,
    /// Appointment booked by the specialist.
    Booked,
    /// Patient confirmed attendance.
    Confirmed,
    /// Patient did not attend the booked appointment.
    NoShow,
    /// Appointment window passed without attendance.
    Missed,
    /// A new appointment must be arranged.
    NeedsReschedule,
    /// Patient was seen.
    Completed,
    /// Referral withdrawn.
    Cancelled,
}

impl ReferralStatus {
    /// Convert to the wire/storage string.
    pub fn as_wire(self) -> &'static str {
        match self {
            ReferralStatus::Created => "CREATED",
            ReferralStatus::Scheduled => "SCHEDULED",
            ReferralStatus::Booked => "BOOKED",
            ReferralStatus::Confirmed => "CONFIRMED",
            ReferralStatus::NoShow => "NO_SHOW",
            ReferralStatus::Missed => "MISSED",
            ReferralStatus::NeedsReschedule => "NEEDS_RESCHEDULE",
            ReferralStatus::Completed => "COMPLETED",
            ReferralStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parse from the wire/storage string.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(ReferralStatus::Created),
            "SCHEDULED" => Some(ReferralStatus::Scheduled),
            "BOOKED" => Some(ReferralStatus::Booked),
            "CONFIRMED" => Some(ReferralStatus::Confirmed),
            "NO_SHOW" => Some(ReferralStatus::NoShow),
            "MISSED" => Some(ReferralStatus::Missed),
            "NEEDS_RESCHEDULE" => Some(ReferralStatus::NeedsReschedule),
            "COMPLETED" => Some(ReferralStatus::Completed),
            "CANCELLED" => Some(ReferralStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether this status means the patient did not attend.
    pub fn is_missed_appointment(self) -> bool {
        matches!(self, ReferralStatus::NoShow | ReferralStatus::Missed)
    }

    /// Human-readable label, e.g. `NO SHOW`.
    pub fn label(self) -> String {
        self.as_wire().replace('_', " ")
    }
}

impl std::fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Compute the urgency flag after a status transition.
///
/// A transition into a missed-appointment state forces urgency on. Moving
/// away from a missed state does not clear it; lowering urgency is a staff
/// decision, not a state-machine rule.
pub fn apply_transition(current_urgency: bool, new_status: ReferralStatus) -> bool {
    current_urgency || new_status.is_missed_appointment()
}
