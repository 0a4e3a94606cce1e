//! Domain models for patients, referrals, and the dashboard view.

use crate::status::ReferralStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered patient.
///
/// The risk score is computed once, at registration, from the medical history
/// (see [`crate::risk`]). Later edits to the history do not recompute it; the
/// stored score stays frozen so it remains auditable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub full_name: String,
    pub risk_score: i64,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub medical_history: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a patient. The store generates the identifier and
/// the risk score is supplied by the caller from the scoring rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPatient {
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub medical_history: Vec<String>,
}

/// A request for a patient to be seen by a specialty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub id: String,
    pub patient_id: String,
    pub specialty: String,
    pub status: ReferralStatus,
    pub priority: String,
    pub is_urgent: bool,
    pub requires_transport: bool,
    pub appointment_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a referral. New referrals always start as
/// [`ReferralStatus::Created`] with urgency off.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReferral {
    pub patient_id: String,
    pub specialty: String,
    pub priority: String,
    pub requires_transport: bool,
    pub appointment_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// One row of the triage dashboard: a referral joined with its patient and
/// carrying the display risk (see [`crate::dashboard`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardEntry {
    pub referral_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub specialty: String,
    pub status: ReferralStatus,
    pub priority: String,
    pub is_urgent: bool,
    pub requires_transport: bool,
    pub appointment_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub effective_risk: i64,
}
