//! Wire request/response types for the REST API.
//!
//! Timestamps cross the wire as RFC 3339 strings; the referral status is its
//! uppercase wire form (`CREATED`, `NO_SHOW`, ...). Translation to and from
//! domain types happens in `api-rest`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A patient as presented over the wire.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub full_name: String,
    pub risk_score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub medical_history: Vec<String>,
    pub created_at: String,
}

/// Request body for registering a patient.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePatientReq {
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub medical_history: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePatientRes {
    pub patient: PatientRes,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<PatientRes>,
}

/// A referral as presented over the wire.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ReferralRes {
    pub id: String,
    pub patient_id: String,
    pub specialty: String,
    pub status: String,
    pub priority: String,
    pub is_urgent: bool,
    pub requires_transport: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a referral.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateReferralReq {
    pub patient_id: String,
    pub specialty: String,
    pub priority: String,
    #[serde(default)]
    pub requires_transport: bool,
    /// RFC 3339 timestamp, if an appointment is already arranged.
    #[serde(default)]
    pub appointment_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateReferralRes {
    pub referral: ReferralRes,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListReferralsRes {
    pub referrals: Vec<ReferralRes>,
}

/// Request body for a referral status transition.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    /// New status in wire form, e.g. `NO_SHOW`.
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusRes {
    pub id: String,
    pub status: String,
    pub is_urgent: bool,
}

/// One ranked dashboard row.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardEntryRes {
    pub referral_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub specialty: String,
    pub status: String,
    pub priority: String,
    pub is_urgent: bool,
    pub requires_transport: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub effective_risk: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardRes {
    pub entries: Vec<DashboardEntryRes>,
}

/// Acknowledgement that no-show notifications were enqueued.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NotifyNoShowRes {
    pub ok: bool,
    /// Number of messages handed to the delivery queue.
    pub queued: u32,
}
