//! Dashboard ranking.
//!
//! Turns joined (referral, patient) pairs into the ordered presentation list
//! shown on the triage dashboard. The display risk is the patient's stored
//! score unless the referral is in a missed-appointment state, in which case
//! it is overridden to a sentinel that forces the entry to the top.
//!
//! Referrals whose patient record cannot be found never reach this module:
//! the store gateway joins with inner-join semantics and drops them.

use crate::model::{DashboardEntry, Patient, Referral};
use crate::status::ReferralStatus;

/// Display risk assigned to missed/no-show referrals, above any baseline.
pub const MISSED_APPOINTMENT_RISK: i64 = 100;

/// Compute the display risk for one referral.
pub fn effective_risk(status: ReferralStatus, patient_risk: i64) -> i64 {
    if status.is_missed_appointment() {
        MISSED_APPOINTMENT_RISK
    } else {
        patient_risk
    }
}

/// Rank joined referral/patient pairs for presentation.
///
/// Entries are sorted descending by effective risk. No secondary key is
/// defined; the sort is stable, so ties keep their input order and the
/// priority field is carried through but not consulted.
pub fn rank(rows: Vec<(Referral, Patient)>) -> Vec<DashboardEntry> {
    let mut entries: Vec<DashboardEntry> = rows
        .into_iter()
        .map(|(referral, patient)| {
            let effective_risk = effective_risk(referral.status, patient.risk_score);
            DashboardEntry {
                referral_id: referral.id,
                patient_id: referral.patient_id,
                patient_name: patient.full_name,
                specialty: referral.specialty,
                status: referral.status,
                priority: referral.priority,
                is_urgent: referral.is_urgent,
                requires_transport: referral.requires_transport,
                appointment_date: referral.appointment_date,
                notes: referral.notes,
                effective_risk,
            }
        })
        .collect();

    entries.sort_by(|a, b| b.effective_risk.cmp(&a.effective_risk));
    entries
}
