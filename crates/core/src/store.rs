//! Data store gateway.
//!
//! Single access path for the `patients` and `referrals` tables. Every read
//! and write in the process goes through [`ReferralStore`]; nothing else
//! holds a connection, so there is exactly one view of each entity.
//!
//! Identifiers are store-generated UUIDs in simple (32 hex) form.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::model::{NewPatient, NewReferral, Patient, Referral};
use crate::status::{self, ReferralStatus};
use crate::{db, ReferralError, ReferralResult};

/// Gateway over the relational store.
///
/// The connection is mutex-guarded; each operation is a bounded, single-shot
/// call that holds the lock for its own duration only.
pub struct ReferralStore {
    conn: Mutex<Connection>,
}

impl ReferralStore {
    /// Open (and migrate) the database at `path`.
    pub fn open(path: &Path) -> ReferralResult<Self> {
        Ok(Self::from_connection(db::open_database(path)?))
    }

    /// Open an in-memory store, mainly for tests.
    pub fn open_in_memory() -> ReferralResult<Self> {
        Ok(Self::from_connection(db::open_memory_database()?))
    }

    /// Wrap an already-opened (and migrated) connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock still holds a usable connection.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a new patient with the given (already computed) risk score.
    ///
    /// The identifier and creation timestamp are generated here.
    pub fn create_patient(&self, new: NewPatient, risk_score: i64) -> ReferralResult<Patient> {
        let patient = Patient {
            id: Uuid::new_v4().simple().to_string(),
            full_name: new.full_name,
            risk_score,
            phone: new.phone,
            email: new.email,
            address: new.address,
            medical_history: new.medical_history,
            created_at: Utc::now(),
        };

        let history = serde_json::to_string(&patient.medical_history)
            .map_err(ReferralError::HistorySerialization)?;

        self.conn().execute(
            "INSERT INTO patients (id, full_name, risk_score, phone, email, address,
                                   medical_history, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                patient.id,
                patient.full_name,
                patient.risk_score,
                patient.phone,
                patient.email,
                patient.address,
                history,
                patient.created_at,
            ],
        )?;

        Ok(patient)
    }

    /// Fetch a patient by identifier.
    pub fn patient(&self, id: &str) -> ReferralResult<Patient> {
        self.conn()
            .query_row(
                "SELECT id, full_name, risk_score, phone, email, address,
                        medical_history, created_at
                 FROM patients WHERE id = ?1",
                params![id],
                map_patient_row,
            )
            .optional()?
            .ok_or_else(|| ReferralError::patient_not_found(id))
    }

    /// List all patients, most recently registered first.
    pub fn list_patients(&self) -> ReferralResult<Vec<Patient>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, full_name, risk_score, phone, email, address,
                    medical_history, created_at
             FROM patients ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], map_patient_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?);
        }
        Ok(patients)
    }

    /// Insert a new referral for an existing patient.
    ///
    /// # Errors
    /// Returns [`ReferralError::NotFound`] if the patient does not exist.
    pub fn create_referral(&self, new: NewReferral) -> ReferralResult<Referral> {
        let conn = self.conn();

        let patient_exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM patients WHERE id = ?1",
                params![new.patient_id],
                |row| row.get(0),
            )
            .optional()?;
        if patient_exists.is_none() {
            return Err(ReferralError::patient_not_found(&new.patient_id));
        }

        let now = Utc::now();
        let referral = Referral {
            id: Uuid::new_v4().simple().to_string(),
            patient_id: new.patient_id,
            specialty: new.specialty,
            status: ReferralStatus::Created,
            priority: new.priority,
            is_urgent: false,
            requires_transport: new.requires_transport,
            appointment_date: new.appointment_date,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO referrals (id, patient_id, specialty, status, priority,
                                    is_urgent, requires_transport, appointment_date,
                                    notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                referral.id,
                referral.patient_id,
                referral.specialty,
                referral.status.as_wire(),
                referral.priority,
                referral.is_urgent,
                referral.requires_transport,
                referral.appointment_date,
                referral.notes,
                referral.created_at,
                referral.updated_at,
            ],
        )?;

        Ok(referral)
    }

    /// Fetch a referral by identifier.
    pub fn referral(&self, id: &str) -> ReferralResult<Referral> {
        self.conn()
            .query_row(
                &format!("SELECT {REFERRAL_COLUMNS} FROM referrals WHERE id = ?1"),
                params![id],
                map_referral_row,
            )
            .optional()?
            .ok_or_else(|| ReferralError::referral_not_found(id))
    }

    /// List all referrals, most recently created first.
    pub fn list_referrals(&self) -> ReferralResult<Vec<Referral>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REFERRAL_COLUMNS} FROM referrals ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map([], map_referral_row)?;

        let mut referrals = Vec::new();
        for row in rows {
            referrals.push(row?);
        }
        Ok(referrals)
    }

    /// Fetch all referrals joined with their patients.
    ///
    /// Inner-join semantics: a referral whose patient row is missing is
    /// silently dropped from the result.
    pub fn joined_referrals(&self) -> ReferralResult<Vec<(Referral, Patient)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT r.id, r.patient_id, r.specialty, r.status, r.priority,
                    r.is_urgent, r.requires_transport, r.appointment_date,
                    r.notes, r.created_at, r.updated_at,
                    p.id, p.full_name, p.risk_score, p.phone, p.email, p.address,
                    p.medical_history, p.created_at
             FROM referrals r
             JOIN patients p ON r.patient_id = p.id
             ORDER BY r.created_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let referral = map_referral_row(row)?;
            let patient = Patient {
                id: row.get(11)?,
                full_name: row.get(12)?,
                risk_score: row.get(13)?,
                phone: row.get(14)?,
                email: row.get(15)?,
                address: row.get(16)?,
                medical_history: parse_history(row, 17)?,
                created_at: row.get(18)?,
            };
            Ok((referral, patient))
        })?;

        let mut joined = Vec::new();
        for row in rows {
            joined.push(row?);
        }
        Ok(joined)
    }

    /// Apply a status transition to a referral.
    ///
    /// Sets the status unconditionally and derives the urgency flag through
    /// the transition rule (a move into NO_SHOW/MISSED forces it on). No
    /// other fields besides `updated_at` are touched.
    ///
    /// # Errors
    /// Returns [`ReferralError::NotFound`] if the referral does not exist.
    pub fn update_referral_status(
        &self,
        id: &str,
        new_status: ReferralStatus,
    ) -> ReferralResult<Referral> {
        let conn = self.conn();

        let current_urgency: Option<bool> = conn
            .query_row(
                "SELECT is_urgent FROM referrals WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current_urgency) = current_urgency else {
            return Err(ReferralError::referral_not_found(id));
        };

        let is_urgent = status::apply_transition(current_urgency, new_status);
        conn.execute(
            "UPDATE referrals SET status = ?1, is_urgent = ?2, updated_at = ?3 WHERE id = ?4",
            params![new_status.as_wire(), is_urgent, Utc::now(), id],
        )?;

        conn.query_row(
            &format!("SELECT {REFERRAL_COLUMNS} FROM referrals WHERE id = ?1"),
            params![id],
            map_referral_row,
        )
        .map_err(ReferralError::from)
    }
}

const REFERRAL_COLUMNS: &str = "id, patient_id, specialty, status, priority, is_urgent, \
     requires_transport, appointment_date, notes, created_at, updated_at";

fn map_patient_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        full_name: row.get(1)?,
        risk_score: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        address: row.get(5)?,
        medical_history: parse_history(row, 6)?,
        created_at: row.get(7)?,
    })
}

fn map_referral_row(row: &Row<'_>) -> rusqlite::Result<Referral> {
    let status: String = row.get(3)?;
    let status = ReferralStatus::from_wire(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unknown referral status: {status}").into(),
        )
    })?;

    let appointment_date: Option<DateTime<Utc>> = row.get(7)?;
    Ok(Referral {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        specialty: row.get(2)?,
        status,
        priority: row.get(4)?,
        is_urgent: row.get(5)?,
        requires_transport: row.get(6)?,
        appointment_date,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn parse_history(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk;

    fn store() -> ReferralStore {
        ReferralStore::open_in_memory().expect("in-memory store")
    }

    fn new_patient(name: &str, email: Option<&str>, history: &[&str]) -> NewPatient {
        NewPatient {
            full_name: name.into(),
            phone: Some("555-0101".into()),
            email: email.map(Into::into),
            address: None,
            medical_history: history.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn new_referral(patient_id: &str) -> NewReferral {
        NewReferral {
            patient_id: patient_id.into(),
            specialty: "Cardiology".into(),
            priority: "High".into(),
            requires_transport: false,
            appointment_date: None,
            notes: Some("Chest pain evaluation".into()),
        }
    }

    #[test]
    fn patient_round_trips_including_optionals() {
        let store = store();
        let created = store
            .create_patient(
                new_patient("Maria Garcia", Some("maria@example.com"), &["Cardiac History"]),
                60,
            )
            .unwrap();
        assert_eq!(created.risk_score, 60);

        let fetched = store.patient(&created.id).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.medical_history, vec!["Cardiac History"]);
    }

    #[test]
    fn unknown_patient_is_not_found() {
        let err = store().patient("missing").unwrap_err();
        assert!(matches!(err, ReferralError::NotFound { entity: "patient", .. }));
    }

    #[test]
    fn lists_registered_patients() {
        let store = store();
        store.create_patient(new_patient("A", None, &[]), 10).unwrap();
        store.create_patient(new_patient("B", None, &[]), 10).unwrap();
        assert_eq!(store.list_patients().unwrap().len(), 2);
    }

    #[test]
    fn referral_starts_created_and_not_urgent() {
        let store = store();
        let patient = store.create_patient(new_patient("A", None, &[]), 10).unwrap();
        let referral = store.create_referral(new_referral(&patient.id)).unwrap();

        assert_eq!(referral.status, ReferralStatus::Created);
        assert!(!referral.is_urgent);
        assert_eq!(store.referral(&referral.id).unwrap(), referral);
    }

    #[test]
    fn referral_for_unknown_patient_is_rejected() {
        let err = store().create_referral(new_referral("missing")).unwrap_err();
        assert!(matches!(err, ReferralError::NotFound { entity: "patient", .. }));
    }

    #[test]
    fn status_update_to_no_show_forces_urgency() {
        let store = store();
        let patient = store.create_patient(new_patient("A", None, &[]), 10).unwrap();
        let referral = store.create_referral(new_referral(&patient.id)).unwrap();

        let updated = store
            .update_referral_status(&referral.id, ReferralStatus::NoShow)
            .unwrap();
        assert_eq!(updated.status, ReferralStatus::NoShow);
        assert!(updated.is_urgent);
    }

    #[test]
    fn urgency_survives_later_transitions() {
        let store = store();
        let patient = store.create_patient(new_patient("A", None, &[]), 10).unwrap();
        let referral = store.create_referral(new_referral(&patient.id)).unwrap();

        store
            .update_referral_status(&referral.id, ReferralStatus::Missed)
            .unwrap();
        let rescheduled = store
            .update_referral_status(&referral.id, ReferralStatus::Scheduled)
            .unwrap();
        assert_eq!(rescheduled.status, ReferralStatus::Scheduled);
        assert!(rescheduled.is_urgent);
    }

    #[test]
    fn non_missed_transition_leaves_urgency_off() {
        let store = store();
        let patient = store.create_patient(new_patient("A", None, &[]), 10).unwrap();
        let referral = store.create_referral(new_referral(&patient.id)).unwrap();

        let booked = store
            .update_referral_status(&referral.id, ReferralStatus::Booked)
            .unwrap();
        assert!(!booked.is_urgent);
    }

    #[test]
    fn status_update_for_unknown_referral_is_not_found() {
        let err = store()
            .update_referral_status("missing", ReferralStatus::NoShow)
            .unwrap_err();
        assert!(matches!(err, ReferralError::NotFound { entity: "referral", .. }));
    }

    #[test]
    fn join_pairs_referrals_with_their_patients() {
        let store = store();
        let score = risk::score_medical_history(["Cardiac History"]);
        let patient = store
            .create_patient(new_patient("Maria Garcia", None, &["Cardiac History"]), score)
            .unwrap();
        let referral = store.create_referral(new_referral(&patient.id)).unwrap();

        let joined = store.joined_referrals().unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].0.id, referral.id);
        assert_eq!(joined[0].1.id, patient.id);
        assert_eq!(joined[0].1.risk_score, 60);
    }

    #[test]
    fn join_drops_referrals_without_patients() {
        let conn = crate::db::open_memory_database().unwrap();
        // Simulate a dangling foreign key, as could arrive via replication
        // or an out-of-band import.
        conn.execute_batch("PRAGMA foreign_keys=OFF;").unwrap();
        conn.execute(
            "INSERT INTO referrals (id, patient_id, specialty, status, priority,
                                    is_urgent, requires_transport, notes,
                                    created_at, updated_at)
             VALUES ('r1', 'ghost', 'Cardiology', 'CREATED', 'High', 0, 0, NULL,
                     '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let store = ReferralStore::from_connection(conn);
        assert_eq!(store.list_referrals().unwrap().len(), 1);
        assert!(store.joined_referrals().unwrap().is_empty());
    }
}
