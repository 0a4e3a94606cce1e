//! Missed-appointment notifications.
//!
//! The dispatcher resolves a referral and its patient, composes the outgoing
//! messages, and hands them to a background queue. The caller is acknowledged
//! as soon as the jobs are enqueued; delivery happens on a worker task and a
//! failed send is logged, never surfaced back to the triggering request.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::mailer::{Mailer, OutboundEmail};
use crate::model::{Patient, Referral};
use crate::store::ReferralStore;
use crate::{ReferralError, ReferralResult};

/// A queued notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationJob {
    pub referral_id: String,
    pub email: OutboundEmail,
}

/// Background delivery queue.
///
/// Jobs are consumed in order by a single worker task. Once a job is on the
/// queue there is no cancellation and no retry.
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<NotificationJob>,
    worker: JoinHandle<()>,
}

impl NotificationQueue {
    /// Spawn the worker task and return the queue handle.
    pub fn start(mailer: Arc<dyn Mailer>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<NotificationJob>();
        let worker = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match mailer.send(&job.email).await {
                    Ok(()) => {
                        tracing::info!(
                            referral_id = %job.referral_id,
                            to = %job.email.to,
                            "notification delivered"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            referral_id = %job.referral_id,
                            to = %job.email.to,
                            "notification delivery failed: {e}"
                        );
                    }
                }
            }
        });
        Self { tx, worker }
    }

    /// Enqueue a job. Returns `false` if the worker has already stopped.
    pub fn enqueue(&self, job: NotificationJob) -> bool {
        if self.tx.send(job).is_err() {
            tracing::error!("notification worker is gone, dropping job");
            return false;
        }
        true
    }

    /// Stop accepting jobs and wait for the worker to drain the queue.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}

/// Composes and enqueues missed-appointment notices.
pub struct NotificationDispatcher {
    store: Arc<ReferralStore>,
    queue: NotificationQueue,
    internal_recipient: Option<String>,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<ReferralStore>,
        queue: NotificationQueue,
        internal_recipient: Option<String>,
    ) -> Self {
        Self {
            store,
            queue,
            internal_recipient,
        }
    }

    /// Trigger the no-show notification for a referral.
    ///
    /// Resolves the referral and its patient, composes the patient message
    /// and the internal notice, and enqueues them. Returns the number of
    /// jobs enqueued; the caller learns nothing about eventual delivery.
    ///
    /// # Errors
    /// - [`ReferralError::NotFound`] if the referral or its patient is absent
    /// - [`ReferralError::BadRequest`] if the patient has no email address
    pub fn notify_no_show(&self, referral_id: &str) -> ReferralResult<usize> {
        let referral = self.store.referral(referral_id)?;
        let patient = self.store.patient(&referral.patient_id)?;

        let jobs = build_no_show_jobs(&patient, &referral, self.internal_recipient.as_deref())?;
        let mut enqueued = 0;
        for job in jobs {
            if self.queue.enqueue(job) {
                enqueued += 1;
            }
        }
        Ok(enqueued)
    }

    /// Stop accepting notifications and wait for queued sends to drain.
    pub async fn shutdown(self) {
        self.queue.shutdown().await;
    }
}

/// Build the notification jobs for a missed appointment.
///
/// Always one message to the patient; a second internal notice only when an
/// internal recipient is configured.
///
/// # Errors
/// Returns [`ReferralError::BadRequest`] if the patient has no contactable
/// email address.
pub fn build_no_show_jobs(
    patient: &Patient,
    referral: &Referral,
    internal_recipient: Option<&str>,
) -> ReferralResult<Vec<NotificationJob>> {
    let to = patient
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            ReferralError::BadRequest(format!(
                "patient {} has no email address on record",
                patient.id
            ))
        })?;

    let mut jobs = vec![NotificationJob {
        referral_id: referral.id.clone(),
        email: OutboundEmail {
            to: to.to_string(),
            subject: "Missed appointment".to_string(),
            html: patient_message(patient, referral),
        },
    }];

    if let Some(internal) = internal_recipient {
        jobs.push(NotificationJob {
            referral_id: referral.id.clone(),
            email: OutboundEmail {
                to: internal.to_string(),
                subject: format!(
                    "[TEST] {} - {}",
                    referral.status.label(),
                    patient.full_name
                ),
                html: internal_notice(patient, referral),
            },
        });
    }

    Ok(jobs)
}

/// Message sent to the patient: the referral's free-text notes if present,
/// otherwise a default missed-appointment message.
fn patient_message(patient: &Patient, referral: &Referral) -> String {
    match referral.notes.as_deref().map(str::trim) {
        Some(notes) if !notes.is_empty() => format!("<p>{notes}</p>"),
        _ => format!(
            "<p>Hello {}, it looks like you missed your appointment. \
             Please contact the clinic to reschedule.</p>",
            patient.full_name
        ),
    }
}

/// Internal notice summarising the event for the configured test recipient.
fn internal_notice(patient: &Patient, referral: &Referral) -> String {
    format!(
        "<h2>Status update detected</h2>\
         <p>The following referral has been marked as <strong>{status}</strong>.</p>\
         <ul>\
         <li><strong>Patient:</strong> {patient}</li>\
         <li><strong>Referral ID:</strong> {id}</li>\
         </ul>\
         <p><strong>Specialty:</strong> {specialty}</p>",
        status = referral.status.label(),
        patient = patient.full_name,
        id = referral.id,
        specialty = referral.specialty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ReferralStatus;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Mailer double that records every message it is asked to send.
    pub(crate) struct RecordingMailer {
        pub sent: Mutex<Vec<OutboundEmail>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub(crate) fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutboundEmail) -> ReferralResult<()> {
            if self.fail {
                return Err(ReferralError::DeliveryRejected { status: 500 });
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn patient(email: Option<&str>) -> Patient {
        Patient {
            id: "p1".into(),
            full_name: "Maria Garcia".into(),
            risk_score: 60,
            phone: None,
            email: email.map(Into::into),
            address: None,
            medical_history: vec!["Cardiac History".into()],
            created_at: Utc::now(),
        }
    }

    fn referral(status: ReferralStatus, notes: Option<&str>) -> Referral {
        let now = Utc::now();
        Referral {
            id: "r1".into(),
            patient_id: "p1".into(),
            specialty: "Cardiology".into(),
            status,
            priority: "High".into(),
            is_urgent: true,
            requires_transport: false,
            appointment_date: None,
            notes: notes.map(Into::into),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn patient_message_uses_notes_when_present() {
        let jobs = build_no_show_jobs(
            &patient(Some("maria@example.com")),
            &referral(ReferralStatus::NoShow, Some("Please call us")),
            None,
        )
        .unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].email.to, "maria@example.com");
        assert!(jobs[0].email.html.contains("Please call us"));
    }

    #[test]
    fn patient_message_falls_back_to_default() {
        let jobs = build_no_show_jobs(
            &patient(Some("maria@example.com")),
            &referral(ReferralStatus::Missed, None),
            None,
        )
        .unwrap();

        assert!(jobs[0].email.html.contains("missed your appointment"));
        assert!(jobs[0].email.html.contains("Maria Garcia"));
    }

    #[test]
    fn internal_notice_carries_referral_id_and_specialty() {
        let jobs = build_no_show_jobs(
            &patient(Some("maria@example.com")),
            &referral(ReferralStatus::NoShow, Some("Please call us")),
            Some("ops@example.org"),
        )
        .unwrap();

        assert_eq!(jobs.len(), 2);
        let internal = &jobs[1].email;
        assert_eq!(internal.to, "ops@example.org");
        assert!(internal.subject.contains("NO SHOW"));
        assert!(internal.html.contains("r1"));
        assert!(internal.html.contains("Cardiology"));
        assert!(internal.html.contains("Maria Garcia"));
    }

    #[test]
    fn internal_notice_skipped_without_recipient() {
        let jobs = build_no_show_jobs(
            &patient(Some("maria@example.com")),
            &referral(ReferralStatus::NoShow, None),
            None,
        )
        .unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn missing_patient_email_is_a_bad_request() {
        let err = build_no_show_jobs(
            &patient(None),
            &referral(ReferralStatus::NoShow, None),
            Some("ops@example.org"),
        )
        .unwrap_err();
        assert!(matches!(err, ReferralError::BadRequest(_)));

        let err = build_no_show_jobs(
            &patient(Some("   ")),
            &referral(ReferralStatus::NoShow, None),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ReferralError::BadRequest(_)));
    }

    #[tokio::test]
    async fn queue_delivers_enqueued_jobs() {
        let mailer = Arc::new(RecordingMailer::new());
        let queue = NotificationQueue::start(mailer.clone());

        let job = NotificationJob {
            referral_id: "r1".into(),
            email: OutboundEmail {
                to: "maria@example.com".into(),
                subject: "Missed appointment".into(),
                html: "<p>Please call us</p>".into(),
            },
        };
        assert!(queue.enqueue(job.clone()));
        queue.shutdown().await;

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.as_slice(), &[job.email]);
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed_by_the_worker() {
        let mailer = Arc::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
            fail: true,
        });
        let queue = NotificationQueue::start(mailer.clone());

        assert!(queue.enqueue(NotificationJob {
            referral_id: "r1".into(),
            email: OutboundEmail {
                to: "maria@example.com".into(),
                subject: "Missed appointment".into(),
                html: "<p>x</p>".into(),
            },
        }));
        // Worker keeps running and shuts down cleanly despite the failure.
        queue.shutdown().await;
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dispatcher_resolves_and_enqueues_both_messages() {
        let store = Arc::new(ReferralStore::open_in_memory().unwrap());
        let created = store
            .create_patient(
                crate::model::NewPatient {
                    full_name: "Maria Garcia".into(),
                    phone: None,
                    email: Some("maria@example.com".into()),
                    address: None,
                    medical_history: vec![],
                },
                10,
            )
            .unwrap();
        let referral = store
            .create_referral(crate::model::NewReferral {
                patient_id: created.id.clone(),
                specialty: "Cardiology".into(),
                priority: "High".into(),
                requires_transport: false,
                appointment_date: None,
                notes: Some("Please call us".into()),
            })
            .unwrap();
        store
            .update_referral_status(&referral.id, ReferralStatus::NoShow)
            .unwrap();

        let mailer = Arc::new(RecordingMailer::new());
        let queue = NotificationQueue::start(mailer.clone());
        let dispatcher =
            NotificationDispatcher::new(store, queue, Some("ops@example.org".into()));

        let enqueued = dispatcher.notify_no_show(&referral.id).unwrap();
        assert_eq!(enqueued, 2);

        dispatcher.shutdown().await;
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].html.contains("Please call us"));
        assert!(sent[1].html.contains(&referral.id));
    }

    #[tokio::test]
    async fn dispatcher_surfaces_not_found() {
        let store = Arc::new(ReferralStore::open_in_memory().unwrap());
        let queue = NotificationQueue::start(Arc::new(RecordingMailer::new()));
        let dispatcher = NotificationDispatcher::new(store, queue, None);

        let err = dispatcher.notify_no_show("missing").unwrap_err();
        assert!(matches!(err, ReferralError::NotFound { entity: "referral", .. }));
    }
}
