//! End-to-end exercise of the no-show flow: registration, referral,
//! dashboard ranking, status escalation and notification composition.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clearwater_core::mailer::{Mailer, OutboundEmail};
use clearwater_core::notify::{NotificationDispatcher, NotificationQueue};
use clearwater_core::{
    dashboard, risk, NewPatient, NewReferral, ReferralResult, ReferralStatus, ReferralStore,
};

struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> ReferralResult<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[tokio::test]
async fn cardiac_patient_no_show_reaches_top_of_dashboard_and_notifies() {
    let store = Arc::new(ReferralStore::open_in_memory().expect("store"));

    // Registration applies the scoring rule once.
    let history = vec!["Cardiac History".to_string()];
    let score = risk::score_medical_history(&history);
    assert_eq!(score, 60);

    let patient = store
        .create_patient(
            NewPatient {
                full_name: "Maria Garcia".into(),
                phone: Some("555-0101".into()),
                email: Some("maria@example.com".into()),
                address: None,
                medical_history: history,
            },
            score,
        )
        .expect("create patient");

    let referral = store
        .create_referral(NewReferral {
            patient_id: patient.id.clone(),
            specialty: "Cardiology".into(),
            priority: "High".into(),
            requires_transport: false,
            appointment_date: None,
            notes: Some("Please call us".into()),
        })
        .expect("create referral");
    assert_eq!(referral.status, ReferralStatus::Created);
    assert!(!referral.is_urgent);

    // Before the no-show, the dashboard shows the baseline risk.
    let entries = dashboard::rank(store.joined_referrals().expect("join"));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].effective_risk, 60);
    assert_eq!(entries[0].patient_name, "Maria Garcia");

    // The no-show forces urgency and overrides the display risk.
    let updated = store
        .update_referral_status(&referral.id, ReferralStatus::NoShow)
        .expect("update status");
    assert!(updated.is_urgent);

    let entries = dashboard::rank(store.joined_referrals().expect("join"));
    assert_eq!(entries[0].effective_risk, 100);

    // Triggering the notification enqueues the patient message and the
    // internal notice.
    let mailer = Arc::new(RecordingMailer {
        sent: Mutex::new(Vec::new()),
    });
    let queue = NotificationQueue::start(mailer.clone());
    let dispatcher = NotificationDispatcher::new(
        store.clone(),
        queue,
        Some("ops@example.org".to_string()),
    );

    let enqueued = dispatcher.notify_no_show(&referral.id).expect("notify");
    assert_eq!(enqueued, 2);
    dispatcher.shutdown().await;

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "maria@example.com");
    assert!(sent[0].html.contains("Please call us"));
    assert_eq!(sent[1].to, "ops@example.org");
    assert!(sent[1].html.contains(&referral.id));
    assert!(sent[1].html.contains("Cardiology"));
}
