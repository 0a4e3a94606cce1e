//! # Clearwater Core
//!
//! Core business logic for the Clearwater referral-tracking backend:
//! - patient registration with frozen-at-creation risk scoring
//! - referral lifecycle with a typed status and urgency escalation
//! - dashboard ranking with missed-appointment risk override
//! - the single data-store gateway over SQLite
//! - background no-show email notifications
//!
//! **No API concerns**: HTTP routing, wire DTOs and OpenAPI documentation
//! belong in `api-rest` and `api-shared`.

pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod mailer;
pub mod model;
pub mod notify;
pub mod risk;
pub mod status;
pub mod store;

pub use config::CoreConfig;
pub use error::{ReferralError, ReferralResult};
pub use mailer::{Mailer, OutboundEmail, ResendMailer};
pub use model::{DashboardEntry, NewPatient, NewReferral, Patient, Referral};
pub use notify::{NotificationDispatcher, NotificationQueue};
pub use status::ReferralStatus;
pub use store::ReferralStore;
