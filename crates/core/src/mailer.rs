//! Email delivery.
//!
//! [`Mailer`] is the narrow seam to the transactional-email provider; the
//! production implementation talks to a Resend-style HTTP API. Tests swap in
//! a recording double.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::CoreConfig;
use crate::{ReferralError, ReferralResult};

/// One message ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Email-delivery capability.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a single message. One shot, no retry.
    async fn send(&self, email: &OutboundEmail) -> ReferralResult<()>;
}

/// Mailer backed by the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl ResendMailer {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: cfg.email_api_base().trim_end_matches('/').to_string(),
            api_key: cfg.email_api_key().to_string(),
            from: cfg.email_from().to_string(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> ReferralResult<()> {
        let url = format!("{}/emails", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SendEmailBody {
                from: &self.from,
                to: &email.to,
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReferralError::DeliveryRejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
