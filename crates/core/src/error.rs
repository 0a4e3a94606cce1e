#[derive(Debug, thiserror::Error)]
pub enum ReferralError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("missing or invalid configuration: {0}")]
    Config(&'static str),
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("failed to encode medical history: {0}")]
    HistorySerialization(serde_json::Error),
    #[error("email delivery failed: {0}")]
    Delivery(#[from] reqwest::Error),
    #[error("email provider rejected the message with HTTP {status}")]
    DeliveryRejected { status: u16 },
}

impl ReferralError {
    /// Shorthand for a missing-patient error.
    pub fn patient_not_found(id: &str) -> Self {
        ReferralError::NotFound {
            entity: "patient",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing-referral error.
    pub fn referral_not_found(id: &str) -> Self {
        ReferralError::NotFound {
            entity: "referral",
            id: id.to_string(),
        }
    }
}

pub type ReferralResult<T> = std::result::Result<T, ReferralError>;
