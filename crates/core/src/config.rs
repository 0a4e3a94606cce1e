//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core
//! services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in
//! multi-threaded runtimes and test harnesses.

use crate::{ReferralError, ReferralResult};
use std::path::{Path, PathBuf};

/// Default base URL of the transactional-email provider.
pub const DEFAULT_EMAIL_API_BASE: &str = "https://api.resend.com";

/// Core configuration resolved at startup.
///
/// Constructing a `CoreConfig` validates every required value, so a process
/// that holds one is known to be runnable. Missing values abort startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: PathBuf,
    email_api_base: String,
    email_api_key: String,
    email_from: String,
    internal_recipient: Option<String>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`, validating required values.
    ///
    /// # Errors
    /// Returns [`ReferralError::Config`] if the database path, email API key
    /// or sender address is empty.
    pub fn new(
        database_path: PathBuf,
        email_api_base: String,
        email_api_key: String,
        email_from: String,
        internal_recipient: Option<String>,
    ) -> ReferralResult<Self> {
        if database_path.as_os_str().is_empty() {
            return Err(ReferralError::Config("database path cannot be empty"));
        }
        if email_api_key.trim().is_empty() {
            return Err(ReferralError::Config("email API key cannot be empty"));
        }
        if email_from.trim().is_empty() {
            return Err(ReferralError::Config("email sender address cannot be empty"));
        }

        let internal_recipient = internal_recipient
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            database_path,
            email_api_base,
            email_api_key,
            email_from,
            internal_recipient,
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn email_api_base(&self) -> &str {
        &self.email_api_base
    }

    pub fn email_api_key(&self) -> &str {
        &self.email_api_key
    }

    pub fn email_from(&self) -> &str {
        &self.email_from
    }

    /// Address that receives the internal copy of no-show notices, if any.
    pub fn internal_recipient(&self) -> Option<&str> {
        self.internal_recipient.as_deref()
    }
}

/// Resolve a `CoreConfig` from the process environment.
///
/// # Environment Variables
/// - `CLEARWATER_DB_PATH`: SQLite database file (required)
/// - `RESEND_API_KEY`: transactional-email API credential (required)
/// - `EMAIL_FROM`: verified sender address (required)
/// - `EMAIL_TO_TEST`: internal recipient for copy notices (optional)
/// - `RESEND_API_BASE`: provider base URL override (optional)
///
/// # Errors
/// Returns [`ReferralError::Config`] if any required variable is absent or
/// empty. Callers are expected to treat this as fatal.
pub fn load_from_env() -> ReferralResult<CoreConfig> {
    fn required(name: &'static str) -> ReferralResult<String> {
        std::env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ReferralError::Config(name))
    }

    let database_path = PathBuf::from(required("CLEARWATER_DB_PATH")?);
    let email_api_key = required("RESEND_API_KEY")?;
    let email_from = required("EMAIL_FROM")?;
    let internal_recipient = std::env::var("EMAIL_TO_TEST").ok();
    let email_api_base = std::env::var("RESEND_API_BASE")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_EMAIL_API_BASE.to_string());

    CoreConfig::new(
        database_path,
        email_api_base,
        email_api_key,
        email_from,
        internal_recipient,
    )
}
