//! Email OTP verification and the stored session

use crate::session::Session;
use crate::state::{self, SharedState};
use crate::storage::Storage;
use crate::transport::{IssueTransport, OtpRequest, OtpResponse};
use crate::{Error, Result};
use std::sync::Arc;

/// Length of the emailed verification code
pub const OTP_LENGTH: usize = 6;

/// Trimmed email, or [`Error::InvalidEmail`]
pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if valid {
        Ok(email.to_string())
    } else {
        Err(Error::InvalidEmail(email.to_string()))
    }
}

/// Trimmed code of exactly six digits, or [`Error::InvalidOtp`]
pub fn validate_otp(otp: &str) -> Result<String> {
    let otp = otp.trim();
    if otp.len() == OTP_LENGTH && otp.chars().all(|c| c.is_ascii_digit()) {
        Ok(otp.to_string())
    } else {
        Err(Error::InvalidOtp(otp.to_string()))
    }
}

/// Outcome of a code verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub message: Option<String>,
    /// Present only when the reply carried both a token and a user
    pub session: Option<Session>,
}

impl Verification {
    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }
}

pub struct AuthService {
    transport: Arc<dyn IssueTransport>,
    storage: Arc<Storage>,
    state: SharedState,
}

impl AuthService {
    pub fn new(transport: Arc<dyn IssueTransport>, storage: Arc<Storage>, state: SharedState) -> Self {
        Self {
            transport,
            storage,
            state,
        }
    }

    /// Load the stored session into the application state
    pub fn restore(&self) -> Option<Session> {
        let session = Session::load(&self.storage);
        state::write(&self.state).session = session.clone();
        session
    }

    pub fn session(&self) -> Option<Session> {
        state::read(&self.state).session.clone()
    }

    /// Verify an emailed code; a returned token and user become the session
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<Verification> {
        let request = OtpRequest {
            email: validate_email(email)?,
            otp: Some(validate_otp(otp)?),
        };

        let OtpResponse {
            message,
            token,
            user,
        } = self.transport.verify_otp(&request).await?;

        let session = match (token, user) {
            (Some(token), Some(user)) => {
                let session = Session { token, user };
                session.save(&self.storage)?;
                tracing::info!(user = %session.user.email, "logged in");
                state::write(&self.state).session = Some(session.clone());
                Some(session)
            }
            (Some(_), None) => {
                tracing::warn!("verification returned a token without a user, not logging in");
                None
            }
            _ => None,
        };

        Ok(Verification { message, session })
    }

    pub async fn resend_otp(&self, email: &str) -> Result<OtpResponse> {
        let request = OtpRequest {
            email: validate_email(email)?,
            otp: None,
        };
        self.transport.resend_otp(&request).await
    }

    pub fn logout(&self) -> Result<()> {
        Session::clear(&self.storage)?;
        state::write(&self.state).session = None;
        Ok(())
    }
}
