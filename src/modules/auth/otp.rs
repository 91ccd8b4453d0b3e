//! One-time passwords for login and contact verification.
//!
//! Codes are keyed by the identifier they were sent to (email or phone), with
//! email addresses lowercased to match account lookup. A code verified for
//! login is consumed; a code verified through the
//! verification endpoint stays usable until it expires.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use tessera_cache::{OtpStore, StoredOtp};
use tessera_core::AuthError;

use crate::metrics::{track_otp_sent, track_store_error};
use crate::modules::users::model::ContactChannel;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OtpChannel {
    Email,
    Sms,
    Whatsapp,
}

impl OtpChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpChannel::Email => "email",
            OtpChannel::Sms => "sms",
            OtpChannel::Whatsapp => "whatsapp",
        }
    }

    pub fn contact_channel(&self) -> ContactChannel {
        match self {
            OtpChannel::Email => ContactChannel::Email,
            OtpChannel::Sms | OtpChannel::Whatsapp => ContactChannel::Phone,
        }
    }

    /// Email for anything that looks like an address, SMS otherwise.
    pub fn for_identifier(identifier: &str) -> Self {
        if identifier.contains('@') {
            OtpChannel::Email
        } else {
            OtpChannel::Sms
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    /// Consumed on success.
    Login,
    /// Left in place on success.
    Verification,
}

/// Delivers a code to its recipient.
#[async_trait]
pub trait OtpSender: Send + Sync + Debug {
    async fn send(&self, channel: OtpChannel, identifier: &str, code: &str) -> anyhow::Result<()>;
}

/// Writes codes to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOtpSender;

#[async_trait]
impl OtpSender for TracingOtpSender {
    async fn send(&self, channel: OtpChannel, identifier: &str, code: &str) -> anyhow::Result<()> {
        info!(channel = channel.as_str(), identifier, code, "OTP issued");
        Ok(())
    }
}

/// Store key for an identifier. Emails compare case-insensitively, phones as typed.
pub fn normalize_identifier(identifier: &str) -> String {
    let identifier = identifier.trim();
    if identifier.contains('@') {
        identifier.to_lowercase()
    } else {
        identifier.to_string()
    }
}

fn codes_match(expected: &str, submitted: &str) -> bool {
    expected.as_bytes().ct_eq(submitted.as_bytes()).into()
}

pub fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Generates, stores and sends a fresh code, replacing any earlier one.
#[instrument(skip(state))]
pub async fn issue_otp(
    state: &AppState,
    identifier: &str,
    channel: OtpChannel,
) -> anyhow::Result<()> {
    let identifier = normalize_identifier(identifier);
    let identifier = identifier.as_str();
    let code = generate_code(state.otp_config.length);
    let record = StoredOtp {
        code: code.clone(),
        issued_at: Utc::now().timestamp(),
    };

    state
        .otp_store
        .store(identifier, &record, state.otp_config.ttl())
        .await
        .inspect_err(|_| track_store_error("otp_write"))?;

    state.otp_sender.send(channel, identifier, &code).await?;
    track_otp_sent(channel.as_str());
    Ok(())
}

/// Checks a submitted code. The master code, when allowed, always passes and
/// never touches the store.
#[instrument(skip(state, code))]
pub async fn verify_otp(
    state: &AppState,
    identifier: &str,
    code: &str,
    purpose: OtpPurpose,
) -> Result<(), AuthError> {
    let identifier = normalize_identifier(identifier);
    let identifier = identifier.as_str();
    let code = code.trim();

    if code.is_empty() {
        return Err(AuthError::CredentialMismatch);
    }

    if state
        .otp_config
        .effective_master_code(state.mode)
        .is_some_and(|master| codes_match(master, code))
    {
        return Ok(());
    }

    let stored = fetch(state.otp_store.as_ref(), identifier).await?;
    match stored {
        Some(stored) if codes_match(&stored.code, code) => {}
        _ => return Err(AuthError::CredentialMismatch),
    }

    if purpose == OtpPurpose::Login {
        if let Err(e) = state.otp_store.discard(identifier).await {
            error!(error = %e, "Failed to discard used OTP");
            track_store_error("otp_write");
            return Err(AuthError::StoreUnavailable);
        }
    }

    Ok(())
}

async fn fetch(store: &dyn OtpStore, identifier: &str) -> Result<Option<StoredOtp>, AuthError> {
    store.fetch(identifier).await.map_err(|e| {
        error!(error = %e, "OTP lookup failed");
        track_store_error("otp_read");
        AuthError::StoreUnavailable
    })
}
