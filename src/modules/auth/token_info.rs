//! Human-readable lifetime reports for the `/token-info` endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use tessera_auth::{ClaimSet, CredentialKind, ExpiryPolicy, TokenCodec};
use tessera_config::JwtConfig;

const HOUR: i64 = 60;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Renders a minute count as minutes, hours and minutes, days and hours, or
/// weeks and days.
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.abs();
    let (major, major_unit, minor, minor_unit) = if minutes < HOUR {
        return plural(minutes, "minute");
    } else if minutes < DAY {
        (minutes / HOUR, "hour", minutes % HOUR, "minute")
    } else if minutes < WEEK {
        (minutes / DAY, "day", (minutes % DAY) / HOUR, "hour")
    } else {
        (minutes / WEEK, "week", (minutes % WEEK) / DAY, "day")
    };

    if minor == 0 {
        plural(major, major_unit)
    } else {
        format!("{} and {}", plural(major, major_unit), plural(minor, minor_unit))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TokenReport {
    pub token_type: CredentialKind,
    pub session_id: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub age_minutes: i64,
    pub age: String,
    pub expires_in_minutes: i64,
    /// `EXPIRED` once the credential is past its expiry.
    pub expires_in: String,
    pub lifetime_percentage_used: f64,
    pub is_expired: bool,
}

impl TokenReport {
    pub fn at(claims: &ClaimSet, now: DateTime<Utc>) -> Self {
        let header = claims.header();
        let now_ts = now.timestamp();

        let age_minutes = (now_ts - header.iat) / 60;
        let expires_in_minutes = (header.exp - now_ts) / 60;
        let lifetime_minutes = (header.exp - header.iat) / 60;
        let is_expired = header.exp <= now_ts;

        let lifetime_percentage_used = if lifetime_minutes > 0 {
            (age_minutes as f64 / lifetime_minutes as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        Self {
            token_type: claims.kind(),
            session_id: header.session_id.clone(),
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            age_minutes,
            age: format_duration(age_minutes),
            expires_in_minutes,
            expires_in: if is_expired {
                "EXPIRED".to_string()
            } else {
                format_duration(expires_in_minutes)
            },
            lifetime_percentage_used,
            is_expired,
        }
    }
}

/// Report for a token supplied in the request body.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum TokenReportEntry {
    Decoded(TokenReport),
    Failed { error: String },
}

impl TokenReportEntry {
    fn decoded(&self) -> Option<&TokenReport> {
        match self {
            TokenReportEntry::Decoded(report) => Some(report),
            TokenReportEntry::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TokenLifetime {
    pub expiry_minutes: u64,
    pub expires_in: String,
}

impl TokenLifetime {
    fn new(minutes: u64) -> Self {
        Self {
            expiry_minutes: minutes,
            expires_in: format_duration(minutes as i64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TokenConfiguration {
    pub access_token: TokenLifetime,
    pub session_token: TokenLifetime,
    pub refresh_token: TokenLifetime,
}

impl TokenConfiguration {
    pub fn from_config(config: &JwtConfig) -> Self {
        Self {
            access_token: TokenLifetime::new(config.access_token_expiry_minutes),
            session_token: TokenLifetime::new(config.session_token_expiry_minutes),
            refresh_token: TokenLifetime::new(config.refresh_token_expiry_minutes),
        }
    }

    fn for_kind(&self, kind: CredentialKind) -> &TokenLifetime {
        match kind {
            CredentialKind::Access => &self.access_token,
            CredentialKind::Session => &self.session_token,
            CredentialKind::Refresh => &self.refresh_token,
        }
    }
}

/// How far a refresh would push the current credential's expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ExtensionInfo {
    pub current_expires_in: String,
    pub after_refresh_expires_in: String,
    pub extension_minutes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_by_minutes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TokenInfoResponse {
    pub current: TokenReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<TokenReportEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<TokenReportEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<TokenReportEntry>,
    pub token_configuration: TokenConfiguration,
    pub extension_info: ExtensionInfo,
}

/// Tokens a caller may submit for comparison with the current credential.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuppliedTokens<'a> {
    pub access_token: Option<&'a str>,
    pub session_token: Option<&'a str>,
    pub refresh_token: Option<&'a str>,
}

fn supplied_entry(
    codec: &TokenCodec,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Option<TokenReportEntry> {
    let token = token.map(str::trim).filter(|t| !t.is_empty())?;
    Some(match codec.decode(token, ExpiryPolicy::Enforce) {
        Ok(claims) => TokenReportEntry::Decoded(TokenReport::at(&claims, now)),
        Err(e) => TokenReportEntry::Failed {
            error: e.to_string(),
        },
    })
}

pub fn build_token_info(
    current: &ClaimSet,
    supplied: SuppliedTokens<'_>,
    codec: &TokenCodec,
    config: &JwtConfig,
    now: DateTime<Utc>,
) -> TokenInfoResponse {
    let current = TokenReport::at(current, now);
    let token_configuration = TokenConfiguration::from_config(config);

    let access_token = supplied_entry(codec, supplied.access_token, now);
    let session_token = supplied_entry(codec, supplied.session_token, now);
    let refresh_token = supplied_entry(codec, supplied.refresh_token, now);

    let after_refresh = token_configuration.for_kind(current.token_type);
    let mut extension_info = ExtensionInfo {
        current_expires_in: current.expires_in.clone(),
        after_refresh_expires_in: after_refresh.expires_in.clone(),
        extension_minutes: after_refresh.expiry_minutes,
        extended_by: None,
        extended_by_minutes: None,
    };

    let before = [&access_token, &session_token, &refresh_token]
        .into_iter()
        .flatten()
        .filter_map(TokenReportEntry::decoded)
        .find(|r| r.token_type == current.token_type);
    if let Some(before) = before {
        let extended = current.expires_in_minutes - before.expires_in_minutes;
        if before.expires_in_minutes > 0 && current.expires_in_minutes > 0 && extended > 0 {
            extension_info.extended_by = Some(format_duration(extended));
            extension_info.extended_by_minutes = Some(extended);
        }
    }

    TokenInfoResponse {
        current,
        access_token,
        session_token,
        refresh_token,
        token_configuration,
        extension_info,
    }
}
