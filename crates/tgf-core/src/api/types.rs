use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::{iso_timestamp_utc, mentions_expiry};

/// Structured error code the remote service may attach to a failed reply.
pub const CODE_SESSION_EXPIRED: &str = "session_expired";

/// Message shown when a status poll could not complete.
pub const STATUS_UNAVAILABLE_MESSAGE: &str = "Failed to fetch status";

/// Raw reply body shared by every mutating endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "waitTime")]
    pub wait_time: Option<u32>,
    #[serde(default, rename = "requires2FA")]
    pub requires_two_factor: Option<bool>,
    #[serde(default, rename = "requiresCode")]
    pub requires_code: Option<bool>,
    #[serde(default)]
    pub code: Option<String>,
}

/// How a failure came about. Drives branch choices in the wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The remote service answered with `success: false`.
    Remote,
    /// The remote service says the uploaded session is expired.
    SessionExpired,
    /// The call never completed (connect error, timeout, unreadable body).
    Transport,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    pub wait_time_seconds: Option<u32>,
    pub requires_two_factor: bool,
    pub requires_code: bool,
    pub kind: FailureKind,
}

impl Failure {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            wait_time_seconds: None,
            requires_two_factor: false,
            requires_code: false,
            kind: FailureKind::Transport,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        self.kind == FailureKind::SessionExpired
    }
}

/// Uniform result of a mutating remote call. Never an `Err`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiOutcome {
    Success { message: String },
    Failure(Failure),
}

impl ApiOutcome {
    /// Interpret a parsed reply body. `default_message` fills in for a missing
    /// or blank message.
    pub fn from_reply(reply: RemoteReply, default_message: &str) -> Self {
        let message = reply
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_message.to_string());

        if reply.success {
            return ApiOutcome::Success { message };
        }

        let kind = match reply.code.as_deref() {
            Some(CODE_SESSION_EXPIRED) => FailureKind::SessionExpired,
            Some(_) => FailureKind::Remote,
            None if mentions_expiry(&message) => FailureKind::SessionExpired,
            None => FailureKind::Remote,
        };

        ApiOutcome::Failure(Failure {
            message,
            wait_time_seconds: reply.wait_time.filter(|s| *s > 0),
            requires_two_factor: reply.requires_two_factor.unwrap_or(false),
            requires_code: reply.requires_code.unwrap_or(false),
            kind,
        })
    }
}

/// Snapshot of the remote forwarding process. Replaced wholesale on every poll.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_running: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_update: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_connected: bool,
    /// Consecutive failures per destination channel.
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_counts: BTreeMap<String, u64>,
}

/// Missing and `null` both read as the field's default.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

impl RunStatus {
    /// Degraded snapshot used when the status call fails.
    pub fn unavailable() -> Self {
        Self {
            is_running: false,
            last_message: STATUS_UNAVAILABLE_MESSAGE.to_string(),
            last_update: iso_timestamp_utc(),
            is_connected: false,
            error_counts: BTreeMap::new(),
        }
    }

    pub fn last_update_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_update)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}
