//! Server-to-client reply shapes.

use serde::{Deserialize, Serialize};

/// Generic command outcome, encoded as `"OK"` or `"ERROR"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// The command was applied.
    Ok,
    /// The command was rejected or failed.
    Error,
}

/// Which authentication command an [`AuthReply`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthKind {
    /// Reply to `LOGIN`.
    LoginResult,
    /// Reply to `SIGNUP`.
    SignupResult,
}

/// Authentication outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    /// Credentials accepted or account created.
    Success,
    /// Rejected; the message explains why.
    Error,
}

/// Three-element `[kind, status, message]` authentication reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthReply(pub AuthKind, pub AuthStatus, pub String);

impl AuthReply {
    /// Successful reply.
    pub fn success(kind: AuthKind, message: impl Into<String>) -> Self {
        Self(kind, AuthStatus::Success, message.into())
    }

    /// Failed reply.
    pub fn error(kind: AuthKind, message: impl Into<String>) -> Self {
        Self(kind, AuthStatus::Error, message.into())
    }

    /// Reply kind.
    #[must_use]
    pub const fn kind(&self) -> AuthKind {
        self.0
    }

    /// Reply status.
    #[must_use]
    pub const fn status(&self) -> AuthStatus {
        self.1
    }

    /// Human readable explanation.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.2
    }
}

/// One entry of the activity log, as returned by `GET_LOGS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Sequential identifier, starting at 1.
    pub log_id: u64,
    /// Actor that caused the entry.
    pub user: String,
    /// Coarse category, e.g. `Device`, `Auth`, `Protocol`.
    pub action_type: String,
    /// Display name of the affected device, or `N/A`.
    pub device_name: String,
    /// Identifier of the affected device, or `N/A`.
    pub device_id: String,
    /// Free-form description.
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// `YYYY-MM-DD HH:MM:SS` in UTC.
    pub date_time: String,
}

/// Exactly one reply is sent for every client frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    /// `"OK"` or `"ERROR"`.
    Status(Status),
    /// `LOGIN` and `SIGNUP` results.
    Auth(AuthReply),
    /// `GET_LOGS` payload.
    Logs(Vec<ActivityRecord>),
}

impl Reply {
    /// The `"OK"` reply.
    pub const OK: Self = Self::Status(Status::Ok);
    /// The `"ERROR"` reply.
    pub const ERROR: Self = Self::Status(Status::Error);

    /// Maps a facade success flag to a status reply.
    #[must_use]
    pub const fn from_success(success: bool) -> Self {
        if success { Self::OK } else { Self::ERROR }
    }
}
