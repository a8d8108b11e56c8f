//! Uniform result of a weather fetch

use std::fmt;

use serde::Serialize;

/// Why a fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// HTTP 400; the provider could not make sense of the location
    BadRequest,
    ConnectionFailure,
    Timeout,
    /// Any other transport failure, including non-400 error statuses
    OtherRequestError,
    /// Anything that went wrong after the response arrived
    UnexpectedError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::BadRequest => "bad request",
            FailureKind::ConnectionFailure => "connection failure",
            FailureKind::Timeout => "timeout",
            FailureKind::OtherRequestError => "request error",
            FailureKind::UnexpectedError => "unexpected error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details of a failed fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
    /// HTTP status when a response was received
    pub status: Option<u16>,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Weather lookup failed ({}): {}", self.kind, self.message)
    }
}

/// Result of one fetch: the provider's JSON document, or a failure that
/// has already been logged
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(serde_json::Value),
    Failure(FetchFailure),
}

/// Inspection helpers for library callers that hold an outcome directly;
/// the tool path only needs [`FetchOutcome::into_tool_result`].
impl FetchOutcome {
    pub fn failure(kind: FailureKind, message: impl Into<String>, status: Option<u16>) -> Self {
        FetchOutcome::Failure(FetchFailure {
            kind,
            message: message.into(),
            status,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            FetchOutcome::Success(payload) => Some(payload),
            FetchOutcome::Failure(_) => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Failure(failure) => Some(failure.kind),
        }
    }

    /// Shape expected by tool callables: the payload, or the failure rendered
    /// as a user-facing message
    pub fn into_tool_result(self) -> Result<serde_json::Value, String> {
        match self {
            FetchOutcome::Success(payload) => Ok(payload),
            FetchOutcome::Failure(failure) => Err(failure.to_string()),
        }
    }
}
