use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use crate::{auth::error::AuthError, db::error::DatabaseError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Database error")]
    Database(DatabaseError),

    #[error("Auth error")]
    Auth(AuthError),

    #[error("Validation error")]
    Validation(ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store or session resolver is not configured")]
    NotConfigured,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Other error: {0}")]
    Other(anyhow::Error),
}

impl From<DatabaseError> for Error {
    fn from(value: DatabaseError) -> Self {
        Self::Database(value)
    }
}

impl From<AuthError> for Error {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

/// Closed set of failure kinds every provider reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotConfigured,
    NotFound,
    AuthRequired,
    Forbidden,
    Conflict,
    Network,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotConfigured => "not_configured",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AuthRequired => "auth_required",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Network => "network",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Generic message safe to show to a user. Never carries store text.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "The request was incomplete or malformed.",
            ErrorKind::NotConfigured => "The service is not available right now.",
            ErrorKind::NotFound => "The item could not be found.",
            ErrorKind::AuthRequired => "Please sign in to continue.",
            ErrorKind::Forbidden => "You are not allowed to do that.",
            ErrorKind::Conflict => "This was changed elsewhere. Please reload and try again.",
            ErrorKind::Network => "Could not reach the server. Check your connection.",
            ErrorKind::Unknown => "Something went wrong.",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type ProviderResult<T> = Result<T, ErrorKind>;

/// Heterogeneous failure as reported by a store backend or transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFailure {
    pub status: Option<u16>,
    pub code: Option<String>,
    pub message: String,
}

impl RawFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl std::fmt::Display for RawFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.status, &self.code) {
            (Some(status), Some(code)) => write!(f, "[{status}/{code}] {}", self.message),
            (Some(status), None) => write!(f, "[{status}] {}", self.message),
            (None, Some(code)) => write!(f, "[{code}] {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

impl From<&sqlx::Error> for RawFailure {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(database_error) => RawFailure {
                status: None,
                code: database_error.code().map(|code| code.into_owned()),
                message: database_error.message().to_string(),
            },
            sqlx::Error::RowNotFound => RawFailure::new(error.to_string()).with_status(404),
            other => RawFailure::new(other.to_string()),
        }
    }
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const INSUFFICIENT_PRIVILEGE: &str = "42501";
const AUTH_CODES: &[&str] = &["PGRST301", "PGRST302", "28000", "28P01"];

const CONFLICT_MARKERS: &[&str] = &["duplicate key", "unique constraint", "already exists"];
const AUTH_MARKERS: &[&str] = &[
    "jwt",
    "not authenticated",
    "auth session missing",
    "invalid token",
    "unauthorized",
];
const FORBIDDEN_MARKERS: &[&str] = &["permission denied", "row-level security"];
const NETWORK_MARKERS: &[&str] = &[
    "failed to fetch",
    "network",
    "connection refused",
    "connection reset",
    "communicating with database",
    "timed out",
    "timeout",
];

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| haystack.contains(marker))
}

/// Maps a raw failure onto the closed taxonomy.
///
/// Precedence is conflict, then authentication, then permission, then
/// network. Anything left over is `Unknown`.
pub fn classify(failure: &RawFailure) -> ErrorKind {
    let message = failure.message.to_lowercase();
    let code = failure.code.as_deref().unwrap_or_default();

    if failure.status == Some(409)
        || code == UNIQUE_VIOLATION
        || contains_any(&message, CONFLICT_MARKERS)
    {
        return ErrorKind::Conflict;
    }

    if failure.status == Some(401) || AUTH_CODES.contains(&code) || contains_any(&message, AUTH_MARKERS)
    {
        return ErrorKind::AuthRequired;
    }

    if failure.status == Some(403)
        || code == INSUFFICIENT_PRIVILEGE
        || contains_any(&message, FORBIDDEN_MARKERS)
    {
        return ErrorKind::Forbidden;
    }

    if contains_any(&message, NETWORK_MARKERS) {
        return ErrorKind::Network;
    }

    ErrorKind::Unknown
}

/// A write that points at a row deleted in the meantime reads as missing.
fn classify_store_failure(failure: &RawFailure) -> ErrorKind {
    match failure.code.as_deref() {
        Some(FOREIGN_KEY_VIOLATION) => ErrorKind::NotFound,
        _ => classify(failure),
    }
}

impl From<&Error> for ErrorKind {
    fn from(error: &Error) -> Self {
        match error {
            Error::Database(DatabaseError::NotFound) => ErrorKind::NotFound,
            Error::Database(DatabaseError::DatabaseError(sqlx::Error::RowNotFound)) => {
                ErrorKind::NotFound
            }
            Error::Database(DatabaseError::DatabaseError(error)) => {
                classify_store_failure(&RawFailure::from(error))
            }
            Error::Database(DatabaseError::Rejected(failure)) => classify_store_failure(failure),
            Error::Auth(_) => ErrorKind::AuthRequired,
            Error::Validation(_) | Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::NotConfigured => ErrorKind::NotConfigured,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::Other(error) => classify(&RawFailure::new(format!("{error:#}"))),
        }
    }
}

impl From<Error> for ErrorKind {
    fn from(error: Error) -> Self {
        let kind = ErrorKind::from(&error);

        match kind {
            ErrorKind::Unknown | ErrorKind::Network | ErrorKind::NotConfigured => {
                tracing::error!(err.kind = %kind, err.msg = %error, err.details = ?error, "Provider error");
            }
            _ => {
                tracing::warn!(err.kind = %kind, err.msg = %error, "Provider error");
            }
        }

        kind
    }
}

/// Wire shape handed to the view layer: `{ok: true, data}` or `{ok: false, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl<T> From<ProviderResult<T>> for Outcome<T> {
    fn from(result: ProviderResult<T>) -> Self {
        match result {
            Ok(data) => Outcome {
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(kind) => Outcome {
                ok: false,
                data: None,
                error: Some(kind),
            },
        }
    }
}
