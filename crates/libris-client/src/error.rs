//! # Client Error Type
//!
//! Everything a front-end can get back from the [`Library`](crate::Library).
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Error Flow in libris-client                         │
//! │                                                                         │
//! │  Form submit ──► validate_*  ── FormErrors ──────► Validation          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LibraryApi (HttpApi | DemoApi)                                        │
//! │       │                                                                 │
//! │       ├── 401 ─────────────► session cleared ───► Unauthorized          │
//! │       ├── 4xx/5xx {message} ────────────────────► Http { status, msg } │
//! │       ├── connect/timeout ──────────────────────► Network               │
//! │       └── bad JSON ─────────────────────────────► Decode                │
//! │                                                                         │
//! │  Front-end: error.report() → { "code": "NOT_FOUND", "message": ... }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are fatal. Front-ends turn them into a notice, or into a
//! login prompt for [`ClientError::Unauthorized`].

use serde::Serialize;
use thiserror::Error;

use libris_core::FormErrors;

/// Errors surfaced by the client layer.
///
/// `Clone` so a cached failed query can hand the same error to every reader.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The server answered 401, or no one is logged in.
    ///
    /// ## When This Occurs
    /// - Token expired or revoked on the server
    /// - A command was run before `login`
    ///
    /// The session has already been cleared when this is returned.
    #[error("Login required")]
    Unauthorized,

    /// Non-success HTTP status. `message` is the server's `{ "message" }`.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never got a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body was not what the endpoint promises.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// A form failed local validation. No request was sent.
    #[error("{0}")]
    Validation(FormErrors),

    /// A precondition checked before sending failed (e.g. returning a
    /// closed transaction).
    #[error("{0}")]
    Rejected(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted session could not be written or removed.
    #[error("Session error: {0}")]
    Session(String),
}

/// Machine-readable category of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// 401 / no session
    Unauthorized,
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// Local form validation or a 400 from the server
    ValidationError,
    /// Other 4xx
    BadRequest,
    /// 5xx
    ServerError,
    /// Transport failure or undecodable body
    NetworkError,
    /// Config or session file problems
    Internal,
}

/// Serializable `{ code, message }` pair for front-ends.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl ClientError {
    /// Creates an HTTP error with the given status and message.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        ClientError::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a 404 with the server's wording (`"Book not found"`).
    pub fn not_found(message: impl Into<String>) -> Self {
        ClientError::http(404, message)
    }

    /// Creates a 400.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ClientError::http(400, message)
    }

    /// HTTP status, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized => Some(401),
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    /// Whether a failed query is worth another attempt.
    ///
    /// A 401 has already logged the user out and a 4xx will fail the
    /// same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) | ClientError::Decode(_) => true,
            ClientError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Machine-readable category.
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Unauthorized => ErrorCode::Unauthorized,
            ClientError::Http { status, .. } => match status {
                404 => ErrorCode::NotFound,
                409 => ErrorCode::Conflict,
                400 | 422 => ErrorCode::ValidationError,
                s if *s >= 500 => ErrorCode::ServerError,
                _ => ErrorCode::BadRequest,
            },
            ClientError::Network(_) | ClientError::Decode(_) => ErrorCode::NetworkError,
            ClientError::Validation(_) | ClientError::Rejected(_) => ErrorCode::ValidationError,
            ClientError::Config(_) | ClientError::Session(_) => ErrorCode::Internal,
        }
    }

    /// `{ code, message }` for display or JSON output.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
        }
    }

    /// Per-field messages when this is a local validation failure.
    pub fn form_errors(&self) -> Option<&FormErrors> {
        match self {
            ClientError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<FormErrors> for ClientError {
    fn from(errors: FormErrors) -> Self {
        ClientError::Validation(errors)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Session(err.to_string())
    }
}

/// Maps demo backend failures onto the statuses the REST server uses.
///
/// ## Error Mapping
/// ```text
/// DbError::NotFound                     → 404 "{entity} not found"
/// Rule(BookNotFound | MemberNotFound)   → 404 "Book or member not found"
/// Rule(TransactionNotFound)             → 404 "Transaction not found"
/// Rule(other)                           → 400 rule message
/// UniqueViolation                       → 409 "{field} '{value}' already exists"
/// Check / ForeignKey violation          → 400
/// Everything else                       → 500 (logged, generic message)
/// ```
#[cfg(feature = "demo")]
impl From<libris_db::DbError> for ClientError {
    fn from(err: libris_db::DbError) -> Self {
        use libris_core::CoreError;
        use libris_db::DbError;

        match err {
            DbError::NotFound { entity, .. } => {
                ClientError::not_found(format!("{} not found", entity))
            }
            DbError::Rule(CoreError::BookNotFound(_) | CoreError::MemberNotFound(_)) => {
                ClientError::not_found("Book or member not found")
            }
            DbError::Rule(CoreError::TransactionNotFound(_)) => {
                ClientError::not_found("Transaction not found")
            }
            DbError::Rule(rule) => ClientError::bad_request(rule.to_string()),
            DbError::UniqueViolation { field, value } => {
                ClientError::http(409, format!("{} '{}' already exists", field, value))
            }
            DbError::CheckViolation { message } => {
                tracing::warn!("Check constraint rejected write: {}", message);
                ClientError::bad_request("Invalid copy counts")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ClientError::bad_request("Invalid reference")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!("Demo backend database error: {}", other);
                ClientError::http(500, "Database operation failed")
            }
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ClientError::Unauthorized.code(), ErrorCode::Unauthorized);
        assert_eq!(ClientError::not_found("Book not found").code(), ErrorCode::NotFound);
        assert_eq!(ClientError::http(503, "down").code(), ErrorCode::ServerError);
        assert_eq!(
            ClientError::Validation(FormErrors::new()).code(),
            ErrorCode::ValidationError
        );
    }

    #[test]
    fn test_http_error_displays_server_message() {
        let err = ClientError::bad_request("No copies available");
        assert_eq!(err.to_string(), "No copies available");
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_retryable());
        assert!(ClientError::http(502, "Bad gateway").is_retryable());
        assert!(!ClientError::Unauthorized.is_retryable());
    }

    #[test]
    fn test_report_serialization() {
        let json = serde_json::to_string(&ClientError::not_found("Book not found").report()).unwrap();
        assert_eq!(json, r#"{"code":"NOT_FOUND","message":"Book not found"}"#);
    }

    #[cfg(feature = "demo")]
    #[test]
    fn test_db_error_mapping() {
        use libris_core::CoreError;
        use libris_db::DbError;

        let err: ClientError = DbError::not_found("Member", 9).into();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Member not found");

        let err: ClientError = DbError::Rule(CoreError::NoCopiesAvailable(1)).into();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "No copies available");

        let err: ClientError = DbError::Rule(CoreError::MemberNotFound(3)).into();
        assert_eq!(err.to_string(), "Book or member not found");

        let err: ClientError = DbError::duplicate("email", "a@b.co").into();
        assert_eq!(err.code(), ErrorCode::Conflict);

        let err: ClientError = DbError::Internal("disk full".into()).into();
        assert_eq!(err.to_string(), "Database operation failed");
    }
}
