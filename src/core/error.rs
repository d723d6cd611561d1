//! Error taxonomy shared by every service
//!
//! Services return [`ApiError`]; storage, state-machine, filter and token
//! errors are converted into it at the service boundary so callers only ever
//! see one of six outcomes.

use miette::Diagnostic;
use rusqlite::ffi;
use serde::Serialize;
use thiserror::Error;

use crate::core::filter::FilterError;
use crate::core::invite::{InviteAction, InviteError};
use crate::core::token::TokenError;

#[derive(Debug, Error, Diagnostic)]
pub enum ApiError {
    #[error("{0}")]
    #[diagnostic(code(agrilink::bad_request))]
    BadRequest(String),

    #[error("{0}")]
    #[diagnostic(code(agrilink::unauthorized))]
    Unauthorized(String),

    #[error("{0}")]
    #[diagnostic(code(agrilink::forbidden))]
    Forbidden(String),

    #[error("{0}")]
    #[diagnostic(code(agrilink::not_found))]
    NotFound(String),

    #[error("{0}")]
    #[diagnostic(code(agrilink::conflict))]
    Conflict(String),

    #[error("Internal server error: {0}")]
    #[diagnostic(code(agrilink::internal))]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    /// HTTP-equivalent status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Serializable form; the debug rendering is only attached outside production
    pub fn to_body(&self, include_stack: bool) -> ErrorBody {
        ErrorBody {
            code: self.status_code(),
            message: self.to_string(),
            stack: include_stack.then(|| format!("{:?}", self)),
        }
    }
}

/// Wire shape of an error
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => {
                ApiError::NotFound("Record not found".to_string())
            }
            rusqlite::Error::SqliteFailure(ref e, ref msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                match e.extended_code {
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                        ApiError::BadRequest("Referenced record does not exist".to_string())
                    }
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        ApiError::Conflict("Record already exists".to_string())
                    }
                    _ => ApiError::BadRequest(
                        msg.clone()
                            .unwrap_or_else(|| "Constraint violation".to_string()),
                    ),
                }
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<InviteError> for ApiError {
    fn from(err: InviteError) -> Self {
        match err {
            InviteError::InvalidTransition {
                action: InviteAction::Send,
                ..
            } => ApiError::BadRequest("An active invitation already exists".to_string()),
            InviteError::InvalidTransition { .. } => {
                ApiError::NotFound("No pending invitation found".to_string())
            }
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Collects every input violation so they can be reported together
#[derive(Debug, Default)]
pub struct Violations {
    messages: Vec<String>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.messages.push(message.into());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise one BAD_REQUEST
    pub fn finish(self) -> ApiResult<()> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(ApiError::BadRequest(self.messages.join(", ")))
        }
    }
}

/// Loose e-mail shape check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), 400);
        assert_eq!(ApiError::Unauthorized("x".into()).status_code(), 401);
        assert_eq!(ApiError::forbidden("x").status_code(), 403);
        assert_eq!(ApiError::not_found("x").status_code(), 404);
        assert_eq!(ApiError::conflict("x").status_code(), 409);
        assert_eq!(ApiError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err: ApiError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_constraint_violations_are_mapped() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (id INTEGER PRIMARY KEY, parent_id INTEGER NOT NULL REFERENCES parent(id), name TEXT UNIQUE);
             INSERT INTO parent (id) VALUES (1);
             INSERT INTO child (id, parent_id, name) VALUES (1, 1, 'a');",
        )
        .unwrap();

        let fk = conn
            .execute("INSERT INTO child (parent_id, name) VALUES (99, 'b')", [])
            .unwrap_err();
        assert!(matches!(ApiError::from(fk), ApiError::BadRequest(_)));

        let dup = conn
            .execute("INSERT INTO child (parent_id, name) VALUES (1, 'a')", [])
            .unwrap_err();
        assert!(matches!(ApiError::from(dup), ApiError::Conflict(_)));
    }

    #[test]
    fn test_invite_errors_map_by_action() {
        use crate::core::invite::{accept, send, InviteStatus};

        let resend: ApiError = send(InviteStatus::Accepted).unwrap_err().into();
        assert!(matches!(resend, ApiError::BadRequest(_)));

        let stale: ApiError = accept(InviteStatus::Rejected).unwrap_err().into();
        assert!(matches!(stale, ApiError::NotFound(_)));
    }

    #[test]
    fn test_body_hides_stack_in_production() {
        let err = ApiError::not_found("Worker not found");
        let prod = err.to_body(false);
        assert_eq!(prod.code, 404);
        assert_eq!(prod.message, "Worker not found");
        assert!(prod.stack.is_none());

        let dev = err.to_body(true);
        assert!(dev.stack.unwrap().contains("NotFound"));
    }

    #[test]
    fn test_violations_concatenate() {
        let mut v = Violations::new();
        v.check(false, "\"email\" must be a valid email");
        v.check(true, "never shown");
        v.check(false, "\"firstName\" is required");
        let err = v.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"email\" must be a valid email, \"firstName\" is required"
        );
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("pilot@fields.example"));
        assert!(!is_valid_email("pilot.example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
    }
}
