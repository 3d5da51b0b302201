//! Error taxonomy for account operations.
//!
//! Every variant maps to exactly one HTTP status; storage and hashing
//! failures are reported to clients with a generic message only.

use axum::http::StatusCode;

/// Failure reading or writing the user document.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize user document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to replace {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },
    #[error("storage task failed: {0}")]
    Task(String),
}

/// Why a bearer token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token could not be signed: {0}")]
    Signing(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("Username '{0}' already exists")]
    Conflict(String),
    #[error("User not found")]
    UnknownUser,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Missing Authorization header")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken(#[source] TokenError),
    #[error("User not found")]
    NotFound,
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    TokenSigning(String),
}

impl AccountError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) | Self::UnknownUser => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken(_) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Hashing(_) | Self::TokenSigning(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to a client. Internal failures never leak detail.
    pub fn client_message(&self) -> String {
        match self {
            other if other.is_internal() => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<TokenError> for AccountError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => Self::TokenSigning(msg),
            other => Self::InvalidToken(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_http_surface() {
        assert_eq!(
            AccountError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AccountError::Conflict("alice".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AccountError::UnknownUser.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AccountError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AccountError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AccountError::InvalidToken(TokenError::Expired).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AccountError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AccountError::Hashing("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_detail() {
        let err = AccountError::Storage(StorageError::Io {
            path: "/secret/db.json".into(),
            source: std::io::Error::other("disk full"),
        });
        assert!(err.is_internal());
        assert_eq!(err.client_message(), "Internal server error");
        assert!(!err.client_message().contains("/secret"));
    }

    #[test]
    fn signing_failure_is_internal_not_auth() {
        let err: AccountError = TokenError::Signing("bad key".into()).into();
        assert!(err.is_internal());
        assert!(matches!(err, AccountError::TokenSigning(_)));
        assert!(err.to_string().starts_with("token signing failed"));
        let err: AccountError = TokenError::BadSignature.into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
