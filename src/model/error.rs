//! Structured error types for uploads, document storage, identity and pet operations

use thiserror::Error;

/// Errors surfaced by a single-file upload primitive
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    /// The storage service refused the credentials or the preset
    #[error("Access denied: {0}")]
    AccessDenied(String),
    /// The file was rejected (size, format, quota)
    #[error("Upload rejected: {0}")]
    Rejected(String),
    /// Network or connectivity error
    #[error("Network error: {0}")]
    Network(String),
    /// The local file could not be read
    #[error("IO error: {0}")]
    Io(String),
    /// Generic upload error
    #[error("{0}")]
    Other(String),
}

impl UploadError {
    /// Create an UploadError from an error message, attempting to categorize it
    pub fn from_message(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let msg_lower = msg.to_lowercase();

        if msg_lower.contains("access denied")
            || msg_lower.contains("accessdenied")
            || msg_lower.contains("unauthorized")
            || msg_lower.contains("invalid signature")
            || msg_lower.contains("forbidden")
        {
            UploadError::AccessDenied(msg)
        } else if msg_lower.contains("too large")
            || msg_lower.contains("entitytoolarge")
            || msg_lower.contains("quota")
            || msg_lower.contains("invalid image")
            || msg_lower.contains("unsupported")
        {
            UploadError::Rejected(msg)
        } else if msg_lower.contains("network")
            || msg_lower.contains("connection")
            || msg_lower.contains("timeout")
            || msg_lower.contains("dispatch failure")
        {
            UploadError::Network(msg)
        } else {
            UploadError::Other(msg)
        }
    }
}

impl From<std::io::Error> for UploadError {
    fn from(e: std::io::Error) -> Self {
        UploadError::Io(e.to_string())
    }
}

/// Errors raised by a document store backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Store error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// Errors reported by the identity provider
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error("An account with this email already exists")]
    EmailExists,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Weak password: {0}")]
    WeakPassword(String),
    #[error("No account found for this email")]
    UserNotFound,
    #[error("No user is currently signed in")]
    NotSignedIn,
    #[error("Network error: {0}")]
    Network(String),
    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// Map an identity provider error code (e.g. `EMAIL_EXISTS`) to an AuthError
    pub fn from_code(code: &str) -> Self {
        let (head, detail) = match code.split_once(':') {
            Some((head, detail)) => (head.trim(), detail.trim()),
            None => (code.trim(), ""),
        };
        match head {
            "EMAIL_EXISTS" => AuthError::EmailExists,
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
                AuthError::InvalidCredentials
            }
            "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" | "USER_DISABLED" => AuthError::UserNotFound,
            "WEAK_PASSWORD" => AuthError::WeakPassword(detail.to_string()),
            "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
                AuthError::NotSignedIn
            }
            _ => AuthError::Other(code.to_string()),
        }
    }
}

/// Errors of the pet marketplace operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PetError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Result type for upload operations
pub type UploadResult<T = ()> = Result<T, UploadError>;

/// Result type for document store operations
pub type StoreResult<T = ()> = Result<T, StoreError>;

/// Result type for identity operations
pub type AuthResult<T = ()> = Result<T, AuthError>;

/// Result type for pet marketplace operations
pub type PetResult<T = ()> = Result<T, PetError>;
