// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for Drive Path Navigator

use thiserror::Error;

/// Result type alias
pub type DpnResult<T> = Result<T, DpnError>;

/// Main error type
#[derive(Error, Debug)]
pub enum DpnError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not a folder: {0}")]
    NotAFolder(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Item is not reachable from root: {0}")]
    Detached(String),

    #[error("Parent cycle detected at item {0}")]
    CycleDetected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Rate limited: retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider API error ({provider}): {message}")]
    ProviderApi { provider: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DpnError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DpnError::NotFound(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DpnError::Network(_) | DpnError::RateLimited { .. } | DpnError::TokenExpired
        )
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            DpnError::AuthRequired(_) | DpnError::AuthFailed(_) | DpnError::TokenExpired
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_not_found() {
        assert!(DpnError::NotFound("/root/a".into()).is_not_found());
        assert!(!DpnError::NotAFolder("/root/a".into()).is_not_found());
        assert!(!DpnError::Network("reset".into()).is_not_found());
    }

    #[test]
    fn test_is_retryable() {
        assert!(DpnError::Network("connection reset".into()).is_retryable());
        assert!(DpnError::RateLimited { retry_after_secs: Some(30) }.is_retryable());
        assert!(DpnError::TokenExpired.is_retryable());

        assert!(!DpnError::NotFound("file.txt".into()).is_retryable());
        assert!(!DpnError::CycleDetected("abc".into()).is_retryable());
    }

    #[test]
    fn test_is_auth_error() {
        assert!(DpnError::AuthRequired("login needed".into()).is_auth_error());
        assert!(DpnError::AuthFailed("bad code".into()).is_auth_error());
        assert!(DpnError::TokenExpired.is_auth_error());

        assert!(!DpnError::Network("timeout".into()).is_auth_error());
    }

    #[test]
    fn test_error_display() {
        let err = DpnError::NotFound("/root/docs/a.txt".into());
        assert_eq!(format!("{}", err), "Path not found: /root/docs/a.txt");

        let err = DpnError::RateLimited { retry_after_secs: Some(60) };
        assert!(format!("{}", err).contains("60"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DpnError = io_err.into();
        assert!(matches!(err, DpnError::Io(_)));
    }
}
