//! Failure categories shared by every resource handler.

use thiserror::Error;

use crate::password::PasswordError;

/// Failure reported by a parameter-store, key-service or callback collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("resource already exists")]
    AlreadyExists,
    #[error("resource not found")]
    NotFound,
    #[error("{0}")]
    Service(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Validation(String),
    #[error("A parameter named {name} already exists")]
    NameConflict { name: String },
    #[error("A parameter named {name} does not exist")]
    NotFound { name: String },
    #[error("Parameter {name} has no version {version}")]
    VersionNotFound { name: String, version: i64 },
    #[error("{operation} failed: {source}")]
    Upstream {
        operation: &'static str,
        #[source]
        source: UpstreamError,
    },
    #[error("failed to deliver response: {0}")]
    Protocol(String),
}

impl HandlerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn upstream(operation: &'static str, source: UpstreamError) -> Self {
        Self::Upstream { operation, source }
    }

    /// Stable category name, logged as `error_kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NameConflict { .. } => "name_conflict",
            Self::NotFound { .. } => "not_found",
            Self::VersionNotFound { .. } => "version_not_found",
            Self::Upstream { .. } => "upstream_service_error",
            Self::Protocol(_) => "protocol_error",
        }
    }
}

impl From<PasswordError> for HandlerError {
    fn from(error: PasswordError) -> Self {
        Self::Validation(error.to_string())
    }
}
