// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Error type for analysis operations and its HTTP mapping.

use crate::models::api::ErrorEnvelope;
use crate::models::stage::{ErrorInfo, ErrorKind};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The directive document could not be retrieved.
    #[error("failed to fetch directive document: {0}")]
    FetchFailed(String),

    /// The directive document was retrieved but has no content.
    #[error("directive document at {0} is empty")]
    EmptyDocument(String),

    #[error("upstream fetch failed: {0}")]
    UpstreamFetchFailed(String),

    #[error("upstream stage did not succeed: {0}")]
    UpstreamFailed(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("classification unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            AnalysisError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            AnalysisError::FetchFailed(_)
            | AnalysisError::EmptyDocument(_)
            | AnalysisError::UpstreamFetchFailed(_) => ErrorKind::UpstreamFetchFailed,
            AnalysisError::UpstreamFailed(_) => ErrorKind::UpstreamFailed,
            AnalysisError::Timeout(_) => ErrorKind::Timeout,
            AnalysisError::ClassificationUnavailable(_) => ErrorKind::ClassificationUnavailable,
            AnalysisError::NotConfigured(_) => ErrorKind::NotConfigured,
            AnalysisError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidUrl => StatusCode::BAD_REQUEST,
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message without the kind prefix added by `Display`.
    pub fn detail(&self) -> &str {
        match self {
            AnalysisError::InvalidUrl(m)
            | AnalysisError::PermissionDenied(m)
            | AnalysisError::FetchFailed(m)
            | AnalysisError::EmptyDocument(m)
            | AnalysisError::UpstreamFetchFailed(m)
            | AnalysisError::UpstreamFailed(m)
            | AnalysisError::Timeout(m)
            | AnalysisError::ClassificationUnavailable(m)
            | AnalysisError::NotConfigured(m)
            | AnalysisError::Internal(m) => m,
        }
    }

    pub fn to_info(&self) -> ErrorInfo {
        ErrorInfo::new(self.kind(), self.detail())
    }
}

impl From<ErrorInfo> for AnalysisError {
    fn from(info: ErrorInfo) -> Self {
        let message = info.message;
        match info.kind {
            ErrorKind::InvalidUrl => AnalysisError::InvalidUrl(message),
            ErrorKind::PermissionDenied => AnalysisError::PermissionDenied(message),
            ErrorKind::UpstreamFetchFailed => AnalysisError::UpstreamFetchFailed(message),
            ErrorKind::UpstreamFailed => AnalysisError::UpstreamFailed(message),
            ErrorKind::Timeout => AnalysisError::Timeout(message),
            ErrorKind::ClassificationUnavailable => {
                AnalysisError::ClassificationUnavailable(message)
            }
            ErrorKind::NotConfigured => AnalysisError::NotConfigured(message),
            ErrorKind::Internal => AnalysisError::Internal(message),
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.kind().code(), "request failed: {}", self);
        }
        let body = ErrorEnvelope {
            error_status: status.as_u16(),
            error_code: self.kind().code().to_string(),
            error_message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
