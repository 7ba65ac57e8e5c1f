// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Stage names
// ============================================================================

/// Every analysis stage the orchestrator knows about.
///
/// Serialised in camelCase; these are the keys of `ResultAggregate::stages`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum StageName {
    Robots,
    Status,
    Metadata,
    Images,
    Logo,
    ContactInfo,
    Addresses,
    Seo,
    Classification,
    Screenshot,
    Sentiment,
    News,
    ShareCount,
    Reviews,
}

impl StageName {
    pub const ALL: [StageName; 14] = [
        StageName::Robots,
        StageName::Status,
        StageName::Metadata,
        StageName::Images,
        StageName::Logo,
        StageName::ContactInfo,
        StageName::Addresses,
        StageName::Seo,
        StageName::Classification,
        StageName::Screenshot,
        StageName::Sentiment,
        StageName::News,
        StageName::ShareCount,
        StageName::Reviews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Robots => "robots",
            StageName::Status => "status",
            StageName::Metadata => "metadata",
            StageName::Images => "images",
            StageName::Logo => "logo",
            StageName::ContactInfo => "contactInfo",
            StageName::Addresses => "addresses",
            StageName::Seo => "seo",
            StageName::Classification => "classification",
            StageName::Screenshot => "screenshot",
            StageName::Sentiment => "sentiment",
            StageName::News => "news",
            StageName::ShareCount => "shareCount",
            StageName::Reviews => "reviews",
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Errors as data
// ============================================================================

/// Error taxonomy shared by stage failures and HTTP error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ErrorKind {
    InvalidUrl,
    PermissionDenied,
    UpstreamFetchFailed,
    UpstreamFailed,
    Timeout,
    ClassificationUnavailable,
    NotConfigured,
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code used in the `errorCode` envelope field.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidUrl => "INVALID_URL",
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::UpstreamFetchFailed => "UPSTREAM_FETCH_FAILED",
            ErrorKind::UpstreamFailed => "UPSTREAM_FAILED",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ClassificationUnavailable => "CLASSIFICATION_UNAVAILABLE",
            ErrorKind::NotConfigured => "NOT_CONFIGURED",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Serialisable description of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Why a stage did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The directive rules forbid the origin or path the stage needs.
    PermissionDenied,
    /// The directive document could not be retrieved, so permission is unknown.
    PermissionUnavailable,
    /// A stage this one depends on did not succeed.
    UpstreamFailed,
    /// The capability backing the stage is not configured.
    NotConfigured,
}

// ============================================================================
// Stage results
// ============================================================================

/// Outcome of exactly one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum StageResult<T> {
    Success(T),
    Failure(ErrorInfo),
    Skipped(SkipReason),
}

impl<T> StageResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, StageResult::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            StageResult::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ErrorInfo> {
        match self {
            StageResult::Failure(info) => Some(info),
            _ => None,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            StageResult::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_name_serializes_camel_case() {
        let json = serde_json::to_string(&StageName::ContactInfo).unwrap();
        assert_eq!(json, "\"contactInfo\"");
        assert_eq!(StageName::ShareCount.to_string(), "shareCount");
    }

    #[test]
    fn test_stage_name_display_matches_serde() {
        for stage in StageName::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_stage_result_success_shape() {
        let result: StageResult<u32> = StageResult::Success(7);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["value"], 7);
    }

    #[test]
    fn test_stage_result_skipped_shape() {
        let result: StageResult<u32> = StageResult::Skipped(SkipReason::UpstreamFailed);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["value"], "upstream_failed");
        assert_eq!(result.skip_reason(), Some(SkipReason::UpstreamFailed));
    }

    #[test]
    fn test_stage_result_failure_accessors() {
        let result: StageResult<u32> =
            StageResult::Failure(ErrorInfo::new(ErrorKind::Timeout, "too slow"));
        assert!(!result.is_success());
        assert!(result.success().is_none());
        assert_eq!(result.failure().unwrap().kind, ErrorKind::Timeout);
    }

    #[test]
    fn test_error_kind_codes_are_screaming_snake() {
        assert_eq!(ErrorKind::InvalidUrl.code(), "INVALID_URL");
        assert_eq!(ErrorKind::UpstreamFetchFailed.code(), "UPSTREAM_FETCH_FAILED");
    }
}
