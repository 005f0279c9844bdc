// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cloud API error mapping to Kubernetes status condition reasons.
//!
//! This module converts [`CloudError`] values into standardized condition reasons
//! so that a failed reconciliation shows up on the `Bastion` with a reason operators
//! can act on.
//!
//! # Usage
//!
//! ```rust
//! use bastion_controller::cloud_errors::map_http_error_to_reason;
//!
//! let (reason, message) = map_http_error_to_reason(403);
//! assert_eq!(reason, "CloudAuthFailed");
//!
//! let (reason, message) = map_http_error_to_reason(503);
//! assert_eq!(reason, "CloudUnavailable");
//! ```

use crate::errors::CloudError;
use crate::status_reasons::{
    REASON_CLOUD_API_ERROR, REASON_CLOUD_AUTH_FAILED, REASON_CLOUD_BAD_REQUEST,
    REASON_CLOUD_RESOURCE_NOT_FOUND, REASON_CLOUD_THROTTLED, REASON_CLOUD_UNAVAILABLE,
    REASON_CLOUD_UNREACHABLE,
};

/// Map HTTP status code to condition reason and message.
///
/// # HTTP Code Mapping
///
/// | HTTP Code | Reason | Meaning |
/// |-----------|--------|---------|
/// | 400 | `CloudBadRequest` | Request rejected as invalid |
/// | 401 | `CloudAuthFailed` | Credentials missing or expired |
/// | 403 | `CloudAuthFailed` | Credentials lack permissions |
/// | 404 | `CloudResourceNotFound` | Referenced resource does not exist |
/// | 429 | `CloudThrottled` | Request rate exceeded |
/// | 500 | `CloudApiError` | Internal server error |
/// | 502-504 | `CloudUnavailable` | API temporarily unavailable |
/// | Other | `CloudApiError` | Unexpected error |
#[must_use]
pub fn map_http_error_to_reason(status_code: u16) -> (&'static str, String) {
    match status_code {
        400 => (
            REASON_CLOUD_BAD_REQUEST,
            "Invalid request to cloud API (400)".into(),
        ),
        401 => (
            REASON_CLOUD_AUTH_FAILED,
            "Cloud API authentication required (401)".into(),
        ),
        403 => (
            REASON_CLOUD_AUTH_FAILED,
            "Cloud API authorization failed (403)".into(),
        ),
        404 => (
            REASON_CLOUD_RESOURCE_NOT_FOUND,
            "Cloud resource not found (404)".into(),
        ),
        429 => (
            REASON_CLOUD_THROTTLED,
            "Cloud API request rate exceeded (429)".into(),
        ),
        500 => (
            REASON_CLOUD_API_ERROR,
            "Cloud API internal error (500)".into(),
        ),
        502..=504 => (
            REASON_CLOUD_UNAVAILABLE,
            format!("Cloud API temporarily unavailable ({status_code})"),
        ),
        _ => (
            REASON_CLOUD_API_ERROR,
            format!("Unexpected HTTP error from cloud API ({status_code})"),
        ),
    }
}

/// Map any [`CloudError`] to a condition reason and message.
///
/// HTTP errors go through [`map_http_error_to_reason`]; errors raised before a
/// response arrived map to `CloudUnreachable`.
#[must_use]
pub fn map_cloud_error_to_reason(error: &CloudError) -> (&'static str, String) {
    match error {
        CloudError::Api { status, .. } => map_http_error_to_reason(*status),
        CloudError::Transport { .. } | CloudError::InvalidEndpoint { .. } => (
            REASON_CLOUD_UNREACHABLE,
            "Cannot connect to cloud API".into(),
        ),
        CloudError::Decode { .. } => (
            REASON_CLOUD_API_ERROR,
            "Cloud API returned an unreadable response".into(),
        ),
    }
}

#[cfg(test)]
#[path = "cloud_errors_tests.rs"]
mod cloud_errors_tests;
