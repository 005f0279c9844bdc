// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition reasons for `Bastion` resources.
//!
//! Reasons are programmatic identifiers in CamelCase that explain why the `Ready`
//! condition has a particular status.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   ingress:
//!     hostname: ec2-203-0-113-10.compute.example.com
//!     ip: 203.0.113.10
//!   conditions:
//!     - type: Ready
//!       status: "True"
//!       reason: BastionReady
//!       message: "Bastion is reachable at 203.0.113.10"
//! ```

// ============================================================================
// Lifecycle Reasons
// ============================================================================

/// The bastion instance has a private and a public endpoint.
pub const REASON_BASTION_READY: &str = "BastionReady";

/// The bastion is being provisioned; endpoints are not assigned yet.
pub const REASON_PROVISIONING: &str = "Provisioning";

/// The bastion is being torn down.
pub const REASON_DELETING: &str = "Deleting";

// ============================================================================
// Validation Reasons
// ============================================================================

/// A declared ingress CIDR could not be parsed.
pub const REASON_INVALID_INGRESS: &str = "InvalidIngress";

/// The controller configuration is unusable.
pub const REASON_INVALID_CONFIGURATION: &str = "InvalidConfiguration";

// ============================================================================
// Prerequisite Reasons
// ============================================================================

/// A resource the controller relies on but never creates does not exist.
///
/// Possible causes:
/// - Worker security group not created yet
/// - Public utility subnet missing or renamed
pub const REASON_PREREQUISITE_MISSING: &str = "PrerequisiteMissing";

// ============================================================================
// Cloud API Reasons
// ============================================================================

/// Cloud API rejected the request as malformed.
///
/// Maps to HTTP 400 Bad Request. This is typically a bug in the controller.
pub const REASON_CLOUD_BAD_REQUEST: &str = "CloudBadRequest";

/// Cloud API authentication or authorization failed.
///
/// Maps to HTTP 401 Unauthorized or 403 Forbidden.
pub const REASON_CLOUD_AUTH_FAILED: &str = "CloudAuthFailed";

/// A cloud resource referenced by the request does not exist.
///
/// Maps to HTTP 404 Not Found.
pub const REASON_CLOUD_RESOURCE_NOT_FOUND: &str = "CloudResourceNotFound";

/// Cloud API rate limit exceeded.
///
/// Maps to HTTP 429 Too Many Requests.
pub const REASON_CLOUD_THROTTLED: &str = "CloudThrottled";

/// Cloud API returned an error without a more specific mapping.
pub const REASON_CLOUD_API_ERROR: &str = "CloudApiError";

/// Cloud API is temporarily unavailable.
///
/// Maps to HTTP 502 Bad Gateway, 503 Service Unavailable, 504 Gateway Timeout.
pub const REASON_CLOUD_UNAVAILABLE: &str = "CloudUnavailable";

/// No HTTP response was received from the cloud API.
pub const REASON_CLOUD_UNREACHABLE: &str = "CloudUnreachable";

// ============================================================================
// Kubernetes Reasons
// ============================================================================

/// Writing the bastion status or finalizers failed.
pub const REASON_STATUS_UPDATE_FAILED: &str = "StatusUpdateFailed";

// ============================================================================
// Condition Types and Values
// ============================================================================

/// Primary condition type indicating overall resource readiness.
pub const CONDITION_TYPE_READY: &str = "Ready";

/// Condition status value `True`
pub const CONDITION_STATUS_TRUE: &str = "True";

/// Condition status value `False`
pub const CONDITION_STATUS_FALSE: &str = "False";
