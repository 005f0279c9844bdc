// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the bastion controller.
//!
//! This module provides specialized error types for:
//! - Cloud compute API calls (HTTP errors, transport failures, undecodable responses)
//! - Bastion reconciliation (invalid input, failed backend calls, missing prerequisites)
//!
//! A bastion that is merely not ready yet is *not* an error; that is reported as
//! [`crate::reconcilers::bastion::ReconcileOutcome::Requeue`].

use crate::cloud_errors::map_cloud_error_to_reason;
use crate::status_reasons::{
    REASON_INVALID_CONFIGURATION, REASON_INVALID_INGRESS, REASON_PREREQUISITE_MISSING,
    REASON_STATUS_UPDATE_FAILED,
};
use thiserror::Error;

/// Errors returned by a [`crate::cloud::CloudClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    /// The API answered with a non-success HTTP status.
    #[error("cloud API returned HTTP {status} ({code}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Machine-readable error code from the response body, `Unknown` if absent
        code: String,
        /// Human-readable message from the response body
        message: String,
    },

    /// The request never produced an HTTP response (DNS, connect, TLS, reset).
    #[error("cloud API request to {url} failed: {reason}")]
    Transport {
        /// Request URL
        url: String,
        /// Underlying transport error
        reason: String,
    },

    /// The response body could not be decoded.
    #[error("could not decode cloud API response from {url}: {reason}")]
    Decode {
        /// Request URL
        url: String,
        /// Decoder error
        reason: String,
    },

    /// The configured endpoint or a derived request URL is not a valid URL.
    #[error("invalid cloud API endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// Offending endpoint or path
        endpoint: String,
        /// Parser error
        reason: String,
    },
}

impl CloudError {
    /// HTTP status code of an API error, if the request got that far.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Classification of a [`BastionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed declared input; nothing was mutated.
    Validation,
    /// A cloud API call failed.
    Backend,
    /// A resource that must already exist is absent.
    MissingPrerequisite,
    /// Talking to the Kubernetes API failed.
    Kubernetes,
}

/// Errors that abort a bastion reconciliation pass.
#[derive(Error, Debug)]
pub enum BastionError {
    /// A declared ingress CIDR could not be parsed.
    #[error("invalid ingress CIDR {cidr:?}: {reason}")]
    InvalidIngressCidr {
        /// The CIDR as declared
        cidr: String,
        /// Parser error
        reason: String,
    },

    /// A cloud API call failed; `operation` names what was being attempted.
    #[error("failed to {operation}: {source}")]
    Cloud {
        /// Operation in progress, e.g. "create security group"
        operation: &'static str,
        /// Underlying cloud error
        #[source]
        source: CloudError,
    },

    /// A resource this controller never creates does not exist.
    #[error("cannot find {resource} {name:?}")]
    MissingPrerequisite {
        /// Kind of resource, e.g. "worker security group"
        resource: &'static str,
        /// Name the resource was looked up by
        name: String,
    },

    /// Patching the `Bastion` resource failed.
    #[error("failed to update {name}: {source}")]
    Kubernetes {
        /// Namespace/name of the bastion
        name: String,
        /// Underlying Kubernetes client error
        #[source]
        source: kube::Error,
    },

    /// The controller configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BastionError {
    /// Wrap a cloud error with the operation it occurred in.
    #[must_use]
    pub fn cloud(operation: &'static str, source: CloudError) -> Self {
        Self::Cloud { operation, source }
    }

    /// Which of the error kinds this is.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIngressCidr { .. } | Self::Config(_) => ErrorKind::Validation,
            Self::Cloud { .. } => ErrorKind::Backend,
            Self::MissingPrerequisite { .. } => ErrorKind::MissingPrerequisite,
            Self::Kubernetes { .. } => ErrorKind::Kubernetes,
        }
    }

    /// Condition reason describing this error on the `Ready` condition.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidIngressCidr { .. } => REASON_INVALID_INGRESS,
            Self::Config(_) => REASON_INVALID_CONFIGURATION,
            Self::Cloud { source, .. } => map_cloud_error_to_reason(source).0,
            Self::MissingPrerequisite { .. } => REASON_PREREQUISITE_MISSING,
            Self::Kubernetes { .. } => REASON_STATUS_UPDATE_FAILED,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
