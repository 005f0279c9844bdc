// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Outcomes of bastion reconciliation passes.

use k8s_openapi::api::core::v1::LoadBalancerIngress;
use std::time::Duration;

/// "Not done yet, call again after `delay`." Not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequeueAfter {
    pub delay: Duration,
    /// What is still pending, for logs.
    pub cause: String,
}

impl RequeueAfter {
    #[must_use]
    pub fn new(delay: Duration, cause: impl Into<String>) -> Self {
        Self {
            delay,
            cause: cause.into(),
        }
    }
}

/// Result of a successful provisioning pass.
#[derive(Clone, Debug, PartialEq)]
pub enum ReconcileOutcome {
    /// Both endpoints are assigned and the public one has been published.
    Ready { public: LoadBalancerIngress },
    /// Still provisioning.
    Requeue(RequeueAfter),
}

/// Result of a successful teardown pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Every cloud resource is gone; the finalizer may be removed.
    Deleted,
    /// Instances are still shutting down.
    Requeue(RequeueAfter),
}
