// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context passed to the bastion controller.

use crate::cloud::CloudClient;
use crate::config::InfrastructureConfig;
use kube::Client;
use std::sync::Arc;

/// State shared by all reconciliation passes.
///
/// Holds clients only; nothing about individual bastions is cached between passes.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Cloud compute API
    pub cloud: Arc<dyn CloudClient>,

    /// Image, instance type and naming overrides for every bastion
    pub infrastructure: InfrastructureConfig,
}

impl Context {
    #[must_use]
    pub fn new(
        client: Client,
        cloud: Arc<dyn CloudClient>,
        infrastructure: InfrastructureConfig,
    ) -> Self {
        Self {
            client,
            cloud,
            infrastructure,
        }
    }
}
