// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status helpers for `Bastion` resources.
//!
//! Two writers touch a bastion's status, each with its own merge patch so neither
//! clobbers the other:
//! - the provisioning pass publishes the public endpoint in `status.ingress`
//!   through a [`StatusSink`]
//! - the controller records the outcome of each pass in the `Ready` condition
//!   through [`update_ready_condition`]
//!
//! # Example
//!
//! ```rust,no_run
//! use bastion_controller::reconcilers::status::create_condition;
//!
//! let condition = create_condition(
//!     "Ready",
//!     "True",
//!     "BastionReady",
//!     "Bastion is reachable at 203.0.113.10"
//! );
//! ```

use crate::crd::{Bastion, Condition};
use crate::errors::BastionError;
use crate::status_reasons::CONDITION_TYPE_READY;
use async_trait::async_trait;
use chrono::Utc;
use k8s_openapi::api::core::v1::LoadBalancerIngress;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::{json, Value};
use tracing::debug;

/// Create a new Kubernetes condition with the current timestamp.
///
/// # Example
///
/// ```rust,no_run
/// # use bastion_controller::reconcilers::status::create_condition;
/// let condition = create_condition("Ready", "False", "Provisioning", "Waiting for endpoints");
/// assert_eq!(condition.r#type, "Ready");
/// assert_eq!(condition.status, "False");
/// ```
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a mutable conditions list (in-memory, no API call).
///
/// `lastTransitionTime` is preserved when the status value does not change.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Compare two condition lists, ignoring `lastTransitionTime`.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    current.len() == new.len()
        && new.iter().all(|new_cond| {
            find_condition(current, &new_cond.r#type).is_some_and(|curr| {
                curr.status == new_cond.status
                    && curr.reason == new_cond.reason
                    && curr.message == new_cond.message
            })
        })
}

/// Conditions of `bastion` after setting `Ready`, or `None` if nothing would change.
#[must_use]
pub fn ready_conditions(
    bastion: &Bastion,
    status: &str,
    reason: &str,
    message: &str,
) -> Option<Vec<Condition>> {
    let current = bastion
        .status
        .as_ref()
        .map(|s| s.conditions.clone())
        .unwrap_or_default();
    let mut updated = current.clone();
    update_condition_in_memory(&mut updated, CONDITION_TYPE_READY, status, reason, message);

    let observed_generation = bastion.status.as_ref().and_then(|s| s.observed_generation);
    if conditions_equal(&current, &updated) && observed_generation == bastion.metadata.generation
    {
        None
    } else {
        Some(updated)
    }
}

/// Set the `Ready` condition and `observedGeneration` of a bastion.
///
/// Skips the API call if the condition is semantically unchanged.
///
/// # Errors
///
/// Returns [`BastionError::Kubernetes`] if the patch fails.
pub async fn update_ready_condition(
    client: &Client,
    bastion: &Bastion,
    status: &str,
    reason: &str,
    message: &str,
) -> Result<(), BastionError> {
    let name = bastion.name_any();
    let namespace = bastion.namespace().unwrap_or_default();

    let Some(conditions) = ready_conditions(bastion, status, reason, message) else {
        debug!("Bastion {namespace}/{name} condition unchanged, skipping update");
        return Ok(());
    };

    let api: Api<Bastion> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({
        "status": {
            "conditions": conditions,
            "observedGeneration": bastion.metadata.generation,
        }
    });
    api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(|source| BastionError::Kubernetes {
            name: format!("{namespace}/{name}"),
            source,
        })?;

    debug!("Updated Bastion {namespace}/{name} Ready condition to {status} ({reason})");
    Ok(())
}

/// Merge patch that only sets `status.ingress`.
///
/// Unset fields are written as explicit `null`; a merge patch keeps any key it
/// omits, so a hostname from a previous instance would otherwise survive.
#[must_use]
pub fn public_endpoint_patch(ingress: &LoadBalancerIngress) -> Value {
    json!({
        "status": {
            "ingress": {
                "hostname": ingress.hostname,
                "ip": ingress.ip,
                "ipMode": ingress.ip_mode,
                "ports": ingress.ports,
            },
        }
    })
}

/// Where the provisioning pass publishes the bastion's public endpoint.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Publish `ingress` as the bastion's public endpoint.
    ///
    /// Must be idempotent and must not touch any other status field.
    async fn set_public_endpoint(
        &self,
        bastion: &Bastion,
        ingress: &LoadBalancerIngress,
    ) -> Result<(), BastionError>;
}

/// [`StatusSink`] writing to the Kubernetes status subresource.
#[derive(Clone)]
pub struct KubeStatusSink {
    client: Client,
}

impl KubeStatusSink {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusSink for KubeStatusSink {
    async fn set_public_endpoint(
        &self,
        bastion: &Bastion,
        ingress: &LoadBalancerIngress,
    ) -> Result<(), BastionError> {
        let name = bastion.name_any();
        let namespace = bastion.namespace().unwrap_or_default();
        let api: Api<Bastion> = Api::namespaced(self.client.clone(), &namespace);

        api.patch_status(
            &name,
            &PatchParams::default(),
            &Patch::Merge(&public_endpoint_patch(ingress)),
        )
        .await
        .map_err(|source| BastionError::Kubernetes {
            name: format!("{namespace}/{name}"),
            source,
        })?;

        debug!(
            bastion = %name,
            namespace = %namespace,
            hostname = ?ingress.hostname,
            ip = ?ingress.ip,
            "Published bastion endpoint"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
