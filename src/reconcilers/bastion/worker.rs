// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! SSH access from the bastion to the worker nodes.
//!
//! The worker security group is shared infrastructure: the controller only adds
//! or removes its own rule and never touches anything else on it.

use super::options::{get_security_group, Options};
use super::permissions::{security_group_has_permission, worker_ingress_permission};
use crate::cloud::CloudClient;
use crate::errors::BastionError;
use tracing::{debug, info};

/// Allow SSH from the bastion group into the worker group.
///
/// # Errors
///
/// Returns [`BastionError::MissingPrerequisite`] if the worker group does not
/// exist, or [`BastionError::Cloud`] if a call fails.
pub async fn ensure_worker_permissions(
    cloud: &dyn CloudClient,
    opt: &Options,
    bastion_security_group_id: &str,
) -> Result<(), BastionError> {
    let worker_group_name = &opt.names.worker_security_group_name;
    let worker_group = get_security_group(cloud, &opt.vpc_id, worker_group_name)
        .await?
        .ok_or_else(|| BastionError::MissingPrerequisite {
            resource: "worker security group",
            name: worker_group_name.clone(),
        })?;

    let permission = worker_ingress_permission(bastion_security_group_id);
    if security_group_has_permission(&worker_group.ip_permissions, &permission) {
        debug!(group_id = %worker_group.group_id, "Worker SSH ingress already authorized");
        return Ok(());
    }

    info!(
        group_id = %worker_group.group_id,
        bastion_group_id = %bastion_security_group_id,
        "Authorizing SSH ingress from bastion to workers"
    );
    cloud
        .authorize_security_group_ingress(&worker_group.group_id, &[permission])
        .await
        .map_err(|e| BastionError::cloud("authorize worker ingress", e))
}

/// Remove the rule added by [`ensure_worker_permissions`], if present.
///
/// # Errors
///
/// Returns [`BastionError::Cloud`] if the revoke call fails.
pub async fn remove_worker_permissions(
    cloud: &dyn CloudClient,
    vpc_id: &str,
    worker_security_group_name: &str,
    bastion_security_group_id: &str,
) -> Result<(), BastionError> {
    let Some(worker_group) = get_security_group(cloud, vpc_id, worker_security_group_name).await?
    else {
        return Ok(());
    };

    let permission = worker_ingress_permission(bastion_security_group_id);
    if !security_group_has_permission(&worker_group.ip_permissions, &permission) {
        return Ok(());
    }

    info!(
        group_id = %worker_group.group_id,
        bastion_group_id = %bastion_security_group_id,
        "Revoking SSH ingress from bastion to workers"
    );
    cloud
        .revoke_security_group_ingress(&worker_group.group_id, &[permission])
        .await
        .map_err(|e| BastionError::cloud("revoke worker ingress", e))
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod worker_tests;
