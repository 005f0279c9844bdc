// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Teardown of a bastion's cloud resources.
//!
//! Order matters: the worker rule referencing the bastion group goes first and the
//! bastion group last, since a group cannot be deleted while an instance uses it
//! or another group's rule references it.

use super::options::{find_subnet, get_security_group, BastionNames};
use super::types::{DeleteOutcome, RequeueAfter};
use super::worker::remove_worker_permissions;
use crate::cloud::{CloudClient, Filter, InstanceState};
use crate::constants::{FILTER_TAG_NAME, TERMINATING_REQUEUE};
use crate::errors::BastionError;
use crate::metrics::record_cloud_resource_deleted;
use tracing::{debug, info};

/// Remove everything provisioned for a bastion.
///
/// Safe to call repeatedly. Returns [`DeleteOutcome::Requeue`] while tagged
/// instances are still shutting down; the bastion group is only deleted once they
/// are all terminated. If the subnet no longer exists the group steps are skipped.
///
/// # Errors
///
/// Returns [`BastionError::Cloud`] naming the failed call.
pub async fn delete_bastion_resources(
    cloud: &dyn CloudClient,
    names: &BastionNames,
) -> Result<DeleteOutcome, BastionError> {
    let subnet = find_subnet(cloud, names).await?;
    let bastion_group = match &subnet {
        Some(subnet) => {
            get_security_group(cloud, &subnet.vpc_id, &names.bastion_security_group_name).await?
        }
        None => {
            debug!(subnet_name = %names.subnet_name, "Subnet not found, skipping security group cleanup");
            None
        }
    };

    if let (Some(subnet), Some(group)) = (&subnet, &bastion_group) {
        remove_worker_permissions(
            cloud,
            &subnet.vpc_id,
            &names.worker_security_group_name,
            &group.group_id,
        )
        .await?;
    }

    let instances = cloud
        .describe_instances(&[Filter::new(FILTER_TAG_NAME, &names.instance_name)])
        .await
        .map_err(|e| BastionError::cloud("describe instances", e))?;

    let live: Vec<String> = instances
        .iter()
        .filter(|i| !i.state.is_gone())
        .map(|i| i.instance_id.clone())
        .collect();
    if !live.is_empty() {
        info!(instance_name = %names.instance_name, instances = ?live, "Terminating bastion instances");
        cloud
            .terminate_instances(&live)
            .await
            .map_err(|e| BastionError::cloud("terminate bastion instance", e))?;
        for _ in &live {
            record_cloud_resource_deleted("instance");
        }
    }

    if instances
        .iter()
        .any(|i| i.state != InstanceState::Terminated)
    {
        return Ok(DeleteOutcome::Requeue(RequeueAfter::new(
            TERMINATING_REQUEUE,
            "bastion instance is still terminating",
        )));
    }

    if let Some(group) = bastion_group {
        info!(group_id = %group.group_id, "Deleting bastion security group");
        cloud
            .delete_security_group(&group.group_id)
            .await
            .map_err(|e| BastionError::cloud("delete security group", e))?;
        record_cloud_resource_deleted("security_group");
    }

    Ok(DeleteOutcome::Deleted)
}

#[cfg(test)]
#[path = "delete_tests.rs"]
mod delete_tests;
