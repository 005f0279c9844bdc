// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Convergence of the bastion's own security group.

use super::options::{get_security_group, Options};
use super::permissions::{has_peers, ip_permissions_equal, security_group_has_permission};
use crate::cloud::{CloudClient, CreateSecurityGroupRequest, IpPermission, Tag};
use crate::constants::{SECURITY_GROUP_DESCRIPTION, TAG_NAME};
use crate::errors::BastionError;
use crate::metrics::record_cloud_resource_created;
use tracing::{debug, info};

/// Make the bastion security group exist with `ingress` authorized and `egress`
/// as its only egress rule. Returns the group ID.
///
/// Ingress rules are only ever added: rules authorized by earlier passes stay in
/// place even after they are no longer declared. Egress is pruned to exactly the
/// canonical rule, which also removes the backend's default allow-all rule.
///
/// If a freshly created group is not yet visible to the re-fetch, pruning is left
/// to the next pass.
///
/// # Errors
///
/// Returns [`BastionError::Cloud`] naming the failed call. Nothing is rolled back.
pub async fn ensure_security_group(
    cloud: &dyn CloudClient,
    opt: &Options,
    ingress: &IpPermission,
    egress: &IpPermission,
) -> Result<String, BastionError> {
    let group_name = &opt.names.bastion_security_group_name;

    let (group_id, has_ingress, has_egress) =
        match get_security_group(cloud, &opt.vpc_id, group_name).await? {
            Some(group) => (
                group.group_id,
                security_group_has_permission(&group.ip_permissions, ingress),
                security_group_has_permission(&group.ip_permissions_egress, egress),
            ),
            None => {
                info!(group_name = %group_name, vpc_id = %opt.vpc_id, "Creating security group");
                let group_id = cloud
                    .create_security_group(&CreateSecurityGroupRequest {
                        group_name: group_name.clone(),
                        vpc_id: opt.vpc_id.clone(),
                        description: SECURITY_GROUP_DESCRIPTION.to_string(),
                        tags: vec![Tag::new(TAG_NAME, group_name)],
                    })
                    .await
                    .map_err(|e| BastionError::cloud("create security group", e))?;
                record_cloud_resource_created("security_group");
                (group_id, false, false)
            }
        };

    if !has_ingress && has_peers(ingress) {
        info!(group_id = %group_id, "Authorizing SSH ingress");
        cloud
            .authorize_security_group_ingress(&group_id, std::slice::from_ref(ingress))
            .await
            .map_err(|e| BastionError::cloud("authorize ingress", e))?;
    }

    if !has_egress {
        info!(group_id = %group_id, "Authorizing bastion egress to workers");
        cloud
            .authorize_security_group_egress(&group_id, std::slice::from_ref(egress))
            .await
            .map_err(|e| BastionError::cloud("authorize egress", e))?;
    }

    let Some(group) = get_security_group(cloud, &opt.vpc_id, group_name).await? else {
        debug!(group_id = %group_id, "Security group not visible yet, egress pruning deferred");
        return Ok(group_id);
    };

    let stale: Vec<IpPermission> = group
        .ip_permissions_egress
        .into_iter()
        .filter(|rule| !ip_permissions_equal(rule, egress))
        .collect();

    if !stale.is_empty() {
        info!(group_id = %group_id, rules = stale.len(), "Revoking extra bastion egress");
        cloud
            .revoke_security_group_egress(&group_id, &stale)
            .await
            .map_err(|e| BastionError::cloud("revoke egress", e))?;
    }

    Ok(group_id)
}

#[cfg(test)]
#[path = "security_group_tests.rs"]
mod security_group_tests;
