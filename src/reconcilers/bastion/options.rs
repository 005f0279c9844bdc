// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-pass inputs of bastion reconciliation.
//!
//! Names are derived from the cluster (the bastion's namespace) and the bastion's
//! own name; network identifiers are looked up from the backend on every pass.

use crate::cloud::{CloudClient, Filter, SecurityGroup, Subnet};
use crate::config::InfrastructureConfig;
use crate::constants::{
    BASTION_SECURITY_GROUP_SUFFIX, FILTER_GROUP_NAME, FILTER_TAG_NAME, FILTER_VPC_ID,
    INSTANCE_NAME_SUFFIX, PUBLIC_SUBNET_SUFFIX, WORKER_SECURITY_GROUP_SUFFIX,
};
use crate::crd::Bastion;
use crate::errors::BastionError;
use kube::ResourceExt;
use tracing::debug;

/// Names of every cloud resource a bastion touches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BastionNames {
    /// Technical id of the cluster the bastion belongs to.
    pub cluster: String,
    /// Value of the `Name` tag identifying the bastion instance.
    pub instance_name: String,
    pub bastion_security_group_name: String,
    pub worker_security_group_name: String,
    pub subnet_name: String,
}

impl BastionNames {
    #[must_use]
    pub fn new(cluster: &str, bastion: &str, infrastructure: &InfrastructureConfig) -> Self {
        Self {
            cluster: cluster.to_string(),
            instance_name: format!("{cluster}-{bastion}-{INSTANCE_NAME_SUFFIX}"),
            bastion_security_group_name: format!(
                "{cluster}-{bastion}-{BASTION_SECURITY_GROUP_SUFFIX}"
            ),
            worker_security_group_name: infrastructure
                .worker_security_group_name
                .clone()
                .unwrap_or_else(|| format!("{cluster}-{WORKER_SECURITY_GROUP_SUFFIX}")),
            subnet_name: infrastructure
                .subnet_name
                .clone()
                .unwrap_or_else(|| format!("{cluster}-{PUBLIC_SUBNET_SUFFIX}")),
        }
    }

    /// Derive names for `bastion`; its namespace is the cluster id.
    ///
    /// # Errors
    ///
    /// Returns [`BastionError::Config`] if the resource has no namespace.
    pub fn for_bastion(
        bastion: &Bastion,
        infrastructure: &InfrastructureConfig,
    ) -> Result<Self, BastionError> {
        let cluster = bastion.namespace().ok_or_else(|| {
            BastionError::Config(format!("bastion {} has no namespace", bastion.name_any()))
        })?;
        Ok(Self::new(&cluster, &bastion.name_any(), infrastructure))
    }
}

/// Everything a provisioning pass needs, resolved against the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub names: BastionNames,
    pub vpc_id: String,
    pub subnet_id: String,
    pub worker_security_group_id: String,
    pub image_id: String,
    pub instance_type: String,
    pub ipv6: bool,
}

/// Find the subnet bastions are placed in, if it exists.
///
/// # Errors
///
/// Returns [`BastionError::Cloud`] if the lookup fails.
pub async fn find_subnet(
    cloud: &dyn CloudClient,
    names: &BastionNames,
) -> Result<Option<Subnet>, BastionError> {
    let subnets = cloud
        .describe_subnets(&[Filter::new(FILTER_TAG_NAME, &names.subnet_name)])
        .await
        .map_err(|e| BastionError::cloud("describe subnets", e))?;
    Ok(subnets.into_iter().next())
}

/// Look up a security group by network and name; at most one is expected.
///
/// # Errors
///
/// Returns [`BastionError::Cloud`] if the lookup fails.
pub async fn get_security_group(
    cloud: &dyn CloudClient,
    vpc_id: &str,
    group_name: &str,
) -> Result<Option<SecurityGroup>, BastionError> {
    let groups = cloud
        .describe_security_groups(&[
            Filter::new(FILTER_VPC_ID, vpc_id),
            Filter::new(FILTER_GROUP_NAME, group_name),
        ])
        .await
        .map_err(|e| BastionError::cloud("describe security groups", e))?;
    Ok(groups.into_iter().next())
}

/// Resolve the network, subnet and worker group for a provisioning pass.
///
/// # Errors
///
/// Returns [`BastionError::MissingPrerequisite`] if the subnet or the worker
/// security group does not exist, or [`BastionError::Cloud`] if a lookup fails.
pub async fn determine_options(
    cloud: &dyn CloudClient,
    names: BastionNames,
    infrastructure: &InfrastructureConfig,
) -> Result<Options, BastionError> {
    let subnet = find_subnet(cloud, &names)
        .await?
        .ok_or_else(|| BastionError::MissingPrerequisite {
            resource: "subnet",
            name: names.subnet_name.clone(),
        })?;

    let worker_group = get_security_group(cloud, &subnet.vpc_id, &names.worker_security_group_name)
        .await?
        .ok_or_else(|| BastionError::MissingPrerequisite {
            resource: "worker security group",
            name: names.worker_security_group_name.clone(),
        })?;

    debug!(
        cluster = %names.cluster,
        vpc_id = %subnet.vpc_id,
        subnet_id = %subnet.subnet_id,
        worker_group_id = %worker_group.group_id,
        "Resolved bastion options"
    );

    Ok(Options {
        names,
        vpc_id: subnet.vpc_id,
        subnet_id: subnet.subnet_id,
        worker_security_group_id: worker_group.group_id,
        image_id: infrastructure.image_id.clone(),
        instance_type: infrastructure.instance_type.clone(),
        ipv6: infrastructure.ipv6,
    })
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod options_tests;
