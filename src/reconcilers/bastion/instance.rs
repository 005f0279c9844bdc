// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Convergence of the bastion compute instance and its endpoints.
//!
//! The instance is identified solely by its `Name` tag. Once it exists it is only
//! ever read: changed bootstrap data or security groups do not recreate it.

use super::options::Options;
use crate::cloud::{
    CloudClient, Filter, Instance, NetworkInterfaceSpec, RunInstancesRequest, Tag,
};
use crate::constants::{FILTER_TAG_NAME, TAG_NAME};
use crate::errors::BastionError;
use crate::metrics::record_cloud_resource_created;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use k8s_openapi::api::core::v1::LoadBalancerIngress;
use tracing::{debug, info};

/// Private and public addressing of a bastion instance.
///
/// The private endpoint is what worker nodes see SSH connections coming from;
/// the public endpoint is where users connect to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BastionEndpoints {
    pub private: Option<LoadBalancerIngress>,
    pub public: Option<LoadBalancerIngress>,
}

impl BastionEndpoints {
    /// Endpoints of an instance as currently reported by the backend.
    #[must_use]
    pub fn from_instance(instance: &Instance) -> Self {
        Self {
            private: address_to_ingress(
                instance.private_dns_name.as_deref(),
                instance.private_ip_address.as_deref(),
            ),
            public: address_to_ingress(
                instance.public_dns_name.as_deref(),
                instance.public_ip_address.as_deref(),
            ),
        }
    }

    /// True once both the private and the public endpoint are ready.
    #[must_use]
    pub fn ready(&self) -> bool {
        ingress_ready(self.private.as_ref()) && ingress_ready(self.public.as_ref())
    }
}

/// An endpoint is ready if it has a non-empty hostname or IP.
#[must_use]
pub fn ingress_ready(ingress: Option<&LoadBalancerIngress>) -> bool {
    ingress.is_some_and(|i| {
        i.hostname.as_deref().is_some_and(|h| !h.is_empty())
            || i.ip.as_deref().is_some_and(|ip| !ip.is_empty())
    })
}

/// Build an endpoint from an optional DNS name and IP; empty strings count as unset.
#[must_use]
pub fn address_to_ingress(dns_name: Option<&str>, ip: Option<&str>) -> Option<LoadBalancerIngress> {
    let hostname = dns_name.filter(|s| !s.is_empty()).map(str::to_string);
    let ip = ip.filter(|s| !s.is_empty()).map(str::to_string);
    if hostname.is_none() && ip.is_none() {
        return None;
    }
    Some(LoadBalancerIngress {
        hostname,
        ip,
        ..Default::default()
    })
}

/// First instance tagged `instance_name` that is not shutting down or terminated.
///
/// # Errors
///
/// Returns [`BastionError::Cloud`] if the lookup fails.
pub async fn first_matching_instance(
    cloud: &dyn CloudClient,
    instance_name: &str,
) -> Result<Option<Instance>, BastionError> {
    let instances = cloud
        .describe_instances(&[Filter::new(FILTER_TAG_NAME, instance_name)])
        .await
        .map_err(|e| BastionError::cloud("describe instances", e))?;
    Ok(instances.into_iter().find(|i| !i.state.is_gone()))
}

/// Endpoints of the live instance tagged `instance_name`, if there is one.
///
/// # Errors
///
/// Returns [`BastionError::Cloud`] if the lookup fails.
pub async fn get_instance_endpoints(
    cloud: &dyn CloudClient,
    instance_name: &str,
) -> Result<Option<BastionEndpoints>, BastionError> {
    Ok(first_matching_instance(cloud, instance_name)
        .await?
        .map(|instance| BastionEndpoints::from_instance(&instance)))
}

/// Build the launch request for a new bastion instance.
#[must_use]
pub fn run_instances_request(
    opt: &Options,
    security_group_id: &str,
    user_data: &[u8],
) -> RunInstancesRequest {
    let (ipv6_address_count, primary_ipv6) = if opt.ipv6 {
        (Some(1), Some(true))
    } else {
        (None, None)
    };
    RunInstancesRequest {
        image_id: opt.image_id.clone(),
        instance_type: opt.instance_type.clone(),
        user_data: BASE64.encode(user_data),
        min_count: 1,
        max_count: 1,
        tags: vec![Tag::new(TAG_NAME, &opt.names.instance_name)],
        network_interfaces: vec![NetworkInterfaceSpec {
            device_index: 0,
            subnet_id: opt.subnet_id.clone(),
            groups: vec![security_group_id.to_string()],
            associate_public_ip_address: true,
            ipv6_address_count,
            primary_ipv6,
        }],
    }
}

/// Make exactly one bastion instance exist and return its current endpoints.
///
/// A new instance usually has no addresses yet; that is returned as not-ready
/// endpoints, not as an error.
///
/// # Errors
///
/// Returns [`BastionError::Cloud`] if the lookup or the launch fails.
pub async fn ensure_bastion_instance(
    cloud: &dyn CloudClient,
    opt: &Options,
    security_group_id: &str,
    user_data: &[u8],
) -> Result<BastionEndpoints, BastionError> {
    let instance_name = &opt.names.instance_name;

    if let Some(endpoints) = get_instance_endpoints(cloud, instance_name).await? {
        debug!(instance_name = %instance_name, "Bastion instance already exists");
        return Ok(endpoints);
    }

    info!(
        instance_name = %instance_name,
        subnet_id = %opt.subnet_id,
        group_id = %security_group_id,
        ipv6 = opt.ipv6,
        "Running new bastion instance"
    );
    cloud
        .run_instances(&run_instances_request(opt, security_group_id, user_data))
        .await
        .map_err(|e| BastionError::cloud("run bastion instance", e))?;
    record_cloud_resource_created("instance");

    Ok(get_instance_endpoints(cloud, instance_name)
        .await?
        .unwrap_or_default())
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod instance_tests;
