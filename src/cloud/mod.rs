// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cloud compute backend used to provision bastions.
//!
//! The reconcilers only talk to the backend through the [`CloudClient`] trait, so
//! every convergence step can be driven against an in-memory fake in tests and
//! against [`http::HttpCloudClient`] in production.
//!
//! Every method is a single API call. The client does not retry: a failed call
//! aborts the reconciliation pass and the controller requeues the resource.

pub mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use crate::errors::CloudError;
use async_trait::async_trait;

pub use types::{
    CreateSecurityGroupRequest, Filter, Instance, InstanceState, IpPermission, IpRange,
    Ipv6Range, NetworkInterfaceSpec, RunInstancesRequest, SecurityGroup, Subnet, Tag,
    UserIdGroupPair,
};

/// Result type for cloud API calls.
pub type CloudResult<T> = Result<T, CloudError>;

/// Operations of the cloud compute API needed to manage a bastion.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// List subnets matching all filters.
    async fn describe_subnets(&self, filters: &[Filter]) -> CloudResult<Vec<Subnet>>;

    /// List security groups matching all filters.
    async fn describe_security_groups(&self, filters: &[Filter])
        -> CloudResult<Vec<SecurityGroup>>;

    /// Create a security group and return its ID.
    ///
    /// A new group starts with the backend's default egress rule (allow all).
    async fn create_security_group(&self, request: &CreateSecurityGroupRequest)
        -> CloudResult<String>;

    /// Delete a security group by ID.
    async fn delete_security_group(&self, group_id: &str) -> CloudResult<()>;

    /// Add ingress rules to a security group.
    async fn authorize_security_group_ingress(
        &self,
        group_id: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()>;

    /// Add egress rules to a security group.
    async fn authorize_security_group_egress(
        &self,
        group_id: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()>;

    /// Remove ingress rules from a security group.
    async fn revoke_security_group_ingress(
        &self,
        group_id: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()>;

    /// Remove egress rules from a security group.
    async fn revoke_security_group_egress(
        &self,
        group_id: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()>;

    /// List instances matching all filters, including terminated ones.
    async fn describe_instances(&self, filters: &[Filter]) -> CloudResult<Vec<Instance>>;

    /// Launch instances and return them as created.
    async fn run_instances(&self, request: &RunInstancesRequest) -> CloudResult<Vec<Instance>>;

    /// Request termination of instances.
    async fn terminate_instances(&self, instance_ids: &[String]) -> CloudResult<()>;
}
