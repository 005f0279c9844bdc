// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for bastion management.
//!
//! A [`Bastion`] requests a temporary SSH jump host for one cluster. The controller
//! provisions a security group and a single compute instance for it, and publishes the
//! instance's public endpoint in `status.ingress` once the instance is reachable.
//!
//! # Example: Requesting a Bastion
//!
//! ```rust,no_run
//! use bastion_controller::crd::{BastionIngressPolicy, BastionSpec};
//! use k8s_openapi::api::networking::v1::IPBlock;
//! use k8s_openapi::ByteString;
//!
//! let spec = BastionSpec {
//!     user_data: ByteString(b"#!/bin/bash\necho hello".to_vec()),
//!     ingress: vec![BastionIngressPolicy {
//!         ip_block: IPBlock {
//!             cidr: "203.0.113.0/24".to_string(),
//!             except: None,
//!         },
//!     }],
//! };
//! ```

use k8s_openapi::api::core::v1::LoadBalancerIngress;
use k8s_openapi::api::networking::v1::IPBlock;
use k8s_openapi::ByteString;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. The controller maintains a single `Ready` condition.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// A single address block allowed to reach the bastion over SSH.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BastionIngressPolicy {
    /// Source address block in CIDR notation (IPv4 or IPv6).
    ///
    /// Host bits are zeroed before use, e.g. `10.1.2.3/8` is treated as `10.0.0.0/8`.
    /// The `except` list is not supported by cloud security groups and is ignored.
    pub ip_block: IPBlock,
}

/// `Bastion` requests a temporary SSH jump host into a cluster's private network.
///
/// The bastion is placed in the cluster's public utility subnet, receives a public
/// address, and is allowed to reach the worker nodes on port 22.
///
/// # Example
///
/// ```yaml
/// apiVersion: operator.bastion.io/v1alpha1
/// kind: Bastion
/// metadata:
///   name: debug-session
///   namespace: shoot--dev--cluster
/// spec:
///   userData: IyEvYmluL2Jhc2gKZWNobyBoZWxsbw==
///   ingress:
///     - ipBlock:
///         cidr: 203.0.113.0/24
///     - ipBlock:
///         cidr: 2001:db8::/32
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "operator.bastion.io",
    version = "v1alpha1",
    kind = "Bastion",
    namespaced,
    shortname = "bst",
    printcolumn = r#"{"name":"Public IP","type":"string","jsonPath":".status.ingress.ip"}"#,
    printcolumn = r#"{"name":"Hostname","type":"string","jsonPath":".status.ingress.hostname"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#,
    doc = "Bastion requests a temporary SSH jump host for operator access to otherwise unreachable cluster nodes. The controller provisions a security group and a single compute instance and publishes the public endpoint in status.ingress."
)]
#[kube(status = "BastionStatus")]
#[serde(rename_all = "camelCase")]
pub struct BastionSpec {
    /// Bootstrap data handed to the instance on first boot (base64 in JSON).
    ///
    /// Only used when the instance is created; later changes do not affect a
    /// running bastion.
    #[schemars(with = "String")]
    pub user_data: ByteString,

    /// Address blocks allowed to connect to the bastion over SSH.
    #[serde(default)]
    pub ingress: Vec<BastionIngressPolicy>,
}

/// `Bastion` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BastionStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Public endpoint (hostname and/or IP) of the bastion instance, set once reachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress: Option<LoadBalancerIngress>,
}
