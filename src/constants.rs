// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the bastion controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

use std::time::Duration;

// ============================================================================
// API Constants
// ============================================================================

/// API group for the `Bastion` CRD
pub const API_GROUP: &str = "operator.bastion.io";

/// API version for the `Bastion` CRD
pub const API_VERSION: &str = "v1alpha1";

/// Kind name for `Bastion` resource
pub const KIND_BASTION: &str = "Bastion";

/// Finalizer guarding cloud-side teardown of a bastion
pub const BASTION_FINALIZER: &str = "bastion.operator.io/finalizer";

// ============================================================================
// Network Constants
// ============================================================================

/// Port the bastion accepts SSH on and uses to reach worker nodes
pub const SSH_PORT: i32 = 22;

/// Protocol used for all bastion rules
pub const PROTOCOL_TCP: &str = "tcp";

/// Description attached to newly created bastion security groups.
///
/// Rule descriptions are never set; only the group itself carries one.
pub const SECURITY_GROUP_DESCRIPTION: &str = "SSH access for Bastion";

// ============================================================================
// Cloud Filter and Tag Constants
// ============================================================================

/// Tag key used as the identity of bastion instances and groups
pub const TAG_NAME: &str = "Name";

/// Filter selecting resources by their `Name` tag
pub const FILTER_TAG_NAME: &str = "tag:Name";

/// Filter selecting security groups by network
pub const FILTER_VPC_ID: &str = "vpc-id";

/// Filter selecting security groups by name
pub const FILTER_GROUP_NAME: &str = "group-name";

// ============================================================================
// Naming Constants
// ============================================================================

/// Suffix of the bastion instance name (`<cluster>-<bastion>-bastion`)
pub const INSTANCE_NAME_SUFFIX: &str = "bastion";

/// Suffix of the bastion security group name (`<cluster>-<bastion>-bsg`)
pub const BASTION_SECURITY_GROUP_SUFFIX: &str = "bsg";

/// Suffix of the worker security group name (`<cluster>-nodes`)
pub const WORKER_SECURITY_GROUP_SUFFIX: &str = "nodes";

/// Suffix of the default public subnet name (`<cluster>-public-utility-z0`)
pub const PUBLIC_SUBNET_SUFFIX: &str = "public-utility-z0";

// ============================================================================
// Requeue Constants
// ============================================================================

/// Requeue delay while the bastion instance has no endpoints yet.
///
/// Kept short so that users waiting for the public endpoint are not delayed.
pub const NOT_READY_REQUEUE_SECS: u64 = 5;

/// Requeue delay while a terminated bastion instance is still shutting down
pub const TERMINATING_REQUEUE_SECS: u64 = 10;

/// Requeue delay after a failed reconciliation
pub const ERROR_REQUEUE_SECS: u64 = 30;

/// Requeue delay for periodic drift checks of ready bastions
pub const READY_REQUEUE_SECS: u64 = 300;

/// [`NOT_READY_REQUEUE_SECS`] as a [`Duration`]
pub const NOT_READY_REQUEUE: Duration = Duration::from_secs(NOT_READY_REQUEUE_SECS);

/// [`TERMINATING_REQUEUE_SECS`] as a [`Duration`]
pub const TERMINATING_REQUEUE: Duration = Duration::from_secs(TERMINATING_REQUEUE_SECS);

// ============================================================================
// Runtime Constants
// ============================================================================

/// Default address of the Prometheus metrics endpoint
pub const DEFAULT_METRICS_ADDRESS: &str = "0.0.0.0:8080";

/// Path the metrics endpoint is served on
pub const METRICS_PATH: &str = "/metrics";

/// Number of Tokio worker threads for the controller runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Cloud API Constants
// ============================================================================

/// Connect timeout for cloud API calls
///
/// Requests themselves carry no deadline; the reconcile pass owning the call aborts
/// it by dropping the future.
pub const CLOUD_API_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Prefix of query parameters carrying describe filters (`filter.<name>=<value>`)
pub const FILTER_QUERY_PREFIX: &str = "filter.";
