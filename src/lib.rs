// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Bastion Controller - SSH Jump Hosts for Kubernetes-Managed Clusters
//!
//! A Kubernetes controller that turns a `Bastion` custom resource into a temporary
//! SSH jump host on a cloud compute backend.
//!
//! ## Overview
//!
//! For every `Bastion` the controller converges:
//!
//! - A dedicated security group admitting SSH from the declared CIDRs, with egress
//!   restricted to the cluster's worker nodes
//! - Exactly one compute instance in the cluster's public utility subnet
//! - An ingress rule on the worker security group admitting SSH from the bastion
//!
//! Once the instance has both a private and a public address, the public endpoint is
//! published in `status.ingress`.
//!
//! ## Modules
//!
//! - [`crd`] - The `Bastion` Custom Resource Definition
//! - [`reconcilers`] - Provisioning and teardown logic
//! - [`cloud`] - Cloud compute API client trait and HTTP implementation
//! - [`config`] - Controller configuration file
//! - [`context`] - Shared state handed to every reconciliation
//!
//! ## Example
//!
//! ```rust,no_run
//! use bastion_controller::crd::{Bastion, BastionIngressPolicy, BastionSpec};
//! use k8s_openapi::api::networking::v1::IPBlock;
//! use k8s_openapi::ByteString;
//!
//! let bastion = Bastion::new(
//!     "debug-session",
//!     BastionSpec {
//!         user_data: ByteString(b"#!/bin/bash\n".to_vec()),
//!         ingress: vec![BastionIngressPolicy {
//!             ip_block: IPBlock {
//!                 cidr: "203.0.113.0/24".to_string(),
//!                 except: None,
//!             },
//!         }],
//!     },
//! );
//! ```

pub mod cloud;
pub mod cloud_errors;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod errors;
pub mod metrics;
pub mod reconcilers;
pub mod status_reasons;

#[cfg(test)]
mod crd_tests;
