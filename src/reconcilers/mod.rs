// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation logic for `Bastion` resources.
//!
//! # Reconciliation Architecture
//!
//! The controller follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - Monitor `Bastion` changes via the Kubernetes API
//! 2. **Reconcile** - Converge security groups and the bastion instance on the cloud backend
//! 3. **Status** - Publish the public endpoint and a `Ready` condition
//! 4. **Finalize** - Tear cloud resources down before the `Bastion` disappears
//!
//! # Available Reconcilers
//!
//! - [`reconcile_bastion`] - One provisioning pass against a [`crate::cloud::CloudClient`]
//! - [`delete_bastion`] - One teardown pass
//!
//! # Example: Running a Provisioning Pass
//!
//! ```rust,no_run
//! use bastion_controller::context::Context;
//! use bastion_controller::crd::Bastion;
//! use bastion_controller::reconcilers::{reconcile, ReconcileOutcome};
//!
//! async fn provision(ctx: &Context, bastion: &Bastion) -> anyhow::Result<()> {
//!     match reconcile(ctx, bastion).await? {
//!         ReconcileOutcome::Ready { public } => println!("ready at {:?}", public.ip),
//!         ReconcileOutcome::Requeue(requeue) => println!("retry in {:?}", requeue.delay),
//!     }
//!     Ok(())
//! }
//! ```

pub mod bastion;
pub mod finalizers;
pub mod status;

pub use bastion::{
    delete_bastion, deleting_condition, error_condition, outcome_condition, reconcile,
    reconcile_bastion, DeleteOutcome, ReconcileOutcome, RequeueAfter,
};
