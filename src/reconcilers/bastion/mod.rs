// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Bastion` reconciliation.
//!
//! A provisioning pass runs three convergence steps in order and then gates on the
//! instance's endpoints:
//!
//! 1. [`security_group::ensure_security_group`] - bastion group with SSH ingress from
//!    the declared CIDRs and egress only to the workers
//! 2. [`instance::ensure_bastion_instance`] - exactly one tagged instance
//! 3. [`worker::ensure_worker_permissions`] - SSH from the bastion group into the
//!    worker group
//!
//! Until the instance has both a private and a public endpoint the pass returns
//! [`ReconcileOutcome::Requeue`]; once it does, the public endpoint is published in
//! `status.ingress`. Any failed step ends the pass with an error instead.
//!
//! Teardown is handled by [`delete::delete_bastion_resources`].

pub mod delete;
pub mod instance;
pub mod options;
pub mod permissions;
pub mod security_group;
pub mod types;
pub mod worker;

#[cfg(test)]
pub(crate) mod fixtures;

pub use options::{determine_options, BastionNames, Options};
pub use types::{DeleteOutcome, ReconcileOutcome, RequeueAfter};

use crate::cloud::CloudClient;
use crate::constants::NOT_READY_REQUEUE;
use crate::context::Context;
use crate::crd::Bastion;
use crate::errors::BastionError;
use crate::reconcilers::status::{KubeStatusSink, StatusSink};
use crate::status_reasons::{
    CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, REASON_BASTION_READY, REASON_DELETING,
    REASON_PROVISIONING,
};
use k8s_openapi::api::core::v1::LoadBalancerIngress;
use kube::ResourceExt;
use tracing::{debug, info};

/// Run one provisioning pass for `bastion` with already resolved options.
///
/// # Errors
///
/// Returns the first failing step's error; later steps do not run.
pub async fn reconcile_bastion(
    cloud: &dyn CloudClient,
    status: &dyn StatusSink,
    bastion: &Bastion,
    opt: &Options,
) -> Result<ReconcileOutcome, BastionError> {
    let ingress = permissions::ingress_permission(&bastion.spec.ingress)?;
    let egress = permissions::bastion_egress_permission(&opt.worker_security_group_id);

    let group_id = security_group::ensure_security_group(cloud, opt, &ingress, &egress).await?;
    let endpoints =
        instance::ensure_bastion_instance(cloud, opt, &group_id, &bastion.spec.user_data.0)
            .await?;
    worker::ensure_worker_permissions(cloud, opt, &group_id).await?;

    let public = match endpoints.public {
        Some(public) if endpoints.ready() => public,
        _ => {
            debug!(
                bastion = %bastion.name_any(),
                instance_name = %opt.names.instance_name,
                "Bastion instance has no public/private endpoints yet"
            );
            return Ok(ReconcileOutcome::Requeue(RequeueAfter::new(
                NOT_READY_REQUEUE,
                "bastion instance has no public/private endpoints yet",
            )));
        }
    };

    status.set_public_endpoint(bastion, &public).await?;
    info!(
        bastion = %bastion.name_any(),
        namespace = ?bastion.namespace(),
        hostname = ?public.hostname,
        ip = ?public.ip,
        "Bastion is ready"
    );
    Ok(ReconcileOutcome::Ready { public })
}

/// Resolve options for `bastion` and run a provisioning pass.
///
/// # Errors
///
/// Returns [`BastionError`] if option resolution or any step fails.
pub async fn reconcile(ctx: &Context, bastion: &Bastion) -> Result<ReconcileOutcome, BastionError> {
    let names = BastionNames::for_bastion(bastion, &ctx.infrastructure)?;
    let opt = determine_options(ctx.cloud.as_ref(), names, &ctx.infrastructure).await?;
    let sink = KubeStatusSink::new(ctx.client.clone());
    reconcile_bastion(ctx.cloud.as_ref(), &sink, bastion, &opt).await
}

/// Run a teardown pass for `bastion`.
///
/// # Errors
///
/// Returns [`BastionError`] if any teardown call fails.
pub async fn delete_bastion(ctx: &Context, bastion: &Bastion) -> Result<DeleteOutcome, BastionError> {
    let names = BastionNames::for_bastion(bastion, &ctx.infrastructure)?;
    delete::delete_bastion_resources(ctx.cloud.as_ref(), &names).await
}

/// Human-readable address of an endpoint, preferring the IP.
fn describe_endpoint(ingress: &LoadBalancerIngress) -> &str {
    ingress
        .ip
        .as_deref()
        .or(ingress.hostname.as_deref())
        .unwrap_or_default()
}

/// `Ready` condition (status, reason, message) describing a provisioning outcome.
#[must_use]
pub fn outcome_condition(outcome: &ReconcileOutcome) -> (&'static str, &'static str, String) {
    match outcome {
        ReconcileOutcome::Ready { public } => (
            CONDITION_STATUS_TRUE,
            REASON_BASTION_READY,
            format!("Bastion is reachable at {}", describe_endpoint(public)),
        ),
        ReconcileOutcome::Requeue(requeue) => (
            CONDITION_STATUS_FALSE,
            REASON_PROVISIONING,
            capitalize(&requeue.cause),
        ),
    }
}

/// `Ready` condition describing a teardown still in progress.
#[must_use]
pub fn deleting_condition(requeue: &RequeueAfter) -> (&'static str, &'static str, String) {
    (CONDITION_STATUS_FALSE, REASON_DELETING, capitalize(&requeue.cause))
}

/// `Ready` condition describing a failed pass.
#[must_use]
pub fn error_condition(error: &BastionError) -> (&'static str, &'static str, String) {
    (CONDITION_STATUS_FALSE, error.reason(), error.to_string())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
