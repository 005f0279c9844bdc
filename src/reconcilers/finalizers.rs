// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer management for namespaced custom resources.
//!
//! The bastion controller adds its finalizer before provisioning anything, so that
//! deleting a `Bastion` always goes through cloud teardown first.
//!
//! # Example
//!
//! ```rust,no_run
//! use bastion_controller::constants::BASTION_FINALIZER;
//! use bastion_controller::crd::Bastion;
//! use bastion_controller::reconcilers::finalizers::ensure_finalizer;
//! use kube::Client;
//!
//! # async fn example(client: Client, bastion: Bastion) {
//! ensure_finalizer(&client, &bastion, BASTION_FINALIZER).await.unwrap();
//! # }
//! ```

use crate::errors::BastionError;
use kube::api::{Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::json;
use tracing::info;

/// True if `finalizer` is set on the resource.
#[must_use]
pub fn has_finalizer<T: Resource>(resource: &T, finalizer: &str) -> bool {
    resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|x| x == finalizer))
}

/// Finalizer list of the resource with `finalizer` added or removed.
#[must_use]
pub fn finalizers_with<T: Resource>(resource: &T, finalizer: &str, present: bool) -> Vec<String> {
    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    finalizers.retain(|f| f != finalizer);
    if present {
        finalizers.push(finalizer.to_string());
    }
    finalizers
}

async fn patch_finalizers<T>(
    client: &Client,
    resource: &T,
    finalizers: Vec<String>,
) -> Result<(), BastionError>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();

    let api: Api<T> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(|source| BastionError::Kubernetes {
            name: format!("{namespace}/{name}"),
            source,
        })?;
    Ok(())
}

/// Add a finalizer to a resource if not already present.
///
/// # Errors
///
/// Returns [`BastionError::Kubernetes`] if the patch fails.
pub async fn ensure_finalizer<T>(
    client: &Client,
    resource: &T,
    finalizer: &str,
) -> Result<(), BastionError>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if has_finalizer(resource, finalizer) {
        return Ok(());
    }

    info!(
        "Adding finalizer {} to {}/{} {}",
        finalizer,
        resource.namespace().unwrap_or_default(),
        resource.name_any(),
        T::kind(&())
    );
    patch_finalizers(client, resource, finalizers_with(resource, finalizer, true)).await
}

/// Remove a finalizer from a resource if present.
///
/// # Errors
///
/// Returns [`BastionError::Kubernetes`] if the patch fails.
pub async fn remove_finalizer<T>(
    client: &Client,
    resource: &T,
    finalizer: &str,
) -> Result<(), BastionError>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if !has_finalizer(resource, finalizer) {
        return Ok(());
    }

    info!(
        "Removing finalizer {} from {}/{} {}",
        finalizer,
        resource.namespace().unwrap_or_default(),
        resource.name_any(),
        T::kind(&())
    );
    patch_finalizers(client, resource, finalizers_with(resource, finalizer, false)).await
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
