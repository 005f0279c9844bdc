// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared test fixtures for bastion reconciliation tests.

use super::options::{BastionNames, Options};
use super::permissions::{bastion_egress_permission, ingress_permission};
use crate::cloud::fake::FakeCloud;
use crate::cloud::{IpPermission, SecurityGroup, Tag};
use crate::config::InfrastructureConfig;
use crate::constants::TAG_NAME;
use crate::crd::{Bastion, BastionIngressPolicy, BastionSpec};
use crate::errors::BastionError;
use crate::reconcilers::status::StatusSink;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::LoadBalancerIngress;
use k8s_openapi::api::networking::v1::IPBlock;
use k8s_openapi::ByteString;
use std::sync::Mutex;

pub(crate) const CLUSTER: &str = "shoot--dev--c1";
pub(crate) const BASTION: &str = "b1";
pub(crate) const VPC_ID: &str = "vpc-1";
pub(crate) const SUBNET_ID: &str = "subnet-1";
pub(crate) const WORKER_GROUP_ID: &str = "sg-workers";
pub(crate) const USER_DATA: &[u8] = b"#!/bin/bash\necho hello";

pub(crate) fn infrastructure() -> InfrastructureConfig {
    InfrastructureConfig {
        image_id: "img-1".to_string(),
        instance_type: "t3.nano".to_string(),
        ..Default::default()
    }
}

pub(crate) fn names() -> BastionNames {
    BastionNames::new(CLUSTER, BASTION, &infrastructure())
}

pub(crate) fn options() -> Options {
    Options {
        names: names(),
        vpc_id: VPC_ID.to_string(),
        subnet_id: SUBNET_ID.to_string(),
        worker_security_group_id: WORKER_GROUP_ID.to_string(),
        image_id: "img-1".to_string(),
        instance_type: "t3.nano".to_string(),
        ipv6: false,
    }
}

pub(crate) fn policy(cidr: &str) -> BastionIngressPolicy {
    BastionIngressPolicy {
        ip_block: IPBlock {
            cidr: cidr.to_string(),
            except: None,
        },
    }
}

pub(crate) fn bastion(cidrs: &[&str]) -> Bastion {
    let mut bastion = Bastion::new(
        BASTION,
        BastionSpec {
            user_data: ByteString(USER_DATA.to_vec()),
            ingress: cidrs.iter().map(|c| policy(c)).collect(),
        },
    );
    bastion.metadata.namespace = Some(CLUSTER.to_string());
    bastion.metadata.generation = Some(1);
    bastion
}

pub(crate) fn ingress(cidrs: &[&str]) -> IpPermission {
    let policies: Vec<_> = cidrs.iter().map(|c| policy(c)).collect();
    ingress_permission(&policies).unwrap()
}

pub(crate) fn egress() -> IpPermission {
    bastion_egress_permission(WORKER_GROUP_ID)
}

/// A backend with the cluster's public subnet and worker group.
pub(crate) fn cloud_with_network() -> FakeCloud {
    let cloud = FakeCloud::new();
    let names = names();
    cloud.add_subnet(SUBNET_ID, VPC_ID, &names.subnet_name);
    cloud.add_security_group(SecurityGroup {
        group_id: WORKER_GROUP_ID.to_string(),
        group_name: names.worker_security_group_name.clone(),
        vpc_id: VPC_ID.to_string(),
        tags: vec![Tag::new(TAG_NAME, &names.worker_security_group_name)],
        ..Default::default()
    });
    cloud
}

/// [`StatusSink`] remembering every published endpoint.
#[derive(Default)]
pub(crate) struct RecordingStatusSink {
    pub(crate) published: Mutex<Vec<LoadBalancerIngress>>,
}

impl RecordingStatusSink {
    pub(crate) fn published(&self) -> Vec<LoadBalancerIngress> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusSink for RecordingStatusSink {
    async fn set_public_endpoint(
        &self,
        _bastion: &Bastion,
        ingress: &LoadBalancerIngress,
    ) -> Result<(), BastionError> {
        self.published.lock().unwrap().push(ingress.clone());
        Ok(())
    }
}
