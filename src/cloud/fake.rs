// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`CloudClient`] for unit tests.
//!
//! Keeps subnets, security groups and instances in memory, records every call,
//! and can be told to fail a given operation or to hide freshly created groups
//! from describe calls (eventual consistency).

use super::{
    CloudClient, CloudResult, CreateSecurityGroupRequest, Filter, Instance, InstanceState,
    IpPermission, IpRange, RunInstancesRequest, SecurityGroup, Subnet, Tag,
};
use crate::constants::TAG_NAME;
use crate::errors::CloudError;
use crate::reconcilers::bastion::permissions::ip_permissions_equal;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A call received by [`FakeCloud`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    DescribeSubnets,
    DescribeSecurityGroups,
    CreateSecurityGroup(String),
    DeleteSecurityGroup(String),
    AuthorizeIngress(String, Vec<IpPermission>),
    AuthorizeEgress(String, Vec<IpPermission>),
    RevokeIngress(String, Vec<IpPermission>),
    RevokeEgress(String, Vec<IpPermission>),
    DescribeInstances,
    RunInstances(RunInstancesRequest),
    TerminateInstances(Vec<String>),
}

impl Call {
    /// True for calls that change backend state.
    pub(crate) fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::DescribeSubnets | Self::DescribeSecurityGroups | Self::DescribeInstances
        )
    }
}

#[derive(Default)]
struct State {
    subnets: Vec<Subnet>,
    groups: Vec<SecurityGroup>,
    instances: Vec<Instance>,
    calls: Vec<Call>,
    failures: HashMap<&'static str, CloudError>,
    hidden_groups: HashSet<String>,
    hide_new_groups: bool,
    next_id: u32,
}

impl State {
    fn record(&mut self, operation: &'static str, call: Call) -> CloudResult<()> {
        self.calls.push(call);
        match self.failures.get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:04}", self.next_id)
    }

    fn group_mut(&mut self, group_id: &str) -> CloudResult<&mut SecurityGroup> {
        self.groups
            .iter_mut()
            .find(|g| g.group_id == group_id)
            .ok_or_else(|| not_found(&format!("security group {group_id}")))
    }
}

fn not_found(what: &str) -> CloudError {
    CloudError::Api {
        status: 404,
        code: "NotFound".to_string(),
        message: format!("{what} does not exist"),
    }
}

fn tag_value<'a>(tags: &'a [Tag], key: &str) -> Option<&'a str> {
    tags.iter()
        .find(|t| t.key == key)
        .map(|t| t.value.as_str())
}

/// Every filter must match; `tag:<key>` filters look at tags, others at `fields`.
fn matches(filters: &[Filter], fields: &[(&str, &str)], tags: &[Tag]) -> bool {
    filters.iter().all(|filter| {
        let actual = match filter.name.strip_prefix("tag:") {
            Some(key) => tag_value(tags, key),
            None => fields
                .iter()
                .find(|(name, _)| *name == filter.name)
                .map(|(_, value)| *value),
        };
        actual.is_some_and(|value| filter.values.iter().any(|v| v == value))
    })
}

fn remove_permissions(rules: &mut Vec<IpPermission>, revoked: &[IpPermission]) {
    rules.retain(|rule| !revoked.iter().any(|r| ip_permissions_equal(rule, r)));
}

/// In-memory cloud backend.
#[derive(Default)]
pub(crate) struct FakeCloud {
    state: Mutex<State>,
}

impl FakeCloud {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub(crate) fn add_subnet(&self, subnet_id: &str, vpc_id: &str, name: &str) {
        self.state().subnets.push(Subnet {
            subnet_id: subnet_id.to_string(),
            vpc_id: vpc_id.to_string(),
            availability_zone: None,
            tags: vec![Tag::new(TAG_NAME, name)],
        });
    }

    pub(crate) fn add_security_group(&self, group: SecurityGroup) {
        self.state().groups.push(group);
    }

    pub(crate) fn add_instance(&self, instance: Instance) {
        self.state().instances.push(instance);
    }

    pub(crate) fn security_group(&self, group_id: &str) -> Option<SecurityGroup> {
        self.state()
            .groups
            .iter()
            .find(|g| g.group_id == group_id)
            .cloned()
    }

    pub(crate) fn security_group_by_name(&self, name: &str) -> Option<SecurityGroup> {
        self.state()
            .groups
            .iter()
            .find(|g| g.group_name == name)
            .cloned()
    }

    pub(crate) fn instances(&self) -> Vec<Instance> {
        self.state().instances.clone()
    }

    /// Assign addresses to an instance and mark it running.
    pub(crate) fn assign_endpoints(
        &self,
        instance_id: &str,
        private_ip: Option<&str>,
        public_ip: Option<&str>,
        public_dns: Option<&str>,
    ) {
        let mut state = self.state();
        if let Some(instance) = state
            .instances
            .iter_mut()
            .find(|i| i.instance_id == instance_id)
        {
            instance.state = InstanceState::Running;
            instance.private_ip_address = private_ip.map(str::to_string);
            instance.public_ip_address = public_ip.map(str::to_string);
            instance.public_dns_name = public_dns.map(str::to_string);
        }
    }

    pub(crate) fn set_instance_state(&self, instance_id: &str, new_state: InstanceState) {
        let mut state = self.state();
        if let Some(instance) = state
            .instances
            .iter_mut()
            .find(|i| i.instance_id == instance_id)
        {
            instance.state = new_state;
        }
    }

    /// Make `operation` (e.g. `"run_instances"`) fail with `error`.
    pub(crate) fn fail(&self, operation: &'static str, error: CloudError) {
        self.state().failures.insert(operation, error);
    }

    /// Groups created from now on are invisible to describe calls.
    pub(crate) fn hide_new_groups(&self) {
        self.state().hide_new_groups = true;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub(crate) fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub(crate) fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

#[async_trait]
impl CloudClient for FakeCloud {
    async fn describe_subnets(&self, filters: &[Filter]) -> CloudResult<Vec<Subnet>> {
        let mut state = self.state();
        state.record("describe_subnets", Call::DescribeSubnets)?;
        Ok(state
            .subnets
            .iter()
            .filter(|s| {
                matches(
                    filters,
                    &[("subnet-id", s.subnet_id.as_str()), ("vpc-id", s.vpc_id.as_str())],
                    &s.tags,
                )
            })
            .cloned()
            .collect())
    }

    async fn describe_security_groups(
        &self,
        filters: &[Filter],
    ) -> CloudResult<Vec<SecurityGroup>> {
        let mut state = self.state();
        state.record("describe_security_groups", Call::DescribeSecurityGroups)?;
        Ok(state
            .groups
            .iter()
            .filter(|g| !state.hidden_groups.contains(&g.group_id))
            .filter(|g| {
                matches(
                    filters,
                    &[
                        ("group-id", g.group_id.as_str()),
                        ("group-name", g.group_name.as_str()),
                        ("vpc-id", g.vpc_id.as_str()),
                    ],
                    &g.tags,
                )
            })
            .cloned()
            .collect())
    }

    async fn create_security_group(
        &self,
        request: &CreateSecurityGroupRequest,
    ) -> CloudResult<String> {
        let mut state = self.state();
        state.record(
            "create_security_group",
            Call::CreateSecurityGroup(request.group_name.clone()),
        )?;
        let group_id = state.next_id("sg");
        state.groups.push(SecurityGroup {
            group_id: group_id.clone(),
            group_name: request.group_name.clone(),
            vpc_id: request.vpc_id.clone(),
            description: Some(request.description.clone()),
            ip_permissions: Vec::new(),
            ip_permissions_egress: vec![IpPermission {
                ip_protocol: "-1".to_string(),
                ip_ranges: Some(vec![IpRange {
                    cidr_ip: "0.0.0.0/0".to_string(),
                    description: None,
                }]),
                ..Default::default()
            }],
            tags: request.tags.clone(),
        });
        if state.hide_new_groups {
            state.hidden_groups.insert(group_id.clone());
        }
        Ok(group_id)
    }

    async fn delete_security_group(&self, group_id: &str) -> CloudResult<()> {
        let mut state = self.state();
        state.record(
            "delete_security_group",
            Call::DeleteSecurityGroup(group_id.to_string()),
        )?;
        state.group_mut(group_id)?;
        state.groups.retain(|g| g.group_id != group_id);
        Ok(())
    }

    async fn authorize_security_group_ingress(
        &self,
        group_id: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()> {
        let mut state = self.state();
        state.record(
            "authorize_security_group_ingress",
            Call::AuthorizeIngress(group_id.to_string(), permissions.to_vec()),
        )?;
        state
            .group_mut(group_id)?
            .ip_permissions
            .extend_from_slice(permissions);
        Ok(())
    }

    async fn authorize_security_group_egress(
        &self,
        group_id: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()> {
        let mut state = self.state();
        state.record(
            "authorize_security_group_egress",
            Call::AuthorizeEgress(group_id.to_string(), permissions.to_vec()),
        )?;
        state
            .group_mut(group_id)?
            .ip_permissions_egress
            .extend_from_slice(permissions);
        Ok(())
    }

    async fn revoke_security_group_ingress(
        &self,
        group_id: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()> {
        let mut state = self.state();
        state.record(
            "revoke_security_group_ingress",
            Call::RevokeIngress(group_id.to_string(), permissions.to_vec()),
        )?;
        remove_permissions(&mut state.group_mut(group_id)?.ip_permissions, permissions);
        Ok(())
    }

    async fn revoke_security_group_egress(
        &self,
        group_id: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()> {
        let mut state = self.state();
        state.record(
            "revoke_security_group_egress",
            Call::RevokeEgress(group_id.to_string(), permissions.to_vec()),
        )?;
        remove_permissions(
            &mut state.group_mut(group_id)?.ip_permissions_egress,
            permissions,
        );
        Ok(())
    }

    async fn describe_instances(&self, filters: &[Filter]) -> CloudResult<Vec<Instance>> {
        let mut state = self.state();
        state.record("describe_instances", Call::DescribeInstances)?;
        Ok(state
            .instances
            .iter()
            .filter(|i| matches(filters, &[("instance-id", i.instance_id.as_str())], &i.tags))
            .cloned()
            .collect())
    }

    async fn run_instances(&self, request: &RunInstancesRequest) -> CloudResult<Vec<Instance>> {
        let mut state = self.state();
        state.record("run_instances", Call::RunInstances(request.clone()))?;
        let instance = Instance {
            instance_id: state.next_id("i"),
            state: InstanceState::Pending,
            tags: request.tags.clone(),
            ..Default::default()
        };
        state.instances.push(instance.clone());
        Ok(vec![instance])
    }

    async fn terminate_instances(&self, instance_ids: &[String]) -> CloudResult<()> {
        let mut state = self.state();
        state.record(
            "terminate_instances",
            Call::TerminateInstances(instance_ids.to_vec()),
        )?;
        for instance in &mut state.instances {
            if instance_ids.contains(&instance.instance_id) {
                instance.state = InstanceState::ShuttingDown;
            }
        }
        Ok(())
    }
}
