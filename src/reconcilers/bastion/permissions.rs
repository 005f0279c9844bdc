// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Authorization rules of a bastion.
//!
//! Builds the canonical ingress rule from the declared CIDRs, the egress rule from
//! the bastion to the workers, the matching worker ingress rule, and compares rules
//! the way the backend does.

use crate::cloud::{IpPermission, IpRange, Ipv6Range, UserIdGroupPair};
use crate::constants::{PROTOCOL_TCP, SSH_PORT};
use crate::crd::BastionIngressPolicy;
use crate::errors::BastionError;
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A declared address block, resolved to its address family once at parse time.
///
/// Host bits are always zeroed: `10.1.2.3/8` parses to `10.0.0.0/8`, matching the
/// normalization the backend applies to stored rules.
///
/// The family follows the written notation. An IPv4-mapped IPv6 block such as
/// `::ffff:10.0.0.0/104` stays an [`CidrBlock::Ipv6Block`] and lands in the IPv6
/// range list unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CidrBlock {
    Ipv4Block(Ipv4Net),
    Ipv6Block(Ipv6Net),
}

impl FromStr for CidrBlock {
    type Err = BastionError;

    fn from_str(cidr: &str) -> Result<Self, Self::Err> {
        let net = IpNet::from_str(cidr).map_err(|e| BastionError::InvalidIngressCidr {
            cidr: cidr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(match net.trunc() {
            IpNet::V4(net) => Self::Ipv4Block(net),
            IpNet::V6(net) => Self::Ipv6Block(net),
        })
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4Block(net) => fmt::Display::fmt(net, f),
            Self::Ipv6Block(net) => fmt::Display::fmt(net, f),
        }
    }
}

fn ssh_permission() -> IpPermission {
    IpPermission {
        ip_protocol: PROTOCOL_TCP.to_string(),
        from_port: Some(SSH_PORT),
        to_port: Some(SSH_PORT),
        ..Default::default()
    }
}

fn group_permission(group_id: &str) -> IpPermission {
    IpPermission {
        user_id_group_pairs: Some(vec![UserIdGroupPair {
            group_id: group_id.to_string(),
            description: None,
        }]),
        ..ssh_permission()
    }
}

/// Build the single SSH ingress rule covering every declared address block.
///
/// IPv4 and IPv6 blocks go into separate lists of the same rule. A list is left
/// `None` when its family has no blocks; duplicates after normalization are dropped.
/// Rule descriptions are never set.
///
/// # Errors
///
/// Returns [`BastionError::InvalidIngressCidr`] for the first CIDR that does not
/// parse; no partial rule is returned.
pub fn ingress_permission(policies: &[BastionIngressPolicy]) -> Result<IpPermission, BastionError> {
    let mut ipv4: Vec<IpRange> = Vec::new();
    let mut ipv6: Vec<Ipv6Range> = Vec::new();
    let mut seen = BTreeSet::new();

    for policy in policies {
        let block: CidrBlock = policy.ip_block.cidr.parse()?;
        if !seen.insert(block) {
            continue;
        }
        match block {
            CidrBlock::Ipv4Block(net) => ipv4.push(IpRange {
                cidr_ip: net.to_string(),
                description: None,
            }),
            CidrBlock::Ipv6Block(net) => ipv6.push(Ipv6Range {
                cidr_ipv6: net.to_string(),
                description: None,
            }),
        }
    }

    Ok(IpPermission {
        ip_ranges: (!ipv4.is_empty()).then_some(ipv4),
        ipv6_ranges: (!ipv6.is_empty()).then_some(ipv6),
        ..ssh_permission()
    })
}

/// Egress rule letting the bastion reach the worker group on the SSH port, and nothing else.
#[must_use]
pub fn bastion_egress_permission(worker_security_group_id: &str) -> IpPermission {
    group_permission(worker_security_group_id)
}

/// Ingress rule on the worker group admitting SSH from the bastion group.
#[must_use]
pub fn worker_ingress_permission(bastion_security_group_id: &str) -> IpPermission {
    group_permission(bastion_security_group_id)
}

/// True if the rule names at least one source or destination.
#[must_use]
pub fn has_peers(permission: &IpPermission) -> bool {
    permission.ip_ranges.as_ref().is_some_and(|r| !r.is_empty())
        || permission.ipv6_ranges.as_ref().is_some_and(|r| !r.is_empty())
        || permission
            .user_id_group_pairs
            .as_ref()
            .is_some_and(|p| !p.is_empty())
}

/// Normalized form of a CIDR as stored by the backend; unparsable values compare verbatim.
fn normalize_cidr(cidr: &str) -> String {
    cidr.parse::<CidrBlock>()
        .map_or_else(|_| cidr.to_string(), |block| block.to_string())
}

fn ipv4_set(permission: &IpPermission) -> BTreeSet<String> {
    permission
        .ip_ranges
        .iter()
        .flatten()
        .map(|r| normalize_cidr(&r.cidr_ip))
        .collect()
}

fn ipv6_set(permission: &IpPermission) -> BTreeSet<String> {
    permission
        .ipv6_ranges
        .iter()
        .flatten()
        .map(|r| normalize_cidr(&r.cidr_ipv6))
        .collect()
}

fn group_set(permission: &IpPermission) -> BTreeSet<&str> {
    permission
        .user_id_group_pairs
        .iter()
        .flatten()
        .map(|p| p.group_id.as_str())
        .collect()
}

/// Compare two rules as the backend does.
///
/// Protocol, port range and the sets of address blocks and group references must
/// match. Order, duplicates and descriptions are ignored, and an absent list equals
/// an empty one.
#[must_use]
pub fn ip_permissions_equal(a: &IpPermission, b: &IpPermission) -> bool {
    a.ip_protocol.eq_ignore_ascii_case(&b.ip_protocol)
        && a.from_port == b.from_port
        && a.to_port == b.to_port
        && ipv4_set(a) == ipv4_set(b)
        && ipv6_set(a) == ipv6_set(b)
        && group_set(a) == group_set(b)
}

/// True if any rule in `rules` equals `permission`.
#[must_use]
pub fn security_group_has_permission(rules: &[IpPermission], permission: &IpPermission) -> bool {
    rules.iter().any(|rule| ip_permissions_equal(rule, permission))
}

#[cfg(test)]
#[path = "permissions_tests.rs"]
mod permissions_tests;
