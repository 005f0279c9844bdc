// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator configuration.
//!
//! Loaded once at startup from a YAML file:
//!
//! ```yaml
//! cloud:
//!   endpoint: https://compute.example.com/api
//!   tokenFile: /var/run/secrets/cloud/token
//! infrastructure:
//!   imageId: img-0123456789
//!   instanceType: t3.nano
//!   ipv6: false
//! ```

use crate::errors::BastionError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    pub cloud: CloudConfig,
    pub infrastructure: InfrastructureConfig,
}

/// How to reach the cloud compute API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudConfig {
    /// Base URL of the API.
    pub endpoint: String,

    /// File holding a bearer token; requests are unauthenticated when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

/// Settings shared by every bastion this operator provisions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureConfig {
    /// Machine image of bastion instances.
    pub image_id: String,

    /// Instance size class of bastion instances.
    pub instance_type: String,

    /// Give bastions a primary IPv6 address in addition to IPv4.
    #[serde(default)]
    pub ipv6: bool,

    /// Subnet name overriding `<cluster>-public-utility-z0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_name: Option<String>,

    /// Worker security group name overriding `<cluster>-nodes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_security_group_name: Option<String>,
}

impl OperatorConfig {
    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`BastionError::Config`] if the YAML is malformed or a required
    /// field is empty.
    pub fn from_yaml(yaml: &str) -> Result<Self, BastionError> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| BastionError::Config(format!("cannot parse configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BastionError::Config`] if the file cannot be read or is invalid.
    pub async fn load(path: &Path) -> Result<Self, BastionError> {
        let yaml = tokio::fs::read_to_string(path).await.map_err(|e| {
            BastionError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&yaml)
    }

    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns [`BastionError::Config`] naming the first empty required field.
    pub fn validate(&self) -> Result<(), BastionError> {
        let required = [
            ("cloud.endpoint", &self.cloud.endpoint),
            ("infrastructure.imageId", &self.infrastructure.image_id),
            ("infrastructure.instanceType", &self.infrastructure.instance_type),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(BastionError::Config(format!("{field} must not be empty")));
            }
        }
        for (field, value) in [
            ("infrastructure.subnetName", &self.infrastructure.subnet_name),
            (
                "infrastructure.workerSecurityGroupName",
                &self.infrastructure.worker_security_group_name,
            ),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(BastionError::Config(format!(
                    "{field} must not be empty when set"
                )));
            }
        }
        Ok(())
    }
}

impl CloudConfig {
    /// Read the bearer token, if one is configured. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`BastionError::Config`] if the token file cannot be read or is empty.
    pub async fn read_token(&self) -> Result<Option<String>, BastionError> {
        let Some(path) = &self.token_file else {
            return Ok(None);
        };
        let token = tokio::fs::read_to_string(path).await.map_err(|e| {
            BastionError::Config(format!("cannot read token file {}: {e}", path.display()))
        })?;
        let token = token.trim();
        if token.is_empty() {
            return Err(BastionError::Config(format!(
                "token file {} is empty",
                path.display()
            )));
        }
        Ok(Some(token.to_string()))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
