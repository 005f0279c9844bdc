// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! JSON-over-HTTP implementation of [`CloudClient`].
//!
//! # Endpoints
//!
//! | Operation | Method | Path |
//! |-----------|--------|------|
//! | describe subnets | GET | `v1/subnets` |
//! | describe security groups | GET | `v1/security-groups` |
//! | create security group | POST | `v1/security-groups` |
//! | delete security group | DELETE | `v1/security-groups/{id}` |
//! | authorize/revoke rules | POST | `v1/security-groups/{id}/{ingress,egress}/{authorize,revoke}` |
//! | describe instances | GET | `v1/instances` |
//! | run instances | POST | `v1/instances` |
//! | terminate instances | POST | `v1/instances/terminate` |
//!
//! Describe filters travel as query parameters `filter.<name>=<value>`, repeated for
//! multiple values. Non-2xx responses carry `{"code": ..., "message": ...}`.

use super::types::{
    ApiErrorBody, CreateSecurityGroupResponse, DescribeSecurityGroupsResponse,
    DescribeSubnetsResponse, InstancesResponse, PermissionsRequest, TerminateInstancesRequest,
};
use super::{
    CloudClient, CloudResult, CreateSecurityGroupRequest, Filter, Instance, IpPermission,
    RunInstancesRequest, SecurityGroup, Subnet,
};
use crate::cloud_errors::map_cloud_error_to_reason;
use crate::constants::{CLOUD_API_CONNECT_TIMEOUT_SECS, FILTER_QUERY_PREFIX};
use crate::errors::CloudError;
use crate::metrics::record_cloud_api_call;
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error};
use url::Url;

/// Cloud API client speaking JSON over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpCloudClient {
    client: HttpClient,
    base_url: Url,
    token: Option<String>,
}

impl HttpCloudClient {
    /// Create a client for the API at `endpoint`, authenticating with a bearer
    /// token when one is given.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::InvalidEndpoint`] if `endpoint` is not an absolute
    /// http(s) URL, or [`CloudError::Transport`] if the HTTP client cannot be built.
    pub fn new(endpoint: &str, token: Option<String>) -> CloudResult<Self> {
        let client = HttpClient::builder()
            .connect_timeout(Duration::from_secs(CLOUD_API_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| CloudError::Transport {
                url: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        Self::with_client(client, endpoint, token)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::InvalidEndpoint`] if `endpoint` is not an absolute
    /// http(s) URL.
    pub fn with_client(
        client: HttpClient,
        endpoint: &str,
        token: Option<String>,
    ) -> CloudResult<Self> {
        Ok(Self {
            client,
            base_url: build_base_url(endpoint)?,
            token,
        })
    }

    /// Base URL all request paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base URL and append describe filters.
    pub(crate) fn url(&self, path: &str, filters: &[Filter]) -> CloudResult<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| CloudError::InvalidEndpoint {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })?;
        if !filters.is_empty() {
            let mut query = url.query_pairs_mut();
            for filter in filters {
                let key = format!("{FILTER_QUERY_PREFIX}{}", filter.name);
                for value in &filter.values {
                    query.append_pair(&key, value);
                }
            }
        }
        Ok(url)
    }

    /// Send one request and return the raw response body.
    ///
    /// Records the call in `cloud_api_calls_total` whatever the outcome.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> CloudResult<String> {
        let start = Instant::now();
        let result = self.execute_inner(operation, method, url, body).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => map_cloud_error_to_reason(e).0,
        };
        record_cloud_api_call(operation, outcome, start.elapsed());
        result
    }

    async fn execute_inner<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> CloudResult<String> {
        debug!(
            operation,
            method = %method,
            url = %url,
            auth_enabled = self.token.is_some(),
            "Cloud API request"
        );

        let url_text = url.to_string();
        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| CloudError::Transport {
            url: url_text.clone(),
            reason: e.to_string(),
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| CloudError::Transport {
            url: url_text.clone(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let code = if body.code.is_empty() {
                "Unknown".to_string()
            } else {
                body.code
            };
            let message = if body.message.is_empty() {
                text
            } else {
                body.message
            };
            error!(
                operation,
                method = %method,
                url = %url_text,
                status = status.as_u16(),
                code = %code,
                error = %message,
                "Cloud API request failed"
            );
            return Err(CloudError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        debug!(
            operation,
            url = %url_text,
            status = status.as_u16(),
            response_len = text.len(),
            "Cloud API request successful"
        );
        Ok(text)
    }

    async fn get<R: DeserializeOwned>(&self, operation: &'static str, url: Url) -> CloudResult<R> {
        let url_text = url.to_string();
        let text = self.execute::<()>(operation, Method::GET, url, None).await?;
        decode(&url_text, &text)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        url: Url,
        body: &B,
    ) -> CloudResult<String> {
        self.execute(operation, Method::POST, url, Some(body)).await
    }

    async fn change_rules(
        &self,
        operation: &'static str,
        group_id: &str,
        direction: &str,
        action: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()> {
        let url = self.url(
            &format!("v1/security-groups/{group_id}/{direction}/{action}"),
            &[],
        )?;
        self.post(
            operation,
            url,
            &PermissionsRequest {
                ip_permissions: permissions,
            },
        )
        .await?;
        Ok(())
    }
}

/// Parse and normalize the configured endpoint.
///
/// The path always ends with `/` so that relative request paths extend it
/// instead of replacing its last segment.
pub(crate) fn build_base_url(endpoint: &str) -> CloudResult<Url> {
    let invalid = |reason: String| CloudError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let mut url = Url::parse(endpoint.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn decode<R: DeserializeOwned>(url: &str, text: &str) -> CloudResult<R> {
    serde_json::from_str(text).map_err(|e| CloudError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl CloudClient for HttpCloudClient {
    async fn describe_subnets(&self, filters: &[Filter]) -> CloudResult<Vec<Subnet>> {
        let url = self.url("v1/subnets", filters)?;
        let response: DescribeSubnetsResponse = self.get("describe_subnets", url).await?;
        Ok(response.subnets)
    }

    async fn describe_security_groups(
        &self,
        filters: &[Filter],
    ) -> CloudResult<Vec<SecurityGroup>> {
        let url = self.url("v1/security-groups", filters)?;
        let response: DescribeSecurityGroupsResponse =
            self.get("describe_security_groups", url).await?;
        Ok(response.security_groups)
    }

    async fn create_security_group(
        &self,
        request: &CreateSecurityGroupRequest,
    ) -> CloudResult<String> {
        let url = self.url("v1/security-groups", &[])?;
        let url_text = url.to_string();
        let text = self.post("create_security_group", url, request).await?;
        let response: CreateSecurityGroupResponse = decode(&url_text, &text)?;
        Ok(response.group_id)
    }

    async fn delete_security_group(&self, group_id: &str) -> CloudResult<()> {
        let url = self.url(&format!("v1/security-groups/{group_id}"), &[])?;
        self.execute::<()>("delete_security_group", Method::DELETE, url, None)
            .await?;
        Ok(())
    }

    async fn authorize_security_group_ingress(
        &self,
        group_id: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()> {
        self.change_rules(
            "authorize_security_group_ingress",
            group_id,
            "ingress",
            "authorize",
            permissions,
        )
        .await
    }

    async fn authorize_security_group_egress(
        &self,
        group_id: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()> {
        self.change_rules(
            "authorize_security_group_egress",
            group_id,
            "egress",
            "authorize",
            permissions,
        )
        .await
    }

    async fn revoke_security_group_ingress(
        &self,
        group_id: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()> {
        self.change_rules(
            "revoke_security_group_ingress",
            group_id,
            "ingress",
            "revoke",
            permissions,
        )
        .await
    }

    async fn revoke_security_group_egress(
        &self,
        group_id: &str,
        permissions: &[IpPermission],
    ) -> CloudResult<()> {
        self.change_rules(
            "revoke_security_group_egress",
            group_id,
            "egress",
            "revoke",
            permissions,
        )
        .await
    }

    async fn describe_instances(&self, filters: &[Filter]) -> CloudResult<Vec<Instance>> {
        let url = self.url("v1/instances", filters)?;
        let response: InstancesResponse = self.get("describe_instances", url).await?;
        Ok(response.instances)
    }

    async fn run_instances(&self, request: &RunInstancesRequest) -> CloudResult<Vec<Instance>> {
        let url = self.url("v1/instances", &[])?;
        let url_text = url.to_string();
        let text = self.post("run_instances", url, request).await?;
        let response: InstancesResponse = decode(&url_text, &text)?;
        Ok(response.instances)
    }

    async fn terminate_instances(&self, instance_ids: &[String]) -> CloudResult<()> {
        let url = self.url("v1/instances/terminate", &[])?;
        self.post(
            "terminate_instances",
            url,
            &TerminateInstancesRequest { instance_ids },
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod http_tests;
