// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `crd.rs`

#[cfg(test)]
mod tests {
    use crate::constants::{API_GROUP, API_VERSION, KIND_BASTION};
    use crate::crd::*;
    use k8s_openapi::api::core::v1::LoadBalancerIngress;
    use kube::CustomResourceExt;
    use serde_json::json;

    #[test]
    fn test_bastion_spec_from_json() {
        let spec: BastionSpec = serde_json::from_value(json!({
            "userData": "IyEvYmluL2Jhc2gKZWNobyBoZWxsbw==",
            "ingress": [
                {"ipBlock": {"cidr": "203.0.113.0/24"}},
                {"ipBlock": {"cidr": "2001:db8::/32", "except": ["2001:db8::/48"]}}
            ]
        }))
        .unwrap();

        assert_eq!(spec.user_data.0, b"#!/bin/bash\necho hello".to_vec());
        assert_eq!(spec.ingress.len(), 2);
        assert_eq!(spec.ingress[0].ip_block.cidr, "203.0.113.0/24");
        assert_eq!(spec.ingress[1].ip_block.cidr, "2001:db8::/32");
    }

    #[test]
    fn test_ingress_defaults_to_empty() {
        let spec: BastionSpec = serde_json::from_value(json!({"userData": ""})).unwrap();
        assert!(spec.ingress.is_empty());
        assert!(spec.user_data.0.is_empty());
    }

    #[test]
    fn test_status_serialization_skips_unset_fields() {
        let status = BastionStatus::default();
        assert_eq!(serde_json::to_value(&status).unwrap(), json!({"conditions": []}));

        let status = BastionStatus {
            ingress: Some(LoadBalancerIngress {
                ip: Some("203.0.113.10".to_string()),
                ..Default::default()
            }),
            observed_generation: Some(3),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({
                "conditions": [],
                "observedGeneration": 3,
                "ingress": {"ip": "203.0.113.10"}
            })
        );
    }

    #[test]
    fn test_crd_metadata() {
        let crd = Bastion::crd();
        assert_eq!(crd.metadata.name.as_deref(), Some("bastions.operator.bastion.io"));
        assert_eq!(crd.spec.group, API_GROUP);
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(crd.spec.names.kind, KIND_BASTION);
        assert_eq!(crd.spec.names.short_names, Some(vec!["bst".to_string()]));
        assert_eq!(crd.spec.versions[0].name, API_VERSION);
        assert!(crd.spec.versions[0]
            .subresources
            .as_ref()
            .and_then(|s| s.status.as_ref())
            .is_some());
    }

    #[test]
    fn test_crd_schema_user_data_is_string() {
        let crd = serde_json::to_value(Bastion::crd()).unwrap();
        let spec = crd
            .pointer("/spec/versions/0/schema/openAPIV3Schema/properties/spec")
            .unwrap();

        assert_eq!(
            spec.pointer("/properties/userData/type"),
            Some(&json!("string"))
        );
        assert!(spec["required"]
            .as_array()
            .unwrap()
            .contains(&json!("userData")));
    }

    #[test]
    fn test_condition_serialization() {
        let condition = Condition {
            r#type: "Ready".to_string(),
            status: "True".to_string(),
            reason: Some("BastionReady".to_string()),
            message: None,
            last_transition_time: None,
        };
        assert_eq!(
            serde_json::to_value(&condition).unwrap(),
            json!({"type": "Ready", "status": "True", "reason": "BastionReady"})
        );
    }
}
