// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for bastion error types.

#[cfg(test)]
mod tests {
    use crate::errors::*;
    use crate::status_reasons::*;

    fn throttled() -> CloudError {
        CloudError::Api {
            status: 429,
            code: "RequestLimitExceeded".to_string(),
            message: "slow down".to_string(),
        }
    }

    #[test]
    fn test_cloud_api_error_display() {
        assert_eq!(
            throttled().to_string(),
            "cloud API returned HTTP 429 (RequestLimitExceeded): slow down"
        );
    }

    #[test]
    fn test_cloud_error_status() {
        assert_eq!(throttled().status(), Some(429));
        let transport = CloudError::Transport {
            url: "http://localhost".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(transport.status(), None);
    }

    #[test]
    fn test_backend_error_names_operation() {
        let error = BastionError::cloud("create security group", throttled());
        assert_eq!(error.kind(), ErrorKind::Backend);
        assert_eq!(error.reason(), REASON_CLOUD_THROTTLED);
        assert!(error
            .to_string()
            .starts_with("failed to create security group: "));
    }

    #[test]
    fn test_invalid_ingress_is_validation() {
        let error = BastionError::InvalidIngressCidr {
            cidr: "not-a-cidr".to_string(),
            reason: "invalid IP address syntax".to_string(),
        };
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.reason(), REASON_INVALID_INGRESS);
        assert!(error.to_string().contains("\"not-a-cidr\""));
    }

    #[test]
    fn test_missing_prerequisite() {
        let error = BastionError::MissingPrerequisite {
            resource: "worker security group",
            name: "shoot--dev--cluster-nodes".to_string(),
        };
        assert_eq!(error.kind(), ErrorKind::MissingPrerequisite);
        assert_eq!(error.reason(), REASON_PREREQUISITE_MISSING);
        assert_eq!(
            error.to_string(),
            "cannot find worker security group \"shoot--dev--cluster-nodes\""
        );
    }

    #[test]
    fn test_config_error() {
        let error = BastionError::Config("cloud.endpoint must not be empty".to_string());
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.reason(), REASON_INVALID_CONFIGURATION);
    }
}
