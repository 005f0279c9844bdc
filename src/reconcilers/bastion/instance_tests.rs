// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for bastion instance convergence.

#[cfg(test)]
mod tests {
    use crate::cloud::fake::Call;
    use crate::cloud::{Instance, InstanceState, Tag};
    use crate::errors::{CloudError, ErrorKind};
    use crate::reconcilers::bastion::fixtures::*;
    use crate::reconcilers::bastion::instance::*;
    use k8s_openapi::api::core::v1::LoadBalancerIngress;

    const INSTANCE_NAME: &str = "shoot--dev--c1-b1-bastion";

    fn tagged_instance(id: &str, state: InstanceState) -> Instance {
        Instance {
            instance_id: id.to_string(),
            state,
            tags: vec![Tag::new("Name", INSTANCE_NAME)],
            ..Default::default()
        }
    }

    #[test]
    fn test_address_to_ingress() {
        assert_eq!(address_to_ingress(None, None), None);
        assert_eq!(address_to_ingress(Some(""), Some("")), None);

        let ingress = address_to_ingress(Some("bastion.example.com"), Some("")).unwrap();
        assert_eq!(ingress.hostname.as_deref(), Some("bastion.example.com"));
        assert_eq!(ingress.ip, None);

        let ingress = address_to_ingress(None, Some("10.0.0.5")).unwrap();
        assert_eq!(ingress.hostname, None);
        assert_eq!(ingress.ip.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn test_ingress_ready() {
        assert!(!ingress_ready(None));
        assert!(!ingress_ready(Some(&LoadBalancerIngress::default())));
        assert!(!ingress_ready(Some(&LoadBalancerIngress {
            hostname: Some(String::new()),
            ip: Some(String::new()),
            ..Default::default()
        })));
        assert!(ingress_ready(Some(&LoadBalancerIngress {
            ip: Some("203.0.113.10".to_string()),
            ..Default::default()
        })));
    }

    #[test]
    fn test_endpoints_need_both_sides() {
        let mut instance = tagged_instance("i-1", InstanceState::Running);
        instance.private_ip_address = Some("10.0.0.5".to_string());
        assert!(!BastionEndpoints::from_instance(&instance).ready());

        instance.public_dns_name = Some("ec2-203-0-113-10.example.com".to_string());
        let endpoints = BastionEndpoints::from_instance(&instance);
        assert!(endpoints.ready());
        assert_eq!(
            endpoints.public.unwrap().hostname.as_deref(),
            Some("ec2-203-0-113-10.example.com")
        );
    }

    #[test]
    fn test_run_instances_request() {
        let request = run_instances_request(&options(), "sg-0001", USER_DATA);

        assert_eq!(request.image_id, "img-1");
        assert_eq!(request.instance_type, "t3.nano");
        assert_eq!(request.user_data, "IyEvYmluL2Jhc2gKZWNobyBoZWxsbw==");
        assert_eq!((request.min_count, request.max_count), (1, 1));
        assert_eq!(request.tags, vec![Tag::new("Name", INSTANCE_NAME)]);

        let nic = &request.network_interfaces[0];
        assert_eq!(request.network_interfaces.len(), 1);
        assert_eq!(nic.device_index, 0);
        assert_eq!(nic.subnet_id, SUBNET_ID);
        assert_eq!(nic.groups, vec!["sg-0001".to_string()]);
        assert!(nic.associate_public_ip_address);
        assert_eq!(nic.ipv6_address_count, None);
        assert_eq!(nic.primary_ipv6, None);
    }

    #[test]
    fn test_run_instances_request_ipv6() {
        let opt = crate::reconcilers::bastion::Options {
            ipv6: true,
            ..options()
        };
        let request = run_instances_request(&opt, "sg-0001", USER_DATA);
        let nic = &request.network_interfaces[0];
        assert_eq!(nic.ipv6_address_count, Some(1));
        assert_eq!(nic.primary_ipv6, Some(true));
    }

    #[tokio::test]
    async fn test_launches_missing_instance() {
        let cloud = cloud_with_network();

        let endpoints = ensure_bastion_instance(&cloud, &options(), "sg-0001", USER_DATA)
            .await
            .unwrap();

        assert!(!endpoints.ready());
        assert_eq!(endpoints, BastionEndpoints::default());

        let runs: Vec<_> = cloud
            .mutations()
            .into_iter()
            .filter(|c| matches!(c, Call::RunInstances(_)))
            .collect();
        assert_eq!(runs.len(), 1);
        assert_eq!(cloud.instances().len(), 1);
    }

    #[tokio::test]
    async fn test_existing_instance_is_reused() {
        let cloud = cloud_with_network();
        cloud.add_instance(tagged_instance("i-1", InstanceState::Pending));
        cloud.assign_endpoints(
            "i-1",
            Some("10.0.0.5"),
            None,
            Some("ec2-203-0-113-10.example.com"),
        );

        let endpoints = ensure_bastion_instance(&cloud, &options(), "sg-0001", USER_DATA)
            .await
            .unwrap();

        assert!(endpoints.ready());
        assert_eq!(endpoints.private.unwrap().ip.as_deref(), Some("10.0.0.5"));
        assert!(cloud.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_terminated_instances_are_ignored() {
        let cloud = cloud_with_network();
        cloud.add_instance(tagged_instance("i-old", InstanceState::Terminated));
        cloud.add_instance(tagged_instance("i-leaving", InstanceState::ShuttingDown));

        ensure_bastion_instance(&cloud, &options(), "sg-0001", USER_DATA)
            .await
            .unwrap();

        assert_eq!(
            cloud
                .mutations()
                .iter()
                .filter(|c| matches!(c, Call::RunInstances(_)))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_launch_failure() {
        let cloud = cloud_with_network();
        cloud.fail(
            "run_instances",
            CloudError::Api {
                status: 400,
                code: "InvalidAMIID.NotFound".to_string(),
                message: "image img-1 does not exist".to_string(),
            },
        );

        let err = ensure_bastion_instance(&cloud, &options(), "sg-0001", USER_DATA)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(err.to_string().contains("run bastion instance"));
        assert!(cloud.instances().is_empty());
    }
}
