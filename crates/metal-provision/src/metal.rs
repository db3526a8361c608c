use async_trait::async_trait;
use metal_api::{CreateDeviceRequest, MetalClient};
use tracing::debug;

use crate::types::{ProvisionRequest, ServerId};
use crate::{DeviceApi, IpLookupError, ProvisioningError, Result};

/// Equinix Metal device provider.
///
/// Delegates to `metal_api::MetalClient` for all HTTP calls.
pub struct MetalProvider {
    client: MetalClient,
}

impl MetalProvider {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeviceApi for MetalProvider {
    async fn create_device(&self, req: &ProvisionRequest) -> Result<ServerId> {
        let device = self
            .client
            .create_device(&CreateDeviceRequest {
                metro: req.metro.clone(),
                operating_system: req.operating_system.clone(),
                plan: req.plan.clone(),
                user_data: req.user_data.clone(),
            })
            .await
            .map_err(ProvisioningError::CreationFailed)?;

        debug!(
            device_id = %device.id,
            project = self.client.project_id(),
            "metal: device created"
        );
        Ok(ServerId(device.id))
    }

    async fn fetch_state(&self, id: &ServerId) -> Result<String> {
        let device = self
            .client
            .get_device(&id.0)
            .await
            .map_err(|source| ProvisioningError::PollFailed {
                id: id.clone(),
                source,
            })?;

        Ok(device.state)
    }

    async fn fetch_ip_address(&self, id: &ServerId) -> Result<String> {
        let lookup_failed = |source: IpLookupError| ProvisioningError::IpLookupFailed {
            id: id.clone(),
            source,
        };

        let device = self
            .client
            .get_device(&id.0)
            .await
            .map_err(|e| lookup_failed(IpLookupError::Api(e)))?;

        device
            .primary_address()
            .map(str::to_owned)
            .ok_or_else(|| lookup_failed(IpLookupError::NoAddress))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::{Orchestrator, ProvisionSettings};

    fn provider_for(server: &MockServer) -> MetalProvider {
        MetalProvider::new(MetalClient::new("token", "proj-1").with_base_url(server.uri()))
    }

    fn request() -> ProvisionRequest {
        ProvisionRequest {
            metro: "da".into(),
            plan: "c3.small.x86".into(),
            operating_system: "ubuntu_22_04".into(),
            user_data: None,
        }
    }

    #[tokio::test]
    async fn rejected_create_never_polls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/proj-1/devices"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid plan"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "unused",
                "state": "active",
            })))
            .expect(0)
            .mount(&server)
            .await;

        let orchestrator = Orchestrator::new(
            std::sync::Arc::new(provider_for(&server)),
            ProvisionSettings::new(Duration::from_secs(60)),
        );
        let err = orchestrator.run(&request()).await.unwrap_err();

        match err {
            ProvisioningError::CreationFailed(metal_api::Error::Api { status, body, .. }) => {
                assert_eq!(status.as_u16(), 422);
                assert_eq!(body, "invalid plan");
            }
            other => panic!("expected CreationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn poll_error_maps_to_poll_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/devices/id-1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .fetch_state(&ServerId("id-1".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisioningError::PollFailed { ref id, .. } if id.0 == "id-1"));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn ip_lookup_takes_first_address() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/devices/id-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "id-1",
                "state": "active",
                "ip_addresses": [{"address": "10.0.0.5"}, {"address": "10.0.0.6"}],
            })))
            .mount(&server)
            .await;

        let ip = provider_for(&server)
            .fetch_ip_address(&ServerId("id-1".into()))
            .await
            .unwrap();

        assert_eq!(ip, "10.0.0.5");
    }

    #[tokio::test]
    async fn ip_lookup_without_addresses_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/devices/id-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "id-1",
                "state": "active",
                "ip_addresses": [],
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .fetch_ip_address(&ServerId("id-1".into()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProvisioningError::IpLookupFailed {
                source: IpLookupError::NoAddress,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn provisions_against_http_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/proj-1/devices"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "id-1", "state": "queued"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/devices/id-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "id-1",
                "state": "provisioning",
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/devices/id-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "id-1",
                "state": "active",
                "ip_addresses": [{"address": "147.75.1.2"}],
            })))
            .mount(&server)
            .await;

        let settings = ProvisionSettings::new(Duration::from_secs(30))
            .with_poll_interval(Duration::from_millis(10));
        let orchestrator = Orchestrator::new(std::sync::Arc::new(provider_for(&server)), settings);

        let result = orchestrator.run(&request()).await.unwrap();

        assert_eq!(result.server_id, ServerId("id-1".into()));
        assert_eq!(result.ip_address, "147.75.1.2");
    }

    #[tokio::test]
    async fn create_reads_only_the_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/proj-1/devices"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "id-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let id = provider_for(&server).create_device(&request()).await.unwrap();

        assert_eq!(id, ServerId("id-1".into()));
    }

    #[tokio::test]
    async fn poll_reads_only_the_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/devices/id-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "state": "provisioning",
                "ip_addresses": null,
            })))
            .mount(&server)
            .await;

        let state = provider_for(&server)
            .fetch_state(&ServerId("id-1".into()))
            .await
            .unwrap();

        assert_eq!(state, "provisioning");
    }

    #[tokio::test]
    async fn lookup_rejected_after_active_is_ip_lookup_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/proj-1/devices"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "id-1"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/devices/id-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "active"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/devices/id-1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("lookup down"))
            .expect(1)
            .mount(&server)
            .await;

        let orchestrator = Orchestrator::new(
            std::sync::Arc::new(provider_for(&server)),
            ProvisionSettings::new(Duration::from_secs(30)),
        );
        let err = orchestrator.run(&request()).await.unwrap_err();

        match err {
            ProvisioningError::IpLookupFailed {
                id,
                source: IpLookupError::Api(metal_api::Error::Api { status, body, .. }),
            } => {
                assert_eq!(id, ServerId("id-1".into()));
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "lookup down");
            }
            other => panic!("expected IpLookupFailed, got {other:?}"),
        }
    }
}
