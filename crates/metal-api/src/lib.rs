//! Typed Rust client for the Equinix Metal API.
//!
//! Covers the subset needed to bring up a single device:
//! devices (create, get).

mod types;

pub use types::*;

const BASE_URL: &str = "https://api.equinix.com/metal/v1";
const USER_AGENT: &str = "metal-github-runner-action";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("metal api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("metal api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the Equinix Metal REST API, scoped to one project.
#[derive(Clone)]
pub struct MetalClient {
    token: String,
    project_id: String,
    base_url: String,
    http: reqwest::Client,
}

impl MetalClient {
    pub fn new(token: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            project_id: project_id.into(),
            base_url: BASE_URL.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Point the client at a different API root (no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.url(path))
            .header("X-Auth-Token", &self.token)
            .header("User-Agent", USER_AGENT)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(self.url(path))
            .header("X-Auth-Token", &self.token)
            .header("User-Agent", USER_AGENT)
    }

    async fn check(
        resp: reqwest::Response,
        endpoint: &'static str,
    ) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                endpoint,
                status,
                body,
            });
        }
        Ok(resp)
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn create_device(&self, req: &CreateDeviceRequest) -> Result<CreatedDevice> {
        let resp = self
            .post(&format!("/projects/{}/devices", self.project_id))
            .json(req)
            .send()
            .await?;

        Self::check(resp, "create device")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    pub async fn get_device(&self, device_id: &str) -> Result<Device> {
        let resp = self.get(&format!("/devices/{device_id}")).send().await?;

        Self::check(resp, "get device")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }
}
