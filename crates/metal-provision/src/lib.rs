pub mod classify;
pub mod metal;
pub mod orchestrator;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use types::{ProvisionRequest, ServerId};

pub use classify::classify;
pub use metal::MetalProvider;
pub use orchestrator::{Orchestrator, ProvisionSettings};
pub use types::{ProvisioningResult, ServerState};

/// Why a provisioning attempt stopped. Every variant is fatal.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error("device creation failed: {0}")]
    CreationFailed(#[source] metal_api::Error),

    #[error("status poll for device {id} failed: {source}")]
    PollFailed {
        id: ServerId,
        #[source]
        source: metal_api::Error,
    },

    #[error("device {id} entered state `{state}`")]
    StateFailed { id: ServerId, state: String },

    #[error(
        "device {id} was not active within {}s (gave up after {}s)",
        .limit.as_secs(),
        .elapsed.as_secs()
    )]
    Timeout {
        id: ServerId,
        limit: Duration,
        elapsed: Duration,
    },

    #[error("ip lookup for active device {id} failed: {source}")]
    IpLookupFailed {
        id: ServerId,
        #[source]
        source: IpLookupError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum IpLookupError {
    #[error(transparent)]
    Api(#[from] metal_api::Error),

    #[error("provider lists no ip addresses")]
    NoAddress,
}

pub type Result<T> = std::result::Result<T, ProvisioningError>;

/// The three remote calls the orchestrator needs from a provider.
///
/// Each call is a single request with no retry. Implementations map their
/// failures onto the matching [`ProvisioningError`] phase.
#[async_trait]
pub trait DeviceApi: Send + Sync + 'static {
    /// Create a device. Failures are [`ProvisioningError::CreationFailed`].
    async fn create_device(&self, req: &ProvisionRequest) -> Result<ServerId>;

    /// Raw provider state. Failures are [`ProvisioningError::PollFailed`].
    async fn fetch_state(&self, id: &ServerId) -> Result<String>;

    /// First listed address. Failures, including an empty address list, are
    /// [`ProvisioningError::IpLookupFailed`].
    async fn fetch_ip_address(&self, id: &ServerId) -> Result<String>;
}
