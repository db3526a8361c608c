//! Create → poll → resolve, raced against a provisioning deadline.
//!
//! The deadline runs as its own task that raises a `watch` flag when it
//! expires. The poll loop selects every remote call and every inter-poll
//! delay against that flag, so an expired deadline interrupts the loop
//! wherever it is suspended. The flag branch is polled first: a poll result
//! that becomes ready at the same instant cannot win over the timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use crate::classify::classify;
use crate::types::{ProvisionRequest, ProvisioningResult, ServerId, ServerState};
use crate::{DeviceApi, ProvisioningError, Result};

/// Delay between two status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionSettings {
    /// How long the device may take to become active, measured from creation.
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ProvisionSettings {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Drives one device from creation to a resolved address.
///
/// Holds no state between runs; concurrent `run` calls are independent.
#[derive(Clone)]
pub struct Orchestrator {
    api: Arc<dyn DeviceApi>,
    settings: ProvisionSettings,
}

impl Orchestrator {
    pub fn new(api: Arc<dyn DeviceApi>, settings: ProvisionSettings) -> Self {
        Self { api, settings }
    }

    pub async fn run(&self, req: &ProvisionRequest) -> Result<ProvisioningResult> {
        info!(
            metro = %req.metro,
            plan = %req.plan,
            os = %req.operating_system,
            user_data = req.user_data.is_some(),
            "provisioning device"
        );

        let id = self.api.create_device(req).await?;
        info!(server_id = %id, "device created, waiting for it to become active");

        let started = Instant::now();
        let (expired_tx, expired_rx) = watch::channel(false);
        let limit = self.settings.timeout;
        let deadline = tokio::spawn(async move {
            sleep(limit).await;
            let _ = expired_tx.send(true);
        });

        let polled = self.poll_until_active(&id, expired_rx, started).await;
        deadline.abort();
        polled?;

        let ip_address = self.api.fetch_ip_address(&id).await?;
        info!(
            server_id = %id,
            ip_address = %ip_address,
            elapsed_secs = started.elapsed().as_secs(),
            "device provisioned"
        );

        Ok(ProvisioningResult {
            server_id: id,
            ip_address,
        })
    }

    async fn poll_until_active(
        &self,
        id: &ServerId,
        mut expired: watch::Receiver<bool>,
        started: Instant,
    ) -> Result<()> {
        let timed_out = || {
            let elapsed = started.elapsed();
            warn!(server_id = %id, elapsed_secs = elapsed.as_secs(), "provisioning timed out");
            ProvisioningError::Timeout {
                id: id.clone(),
                limit: self.settings.timeout,
                elapsed,
            }
        };

        loop {
            let raw = tokio::select! {
                biased;
                _ = deadline_expired(&mut expired) => return Err(timed_out()),
                state = self.api.fetch_state(id) => state?,
            };

            match classify(&raw) {
                ServerState::Failed => {
                    warn!(server_id = %id, state = %raw, "device entered a failed state");
                    return Err(ProvisioningError::StateFailed {
                        id: id.clone(),
                        state: raw,
                    });
                }
                ServerState::Active => {
                    info!(server_id = %id, state = %raw, "device status");
                    return Ok(());
                }
                ServerState::Pending => {
                    info!(server_id = %id, state = %raw, "device status");
                }
            }

            tokio::select! {
                biased;
                _ = deadline_expired(&mut expired) => return Err(timed_out()),
                _ = sleep(self.settings.poll_interval) => {}
            }
        }
    }
}

/// Resolves once the deadline task has raised the flag.
///
/// If the task is gone without raising it, this never resolves.
async fn deadline_expired(expired: &mut watch::Receiver<bool>) {
    let fired = expired.wait_for(|fired| *fired).await.is_ok();
    if !fired {
        std::future::pending::<()>().await;
    }
}
