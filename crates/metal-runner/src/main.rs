mod config;
mod report;

use std::process::ExitCode;
use std::sync::Arc;

use metal_api::MetalClient;
use metal_provision::{MetalProvider, Orchestrator, ProvisionSettings};
use tracing_subscriber::EnvFilter;

use crate::config::RunnerConfig;
use crate::report::Reporter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let reporter = Reporter::from_env();

    let config = match RunnerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            reporter.failure(&e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        project = %config.project_id,
        timeout_mins = config.timeout.as_secs() / 60,
        "starting provisioning run"
    );

    let client = MetalClient::new(config.auth_token.clone(), config.project_id.clone());
    let orchestrator = Orchestrator::new(
        Arc::new(MetalProvider::new(client)),
        ProvisionSettings::new(config.timeout),
    );

    let result = match orchestrator.run(&config.request).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "provisioning failed");
            reporter.failure(&e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        server_id = %result.server_id,
        ip_address = %result.ip_address,
        "server provisioned"
    );

    if let Err(e) = reporter.success(&result) {
        tracing::error!(error = %e, "failed to report outputs");
        reporter.failure(&e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
