//! CLI command implementations

use crate::output;
use servoid_core::{BackendClient, DiagnosticConfig, Diagnostician, Mode, TelemetryClient};
use tracing::debug;

/// Run one diagnosis and print its report
pub async fn diagnose(mode: Mode, config: &DiagnosticConfig, format: &str) -> anyhow::Result<()> {
    let telemetry = TelemetryClient::from_config(config)?;
    debug!(
        mode = ?mode,
        operation_id = %telemetry.operation_id(),
        api_base = %config.api_base,
        "Starting diagnosis"
    );

    let report = {
        let client = BackendClient::new(config, &telemetry)?;
        Diagnostician::new(client).run(mode).await
    };

    let rendered = output::format_report(&report, format)?;
    if !rendered.is_empty() {
        println!("{}", rendered);
    }

    // Wait for the final batch before the process exits
    telemetry.shutdown().await;

    Ok(())
}
