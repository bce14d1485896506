//! Light Servoid - Channel Diagnosis CLI
//!
//! Usage:
//! - `light-servoid <channel>`: channel, stream, CDN and video settings report
//! - `light-servoid <channel> <user>`: roles the owner of `<user>` holds on `<channel>`
//!
//! Any other number of channel arguments exits without output.

use clap::Parser;
use servoid_core::config::{DEFAULT_API_BASE, DEFAULT_TELEMETRY_ENDPOINT, DEFAULT_VIDEO_BASE};
use servoid_core::{DiagnosticConfig, Mode};

mod commands;
mod output;

/// Light Servoid - streaming backend diagnostics
#[derive(Parser)]
#[command(name = "light-servoid")]
#[command(version)]
#[command(about = "Diagnose a channel's stream, CDN distribution and relationships", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// REST API base URL
    #[arg(long, env = "SERVOID_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Video host serving HLS playlists
    #[arg(long, env = "SERVOID_VIDEO_BASE", default_value = DEFAULT_VIDEO_BASE)]
    video_base: String,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "SERVOID_TIMEOUT_MS", default_value_t = 30_000)]
    timeout_ms: u64,

    /// Instrumentation key; telemetry is only delivered when set
    #[arg(long, env = "SERVOID_INSTRUMENTATION_KEY")]
    instrumentation_key: Option<String>,

    /// Telemetry ingestion endpoint
    #[arg(long, env = "SERVOID_TELEMETRY_ENDPOINT", default_value = DEFAULT_TELEMETRY_ENDPOINT)]
    telemetry_endpoint: String,

    /// Channel to diagnose, optionally followed by the channel whose owner's
    /// relationship to it should be looked up
    #[arg(num_args = 0..)]
    channels: Vec<String>,
}

impl Cli {
    fn config(&self) -> DiagnosticConfig {
        DiagnosticConfig {
            api_base: self.api_base.clone(),
            video_base: self.video_base.clone(),
            request_timeout_ms: self.timeout_ms,
            instrumentation_key: self.instrumentation_key.clone(),
            telemetry_endpoint: self.telemetry_endpoint.clone(),
            ..Default::default()
        }
    }

    fn mode(&self) -> Mode {
        let argv: Vec<&str> = std::iter::once("light-servoid")
            .chain(self.channels.iter().map(String::as_str))
            .collect();
        Mode::from_args(argv.as_slice())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mode = cli.mode();
    if mode == Mode::Invalid {
        return Ok(());
    }

    // Initialize tracing; stdout is reserved for the report
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    servoid_core::init();
    commands::diagnose(mode, &cli.config(), &cli.format).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_channel_args() {
        let cli = Cli::parse_from(["light-servoid", "ninja"]);
        assert_eq!(cli.mode(), Mode::SingleChannel { channel: "ninja".into() });
    }

    #[test]
    fn test_relationship_args() {
        let cli = Cli::parse_from(["light-servoid", "-f", "json", "ninja", "shroud"]);
        assert_eq!(
            cli.mode(),
            Mode::Relationship {
                channel: "ninja".into(),
                user: "shroud".into()
            }
        );
        assert_eq!(cli.format, "json");
    }

    #[test]
    fn test_no_or_extra_args_are_invalid() {
        assert_eq!(Cli::parse_from(["light-servoid"]).mode(), Mode::Invalid);
        assert_eq!(Cli::parse_from(["light-servoid", "a", "b", "c"]).mode(), Mode::Invalid);
    }

    #[test]
    fn test_config_from_flags() {
        let cli = Cli::parse_from(["light-servoid", "--timeout-ms", "500", "--api-base", "http://localhost:1/", "ninja"]);
        let config = cli.config();
        assert_eq!(config.request_timeout_ms, 500);
        assert_eq!(config.api_base, "http://localhost:1/");
        assert!(config.validate().is_ok());
    }
}
