//! Servoid Core - Channel Diagnosis Library
//!
//! This crate provides the lookups behind the `light-servoid` CLI:
//! - Channel metadata by name or id
//! - Stream manifest and playback URL derivation
//! - CDN distribution probing of the HLS playlist
//! - Video settings (low-latency flag)
//! - User/channel relationship roles
//! - Telemetry around every backend call
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Servoid Core                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │                    ┌──────────────┐                             │
//! │                    │ Diagnostician│ ── Mode from argv           │
//! │                    └──────┬───────┘                             │
//! │                           │ Findings                            │
//! │  ┌──────────┐ ┌──────────┐│┌──────────────┐ ┌──────────────┐    │
//! │  │ Channel  │ │ Manifest │││ Distribution │ │ VideoSettings│    │
//! │  │ Lookup   │ │ Lookup   │││ Probe        │ │ Relationship │    │
//! │  └────┬─────┘ └────┬─────┘│└──────┬───────┘ └──────┬───────┘    │
//! │       └────────────┴──────┴───────┴────────────────┘            │
//! │                           │                                     │
//! │                    ┌──────┴──────┐      ┌──────────────┐        │
//! │                    │BackendClient│ ───▶ │  Telemetry   │        │
//! │                    └─────────────┘      └──────────────┘        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod lookup;
pub mod telemetry;
pub mod types;
pub mod urls;

pub use client::BackendClient;
pub use config::DiagnosticConfig;
pub use diagnosis::{Diagnostician, Finding, Mode, Report};
pub use error::{Error, Result};
pub use lookup::{DistributionProbe, PlaylistSummary};
pub use telemetry::{TelemetryClient, TelemetryItem, TelemetrySink};
pub use types::*;
pub use urls::Endpoints;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log library initialisation
pub fn init() {
    tracing::info!(version = VERSION, "Servoid Core initialized");
}
