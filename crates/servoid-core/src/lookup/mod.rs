//! Backend lookups
//!
//! Each lookup performs exactly one GET, records its telemetry and returns
//! a typed result. None of them retry, and none of them print: turning a
//! failure into a console line is the orchestrator's job.

mod channel;
mod distribution;
mod manifest;
mod relationship;
mod video_settings;

pub use distribution::{find_distribution, summarize_playlist, DistributionProbe, PlaylistSummary};
