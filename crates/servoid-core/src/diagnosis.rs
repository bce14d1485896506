//! Diagnosis orchestration
//!
//! Dispatches on the positional arguments and runs the lookups in order.
//! Failures never escape a diagnosis: each one becomes a [`Finding`] and
//! whatever depended on the failed lookup is skipped.

use crate::{
    client::BackendClient,
    lookup::PlaylistSummary,
    urls, ChannelId, ChannelRecord, Error, ProStatus, RelationshipRecord, UserId,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, instrument};

/// What to diagnose, chosen from the argument count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Mode {
    /// `program <channel>`
    SingleChannel { channel: String },
    /// `program <channel> <user>`
    Relationship { channel: String, user: String },
    /// Anything else; produces no output
    Invalid,
}

impl Mode {
    /// Choose a mode from the full argument vector, program name included
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        match args {
            [_, channel] => Mode::SingleChannel {
                channel: channel.as_ref().to_string(),
            },
            [_, channel, user] => Mode::Relationship {
                channel: channel.as_ref().to_string(),
                user: user.as_ref().to_string(),
            },
            _ => Mode::Invalid,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Mode::SingleChannel { .. } => "single_channel",
            Mode::Relationship { .. } => "relationship",
            Mode::Invalid => "invalid",
        }
    }
}

/// One diagnostic line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "finding", rename_all = "snake_case")]
pub enum Finding {
    ChannelNotFound { channel: String },
    ChannelMissingId { channel: String },
    UserMissingId { channel: String },
    LookupFailed { what: String, code: String, error: String },
    LookingUp { channel: String, id: ChannelId },
    Offline,
    DistributionStatus { status: u16 },
    Distribution { server: String },
    Playlist { summary: PlaylistSummary },
    PlaybackUrl { url: String },
    CurrentTime { now: DateTime<Utc> },
    Hosting { hostee: Option<u64> },
    Pro { status: ProStatus },
    LowLatency { enabled: bool },
    VideoSettingsNotFound { id: ChannelId },
    VodsEnabled { enabled: bool },
    Sparks { sparks: u64 },
    IngestUrl { url: String },
    XpertUrl { url: String },
    UnstuckUrl { url: String },
    RefreshUrl { url: String },
    RelationshipLookup { channel: String, user: String },
    RelationshipUrl { url: String },
    Roles { roles: Vec<String> },
    Follows { user: UserId, channel: ChannelId, since: Option<DateTime<Utc>> },
}

impl Finding {
    fn failed(what: impl Into<String>, error: &Error) -> Self {
        Finding::LookupFailed {
            what: what.into(),
            code: error.error_code().to_string(),
            error: error.to_string(),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::ChannelNotFound { channel } => write!(f, "{} Not found", channel),
            Finding::ChannelMissingId { .. } => write!(f, "Failed to get ID"),
            Finding::UserMissingId { .. } => write!(f, "Failed to get user ID"),
            Finding::LookupFailed { what, error, .. } => write!(f, "{} failed: {}", what, error),
            Finding::LookingUp { channel, id } => write!(f, "Looking up {} with ID {}", channel, id),
            Finding::Offline => write!(f, "channel was offline"),
            Finding::DistributionStatus { status } => write!(f, "Dist probe returned {}", status),
            Finding::Distribution { server } => write!(f, "Your Dist: {}", server),
            Finding::Playlist { summary } => write!(f, "Playlist: {}", summary),
            Finding::PlaybackUrl { url } => write!(f, "PROCESSED VIDEO (VLC): {}", url),
            Finding::CurrentTime { now } => write!(f, "Current Time (UTC): {}", now),
            Finding::Hosting { hostee: Some(id) } => write!(f, "Hosting: {}", id),
            Finding::Hosting { hostee: None } => write!(f, "Hosting: Nobody"),
            Finding::Pro { status: ProStatus::Staff } => write!(f, "Pro: Staff"),
            Finding::Pro { status: ProStatus::Pro } => write!(f, "Pro User: true"),
            Finding::Pro { status: ProStatus::NotPro } => write!(f, "Pro User: false"),
            Finding::LowLatency { enabled } => write!(f, "LightStream Status: {}", enabled),
            Finding::VideoSettingsNotFound { id } => write!(f, "{} 404 LS Not found", id),
            Finding::VodsEnabled { enabled } => write!(f, "VODs Enabled: {}", enabled),
            Finding::Sparks { sparks } => write!(f, "Users Current Sparks: {}", sparks),
            Finding::IngestUrl { url } => write!(f, "SOURCE VIDEO (VLC):  {}", url),
            Finding::XpertUrl { url } => write!(f, "Xpert URL: {}", url),
            Finding::UnstuckUrl { url } => write!(f, "Unstuck URL (Requires v-dash): {}", url),
            Finding::RefreshUrl { url } => write!(f, "Refresh URL (Requires v-dash): {}", url),
            Finding::RelationshipLookup { channel, user } => write!(
                f,
                "Looking up the channel user relationship with Channel: {}  User: {}",
                channel, user
            ),
            Finding::RelationshipUrl { url } => write!(f, "URL:  {}", url),
            Finding::Roles { roles } => write!(f, "User Roles: [{}]", roles.join(" ")),
            Finding::Follows { user, channel, since: Some(since) } => {
                write!(f, "User {} follows channel {} since {}", user, channel, since)
            }
            Finding::Follows { user, channel, since: None } => {
                write!(f, "User {} follows channel {}", user, channel)
            }
        }
    }
}

/// Ordered findings of one run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub mode: Mode,
    pub findings: Vec<Finding>,
}

impl Report {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            findings: Vec::new(),
        }
    }

    fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Console lines in order
    pub fn lines(&self) -> Vec<String> {
        self.findings.iter().map(|f| f.to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Printed playback URL, if the stream was online
    pub fn playback_url(&self) -> Option<&str> {
        self.findings.iter().find_map(|f| match f {
            Finding::PlaybackUrl { url } => Some(url.as_str()),
            _ => None,
        })
    }

    /// Reported distribution server, if any
    pub fn distribution(&self) -> Option<&str> {
        self.findings.iter().find_map(|f| match f {
            Finding::Distribution { server } => Some(server.as_str()),
            _ => None,
        })
    }
}

/// Runs diagnoses against the backend
pub struct Diagnostician<'t> {
    client: BackendClient<'t>,
}

impl<'t> Diagnostician<'t> {
    pub fn new(client: BackendClient<'t>) -> Self {
        Self { client }
    }

    /// Run the diagnosis selected by `mode`
    pub async fn run(&self, mode: Mode) -> Report {
        let telemetry = self.client.telemetry();
        let start = Instant::now();
        telemetry.track_event("Light-Servoid: Starting").await;

        let report = match &mode {
            Mode::SingleChannel { channel } => self.diagnose_channel(channel).await,
            Mode::Relationship { channel, user } => self.diagnose_relationship(channel, user).await,
            Mode::Invalid => Report::new(Mode::Invalid),
        };

        telemetry.track_event("Light-Servoid: Completed").await;
        let api = self.client.endpoints().api_base().to_string();
        telemetry
            .track_request(format!("GET {}", mode.label()), api, start.elapsed(), true)
            .await;

        info!(mode = mode.label(), findings = report.findings.len(), "Diagnosis complete");
        report
    }

    /// Channel lookup followed by manifest, distribution, video settings and
    /// derived links
    #[instrument(skip(self))]
    pub async fn diagnose_channel(&self, name: &str) -> Report {
        let mut report = Report::new(Mode::SingleChannel {
            channel: name.to_string(),
        });

        let channel = match self.client.channel(name).await {
            Ok(channel) => channel,
            Err(e) => {
                report.push(channel_failure(name, &e));
                return report;
            }
        };

        report.push(Finding::LookingUp {
            channel: name.to_string(),
            id: channel.id,
        });

        self.report_stream(channel.id, &mut report).await;

        report.push(Finding::CurrentTime { now: Utc::now() });
        report.push(Finding::Hosting {
            hostee: channel.hostee_id,
        });
        report.push(Finding::Pro {
            status: channel.pro_status(),
        });

        match self.client.video_settings(channel.id).await {
            Ok(settings) => report.push(Finding::LowLatency {
                enabled: settings.low_latency_enabled,
            }),
            Err(Error::NotFound { .. }) => report.push(Finding::VideoSettingsNotFound { id: channel.id }),
            Err(e) => report.push(Finding::failed("Video settings lookup", &e)),
        }

        report_channel_details(name, &channel, &mut report);
        report
    }

    /// Manifest, then the CDN probe and the playback URL while online
    async fn report_stream(&self, id: ChannelId, report: &mut Report) {
        let manifest = match self.client.manifest(id).await {
            Ok(manifest) => manifest,
            Err(Error::NotFound { .. }) => {
                report.push(Finding::Offline);
                return;
            }
            Err(e) => {
                report.push(Finding::failed("Manifest lookup", &e));
                return;
            }
        };

        match self.client.distribution(&manifest.access_key).await {
            Ok(probe) => {
                if let Some(server) = probe.server {
                    report.push(Finding::Distribution { server });
                }
                if let Some(summary) = probe.playlist {
                    report.push(Finding::Playlist { summary });
                }
            }
            Err(Error::NotFound { status, .. }) => report.push(Finding::DistributionStatus { status }),
            Err(e) => report.push(Finding::failed("Distribution probe", &e)),
        }

        match self.client.endpoints().playback(&manifest.access_key) {
            Ok(url) => report.push(Finding::PlaybackUrl { url: url.to_string() }),
            Err(e) => report.push(Finding::failed("Playback URL", &e)),
        }
    }

    /// Roles the owner of `user` holds on `channel`
    #[instrument(skip(self))]
    pub async fn diagnose_relationship(&self, channel: &str, user: &str) -> Report {
        let mut report = Report::new(Mode::Relationship {
            channel: channel.to_string(),
            user: user.to_string(),
        });

        let user_id = match self.client.resolve_user_id(user).await {
            Ok(id) => id,
            Err(e) => {
                report.push(resolution_failure(user, &e));
                return report;
            }
        };
        let channel_id = match self.client.resolve_channel_id(channel).await {
            Ok(id) => id,
            Err(e) => {
                report.push(resolution_failure(channel, &e));
                return report;
            }
        };

        report.push(Finding::RelationshipLookup {
            channel: channel.to_string(),
            user: user.to_string(),
        });

        match self.client.endpoints().relationship(channel_id, user_id) {
            Ok(url) => report.push(Finding::RelationshipUrl { url: url.to_string() }),
            Err(e) => {
                report.push(Finding::failed("Relationship URL", &e));
                return report;
            }
        }

        match self.client.relationship(channel_id, user_id).await {
            Ok(relationship) => report_relationship(relationship, &mut report),
            Err(e) => report.push(Finding::failed("Relationship lookup", &e)),
        }

        report
    }
}

fn channel_failure(name: &str, error: &Error) -> Finding {
    match error {
        Error::NotFound { .. } => Finding::ChannelNotFound {
            channel: name.to_string(),
        },
        Error::EmptyResult(_) => Finding::ChannelMissingId {
            channel: name.to_string(),
        },
        e => Finding::failed(format!("Channel lookup for {}", name), e),
    }
}

/// Either side of a relationship failing to resolve to an id
fn resolution_failure(name: &str, error: &Error) -> Finding {
    match error {
        Error::EmptyResult(_) => Finding::UserMissingId {
            channel: name.to_string(),
        },
        e => channel_failure(name, e),
    }
}

fn report_channel_details(name: &str, channel: &ChannelRecord, report: &mut Report) {
    report.push(Finding::VodsEnabled {
        enabled: channel.vods_enabled,
    });
    report.push(Finding::Sparks {
        sparks: channel.user.sparks,
    });
    report.push(Finding::IngestUrl {
        url: urls::ingest_url(channel.id),
    });
    report.push(Finding::XpertUrl {
        url: urls::xpert_url(channel.id),
    });
    report.push(Finding::UnstuckUrl {
        url: urls::unstuck_url(name),
    });
    report.push(Finding::RefreshUrl {
        url: urls::refresh_url(name),
    });
}

fn report_relationship(relationship: RelationshipRecord, report: &mut Report) {
    report.push(Finding::Roles {
        roles: relationship.roles().to_vec(),
    });
    if let Some(follows) = relationship.status.follows {
        report.push(Finding::Follows {
            user: follows.user,
            channel: follows.channel,
            since: follows.created_at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_args() {
        assert_eq!(
            Mode::from_args(&["progname", "ninja"]),
            Mode::SingleChannel { channel: "ninja".into() }
        );
        assert_eq!(
            Mode::from_args(&["progname", "ninja", "shroud"]),
            Mode::Relationship {
                channel: "ninja".into(),
                user: "shroud".into()
            }
        );
        assert_eq!(Mode::from_args(&["progname"]), Mode::Invalid);
        assert_eq!(Mode::from_args::<&str>(&[]), Mode::Invalid);
        assert_eq!(Mode::from_args(&["progname", "a", "b", "c"]), Mode::Invalid);
    }

    #[test]
    fn test_finding_lines() {
        assert_eq!(Finding::Offline.to_string(), "channel was offline");
        assert_eq!(
            Finding::ChannelNotFound { channel: "ninja".into() }.to_string(),
            "ninja Not found"
        );
        assert_eq!(
            Finding::ChannelMissingId { channel: "ninja".into() }.to_string(),
            "Failed to get ID"
        );
        assert_eq!(
            Finding::UserMissingId { channel: "shroud".into() }.to_string(),
            "Failed to get user ID"
        );
        assert_eq!(Finding::Hosting { hostee: None }.to_string(), "Hosting: Nobody");
        assert_eq!(Finding::Hosting { hostee: Some(7) }.to_string(), "Hosting: 7");
        assert_eq!(Finding::Pro { status: ProStatus::Staff }.to_string(), "Pro: Staff");
        assert_eq!(
            Finding::VideoSettingsNotFound { id: ChannelId(42) }.to_string(),
            "42 404 LS Not found"
        );
        assert_eq!(
            Finding::Roles {
                roles: vec!["Subscriber".into(), "Mod".into()]
            }
            .to_string(),
            "User Roles: [Subscriber Mod]"
        );
    }

    #[test]
    fn test_channel_failure_kinds() {
        let not_found = Error::NotFound { url: "u".into(), status: 404 };
        assert_eq!(
            channel_failure("ninja", &not_found),
            Finding::ChannelNotFound { channel: "ninja".into() }
        );

        let empty = Error::EmptyResult("no token".into());
        assert_eq!(
            channel_failure("ninja", &empty),
            Finding::ChannelMissingId { channel: "ninja".into() }
        );

        let decode = Error::decode("u", "bad json");
        assert!(matches!(
            channel_failure("ninja", &decode),
            Finding::LookupFailed { code, .. } if code == "DECODE"
        ));
    }

    #[test]
    fn test_resolution_failure_kinds() {
        let empty = Error::EmptyResult("no token".into());
        assert_eq!(
            resolution_failure("shroud", &empty),
            Finding::UserMissingId { channel: "shroud".into() }
        );

        let not_found = Error::NotFound { url: "u".into(), status: 404 };
        assert_eq!(
            resolution_failure("shroud", &not_found),
            Finding::ChannelNotFound { channel: "shroud".into() }
        );
    }
}
