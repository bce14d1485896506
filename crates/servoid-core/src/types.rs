//! Backend record types
//!
//! Every attribute the backend may omit or null is an `Option` or a
//! defaulted field, and unknown attributes are ignored, so only a body that
//! is not a JSON object of the right shape fails to decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Read an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Numeric channel identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric user identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Channel metadata from `channels/{nameOrId}`
///
/// A record without a token is still decoded; ids then read as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: ChannelId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: UserId,
    /// Channel token; empty or absent means the channel does not exist
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub online: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub partnered: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suspended: bool,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub viewers_total: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub viewers_current: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_followers: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vods_enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_vod: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_transcodes: bool,
    /// Channel currently being hosted
    #[serde(default)]
    pub hostee_id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: ChannelUser,
}

impl ChannelRecord {
    /// A record only describes a real channel when it carries a token
    pub fn exists(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Pro status of the owning user
    pub fn pro_status(&self) -> ProStatus {
        ProStatus::from_groups(&self.user.groups)
    }
}

/// Owning user of a channel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelUser {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub level: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sparks: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub verified: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<UserGroup>,
}

/// Group membership of a user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserGroup {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Pro status derived from group memberships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProStatus {
    Staff,
    Pro,
    NotPro,
}

impl ProStatus {
    /// Staff outranks Pro; anything else is a regular user
    pub fn from_groups(groups: &[UserGroup]) -> Self {
        if groups.iter().any(|g| g.name == "Staff") {
            ProStatus::Staff
        } else if groups.iter().any(|g| g.name == "Pro") {
            ProStatus::Pro
        } else {
            ProStatus::NotPro
        }
    }
}

/// Stream manifest from `channels/{id}/manifest.light2`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRecord {
    pub access_key: String,
    #[serde(default)]
    pub hls_src: Option<String>,
    #[serde(default)]
    pub ftl_src: Option<String>,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_test_stream: bool,
}

/// Video settings from `channels/{id}/videoSettings`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    #[serde(default)]
    pub id: Option<u64>,
    /// Experimental low-latency (LightStream) streaming
    #[serde(rename = "isLSEnabled")]
    pub low_latency_enabled: bool,
    #[serde(rename = "channelId", default)]
    pub channel_id: Option<ChannelId>,
}

/// Relationship between a user and a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub status: RelationshipStatus,
}

impl RelationshipRecord {
    /// Role names in backend order
    pub fn roles(&self) -> &[String] {
        &self.status.roles
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipStatus {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub follows: Option<FollowInfo>,
}

/// Follow metadata of a relationship
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowInfo {
    pub user: UserId,
    pub channel: ChannelId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
