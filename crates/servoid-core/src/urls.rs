//! Endpoint construction and derived links
//!
//! Backend endpoints are built from the configured bases so the whole tool
//! can be pointed at a mock server. The support links and the ingest URL
//! are fixed templates.

use crate::{ChannelId, DiagnosticConfig, Error, Result, UserId};
use url::Url;

const MANIFEST_RESOURCE: &str = "manifest.light2";
const XPERT_PREFIX: &str = "https://xpert.microsoft.com/osg/views/PROBOTv2?overrides=%7B%22Source%22%3A%22Environment%3DPROD%3BModernClient%3DPartners%3BVEFProvider%3DMixer%3BVEFProvider%3DServices%3BVEFProvider%3DChannel%3BVEFTopic%3D";
const XPERT_SUFFIX: &str = "%3B%22%7D";
const UNSTUCK_BASE: &str = "https://mixer-unstuck-ppe.azurewebsites.net/api";

/// Resolved backend endpoints
#[derive(Debug, Clone)]
pub struct Endpoints {
    api: Url,
    video: Url,
}

impl Endpoints {
    pub fn new(config: &DiagnosticConfig) -> Result<Self> {
        let endpoints = Self {
            api: config.api_base_url()?,
            video: config.video_base_url()?,
        };
        // Reject cannot-be-a-base URLs up front
        endpoints.api_path(&[])?;
        endpoints.video_path(&[])?;
        Ok(endpoints)
    }

    pub fn api_base(&self) -> &Url {
        &self.api
    }

    /// `channels/{nameOrId}`
    pub fn channel(&self, name_or_id: &str) -> Result<Url> {
        self.api_path(&["channels", name_or_id])
    }

    /// `channels/{id}/videoSettings`
    pub fn video_settings(&self, id: ChannelId) -> Result<Url> {
        self.api_path(&["channels", &id.to_string(), "videoSettings"])
    }

    /// `channels/{id}/manifest.light2`
    pub fn manifest(&self, id: ChannelId) -> Result<Url> {
        self.api_path(&["channels", &id.to_string(), MANIFEST_RESOURCE])
    }

    /// `channels/{id}/relationship?user={userId}`
    pub fn relationship(&self, id: ChannelId, user: UserId) -> Result<Url> {
        let mut url = self.api_path(&["channels", &id.to_string(), "relationship"])?;
        url.query_pairs_mut().append_pair("user", &user.to_string());
        Ok(url)
    }

    /// `hls/{accessKey}_source/index.m3u8` on the video host
    pub fn playback(&self, access_key: &str) -> Result<Url> {
        let source = format!("{}_source", access_key);
        append_segments(&self.video, &["hls", &source, "index.m3u8"])
    }

    fn api_path(&self, segments: &[&str]) -> Result<Url> {
        append_segments(&self.api, segments)
    }

    fn video_path(&self, segments: &[&str]) -> Result<Url> {
        append_segments(&self.video, segments)
    }
}

fn append_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::InvalidConfig(format!("{} cannot be used as a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Raw RTMP ingest of a channel's source video
pub fn ingest_url(id: ChannelId) -> String {
    format!("rtmp://<ingestname>.mixer.com:1935/beam/{}", id)
}

/// Support dashboard filtered to a channel
pub fn xpert_url(id: ChannelId) -> String {
    format!("{}{}{}", XPERT_PREFIX, id, XPERT_SUFFIX)
}

/// Support tool that unsticks a channel
pub fn unstuck_url(name: &str) -> String {
    format!("{}/unstick/channel/{}", UNSTUCK_BASE, name)
}

/// Support tool that refreshes a channel
pub fn refresh_url(name: &str) -> String {
    format!("{}/refresh/channel/{}", UNSTUCK_BASE, name)
}
