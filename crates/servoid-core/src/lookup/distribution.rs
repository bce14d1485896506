use crate::{
    client::{BackendClient, CallSite},
    Error, Result,
};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};
use url::Url;

const DISTRIBUTION: CallSite = CallSite {
    name: "/hls/{accessKey}_source/index.m3u8",
    target: "Janus",
};

/// Header name fragment identifying the serving CDN node
const CDN_MARKER: &str = "cdn";

/// Result of probing the playback playlist
#[derive(Debug, Clone)]
pub struct DistributionProbe {
    /// Probed playback URL
    pub url: Url,
    /// First CDN-identifying header value, if any
    pub server: Option<String>,
    /// Shape of the playlist body, if it parsed
    pub playlist: Option<PlaylistSummary>,
}

/// Summary of an HLS playlist body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaylistSummary {
    Master { variants: usize },
    Media { segments: usize, live: bool },
}

impl std::fmt::Display for PlaylistSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaylistSummary::Master { variants } => write!(f, "master, {} variants", variants),
            PlaylistSummary::Media { segments, live } => write!(
                f,
                "media, {} segments, {}",
                segments,
                if *live { "live" } else { "VOD" }
            ),
        }
    }
}

impl BackendClient<'_> {
    /// Probe the playback playlist for the CDN node serving it
    ///
    /// A non-success status is returned as [`Error::NotFound`] carrying the
    /// raw status; headers are only scanned on success.
    #[instrument(skip(self))]
    pub async fn distribution(&self, access_key: &str) -> Result<DistributionProbe> {
        self.telemetry().track_event("Light-Servoid: Getting Dist Server").await;

        let url = self.endpoints().playback(access_key)?;
        let resp = self.send(DISTRIBUTION, &url).await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::NotFound {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let server = find_distribution(resp.headers());
        if let Some(server) = &server {
            self.telemetry().track_event("Light-Servoid: Reporting Dist Server").await;
            let properties = BTreeMap::from([("dist".to_string(), server.clone())]);
            self.telemetry().track_trace("message", properties).await;
        }

        // The body only enriches the report
        let playlist = match resp.bytes().await {
            Ok(body) => summarize_playlist(&body),
            Err(e) => {
                debug!(error = %e, "Failed to read playlist body");
                None
            }
        };

        Ok(DistributionProbe { url, server, playlist })
    }
}

/// First value of the first header whose name mentions the CDN
pub fn find_distribution(headers: &HeaderMap) -> Option<String> {
    headers
        .iter()
        .find(|(name, _)| name.as_str().to_ascii_lowercase().contains(CDN_MARKER))
        .map(|(_, value)| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

/// Parse an HLS playlist body into a summary
#[cfg(feature = "playlist")]
pub fn summarize_playlist(body: &[u8]) -> Option<PlaylistSummary> {
    use m3u8_rs::Playlist;

    match m3u8_rs::parse_playlist_res(body) {
        Ok(Playlist::MasterPlaylist(master)) => Some(PlaylistSummary::Master {
            variants: master.variants.len(),
        }),
        Ok(Playlist::MediaPlaylist(media)) => Some(PlaylistSummary::Media {
            segments: media.segments.len(),
            live: !media.end_list,
        }),
        Err(_) => None,
    }
}

#[cfg(not(feature = "playlist"))]
pub fn summarize_playlist(_body: &[u8]) -> Option<PlaylistSummary> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_cdn_header_found() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/vnd.apple.mpegurl"));
        headers.insert("x-cdn-pop", HeaderValue::from_static("dist-ams-03"));
        headers.append("x-cdn-pop", HeaderValue::from_static("dist-ams-04"));

        assert_eq!(find_distribution(&headers), Some("dist-ams-03".to_string()));
    }

    #[test]
    fn test_no_cdn_header() {
        let mut headers = HeaderMap::new();
        headers.insert("server", HeaderValue::from_static("nginx"));
        assert_eq!(find_distribution(&headers), None);
    }

    #[cfg(feature = "playlist")]
    #[test]
    fn test_summarize_media_playlist() {
        let body = b"#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:2\n#EXT-X-MEDIA-SEQUENCE:10\n#EXTINF:2.000,\nseg10.ts\n#EXTINF:2.000,\nseg11.ts\n";
        assert_eq!(
            summarize_playlist(body),
            Some(PlaylistSummary::Media { segments: 2, live: true })
        );
    }

    #[cfg(feature = "playlist")]
    #[test]
    fn test_summarize_master_playlist() {
        let body = b"#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=6000000,RESOLUTION=1920x1080\nsource/index.m3u8\n#EXT-X-STREAM-INF:BANDWIDTH=1200000,RESOLUTION=852x480\n480p/index.m3u8\n";
        assert_eq!(summarize_playlist(body), Some(PlaylistSummary::Master { variants: 2 }));
    }

    #[test]
    fn test_summary_display() {
        let summary = PlaylistSummary::Media { segments: 3, live: false };
        assert_eq!(summary.to_string(), "media, 3 segments, VOD");
    }
}
