//! Diagnosis configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default REST API base
pub const DEFAULT_API_BASE: &str = "https://mixer.com/api/v1/";
/// Default video/CDN host
pub const DEFAULT_VIDEO_BASE: &str = "https://video.mixer.com/";
/// Default telemetry ingestion endpoint
pub const DEFAULT_TELEMETRY_ENDPOINT: &str = "https://dc.services.visualstudio.com/v2/track";

/// Runtime configuration for a diagnosis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticConfig {
    /// Base URL of the REST API (must end with a slash)
    pub api_base: String,
    /// Base URL of the video host serving HLS playlists
    pub video_base: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Correlation tag attached to dependency records
    pub correlation_tag: String,
    /// Cloud role reported with every telemetry envelope
    pub role_name: String,
    /// Instrumentation key; telemetry is only delivered when set
    pub instrumentation_key: Option<String>,
    /// Telemetry ingestion endpoint
    pub telemetry_endpoint: String,
    /// Maximum buffered telemetry items before a flush
    pub telemetry_batch_size: usize,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            video_base: DEFAULT_VIDEO_BASE.to_string(),
            request_timeout_ms: 30_000,
            correlation_tag: "12346".to_string(),
            role_name: "light-servoid".to_string(),
            instrumentation_key: None,
            telemetry_endpoint: DEFAULT_TELEMETRY_ENDPOINT.to_string(),
            telemetry_batch_size: 8192,
        }
    }
}

impl DiagnosticConfig {
    /// Point both API and video hosts at one server (used against mock backends)
    pub fn with_base(base: &str) -> Self {
        let base = normalize_base(base);
        Self {
            api_base: base.clone(),
            video_base: base,
            ..Default::default()
        }
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Parsed API base
    pub fn api_base_url(&self) -> Result<Url> {
        Ok(Url::parse(&normalize_base(&self.api_base))?)
    }

    /// Parsed video base
    pub fn video_base_url(&self) -> Result<Url> {
        Ok(Url::parse(&normalize_base(&self.video_base))?)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        self.api_base_url()?;
        self.video_base_url()?;

        if self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig("request timeout must be non-zero".into()));
        }
        if self.telemetry_batch_size == 0 {
            return Err(Error::InvalidConfig("telemetry batch size must be non-zero".into()));
        }
        if self.instrumentation_key.is_some() {
            Url::parse(&self.telemetry_endpoint)?;
        }

        Ok(())
    }
}

/// Url::join drops the last path segment unless the base ends with '/'
fn normalize_base(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = DiagnosticConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.telemetry_batch_size, 8192);
    }

    #[test]
    fn test_base_gets_trailing_slash() {
        let config = DiagnosticConfig::with_base("http://127.0.0.1:9000/api/v1");
        assert_eq!(config.api_base_url().unwrap().as_str(), "http://127.0.0.1:9000/api/v1/");
        assert_eq!(config.video_base, "http://127.0.0.1:9000/api/v1/");
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = DiagnosticConfig {
            request_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_base() {
        let config = DiagnosticConfig {
            api_base: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidUrl(_))));
    }
}
