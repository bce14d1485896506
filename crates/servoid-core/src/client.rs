//! Backend HTTP client
//!
//! Every lookup goes through [`BackendClient::send`], which times the call
//! and records a dependency item before the response is inspected.

use crate::{
    telemetry::{DependencyRecord, TelemetryClient},
    urls::Endpoints,
    DiagnosticConfig, Error, Result,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;
use url::Url;

/// Telemetry identity of a backend call
#[derive(Debug, Clone, Copy)]
pub struct CallSite {
    /// Templated operation name
    pub name: &'static str,
    /// Logical target system
    pub target: &'static str,
}

/// Client for the streaming backend
pub struct BackendClient<'t> {
    http: Client,
    endpoints: Endpoints,
    telemetry: &'t TelemetryClient,
    correlation_tag: String,
}

impl<'t> BackendClient<'t> {
    /// Build a client with the configured per-request timeout
    pub fn new(config: &DiagnosticConfig, telemetry: &'t TelemetryClient) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("light-servoid/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoints: Endpoints::new(config)?,
            telemetry,
            correlation_tag: config.correlation_tag.clone(),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn telemetry(&self) -> &'t TelemetryClient {
        self.telemetry
    }

    /// Issue a GET and record the dependency
    pub async fn send(&self, site: CallSite, url: &Url) -> Result<Response> {
        let start = Instant::now();
        let result = self.http.get(url.clone()).send().await;
        let duration = start.elapsed();

        let result_code = result.as_ref().ok().map(|r| r.status().as_u16());
        let success = result.as_ref().map(|r| r.status().is_success()).unwrap_or(false);

        debug!(
            url = %url,
            status = ?result_code,
            elapsed_ms = duration.as_millis() as u64,
            "Backend call"
        );

        self.telemetry
            .track_dependency(DependencyRecord {
                name: site.name.to_string(),
                dependency_type: "HTTP GET".to_string(),
                target: site.target.to_string(),
                data: url.to_string(),
                duration,
                success,
                result_code,
                properties: BTreeMap::from([("cv".to_string(), self.correlation_tag.clone())]),
            })
            .await;

        result.map_err(|e| Error::transport(url.as_str(), e))
    }

    /// GET a JSON document; non-success statuses become `NotFound`
    pub async fn fetch_json<T: DeserializeOwned>(&self, site: CallSite, url: &Url) -> Result<T> {
        let resp = self.send(site, url).await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::NotFound {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::transport(url.as_str(), e))?;

        serde_json::from_slice(&body).map_err(|e| Error::decode(url.as_str(), e))
    }
}
