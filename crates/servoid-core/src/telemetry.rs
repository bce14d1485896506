//! Telemetry emission
//!
//! Records what the tool did for later analysis:
//! - Named events marking workflow steps
//! - Dependency records for every backend call
//! - Trace messages with key/value properties
//! - One request record covering the whole run
//!
//! The client is constructed once per run, passed by reference to whatever
//! needs it and consumed by [`TelemetryClient::shutdown`], which waits for
//! the final batch to be delivered.

use crate::{DiagnosticConfig, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Trace severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Verbose,
    Information,
    Warning,
    Error,
    Critical,
}

impl Severity {
    fn level(self) -> u8 {
        match self {
            Severity::Verbose => 0,
            Severity::Information => 1,
            Severity::Warning => 2,
            Severity::Error => 3,
            Severity::Critical => 4,
        }
    }
}

/// Outcome of one backend call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Templated operation name, e.g. `api/v1/channels/{id}`
    pub name: String,
    /// Call type, e.g. `HTTP GET`
    pub dependency_type: String,
    /// Logical target system
    pub target: String,
    /// Concrete request URL
    pub data: String,
    pub duration: Duration,
    pub success: bool,
    /// HTTP status, absent when no response arrived
    pub result_code: Option<u16>,
    pub properties: BTreeMap<String, String>,
}

/// Telemetry item types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryItem {
    /// Named workflow event
    Event { name: String },

    /// Trace message
    Trace {
        message: String,
        severity: Severity,
        properties: BTreeMap<String, String>,
    },

    /// Backend call
    Dependency(DependencyRecord),

    /// Whole-run request
    Request {
        name: String,
        url: String,
        duration: Duration,
        response_code: u16,
        success: bool,
    },
}

/// Telemetry item with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique item ID
    pub id: Uuid,
    /// Run the item belongs to
    pub operation_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub sequence: u64,
    #[serde(flatten)]
    pub item: TelemetryItem,
}

/// Destination for flushed telemetry batches
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn deliver(&self, batch: &[Envelope]) -> Result<()>;
}

/// Writes every envelope to the tracing log
pub struct LogSink;

#[async_trait]
impl TelemetrySink for LogSink {
    async fn deliver(&self, batch: &[Envelope]) -> Result<()> {
        for envelope in batch {
            debug!(
                id = %envelope.id,
                sequence = envelope.sequence,
                item = ?envelope.item,
                "Telemetry item"
            );
        }
        Ok(())
    }
}

/// Posts batches to an ingestion endpoint
pub struct HttpSink {
    client: Client,
    endpoint: String,
    instrumentation_key: String,
    role: String,
}

impl HttpSink {
    pub fn new(endpoint: String, instrumentation_key: String, role: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Telemetry(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            instrumentation_key,
            role,
        })
    }

    /// Ingestion wire shape of one envelope
    fn wire(&self, envelope: &Envelope) -> serde_json::Value {
        let (kind, base_type, base_data) = match &envelope.item {
            TelemetryItem::Event { name } => (
                "Event",
                "EventData",
                json!({ "ver": 2, "name": name }),
            ),
            TelemetryItem::Trace { message, severity, properties } => (
                "Message",
                "MessageData",
                json!({
                    "ver": 2,
                    "message": message,
                    "severityLevel": severity.level(),
                    "properties": properties,
                }),
            ),
            TelemetryItem::Dependency(dep) => (
                "RemoteDependency",
                "RemoteDependencyData",
                json!({
                    "ver": 2,
                    "id": envelope.id.to_string(),
                    "name": dep.name,
                    "type": dep.dependency_type,
                    "target": dep.target,
                    "data": dep.data,
                    "duration": format_duration(dep.duration),
                    "success": dep.success,
                    "resultCode": dep.result_code.map(|c| c.to_string()).unwrap_or_default(),
                    "properties": dep.properties,
                }),
            ),
            TelemetryItem::Request { name, url, duration, response_code, success } => (
                "Request",
                "RequestData",
                json!({
                    "ver": 2,
                    "id": envelope.id.to_string(),
                    "name": name,
                    "url": url,
                    "duration": format_duration(*duration),
                    "responseCode": response_code.to_string(),
                    "success": success,
                }),
            ),
        };

        json!({
            "name": format!("Microsoft.ApplicationInsights.{}", kind),
            "time": envelope.timestamp.to_rfc3339(),
            "iKey": self.instrumentation_key,
            "tags": {
                "ai.cloud.role": self.role,
                "ai.operation.id": envelope.operation_id.to_string(),
            },
            "data": { "baseType": base_type, "baseData": base_data },
        })
    }
}

#[async_trait]
impl TelemetrySink for HttpSink {
    async fn deliver(&self, batch: &[Envelope]) -> Result<()> {
        let body: Vec<_> = batch.iter().map(|e| self.wire(e)).collect();

        let resp = self.client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Telemetry(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::Telemetry(format!("ingestion returned {}", resp.status())));
        }

        Ok(())
    }
}

/// `d.hh:mm:ss.fffffff`
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let ticks = duration.subsec_nanos() / 100;
    format!(
        "{}.{:02}:{:02}:{:02}.{:07}",
        secs / 86_400,
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60,
        ticks
    )
}

/// Telemetry client for one run
pub struct TelemetryClient {
    operation_id: Uuid,
    /// Item sequence counter
    sequence: RwLock<u64>,
    /// Items not yet delivered
    buffer: RwLock<Vec<Envelope>>,
    /// Maximum buffer size before flush
    max_batch_size: usize,
    sink: Box<dyn TelemetrySink>,
}

impl TelemetryClient {
    /// Create a client delivering to the given sink
    pub fn new(sink: Box<dyn TelemetrySink>, max_batch_size: usize) -> Self {
        Self {
            operation_id: Uuid::new_v4(),
            sequence: RwLock::new(0),
            buffer: RwLock::new(Vec::new()),
            max_batch_size: max_batch_size.max(1),
            sink,
        }
    }

    /// Client that only logs
    pub fn logging() -> Self {
        Self::new(Box::new(LogSink), DiagnosticConfig::default().telemetry_batch_size)
    }

    /// Deliver to the ingestion endpoint when an instrumentation key is set,
    /// otherwise log only
    pub fn from_config(config: &DiagnosticConfig) -> Result<Self> {
        let sink: Box<dyn TelemetrySink> = match &config.instrumentation_key {
            Some(key) => Box::new(HttpSink::new(
                config.telemetry_endpoint.clone(),
                key.clone(),
                config.role_name.clone(),
            )?),
            None => Box::new(LogSink),
        };
        Ok(Self::new(sink, config.telemetry_batch_size))
    }

    pub fn operation_id(&self) -> Uuid {
        self.operation_id
    }

    /// Record a telemetry item
    pub async fn track(&self, item: TelemetryItem) {
        let mut seq = self.sequence.write().await;
        *seq += 1;
        let sequence = *seq;
        drop(seq);

        let envelope = Envelope {
            id: Uuid::new_v4(),
            operation_id: self.operation_id,
            timestamp: Utc::now(),
            sequence,
            item,
        };

        let mut buffer = self.buffer.write().await;
        buffer.push(envelope);

        if buffer.len() >= self.max_batch_size {
            let batch: Vec<_> = buffer.drain(..).collect();
            drop(buffer);
            self.deliver(batch).await;
        }
    }

    pub async fn track_event(&self, name: impl Into<String>) {
        self.track(TelemetryItem::Event { name: name.into() }).await;
    }

    pub async fn track_trace(&self, message: impl Into<String>, properties: BTreeMap<String, String>) {
        self.track(TelemetryItem::Trace {
            message: message.into(),
            severity: Severity::Information,
            properties,
        })
        .await;
    }

    pub async fn track_dependency(&self, record: DependencyRecord) {
        self.track(TelemetryItem::Dependency(record)).await;
    }

    pub async fn track_request(&self, name: impl Into<String>, url: impl Into<String>, duration: Duration, success: bool) {
        self.track(TelemetryItem::Request {
            name: name.into(),
            url: url.into(),
            duration,
            response_code: if success { 200 } else { 500 },
            success,
        })
        .await;
    }

    /// Items recorded but not yet delivered
    pub async fn items(&self) -> Vec<TelemetryItem> {
        self.buffer.read().await.iter().map(|e| e.item.clone()).collect()
    }

    /// Deliver everything buffered so far
    pub async fn flush(&self) {
        let batch: Vec<_> = self.buffer.write().await.drain(..).collect();
        self.deliver(batch).await;
    }

    /// Flush and wait for delivery; the client is unusable afterwards
    pub async fn shutdown(self) {
        self.flush().await;
    }

    async fn deliver(&self, batch: Vec<Envelope>) {
        if batch.is_empty() {
            return;
        }

        info!(count = batch.len(), operation_id = %self.operation_id, "Flushing telemetry");

        // Telemetry loss never fails a diagnosis
        if let Err(e) = self.sink.deliver(&batch).await {
            warn!(error = %e, count = batch.len(), "Telemetry batch dropped");
        }
    }
}
