use crate::{
    client::{BackendClient, CallSite},
    ChannelId, ManifestRecord, Result,
};
use std::collections::BTreeMap;
use tracing::instrument;

const MANIFEST: CallSite = CallSite {
    name: "api/v1/channels/{id}/manifest.light2",
    target: "Falcon",
};

impl BackendClient<'_> {
    /// Fetch the live stream manifest
    ///
    /// Offline channels answer with a non-success status, which surfaces as
    /// [`crate::Error::NotFound`].
    #[instrument(skip(self))]
    pub async fn manifest(&self, id: ChannelId) -> Result<ManifestRecord> {
        self.telemetry().track_event("Light-Servoid: Getting channel manifest").await;

        let url = self.endpoints().manifest(id)?;
        let result = self.fetch_json::<ManifestRecord>(MANIFEST, &url).await;

        match &result {
            Ok(manifest) => {
                self.telemetry()
                    .track_trace("Light-Servoid: Channel was online", BTreeMap::new())
                    .await;

                let properties = BTreeMap::from([
                    ("hlsSource".to_string(), manifest.hls_src.clone().unwrap_or_default()),
                    ("ftlSource".to_string(), manifest.ftl_src.clone().unwrap_or_default()),
                ]);
                self.telemetry().track_trace("message", properties).await;
            }
            Err(e) if e.status().is_some() => {
                self.telemetry()
                    .track_trace("Light-Servoid: Channel was offline", BTreeMap::new())
                    .await;
            }
            Err(_) => {}
        }

        result
    }
}
