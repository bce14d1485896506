use crate::{
    client::{BackendClient, CallSite},
    ChannelId, Result, VideoSettings,
};
use std::collections::BTreeMap;
use tracing::instrument;

const VIDEO_SETTINGS: CallSite = CallSite {
    name: "api/v1/channels/{id}/videoSettings",
    target: "Backend",
};

impl BackendClient<'_> {
    /// Fetch the channel's video settings (low-latency flag)
    #[instrument(skip(self))]
    pub async fn video_settings(&self, id: ChannelId) -> Result<VideoSettings> {
        self.telemetry()
            .track_event("Light-Servoid: Getting channel LightStream Status")
            .await;

        let url = self.endpoints().video_settings(id)?;
        let result = self.fetch_json::<VideoSettings>(VIDEO_SETTINGS, &url).await;

        let message = match &result {
            Ok(_) => "Light-Servoid: Backend Call successful getting VideoSettings",
            Err(_) => "Light-Servoid: Backend Call failed getting VideoSettings",
        };
        self.telemetry().track_trace(message, BTreeMap::new()).await;

        result
    }
}
