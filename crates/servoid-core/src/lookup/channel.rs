use crate::{
    client::{BackendClient, CallSite},
    ChannelId, ChannelRecord, Error, Result, UserId,
};
use std::collections::BTreeMap;
use tracing::instrument;

const CHANNEL: CallSite = CallSite {
    name: "api/v1/channels/{id}",
    target: "Backend",
};

impl BackendClient<'_> {
    /// Resolve a channel name (or numeric id) to its record
    ///
    /// A record without a token is reported as [`Error::EmptyResult`], never
    /// returned.
    #[instrument(skip(self))]
    pub async fn channel(&self, name: &str) -> Result<ChannelRecord> {
        self.telemetry().track_event("Light-Servoid: Getting channel ID").await;
        self.fetch_channel(name).await
    }

    /// Resolve a name to the channel's own id (`want_user_id == false`) or
    /// to its owner's user id (`want_user_id == true`)
    #[instrument(skip(self))]
    pub async fn resolve_id(&self, name: &str, want_user_id: bool) -> Result<u64> {
        self.telemetry().track_event("Light-Servoid: Getting user ID").await;
        let channel = self.fetch_channel(name).await?;

        Ok(if want_user_id {
            channel.user_id.0
        } else {
            channel.id.0
        })
    }

    pub async fn resolve_channel_id(&self, name: &str) -> Result<ChannelId> {
        self.resolve_id(name, false).await.map(ChannelId)
    }

    pub async fn resolve_user_id(&self, name: &str) -> Result<UserId> {
        self.resolve_id(name, true).await.map(UserId)
    }

    async fn fetch_channel(&self, name: &str) -> Result<ChannelRecord> {
        let url = self.endpoints().channel(name)?;
        let result = self.fetch_json::<ChannelRecord>(CHANNEL, &url).await;

        let message = match &result {
            Ok(_) => "Light-Servoid: Backend Call successful getting channel info",
            Err(_) => "Light-Servoid: Backend Call failed getting channel info",
        };
        self.telemetry().track_trace(message, BTreeMap::new()).await;

        let channel = result?;
        if !channel.exists() {
            return Err(Error::EmptyResult(format!("channel {} has no token", name)));
        }

        Ok(channel)
    }
}
