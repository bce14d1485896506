use crate::{
    client::{BackendClient, CallSite},
    ChannelId, RelationshipRecord, Result, UserId,
};
use tracing::instrument;

const RELATIONSHIP: CallSite = CallSite {
    name: "api/v1/channels/{id}/relationship",
    target: "Backend",
};

impl BackendClient<'_> {
    /// Fetch the roles `user` holds on channel `id`
    #[instrument(skip(self))]
    pub async fn relationship(&self, id: ChannelId, user: UserId) -> Result<RelationshipRecord> {
        self.telemetry()
            .track_event("Light-Servoid: Getting channel relationship")
            .await;

        let url = self.endpoints().relationship(id, user)?;
        self.fetch_json(RELATIONSHIP, &url).await
    }
}
