//! Job fair listings.

use crate::client::{EmploiStoreClient, NO_QUERY};
use crate::error::Result;
use crate::models::Record;

pub const EVENTS_SCOPE: &str = "api_evenementsv1 evenements";

const ONLINE_EVENTS_PATH: &str = "evenements/v1/salonsenligne";

/// List online job fairs ("salons en ligne").
#[tracing::instrument(skip(client))]
pub async fn list_online_events(client: &EmploiStoreClient) -> Result<Vec<Record>> {
    match client.get_json(EVENTS_SCOPE, ONLINE_EVENTS_PATH, NO_QUERY).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}
