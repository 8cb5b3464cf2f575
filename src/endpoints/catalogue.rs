//! Catalogue of user-facing Emploi Store services.

use serde_json::Value;

use crate::client::{EmploiStoreClient, NO_QUERY};
use crate::error::{EmploiStoreError, Result};
use crate::models::Record;

pub const CATALOGUE_SCOPE: &str = "api_cataloguedesservicesemploistorev1 emploistoreusagers";

const SERVICES_PATH: &str = "cataloguedesservicesemploistore/v1/api-emploistore/fichesservices";

/// List all services. Each entry carries an `identifiantService` usable
/// with [`describe_service`].
#[tracing::instrument(skip(client))]
pub async fn list_services(client: &EmploiStoreClient) -> Result<Vec<Record>> {
    match client.get_json(CATALOGUE_SCOPE, SERVICES_PATH, NO_QUERY).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

/// Describe one service.
///
/// With `with_images`, the response includes the service images (logo,
/// screenshots) base64 encoded under `ressourcesFicheService`.
#[tracing::instrument(skip(client))]
pub async fn describe_service(
    client: &EmploiStoreClient,
    service_id: &str,
    with_images: bool,
) -> Result<Value> {
    let path = format!(
        "{SERVICES_PATH}/{}/{with_images}",
        urlencoding::encode(service_id)
    );
    client
        .get_json(CATALOGUE_SCOPE, &path, NO_QUERY)
        .await?
        .ok_or_else(|| EmploiStoreError::NotFound {
            entity_type: "Service",
            id: service_id.to_string(),
        })
}
