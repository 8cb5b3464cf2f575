//! Get trait for fetching single entities.

use async_trait::async_trait;

use crate::client::EmploiStoreClient;
use crate::error::Result;

/// Fetch a single entity by ID.
///
/// Implement this trait for entity types that can be fetched individually
/// from the datastore.
///
/// # Example
///
/// ```ignore
/// use emploi_store::{EmploiStoreClient, Package, PackageSelector, Get};
///
/// let client = EmploiStoreClient::from_env()?;
/// let bmo = Package::get(&client, PackageSelector::name("bmo")).await?;
/// ```
#[async_trait]
pub trait Get: Sized {
    /// The ID type for this entity.
    type Id: Send;

    /// Fetch the entity by ID.
    ///
    /// # Arguments
    ///
    /// * `client` - The Emploi Store API client
    /// * `id` - The entity identifier
    ///
    /// # Errors
    ///
    /// Returns [`EmploiStoreError::NotFound`](crate::EmploiStoreError::NotFound)
    /// if nothing matches, or the underlying error if the request fails.
    async fn get(client: &EmploiStoreClient, id: Self::Id) -> Result<Self>;
}
