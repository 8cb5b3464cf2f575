//! Package model and resource resolution.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::de;
use super::{Record, Resource};
use crate::client::EmploiStoreClient;
use crate::error::{EmploiStoreError, Result};
use crate::traits::Get;

/// Organization whose packages make up the open data catalog.
pub const DATA_ORGANIZATION: &str = "digidata";

/// A package as listed in the catalog, without its resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Record,
}

/// A package of resources.
///
/// A package groups datasets that share a subject, like a folder: the BMO
/// package holds one dataset per survey year, plus the code tables they use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Resources in the order the server lists them.
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
    #[serde(flatten)]
    pub extra: Record,
}

/// Description of a resource inside a [`Package`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub pe_version: Option<String>,
    #[serde(flatten)]
    pub raw: Record,
}

/// How to identify a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSelector {
    /// Catalog name, e.g. `"bmo"` or `"rome"`.
    Name(String),
    /// Package ID.
    Id(String),
}

impl PackageSelector {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }
}

/// How to pick a resource within a package.
///
/// Resolution order: `resource_id`, then `name_re`, then `name`. When
/// `pe_version` is set, only resources with that version match. If several
/// resources match, the first one in listed order wins.
#[derive(Debug, Clone, Default)]
pub struct ResourceSelector {
    pub name: Option<String>,
    pub name_re: Option<Regex>,
    pub resource_id: Option<String>,
    pub pe_version: Option<String>,
}

impl ResourceSelector {
    /// Match a resource by its exact name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Match the first resource whose name contains a match for `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`EmploiStoreError::InvalidPattern`] if the pattern does not
    /// compile.
    pub fn by_pattern(pattern: &str) -> Result<Self> {
        Ok(Self::by_regex(Regex::new(pattern)?))
    }

    pub fn by_regex(name_re: Regex) -> Self {
        Self {
            name_re: Some(name_re),
            ..Self::default()
        }
    }

    /// Match a resource by its ID.
    pub fn by_id(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            ..Self::default()
        }
    }

    /// Only match resources with this version.
    pub fn with_version(mut self, pe_version: impl Into<String>) -> Self {
        self.pe_version = Some(pe_version.into());
        self
    }

    fn version_matches(&self, resource: &ResourceDescriptor) -> bool {
        match &self.pe_version {
            Some(version) => resource.pe_version.as_deref() == Some(version.as_str()),
            None => true,
        }
    }
}

impl Package {
    /// Names of all resources in the package, in listed order.
    pub fn list_resources(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }

    /// Find the descriptor of the resource matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`EmploiStoreError::InvalidArgument`] if the selector sets
    /// none of `resource_id`, `name_re` and `name`, and
    /// [`EmploiStoreError::NotFound`] if no resource matches.
    pub fn find_resource(&self, selector: &ResourceSelector) -> Result<&ResourceDescriptor> {
        let (found, wanted) = if let Some(id) = &selector.resource_id {
            let found = self
                .resources
                .iter()
                .find(|r| r.id == *id && selector.version_matches(r));
            (found, id.clone())
        } else if let Some(name_re) = &selector.name_re {
            let found = self
                .resources
                .iter()
                .find(|r| name_re.is_match(&r.name) && selector.version_matches(r));
            (found, format!("/{}/", name_re.as_str()))
        } else if let Some(name) = &selector.name {
            let found = self
                .resources
                .iter()
                .find(|r| r.name == *name && selector.version_matches(r));
            (found, name.clone())
        } else {
            return Err(EmploiStoreError::InvalidArgument(
                "one of resource_id, name_re or name must be set".to_string(),
            ));
        };

        found.ok_or_else(|| {
            tracing::warn!(
                package = %self.name,
                wanted = %wanted,
                available = ?self.list_resources(),
                "no matching resource"
            );
            EmploiStoreError::NotFound {
                entity_type: "Resource",
                id: match &selector.pe_version {
                    Some(version) => format!("{wanted} (version {version})"),
                    None => wanted,
                },
            }
        })
    }

    /// Resolve `selector` and fetch the full resource description.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let bmo = Package::get(&client, PackageSelector::name("bmo")).await?;
    /// let bmo_2015 = bmo
    ///     .get_resource(&client, &ResourceSelector::by_pattern("2015")?)
    ///     .await?;
    /// ```
    #[tracing::instrument(skip(self, client), fields(package = %self.name))]
    pub async fn get_resource(
        &self,
        client: &EmploiStoreClient,
        selector: &ResourceSelector,
    ) -> Result<Resource> {
        let descriptor = self.find_resource(selector)?;
        Resource::get(client, descriptor.id.clone()).await
    }
}

#[derive(Debug, Deserialize)]
struct OrganizationResult {
    #[serde(default)]
    packages: Vec<PackageSummary>,
}

/// List all packages of the catalog, indexed by name.
///
/// The listing is fetched once per client (and its clones) and then served
/// from memory.
#[tracing::instrument(skip(client))]
pub async fn list_packages(
    client: &EmploiStoreClient,
) -> Result<Arc<BTreeMap<String, PackageSummary>>> {
    if let Some(cached) = client.cached_packages().await {
        return Ok(cached);
    }

    let packages = match client
        .datastore_get("organization_show", &[("id", DATA_ORGANIZATION)])
        .await?
    {
        Some(result) => serde_json::from_value::<OrganizationResult>(result)?.packages,
        None => Vec::new(),
    };
    tracing::debug!(count = packages.len(), "listed packages");

    let by_name: BTreeMap<_, _> = packages.into_iter().map(|p| (p.name.clone(), p)).collect();
    // An empty listing is not cached, so the next call asks again.
    if by_name.is_empty() {
        return Ok(Arc::new(by_name));
    }
    Ok(client.cache_packages(by_name).await)
}

async fn show_package(client: &EmploiStoreClient, id: &str) -> Result<Option<Package>> {
    match client.datastore_get("package_show", &[("id", id)]).await? {
        Some(result) => Ok(Some(serde_json::from_value(result)?)),
        None => Ok(None),
    }
}

#[async_trait]
impl Get for Package {
    type Id = PackageSelector;

    #[tracing::instrument(skip(client))]
    async fn get(client: &EmploiStoreClient, selector: PackageSelector) -> Result<Self> {
        let (id, wanted) = match selector {
            PackageSelector::Id(id) => (id.clone(), id),
            PackageSelector::Name(name) => {
                let packages = list_packages(client).await?;
                let id = packages
                    .get(&name)
                    .map(|p| p.id.clone())
                    .ok_or_else(|| EmploiStoreError::NotFound {
                        entity_type: "Package",
                        id: name.clone(),
                    })?;
                (id, name)
            }
        };

        show_package(client, &id)
            .await?
            .ok_or(EmploiStoreError::NotFound {
                entity_type: "Package",
                id: wanted,
            })
    }
}
