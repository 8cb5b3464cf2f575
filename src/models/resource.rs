//! Resource model, record iteration and export.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::de;
use crate::client::EmploiStoreClient;
use crate::error::{EmploiStoreError, Result};
use crate::pagination::{Page, PageStream, DEFAULT_BATCH_SIZE};
use crate::sink::{write_records, CsvSink, RecordSink};
use crate::traits::Get;

/// One row of a resource. Field order is kept as the server sends it.
pub type Record = serde_json::Map<String, Value>;

/// Lazy stream over the records of a resource.
pub type RecordStream<'a> = PageStream<'a, Record>;

/// A resource (one dataset) from the datastore.
///
/// A resource usually comes from a single CSV file upstream, e.g. the
/// results of the BMO survey for one year. Its records are fetched page by
/// page; nothing is cached between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub pe_version: Option<String>,
    /// Every other field of the resource description.
    #[serde(flatten)]
    pub metadata: Record,
}

/// Which records to fetch and how.
#[derive(Debug, Clone)]
pub struct RecordQuery {
    /// Records per page request.
    pub batch_size: u32,
    /// Equality constraints, field name to value.
    pub filters: BTreeMap<String, Value>,
    /// Fields to return; all fields when `None`.
    pub fields: Option<Vec<String>>,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            filters: BTreeMap::new(),
            fields: None,
        }
    }
}

impl RecordQuery {
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Only keep records where `field` equals `value`.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Only return these fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Options for exporting a resource.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Columns to write. When unset, the keys of the first record are used,
    /// sorted, without `_id`.
    pub fieldnames: Option<Vec<String>>,
    pub query: RecordQuery,
}

#[derive(Serialize)]
struct SearchParams<'a> {
    id: &'a str,
    limit: u32,
    offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<String>,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    total: Option<u64>,
}

/// Fetch one page of records of a resource.
#[tracing::instrument(skip(client, query), fields(filters = query.filters.len()))]
pub async fn fetch_records_page(
    client: &EmploiStoreClient,
    resource_id: &str,
    offset: u64,
    limit: u32,
    query: &RecordQuery,
) -> Result<Page<Record>> {
    let filters = if query.filters.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&query.filters)?)
    };
    let params = SearchParams {
        id: resource_id,
        limit,
        offset,
        filters,
        fields: query.fields.as_ref().map(|f| f.join(",")),
    };

    match client.datastore_get("datastore_search", &params).await? {
        Some(result) => {
            let result: SearchResult = serde_json::from_value(result)?;
            Ok(Page::new(result.records, offset, limit, result.total))
        }
        None => Ok(Page::empty(offset, limit)),
    }
}

/// Stream every record of a resource matching `query`.
///
/// Each call starts a fresh run from the first record.
pub fn stream_records<'a>(
    client: &'a EmploiStoreClient,
    resource_id: impl Into<String>,
    query: RecordQuery,
) -> RecordStream<'a> {
    let resource_id = resource_id.into();
    let batch_size = query.batch_size;
    PageStream::new(batch_size, move |offset, limit| {
        let resource_id = resource_id.clone();
        let query = query.clone();
        Box::pin(async move {
            fetch_records_page(client, &resource_id, offset, limit, &query).await
        })
    })
}

impl Resource {
    /// Display name, falling back to the ID.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Stream all records of this resource.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use futures_util::TryStreamExt;
    ///
    /// let query = RecordQuery::default().filter("ROME_PROFESSION_CARD_CODE", "F1402");
    /// let mut records = resource.records(&client, query);
    /// while let Some(record) = records.try_next().await? {
    ///     println!("{}", record["ROME_PROFESSION_NAME"]);
    /// }
    /// ```
    pub fn records<'a>(&self, client: &'a EmploiStoreClient, query: RecordQuery) -> RecordStream<'a> {
        stream_records(client, self.id.clone(), query)
    }

    /// Fetch a single page of records starting at `offset`.
    pub async fn records_page(
        &self,
        client: &EmploiStoreClient,
        offset: u64,
        query: &RecordQuery,
    ) -> Result<Page<Record>> {
        fetch_records_page(client, &self.id, offset, query.batch_size.max(1), query).await
    }

    /// Write all records to `sink`, passing each one through `transform`
    /// first. Returns the number of rows written.
    ///
    /// Records are streamed: at most one page is held in memory.
    #[tracing::instrument(skip(self, client, sink, options, transform), fields(resource = %self.id))]
    pub async fn export<S, F>(
        &self,
        client: &EmploiStoreClient,
        sink: &mut S,
        options: &ExportOptions,
        transform: F,
    ) -> Result<u64>
    where
        S: RecordSink,
        F: FnMut(Record) -> Record,
    {
        let records = self.records(client, options.query.clone());
        write_records(records, sink, options.fieldnames.clone(), transform).await
    }

    /// Download all records to a CSV file at `path`.
    pub async fn to_csv(
        &self,
        client: &EmploiStoreClient,
        path: impl AsRef<Path>,
        options: &ExportOptions,
    ) -> Result<u64> {
        self.to_csv_with(client, path, options, |record| record).await
    }

    /// Download all records to a CSV file at `path`, passing each record
    /// through `transform` before it is written.
    ///
    /// The transform sees records in server order, so it can also serve as
    /// a progress hook.
    pub async fn to_csv_with<F>(
        &self,
        client: &EmploiStoreClient,
        path: impl AsRef<Path>,
        options: &ExportOptions,
        transform: F,
    ) -> Result<u64>
    where
        F: FnMut(Record) -> Record,
    {
        let mut sink = CsvSink::from_path(path)?;
        self.export(client, &mut sink, options, transform).await
    }
}

impl From<super::ResourceDescriptor> for Resource {
    fn from(descriptor: super::ResourceDescriptor) -> Self {
        Self {
            id: descriptor.id,
            name: Some(descriptor.name),
            pe_version: descriptor.pe_version,
            metadata: descriptor.raw,
        }
    }
}

#[async_trait]
impl Get for Resource {
    type Id = String;

    #[tracing::instrument(skip(client))]
    async fn get(client: &EmploiStoreClient, resource_id: String) -> Result<Self> {
        match client
            .datastore_get("resource_show", &[("id", resource_id.as_str())])
            .await?
        {
            Some(result) => Ok(serde_json::from_value(result)?),
            None => Err(EmploiStoreError::NotFound {
                entity_type: "Resource",
                id: resource_id,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_query_builder() {
        let query = RecordQuery::default()
            .with_batch_size(50)
            .filter("ROME_PROFESSION_CARD_CODE", "F1402")
            .fields(["ROME_PROFESSION_NAME"]);

        assert_eq!(query.batch_size, 50);
        assert_eq!(query.filters["ROME_PROFESSION_CARD_CODE"], "F1402");
        assert_eq!(query.fields, Some(vec!["ROME_PROFESSION_NAME".to_string()]));
    }

    #[test]
    fn test_default_batch_size() {
        assert_eq!(RecordQuery::default().batch_size, 200);
    }

    #[test]
    fn test_resource_metadata_kept() {
        let resource: Resource = serde_json::from_value(serde_json::json!({
            "id": "r-1",
            "name": "BMO 2015",
            "format": "CSV",
            "pe_version": 3
        }))
        .unwrap();

        assert_eq!(resource.label(), "BMO 2015");
        assert_eq!(resource.pe_version.as_deref(), Some("3"));
        assert_eq!(resource.metadata["format"], "CSV");
    }

    #[test]
    fn test_search_params_skip_unset() {
        let params = SearchParams {
            id: "r-1",
            limit: 200,
            offset: 400,
            filters: None,
            fields: Some("A,B".to_string()),
        };
        let encoded = serde_json::to_value(&params).unwrap();
        assert_eq!(encoded["offset"], 400);
        assert!(encoded.get("filters").is_none());
        assert_eq!(encoded["fields"], "A,B");
    }
}
