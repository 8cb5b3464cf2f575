//! Record sinks and streaming export.
//!
//! A [`RecordSink`] receives a header once and then one row per record.
//! [`CsvSink`] writes them as CSV through the `csv` crate.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use futures_util::{Stream, TryStreamExt};
use serde_json::Value;

use crate::error::{EmploiStoreError, Result};
use crate::models::Record;

/// Byte order mark some upstream CSV files leave on their first column.
const BOM: char = '\u{feff}';

/// Internal row ID added by the datastore, never exported by default.
const ROW_ID_FIELD: &str = "_id";

/// Destination for exported records.
pub trait RecordSink {
    /// Write the header. Row field order follows these names.
    fn write_header(&mut self, fieldnames: &[String]) -> Result<()>;

    /// Write one record. Fields not in the header are ignored and missing
    /// fields are written empty.
    fn write_row(&mut self, record: &Record) -> Result<()>;

    /// Flush buffered output.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A [`RecordSink`] writing CSV.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    fieldnames: Option<Vec<String>>,
}

impl CsvSink<File> {
    /// Create (or truncate) a CSV file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
            fieldnames: None,
        })
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            fieldnames: None,
        }
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| {
            EmploiStoreError::IoError(io::Error::new(e.error().kind(), e.error().to_string()))
        })
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_header(&mut self, fieldnames: &[String]) -> Result<()> {
        self.writer.write_record(fieldnames)?;
        self.fieldnames = Some(fieldnames.to_vec());
        Ok(())
    }

    fn write_row(&mut self, record: &Record) -> Result<()> {
        let fieldnames = self.fieldnames.as_ref().ok_or_else(|| {
            EmploiStoreError::InvalidArgument("CSV header must be written before rows".to_string())
        })?;
        let row = fieldnames
            .iter()
            .map(|name| record.get(name).map(cell_value).unwrap_or_default());
        self.writer.write_record(row)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Render a JSON value as a CSV cell.
pub fn cell_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn strip_bom(field: &str) -> &str {
    field.strip_prefix(BOM).unwrap_or(field)
}

fn strip_bom_keys(record: Record) -> Record {
    if !record.keys().any(|k| k.starts_with(BOM)) {
        return record;
    }
    record
        .into_iter()
        .map(|(k, v)| (strip_bom(&k).to_string(), v))
        .collect()
}

/// Header derived from a record: its keys without byte order marks or the
/// datastore row ID, sorted.
pub fn header_from_record(record: &Record) -> Vec<String> {
    record
        .keys()
        .map(|k| strip_bom(k))
        .filter(|k| *k != ROW_ID_FIELD)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Stream `records` into `sink`.
///
/// The header is `fieldnames` if given, otherwise [`header_from_record`] of
/// the first record. Each record goes through `transform` before being
/// written. Returns the number of rows written. An empty stream without
/// explicit field names writes nothing.
///
/// Errors from the stream stop the export; rows already written stay in
/// the sink.
pub async fn write_records<St, S, F>(
    mut records: St,
    sink: &mut S,
    fieldnames: Option<Vec<String>>,
    mut transform: F,
) -> Result<u64>
where
    St: Stream<Item = Result<Record>> + Unpin,
    S: RecordSink,
    F: FnMut(Record) -> Record,
{
    let first = records.try_next().await?;
    let fieldnames = match (fieldnames, &first) {
        (Some(names), _) if !names.is_empty() => names,
        (_, Some(first)) => header_from_record(first),
        (_, None) => {
            tracing::debug!("no records and no field names, nothing to write");
            return Ok(0);
        }
    };
    sink.write_header(&fieldnames)?;

    let mut rows = 0u64;
    let mut next = first;
    while let Some(record) = next {
        sink.write_row(&strip_bom_keys(transform(record)))?;
        rows += 1;
        next = records.try_next().await?;
    }
    sink.flush()?;

    tracing::debug!(rows, "export finished");
    Ok(rows)
}
