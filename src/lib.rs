//! Emploi Store API client library.
//!
//! A Rust library for the Emploi Store Dev open data platform. Datasets are
//! organized as packages holding resources; every resource is a paginated
//! set of records that this crate exposes as a lazy [`Stream`].
//!
//! # Quick Start
//!
//! ```no_run
//! use emploi_store::{
//!     EmploiStoreClient, ExportOptions, Get, Package, PackageSelector, ResourceSelector,
//! };
//!
//! #[tokio::main]
//! async fn main() -> emploi_store::Result<()> {
//!     // Credentials from EMPLOI_STORE_CLIENT_ID / EMPLOI_STORE_CLIENT_SECRET
//!     let client = EmploiStoreClient::from_env()?;
//!
//!     // Get the BMO package
//!     let bmo = Package::get(&client, PackageSelector::name("bmo")).await?;
//!
//!     // Pick the 2014 survey results
//!     let bmo_2014 = bmo
//!         .get_resource(&client, &ResourceSelector::by_name("Résultats enquête BMO 2014"))
//!         .await?;
//!
//!     // Download the full resource as CSV
//!     let rows = bmo_2014
//!         .to_csv(&client, "bmo_2014.csv", &ExportOptions::default())
//!         .await?;
//!     println!("Wrote {rows} rows");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`EmploiStoreClient`] performs authenticated requests. Tokens are cached
//!   per scope by its [`TokenCache`].
//! - [`Package`] and [`Resource`] implement [`Get`]; both borrow the client
//!   for each call instead of holding it.
//! - [`PageStream`] walks offset-paginated endpoints one page at a time.
//! - [`RecordSink`] receives exported records; [`CsvSink`] writes CSV.
//! - The `endpoints` functions wrap the fixed APIs: company search,
//!   training ranking, soft skills, service catalogue and events.
//!
//! # Configuration
//!
//! [`ClientConfig::from_env`] reads:
//!
//! - `EMPLOI_STORE_CLIENT_ID` and `EMPLOI_STORE_CLIENT_SECRET` - credentials,
//!   checked when the first token is needed
//! - `EMPLOI_STORE_API_URL` (optional) - API base URL
//! - `EMPLOI_STORE_AUTH_URL` (optional) - OAuth2 token endpoint
//!
//! [`Stream`]: futures_util::Stream

mod auth;
mod client;
mod config;
mod endpoints;
mod error;
mod models;
mod pagination;
mod sink;
mod traits;

pub mod cli;
pub mod output;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use auth::TokenCache;
pub use client::{EmploiStoreClient, DATASTORE_SCOPE};
pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_AUTH_URL, DEFAULT_REALM};
pub use error::{EmploiStoreError, Result};
pub use pagination::{BoxFuture, Page, PageStream, DEFAULT_BATCH_SIZE};
pub use sink::{cell_value, header_from_record, write_records, CsvSink, RecordSink};

// Re-export traits
pub use traits::Get;

// Re-export models
pub use models::{
    // Package types
    list_packages,
    Package,
    PackageSelector,
    PackageSummary,
    ResourceDescriptor,
    ResourceSelector,
    DATA_ORGANIZATION,
    // Resource types
    fetch_records_page,
    stream_records,
    ExportOptions,
    Record,
    RecordQuery,
    RecordStream,
    Resource,
};

// Re-export endpoint functions
pub use endpoints::{
    describe_service, employment_rate_rank, list_online_events, list_services, search_companies,
    soft_skills, Company, CompanySearch, Contract, CATALOGUE_SCOPE, COMPANIES_SCOPE,
    DEFAULT_DISTANCE_KM, EVENTS_SCOPE, MAX_COMPANIES_PAGE_SIZE, SOFT_SKILLS_SCOPE,
    TRAINING_SCOPE,
};
