//! Mock server state management.
//!
//! Provides the in-memory data store for the mock Emploi Store API server.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::fixtures::DefaultScenario;
use crate::{cell_value, Company, Package, PackageSummary, Record};

/// Shared state for the mock server.
///
/// This struct holds all the mock data that the server will serve.
/// It's wrapped in `Arc<RwLock<_>>` for concurrent access.
#[derive(Debug, Default)]
pub struct MockState {
    /// Packages in catalog order.
    pub packages: Vec<Package>,

    /// Records indexed by resource ID, in server order.
    pub records: HashMap<String, Vec<Record>>,

    /// Companies returned by the company search, in server order.
    pub companies: Vec<Company>,

    /// Credentials the token endpoint accepts. Any credentials are accepted
    /// when unset.
    pub credentials: Option<(String, String)>,

    /// Lifetime of issued tokens, in seconds.
    pub token_lifetime_secs: i64,

    /// Tokens handed out so far, with the scope they were issued for.
    pub issued_tokens: Vec<(String, String)>,

    /// Number of `datastore_search` requests served.
    pub search_requests: u32,
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self {
            token_lifetime_secs: 600,
            ..Self::default()
        }
    }

    /// Create state holding every package, record and company of a
    /// scenario. Any credentials are accepted.
    pub fn from_scenario(scenario: DefaultScenario) -> Self {
        let mut state = Self::new().with_companies(scenario.companies);
        state.packages = scenario.packages;
        state.records = scenario.records.into_iter().collect();
        state
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Add a package to the catalog.
    pub fn with_package(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }

    /// Set the records of a resource.
    pub fn with_records(mut self, resource_id: &str, records: Vec<Record>) -> Self {
        self.records.insert(resource_id.to_string(), records);
        self
    }

    /// Add companies to the search results.
    pub fn with_companies(mut self, companies: Vec<Company>) -> Self {
        self.companies.extend(companies);
        self
    }

    /// Only accept these credentials at the token endpoint.
    pub fn with_credentials(mut self, client_id: &str, client_secret: &str) -> Self {
        self.credentials = Some((client_id.to_string(), client_secret.to_string()));
        self
    }

    /// Set the lifetime of issued tokens.
    pub fn with_token_lifetime(mut self, secs: i64) -> Self {
        self.token_lifetime_secs = secs;
        self
    }

    /// Check credentials and issue a token for `scope`.
    pub fn issue_token(&mut self, client_id: &str, client_secret: &str, scope: &str) -> Option<String> {
        if let Some((id, secret)) = &self.credentials {
            if id != client_id || secret != client_secret {
                return None;
            }
        }
        let token = format!("token-{}", self.issued_tokens.len() + 1);
        self.issued_tokens.push((token.clone(), scope.to_string()));
        Some(token)
    }

    /// Returns true if `token` was issued by this server.
    pub fn is_issued(&self, token: &str) -> bool {
        self.issued_tokens.iter().any(|(t, _)| t == token)
    }

    /// Package summaries as listed by the organization.
    pub fn package_summaries(&self) -> Vec<PackageSummary> {
        self.packages
            .iter()
            .map(|p| PackageSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                title: p.title.clone(),
                extra: Record::new(),
            })
            .collect()
    }

    /// Get a package by ID.
    pub fn get_package(&self, id: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// Get a resource description by ID.
    pub fn get_resource(&self, id: &str) -> Option<Record> {
        self.packages
            .iter()
            .flat_map(|p| p.resources.iter())
            .find(|r| r.id == id)
            .and_then(|r| match serde_json::to_value(r) {
                Ok(serde_json::Value::Object(map)) => Some(map),
                _ => None,
            })
    }

    /// Search the records of a resource.
    ///
    /// Applies equality filters (compared as strings), slices by
    /// offset/limit and projects fields. Returns `None` if the resource is
    /// unknown, otherwise the page and the filtered total.
    pub fn search_records(
        &self,
        resource_id: &str,
        filters: &Record,
        fields: Option<&[String]>,
        offset: usize,
        limit: usize,
    ) -> Option<(Vec<Record>, usize)> {
        let records = self.records.get(resource_id)?;
        let matching: Vec<&Record> = records
            .iter()
            .filter(|r| {
                filters.iter().all(|(field, wanted)| {
                    r.get(field)
                        .map(|v| cell_value(v) == cell_value(wanted))
                        .unwrap_or(false)
                })
            })
            .collect();
        let total = matching.len();

        let page = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|r| match fields {
                Some(fields) => fields
                    .iter()
                    .filter_map(|f| r.get(f).map(|v| (f.clone(), v.clone())))
                    .collect(),
                None => r.clone(),
            })
            .collect();
        Some((page, total))
    }
}
