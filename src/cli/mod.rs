//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the
//! emploi-store binary.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    ClientConfig, CompanySearch, Contract, EmploiStoreError, PackageSelector, RecordQuery,
    ResourceSelector, Result, DEFAULT_BATCH_SIZE, DEFAULT_DISTANCE_KM,
};

/// Emploi Store open data command-line interface.
#[derive(Parser, Debug)]
#[command(name = "emploi-store", about = "Emploi Store API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// OAuth2 client ID.
    #[arg(long, global = true, env = "EMPLOI_STORE_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// OAuth2 client secret.
    #[arg(long, global = true, env = "EMPLOI_STORE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// API base URL.
    #[arg(long, global = true, env = "EMPLOI_STORE_API_URL")]
    pub api_url: Option<String>,

    /// OAuth2 token endpoint.
    #[arg(long, global = true, env = "EMPLOI_STORE_AUTH_URL")]
    pub auth_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Client configuration from the global options.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            ..ClientConfig::default()
        };
        if let Some(url) = &self.api_url {
            config = config.with_api_url(url.clone());
        }
        if let Some(url) = &self.auth_url {
            config = config.with_auth_url(url.clone());
        }
        config
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all packages of the catalog.
    Packages,

    /// List the resources of a package.
    Resources {
        #[command(flatten)]
        package: PackageArgs,
    },

    /// Print the records of a resource.
    Records {
        #[command(flatten)]
        resource: ResourceArgs,

        /// Keep only records where FIELD equals VALUE (repeatable).
        #[arg(long = "filter", value_name = "FIELD=VALUE", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        /// Only return these fields (repeatable).
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Stop after this many records.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Download a resource as a CSV file.
    Download {
        #[command(flatten)]
        resource: ResourceArgs,

        /// Path of the CSV file to write.
        #[arg(long, short)]
        output: String,

        /// Columns to write (repeatable). Defaults to the sorted fields of
        /// the first record.
        #[arg(long = "column")]
        columns: Vec<String>,

        /// Keep only records where FIELD equals VALUE (repeatable).
        #[arg(long = "filter", value_name = "FIELD=VALUE", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },

    /// Search companies likely to hire.
    Companies {
        /// INSEE code of the city to search around.
        #[arg(long, required_unless_present_all = ["latitude", "longitude"])]
        city_id: Option<String>,

        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,

        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,

        /// Search radius in kilometers.
        #[arg(long, default_value_t = DEFAULT_DISTANCE_KM)]
        distance: f64,

        /// ROME codes of the job groups (repeatable).
        #[arg(long = "rome")]
        rome_codes: Vec<String>,

        /// NAF codes of the activity sectors (repeatable).
        #[arg(long = "naf")]
        naf_codes: Vec<String>,

        #[arg(long)]
        contract: Option<ContractArg>,

        /// Stop after this many companies.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Employment rate ranking of a training in a city.
    TrainingRank {
        /// Formacode of the training domain.
        formacode: String,

        /// INSEE code of the city.
        city_id: String,
    },

    /// Soft skills of a job group.
    SoftSkills {
        /// ROME code of the job group.
        rome: String,
    },

    /// List the Emploi Store services, or describe one.
    Services {
        /// Service to describe.
        service_id: Option<String>,

        /// Include base64 images in the description.
        #[arg(long, requires = "service_id")]
        images: bool,
    },

    /// List online job fairs.
    Events,
}

/// Package selection.
#[derive(Args, Debug, Clone)]
pub struct PackageArgs {
    /// Package name, or ID with --package-id.
    pub package: String,

    /// Treat the package argument as an ID.
    #[arg(long)]
    pub package_id: bool,
}

impl PackageArgs {
    pub fn selector(&self) -> PackageSelector {
        if self.package_id {
            PackageSelector::id(&self.package)
        } else {
            PackageSelector::name(&self.package)
        }
    }
}

/// Resource selection within a package.
#[derive(Args, Debug, Clone)]
pub struct ResourceArgs {
    #[command(flatten)]
    pub package: PackageArgs,

    /// Exact resource name.
    #[arg(long, required_unless_present_any = ["name_re", "resource_id"])]
    pub name: Option<String>,

    /// Regular expression matched against resource names.
    #[arg(long)]
    pub name_re: Option<String>,

    /// Resource ID.
    #[arg(long)]
    pub resource_id: Option<String>,

    /// Resource version.
    #[arg(long)]
    pub pe_version: Option<String>,

    /// Records per page request.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: u32,
}

impl ResourceArgs {
    /// Build the resource selector.
    ///
    /// # Errors
    ///
    /// Returns an error if `--name-re` is not a valid regular expression.
    pub fn selector(&self) -> Result<ResourceSelector> {
        let name_re = self
            .name_re
            .as_deref()
            .map(regex::Regex::new)
            .transpose()
            .map_err(EmploiStoreError::from)?;

        Ok(ResourceSelector {
            name: self.name.clone(),
            name_re,
            resource_id: self.resource_id.clone(),
            pe_version: self.pe_version.clone(),
        })
    }

    /// Record query with the batch size and the given filters and fields.
    pub fn query(&self, filters: &[(String, String)], fields: &[String]) -> RecordQuery {
        let mut query = RecordQuery::default().with_batch_size(self.batch_size);
        for (field, value) in filters {
            query = query.filter(field.clone(), value.clone());
        }
        if !fields.is_empty() {
            query = query.fields(fields.iter().cloned());
        }
        query
    }
}

/// Contract kinds accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContractArg {
    Dpae,
    Alternance,
}

impl From<ContractArg> for Contract {
    fn from(arg: ContractArg) -> Self {
        match arg {
            ContractArg::Dpae => Contract::Dpae,
            ContractArg::Alternance => Contract::Alternance,
        }
    }
}

/// Build a company search from the `companies` arguments.
pub fn company_search(
    city_id: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    distance: f64,
    rome_codes: Vec<String>,
    naf_codes: Vec<String>,
    contract: Option<ContractArg>,
) -> CompanySearch {
    CompanySearch {
        latitude,
        longitude,
        city_id,
        distance,
        rome_codes,
        naf_codes,
        contract: contract.map(Into::into),
        ..CompanySearch::default()
    }
}

fn parse_filter(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => Err(format!("expected FIELD=VALUE, got '{s}'")),
    }
}
