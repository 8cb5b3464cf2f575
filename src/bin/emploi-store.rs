//! Emploi Store API CLI binary.
//!
//! A command-line interface for browsing and downloading Emploi Store data.

use std::process::ExitCode;

use clap::Parser;
use emploi_store::cli::{company_search, Cli, Command, ResourceArgs};
use emploi_store::output::PrettyPrint;
use emploi_store::{
    describe_service, employment_rate_rank, list_online_events, list_packages, list_services,
    search_companies, soft_skills, Company, EmploiStoreClient, ExportOptions, Get, Package,
    PackageSummary, Record, Resource,
};
use futures_util::{StreamExt, TryStreamExt};
use serde::Serialize;
use tabled::{Table, Tabled};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = match EmploiStoreClient::with_config(cli.client_config()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if matches!(e, emploi_store::EmploiStoreError::ConfigMissing(_)) {
                eprintln!(
                    "Hint: Set EMPLOI_STORE_CLIENT_ID and EMPLOI_STORE_CLIENT_SECRET environment variables"
                );
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &EmploiStoreClient, cli: Cli) -> emploi_store::Result<()> {
    let json = cli.json;
    match cli.command {
        Command::Packages => {
            let packages = list_packages(client).await?;
            if json {
                let list: Vec<&PackageSummary> = packages.values().collect();
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                let rows: Vec<PackageRow> = packages.values().map(PackageRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }
        Command::Resources { package } => {
            let package = Package::get(client, package.selector()).await?;
            output_single(&package, json)?;
        }
        Command::Records {
            resource,
            filters,
            fields,
            limit,
        } => {
            let found = resolve_resource(client, &resource).await?;
            let records = found.records(client, resource.query(&filters, &fields));
            let mut records = records.take(limit.unwrap_or(usize::MAX));
            while let Some(record) = records.try_next().await? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Command::Download {
            resource,
            output,
            columns,
            filters,
        } => {
            let found = resolve_resource(client, &resource).await?;
            let options = ExportOptions {
                fieldnames: (!columns.is_empty()).then_some(columns),
                query: resource.query(&filters, &[]),
            };
            let rows = found.to_csv(client, &output, &options).await?;
            eprintln!("Wrote {rows} records of '{}' to {output}", found.label());
        }
        Command::Companies {
            city_id,
            latitude,
            longitude,
            distance,
            rome_codes,
            naf_codes,
            contract,
            limit,
        } => {
            let search = company_search(
                city_id, latitude, longitude, distance, rome_codes, naf_codes, contract,
            );
            let companies: Vec<Company> = search_companies(client, &search)?
                .take(limit.unwrap_or(usize::MAX))
                .try_collect()
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&companies)?);
            } else {
                let rows: Vec<CompanyRow> = companies.iter().map(CompanyRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }
        Command::TrainingRank { formacode, city_id } => {
            let rank = employment_rate_rank(client, &formacode, &city_id).await?;
            print_json(&rank)?;
        }
        Command::SoftSkills { rome } => {
            let skills = soft_skills(client, &rome).await?;
            print_json(&skills)?;
        }
        Command::Services { service_id, images } => match service_id {
            Some(id) => print_json(&describe_service(client, &id, images).await?)?,
            None => print_json(&list_services(client).await?)?,
        },
        Command::Events => {
            let events: Vec<Record> = list_online_events(client).await?;
            print_json(&events)?;
        }
    }
    Ok(())
}

async fn resolve_resource(
    client: &EmploiStoreClient,
    args: &ResourceArgs,
) -> emploi_store::Result<Resource> {
    let package = Package::get(client, args.package.selector()).await?;
    package.get_resource(client, &args.selector()?).await
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> emploi_store::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn output_single<T: Serialize + PrettyPrint>(item: &T, json: bool) -> emploi_store::Result<()> {
    if json {
        print_json(item)
    } else {
        println!("{}", item.pretty_print());
        Ok(())
    }
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct PackageRow {
    name: String,
    title: String,
    id: String,
}

impl From<&PackageSummary> for PackageRow {
    fn from(p: &PackageSummary) -> Self {
        Self {
            name: p.name.clone(),
            title: p.title.clone().unwrap_or_default(),
            id: p.id.clone(),
        }
    }
}

#[derive(Tabled)]
struct CompanyRow {
    siret: String,
    name: String,
    city: String,
    #[tabled(rename = "km")]
    distance: String,
}

impl From<&Company> for CompanyRow {
    fn from(c: &Company) -> Self {
        Self {
            siret: c.siret.clone().unwrap_or_default(),
            name: c.name.clone().unwrap_or_default(),
            city: c.city.clone().unwrap_or_default(),
            distance: c.distance.map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}
