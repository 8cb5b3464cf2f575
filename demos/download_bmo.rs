//! Download example for the Emploi Store client.
//!
//! Run with:
//! ```
//! EMPLOI_STORE_CLIENT_ID=your-id EMPLOI_STORE_CLIENT_SECRET=your-secret \
//!     cargo run --example download_bmo
//! ```

use emploi_store::{
    list_packages, EmploiStoreClient, ExportOptions, Get, Package, PackageSelector, RecordQuery,
    ResourceSelector,
};
use futures_util::TryStreamExt;

#[tokio::main]
async fn main() -> emploi_store::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    // Create client from environment variables
    println!("Creating Emploi Store client...");
    let client = EmploiStoreClient::from_env()?;
    println!("Connected to: {}", client.api_url());

    // List the catalog
    println!("\n--- Packages ---");
    let packages = list_packages(&client).await?;
    for (name, package) in packages.iter() {
        println!("  - {} ({})", name, package.title.as_deref().unwrap_or("untitled"));
    }

    // Resources of the BMO package
    println!("\n--- BMO Resources ---");
    let bmo = Package::get(&client, PackageSelector::name("bmo")).await?;
    for name in bmo.list_resources() {
        println!("  - {}", name);
    }

    // Download the job family code table
    println!("\n--- Downloading Job Families ---");
    let families = bmo
        .get_resource(
            &client,
            &ResourceSelector::by_name("Référentiel des familles de métier"),
        )
        .await?;
    let rows = families
        .to_csv(&client, "bmo_fap.csv", &ExportOptions::default())
        .await?;
    println!("Wrote {} rows to bmo_fap.csv", rows);

    // Job titles of one ROME group, only the name field
    println!("\n--- ROME F1402 Job Titles ---");
    let rome = Package::get(&client, PackageSelector::name("rome")).await?;
    let appellations = rome
        .get_resource(&client, &ResourceSelector::by_pattern("[Aa]ppellation")?)
        .await?;
    let query = RecordQuery::default()
        .filter("ROME_PROFESSION_CARD_CODE", "F1402")
        .fields(["ROME_PROFESSION_NAME"]);
    let mut records = appellations.records(&client, query);
    while let Some(record) = records.try_next().await? {
        if let Some(name) = record.get("ROME_PROFESSION_NAME").and_then(|n| n.as_str()) {
            println!("  - {}", name);
        }
    }

    println!("\nDone!");
    Ok(())
}
