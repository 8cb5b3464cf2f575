//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use serde_json::json;

use crate::{Company, Package, Record, ResourceDescriptor};

/// Resource ID of the 2014 BMO survey results.
pub const BMO_2014_ID: &str = "bmo-2014";

/// Resource ID of the 2015 BMO survey results.
pub const BMO_2015_ID: &str = "bmo-2015";

/// Resource ID of the job family code table.
pub const FAP_ID: &str = "bmo-fap";

/// Resource ID of the ROME job titles.
pub const APPELLATIONS_ID: &str = "rome-appellations";

/// Number of records of the 2015 BMO resource in the default scenario.
pub const BMO_2015_RECORDS: usize = 447;

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    // =========================================================================
    // Package Fixtures
    // =========================================================================

    /// Create a resource descriptor.
    pub fn resource(id: &str, name: &str, pe_version: Option<&str>) -> ResourceDescriptor {
        ResourceDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            pe_version: pe_version.map(str::to_string),
            raw: Record::new(),
        }
    }

    /// Create a package holding the given resources.
    pub fn package(id: &str, name: &str, resources: Vec<ResourceDescriptor>) -> Package {
        Package {
            id: id.to_string(),
            name: name.to_string(),
            title: None,
            resources,
            extra: Record::new(),
        }
    }

    /// The BMO (labor needs survey) package.
    pub fn bmo_package() -> Package {
        let mut package = Self::package(
            "pkg-bmo",
            "bmo",
            vec![
                Self::resource(BMO_2014_ID, "Résultats enquête BMO 2014", Some("1")),
                Self::resource(BMO_2015_ID, "Résultats enquête BMO 2015", Some("1")),
                Self::resource(FAP_ID, "Référentiel des familles de métier", None),
            ],
        );
        package.title = Some("Besoins en Main d'Oeuvre".to_string());
        package
    }

    /// The ROME (job directory) package.
    pub fn rome_package() -> Package {
        let mut package = Self::package(
            "pkg-rome",
            "rome",
            vec![Self::resource(APPELLATIONS_ID, "Appellations ROME", None)],
        );
        package.title = Some("Répertoire Opérationnel des Métiers et des Emplois".to_string());
        package
    }

    // =========================================================================
    // Record Fixtures
    // =========================================================================

    /// Create `count` records with a row number and its parity.
    pub fn numbered_records(count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| {
                Self::record(json!({
                    "_id": i + 1,
                    "ROW": i,
                    "PARITY": if i % 2 == 0 { "even" } else { "odd" },
                }))
            })
            .collect()
    }

    /// Create BMO survey records spread over a few regions.
    pub fn bmo_records(count: usize) -> Vec<Record> {
        const REGIONS: [&str; 3] = ["Bretagne", "Normandie", "Occitanie"];
        (0..count)
            .map(|i| {
                Self::record(json!({
                    "_id": i + 1,
                    "annee": 2015,
                    "Code métier BMO": format!("A{:04}", i),
                    "REG": REGIONS[i % REGIONS.len()],
                    "met": (i * 7) % 100,
                }))
            })
            .collect()
    }

    /// Job family code table. The first column name carries a UTF-8 BOM,
    /// like the exported source files.
    pub fn fap_records() -> Vec<Record> {
        [("A0Z40", "Agriculteurs salariés"), ("J1Z80", "Ouvriers qualifiés de la manutention")]
            .iter()
            .enumerate()
            .map(|(i, (code, name))| {
                Self::record(json!({
                    "_id": i + 1,
                    "\u{feff}FAP": code,
                    "LIBELLE": name,
                }))
            })
            .collect()
    }

    /// ROME job titles for two job groups.
    pub fn appellation_records() -> Vec<Record> {
        [
            ("F1402", 11004, "Conducteur / Conductrice d'engins de forage"),
            ("F1402", 11005, "Foreur / Foreuse"),
            ("K2204", 12006, "Agent / Agente de nettoyage"),
        ]
        .iter()
        .enumerate()
        .map(|(i, (code, id, name))| {
            Self::record(json!({
                "_id": i + 1,
                "ROME_PROFESSION_CARD_CODE": code,
                "ROME_PROFESSION_NAME": name,
                "OGR": id,
            }))
        })
        .collect()
    }

    fn record(value: serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Record::new(),
        }
    }

    // =========================================================================
    // Company Fixtures
    // =========================================================================

    /// Create a company located in `city`.
    pub fn company(siret: &str, name: &str, city: &str, distance: f64) -> Company {
        Company {
            siret: Some(siret.to_string()),
            name: Some(name.to_string()),
            naf: Some("4711D".to_string()),
            naf_text: Some("Supermarchés".to_string()),
            city: Some(city.to_string()),
            distance: Some(distance),
            lat: None,
            lon: None,
            headcount_text: Some("10 à 19 salariés".to_string()),
            url: None,
            extra: Record::new(),
        }
    }

    /// Create `count` companies around Lyon.
    pub fn companies(count: usize) -> Vec<Company> {
        (0..count)
            .map(|i| {
                Self::company(
                    &format!("{:014}", 12345678900000u64 + i as u64),
                    &format!("Company {}", i + 1),
                    "LYON",
                    (i as f64) / 10.0,
                )
            })
            .collect()
    }

    // =========================================================================
    // Scenario Fixtures
    // =========================================================================

    /// Default test scenario: BMO and ROME packages with records, and a few
    /// companies.
    pub fn default_scenario() -> DefaultScenario {
        DefaultScenario {
            packages: vec![Self::bmo_package(), Self::rome_package()],
            records: vec![
                (BMO_2014_ID.to_string(), Self::bmo_records(12)),
                (BMO_2015_ID.to_string(), Self::bmo_records(BMO_2015_RECORDS)),
                (FAP_ID.to_string(), Self::fap_records()),
                (APPELLATIONS_ID.to_string(), Self::appellation_records()),
            ],
            companies: Self::companies(5),
        }
    }
}

/// A complete test scenario with related data.
pub struct DefaultScenario {
    pub packages: Vec<Package>,
    pub records: Vec<(String, Vec<Record>)>,
    pub companies: Vec<Company>,
}
