//! Search for companies likely to hire ("La Bonne Boite").

use serde::{Deserialize, Serialize};

use crate::client::EmploiStoreClient;
use crate::error::{EmploiStoreError, Result};
use crate::models::{de, Record};
use crate::pagination::{Page, PageStream};

pub const COMPANIES_SCOPE: &str = "api_labonneboitev1";

const COMPANIES_PATH: &str = "labonneboite/v1/company/";

/// Default search radius, in kilometers.
pub const DEFAULT_DISTANCE_KM: f64 = 10.0;

/// Largest page the endpoint serves.
pub const MAX_COMPANIES_PAGE_SIZE: u32 = 100;

/// Kind of hiring a company is likely to offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contract {
    /// Regular hiring (Déclaration Préalable À l'Embauche).
    Dpae,
    /// Work-study contracts.
    Alternance,
}

/// A company returned by the search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub siret: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub naf: Option<String>,
    #[serde(default)]
    pub naf_text: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Distance from the search point, in kilometers.
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub headcount_text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Record,
}

/// Company search options.
///
/// Either `city_id` or both `latitude` and `longitude` must be set; the
/// city wins when both are given.
#[derive(Debug, Clone)]
pub struct CompanySearch {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// INSEE code of the city to search around.
    pub city_id: Option<String>,
    /// Search radius in kilometers.
    pub distance: f64,
    /// ROME codes of the job groups companies should hire in.
    pub rome_codes: Vec<String>,
    /// NAF codes of the companies' activity sectors.
    pub naf_codes: Vec<String>,
    /// Hiring kind; the server assumes [`Contract::Dpae`] when unset.
    pub contract: Option<Contract>,
    /// Companies per page request, capped at [`MAX_COMPANIES_PAGE_SIZE`].
    pub page_size: u32,
}

impl Default for CompanySearch {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            city_id: None,
            distance: DEFAULT_DISTANCE_KM,
            rome_codes: Vec::new(),
            naf_codes: Vec::new(),
            contract: None,
            page_size: MAX_COMPANIES_PAGE_SIZE,
        }
    }
}

impl CompanySearch {
    /// Search around a point.
    pub fn near(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Self::default()
        }
    }

    /// Search around a city, by INSEE code.
    pub fn in_city(city_id: impl Into<String>) -> Self {
        Self {
            city_id: Some(city_id.into()),
            ..Self::default()
        }
    }

    pub fn with_distance(mut self, distance_km: f64) -> Self {
        self.distance = distance_km;
        self
    }

    pub fn with_rome_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rome_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_naf_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.naf_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_contract(mut self, contract: Contract) -> Self {
        self.contract = Some(contract);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Query parameters for page `page` (1-indexed).
    fn params(&self, page: u64, page_size: u32) -> Result<CompanyParams<'_>> {
        let (commune_id, latitude, longitude) = match (&self.city_id, self.latitude, self.longitude)
        {
            (Some(city), _, _) => (Some(city.as_str()), None, None),
            (None, Some(lat), Some(lon)) => (None, Some(lat), Some(lon)),
            _ => {
                return Err(EmploiStoreError::InvalidArgument(
                    "one of city_id or (latitude, longitude) is required".to_string(),
                ))
            }
        };
        let join = |codes: &[String]| (!codes.is_empty()).then(|| codes.join(","));

        Ok(CompanyParams {
            distance: self.distance,
            commune_id,
            latitude,
            longitude,
            rome_codes: join(self.rome_codes.as_slice()),
            naf_codes: join(self.naf_codes.as_slice()),
            contract: self.contract,
            page,
            page_size,
        })
    }
}

#[derive(Debug, Serialize)]
struct CompanyParams<'a> {
    distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    commune_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rome_codes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    naf_codes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contract: Option<Contract>,
    page: u64,
    page_size: u32,
}

#[derive(Deserialize)]
struct CompaniesResponse {
    #[serde(default)]
    companies: Vec<Company>,
    #[serde(default)]
    companies_count: Option<u64>,
}

async fn fetch_companies_page(
    client: &EmploiStoreClient,
    search: &CompanySearch,
    offset: u64,
    limit: u32,
) -> Result<Page<Company>> {
    let params = search.params(offset / u64::from(limit) + 1, limit)?;
    tracing::debug!(page = params.page, "searching companies");

    match client.get_json(COMPANIES_SCOPE, COMPANIES_PATH, &params).await? {
        Some(value) => {
            let response: CompaniesResponse = serde_json::from_value(value)?;
            Ok(Page::new(
                response.companies,
                offset,
                limit,
                response.companies_count,
            ))
        }
        None => Ok(Page::empty(offset, limit)),
    }
}

/// Stream companies likely to hire around a location.
///
/// The location is checked before anything is requested.
///
/// # Errors
///
/// Returns [`EmploiStoreError::InvalidArgument`] if neither a city nor a
/// full latitude/longitude pair is given.
///
/// # Example
///
/// ```ignore
/// use futures_util::TryStreamExt;
///
/// let search = CompanySearch::in_city("69123").with_rome_codes(["D1102"]);
/// let companies: Vec<Company> = search_companies(&client, &search)?.try_collect().await?;
/// ```
pub fn search_companies<'a>(
    client: &'a EmploiStoreClient,
    search: &CompanySearch,
) -> Result<PageStream<'a, Company>> {
    search.params(1, 1)?;

    let search = search.clone();
    let page_size = search.page_size.clamp(1, MAX_COMPANIES_PAGE_SIZE);
    Ok(PageStream::new(page_size, move |offset, limit| {
        let search = search.clone();
        Box::pin(async move { fetch_companies_page(client, &search, offset, limit).await })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_required() {
        let err = CompanySearch::default().params(1, 10).unwrap_err();
        assert!(matches!(err, EmploiStoreError::InvalidArgument(_)));

        let half = CompanySearch {
            latitude: Some(45.75),
            ..Default::default()
        };
        assert!(half.params(1, 10).is_err());
    }

    #[test]
    fn test_city_takes_precedence() {
        let search = CompanySearch {
            latitude: Some(45.75),
            longitude: Some(4.85),
            city_id: Some("69123".to_string()),
            ..Default::default()
        };
        let params = search.params(1, 10).unwrap();
        assert_eq!(params.commune_id, Some("69123"));
        assert!(params.latitude.is_none());
    }

    #[test]
    fn test_codes_joined() {
        let search = CompanySearch::near(45.75, 4.85)
            .with_rome_codes(["D1102", "D1101"])
            .with_contract(Contract::Alternance);
        let params = serde_json::to_value(search.params(2, 50).unwrap()).unwrap();

        assert_eq!(params["rome_codes"], "D1102,D1101");
        assert!(params.get("naf_codes").is_none());
        assert_eq!(params["contract"], "alternance");
        assert_eq!(params["distance"], 10.0);
        assert_eq!(params["page"], 2);
    }

    #[test]
    fn test_company_siret_as_number() {
        let company: Company = serde_json::from_value(serde_json::json!({
            "siret": 12345678900012u64,
            "name": "ACME",
            "distance": 3
        }))
        .unwrap();
        assert_eq!(company.siret.as_deref(), Some("12345678900012"));
        assert_eq!(company.distance, Some(3.0));
    }
}
