//! Catalog resolution and record pagination against a mocked datastore.

mod common;

use common::{client_for, envelope, mount_token, records, DATASTORE_PATH};
use emploi_store::{
    list_packages, stream_records, EmploiStoreError, Get, Package, PackageSelector, RecordQuery,
    Resource, ResourceSelector,
};
use futures_util::{StreamExt, TryStreamExt};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_catalog(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/organization_show")))
        .and(query_param("id", "digidata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "name": "digidata",
            "packages": [
                {"id": "pkg-bmo", "name": "bmo", "title": "BMO"},
                {"id": "pkg-rome", "name": "rome"}
            ]
        }))))
        .expect(1)
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/package_show")))
        .and(query_param("id", "pkg-bmo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "id": "pkg-bmo",
            "name": "bmo",
            "resources": [
                {"id": "r-2014", "name": "Résultats enquête BMO 2014", "pe_version": "1"},
                {"id": "r-2015", "name": "Résultats enquête BMO 2015", "pe_version": "1"},
                {"id": "r-fap", "name": "Référentiel des familles de métier"}
            ]
        }))))
        .mount(mock_server)
        .await;
}

async fn mount_page(mock_server: &MockServer, offset: usize, count: usize, total: usize) {
    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/datastore_search")))
        .and(query_param("id", "r-1"))
        .and(query_param("offset", offset.to_string()))
        .and(query_param("limit", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "records": records(offset, count),
            "total": total
        }))))
        .expect(1)
        .mount(mock_server)
        .await;
}

// =============================================================================
// Package Resolution
// =============================================================================

#[tokio::test]
async fn test_get_package_by_name() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_catalog(&mock_server).await;

    let client = client_for(&mock_server);
    let package = Package::get(&client, PackageSelector::name("bmo"))
        .await
        .unwrap();

    assert_eq!(package.id, "pkg-bmo");
    assert_eq!(package.resources.len(), 3);
}

#[tokio::test]
async fn test_package_listing_fetched_once() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_catalog(&mock_server).await;

    let client = client_for(&mock_server);
    let packages = list_packages(&client).await.unwrap();
    assert_eq!(packages.len(), 2);
    assert!(packages.contains_key("rome"));

    // Second lookup is served from the cached listing (expect(1) above).
    Package::get(&client, PackageSelector::name("bmo"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_empty_listing_is_not_cached() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/organization_show")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_catalog(&mock_server).await;

    let client = client_for(&mock_server);
    let err = Package::get(&client, PackageSelector::name("bmo"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EmploiStoreError::NotFound {
            entity_type: "Package",
            ..
        }
    ));

    // The server recovered: the listing is fetched again.
    let package = Package::get(&client, PackageSelector::name("bmo"))
        .await
        .unwrap();
    assert_eq!(package.id, "pkg-bmo");
}

#[tokio::test]
async fn test_get_package_by_id_skips_listing() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/organization_show")))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/package_show")))
        .and(query_param("id", "pkg-rome"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "id": "pkg-rome",
            "name": "rome",
            "resources": []
        }))))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let package = Package::get(&client, PackageSelector::id("pkg-rome"))
        .await
        .unwrap();

    assert_eq!(package.name, "rome");
    assert!(package.resources.is_empty());
}

#[tokio::test]
async fn test_unknown_package_name() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_catalog(&mock_server).await;

    let client = client_for(&mock_server);
    let err = Package::get(&client, PackageSelector::name("nope"))
        .await
        .unwrap_err();

    match err {
        EmploiStoreError::NotFound { entity_type, id } => {
            assert_eq!(entity_type, "Package");
            assert_eq!(id, "nope");
        }
        other => panic!("Expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_package_id() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/package_show")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = Package::get(&client, PackageSelector::id("missing"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

// =============================================================================
// Resource Resolution
// =============================================================================

#[tokio::test]
async fn test_get_resource_by_pattern() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_catalog(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/resource_show")))
        .and(query_param("id", "r-2015"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "id": "r-2015",
            "name": "Résultats enquête BMO 2015",
            "pe_version": 1,
            "format": "CSV"
        }))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let bmo = Package::get(&client, PackageSelector::name("bmo"))
        .await
        .unwrap();
    let resource = bmo
        .get_resource(&client, &ResourceSelector::by_pattern("2015").unwrap())
        .await
        .unwrap();

    assert_eq!(resource.id, "r-2015");
    assert_eq!(resource.pe_version.as_deref(), Some("1"));
    assert_eq!(resource.metadata["format"], "CSV");
}

#[tokio::test]
async fn test_get_resource_no_match_makes_no_request() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_catalog(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/resource_show")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let bmo = Package::get(&client, PackageSelector::name("bmo"))
        .await
        .unwrap();
    let err = bmo
        .get_resource(&client, &ResourceSelector::by_name("BMO 2099"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_resource_get_missing() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/resource_show")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = Resource::get(&client, "gone".to_string()).await.unwrap_err();
    assert!(err.is_not_found());
}

// =============================================================================
// Record Pagination
// =============================================================================

#[tokio::test]
async fn test_stream_walks_all_pages() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_page(&mock_server, 0, 200, 447).await;
    mount_page(&mock_server, 200, 200, 447).await;
    mount_page(&mock_server, 400, 47, 447).await;

    let client = client_for(&mock_server);
    let mut stream = stream_records(&client, "r-1", RecordQuery::default());

    let mut rows = Vec::new();
    while let Some(record) = stream.try_next().await.unwrap() {
        rows.push(record["ROW"].as_u64().unwrap());
    }

    assert_eq!(rows.len(), 447);
    assert_eq!(rows, (0..447).collect::<Vec<_>>());
    assert_eq!(stream.total(), Some(447));
    assert_eq!(stream.pages_fetched(), 3);
}

#[tokio::test]
async fn test_stream_exact_multiple_stops_at_total() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_page(&mock_server, 0, 200, 400).await;
    mount_page(&mock_server, 200, 200, 400).await;

    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/datastore_search")))
        .and(query_param("offset", "400"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "records": [],
            "total": 400
        }))))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let count = stream_records(&client, "r-1", RecordQuery::default())
        .try_fold(0usize, |n, _| async move { Ok(n + 1) })
        .await
        .unwrap();

    assert_eq!(count, 400);
}

#[tokio::test]
async fn test_stream_empty_resource() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_page(&mock_server, 0, 0, 0).await;

    let client = client_for(&mock_server);
    let records: Vec<_> = stream_records(&client, "r-1", RecordQuery::default())
        .try_collect()
        .await
        .unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_stream_is_lazy() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_page(&mock_server, 0, 200, 447).await;

    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/datastore_search")))
        .and(query_param("offset", "200"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let first: Vec<_> = stream_records(&client, "r-1", RecordQuery::default())
        .take(10)
        .collect()
        .await;

    assert_eq!(first.len(), 10);
    assert!(first.iter().all(|r| r.is_ok()));
}

#[tokio::test]
async fn test_stream_error_mid_way() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_page(&mock_server, 0, 200, 447).await;

    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/datastore_search")))
        .and(query_param("offset", "200"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let items: Vec<_> = stream_records(&client, "r-1", RecordQuery::default())
        .collect()
        .await;

    assert_eq!(items.len(), 201);
    assert!(items[..200].iter().all(|r| r.is_ok()));
    match &items[200] {
        Err(err) => assert_eq!(err.status_code(), Some(503)),
        Ok(_) => panic!("Expected an error after the first page"),
    }
}

#[tokio::test]
async fn test_stream_sends_filters_and_fields() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(format!("{DATASTORE_PATH}/datastore_search")))
        .and(query_param("id", "r-1"))
        .and(query_param("limit", "50"))
        .and(query_param(
            "filters",
            r#"{"ROME_PROFESSION_CARD_CODE":"F1402"}"#,
        ))
        .and(query_param("fields", "ROME_PROFESSION_NAME,OGR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "records": [
                {"ROME_PROFESSION_NAME": "Foreur / Foreuse", "OGR": 11005}
            ],
            "total": 1
        }))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let query = RecordQuery::default()
        .with_batch_size(50)
        .filter("ROME_PROFESSION_CARD_CODE", "F1402")
        .fields(["ROME_PROFESSION_NAME", "OGR"]);
    let records: Vec<_> = stream_records(&client, "r-1", query)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["ROME_PROFESSION_NAME"], "Foreur / Foreuse");
}

#[tokio::test]
async fn test_records_page() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_page(&mock_server, 200, 200, 447).await;

    let client = client_for(&mock_server);
    let resource: Resource = serde_json::from_value(json!({"id": "r-1"})).unwrap();
    let page = resource
        .records_page(&client, 200, &RecordQuery::default())
        .await
        .unwrap();

    assert_eq!(page.len(), 200);
    assert_eq!(page.total, Some(447));
    assert!(page.has_more());
    assert_eq!(page.next_offset(), Some(400));
}
