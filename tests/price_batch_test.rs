use httpmock::prelude::*;
use mahalla_nav::domain::model::{DistrictId, NeighborhoodId};
use mahalla_nav::{CascadingLoader, HttpBackend, TomlConfig};
use std::sync::Arc;

const SQUARE: &str = "POLYGON ((69 41, 70 41, 70 42, 69 42, 69 41))";

fn loader(base_url: &str, concurrency: usize) -> CascadingLoader<HttpBackend<TomlConfig>> {
    let config = TomlConfig::from_toml_str(&format!("[backend]\nbase_url = \"{}\"\n", base_url)).unwrap();
    CascadingLoader::new(Arc::new(HttpBackend::new(config).unwrap()), concurrency)
}

#[tokio::test]
async fn test_one_failing_price_does_not_fail_batch() {
    let server = MockServer::start_async().await;
    let neighborhoods: Vec<serde_json::Value> = (1..=5)
        .map(|i| serde_json::json!({"id": 700 + i, "name": format!("Mahalla {}", i), "geometry": SQUARE}))
        .collect();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/mahallalar/70/");
            then.status(200)
                .json_body(serde_json::json!({ "features": neighborhoods }));
        })
        .await;

    let mut price_mocks = Vec::new();
    for id in 701..=705 {
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/narx/{}/", id));
                if id == 703 {
                    then.status(500);
                } else {
                    then.status(200)
                        .json_body(serde_json::json!({"narx_kvartira": id * 10}));
                }
            })
            .await;
        price_mocks.push(mock);
    }

    let batch = loader(&server.base_url(), 2)
        .load_neighborhood_batch(DistrictId(70))
        .await
        .unwrap();

    for mock in &price_mocks {
        mock.assert_async().await;
    }
    assert_eq!(batch.neighborhoods.len(), 5);
    assert_eq!(batch.prices.len(), 5);
    assert_eq!(batch.failed_prices, vec![NeighborhoodId(703)]);
    assert!(batch.prices[&NeighborhoodId(703)].is_empty());
    assert_eq!(batch.prices[&NeighborhoodId(705)].apartment, Some(7050.0));
}

#[tokio::test]
async fn test_neighborhood_list_failure_fails_batch() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/mahallalar/70/");
            then.status(404);
        })
        .await;

    let result = loader(&server.base_url(), 4).load_neighborhood_batch(DistrictId(70)).await;
    assert!(result.unwrap_err().is_network_failure());
}

#[tokio::test]
async fn test_single_price_record_never_fails() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/narx/9/");
            then.status(200).body("not json");
        })
        .await;

    let record = loader(&server.base_url(), 1)
        .load_price_record(NeighborhoodId(9))
        .await;
    assert!(record.is_empty());
}
