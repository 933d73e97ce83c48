use httpmock::prelude::*;
use mahalla_nav::domain::model::{DistrictId, LayerKind, NeighborhoodId, PriceField, RegionId};
use mahalla_nav::domain::ports::Notice;
use mahalla_nav::{
    CascadingLoader, ConsolePanel, Engine, HeadlessMap, HttpBackend, MapEvent, NavEvent,
    NavigationState, Navigator, TomlConfig, UserEvent,
};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

const TASHKENT: &str = "POLYGON ((69.1 41.2, 69.4 41.2, 69.4 41.4, 69.1 41.4, 69.1 41.2))";
const CHIRCHIQ: &str = "POLYGON ((69.5 41.4, 69.7 41.4, 69.7 41.6, 69.5 41.6, 69.5 41.4))";
const MAHALLA: &str = "POLYGON ((69.55 41.45, 69.6 41.45, 69.6 41.5, 69.55 41.45))";

fn write_config(base_url: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[backend]
base_url = "{}"
timeout_seconds = 5

[backend.headers]
X-Operator = "qa"

[loader]
price_concurrency = 2
"#,
        base_url
    )
    .unwrap();
    file
}

type TestNavigator = Navigator<HttpBackend<TomlConfig>, HeadlessMap, ConsolePanel>;

fn navigator(config: TomlConfig) -> TestNavigator {
    let view = config.view_settings();
    let concurrency = config.price_concurrency();
    let backend = Arc::new(HttpBackend::new(config).unwrap());
    let engine = Engine::new(HeadlessMap::new(), ConsolePanel::new(), view);
    Navigator::new(engine, CascadingLoader::new(backend, concurrency))
}

#[tokio::test]
async fn test_drill_down_edit_and_submit() {
    let server = MockServer::start_async().await;

    let regions_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/viloyatlar/").header("X-Operator", "qa");
            then.status(200).json_body(serde_json::json!([
                {"id": 14, "name": "Tashkent", "polygon": TASHKENT},
                {"id": 3, "name": "Samarkand", "polygon": null}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tumanlar/14/");
            then.status(200).json_body(serde_json::json!({
                "features": [
                    {"id": 201, "properties": {"name": "Chirchiq"}, "geometry": CHIRCHIQ}
                ]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/mahallalar/201/");
            then.status(200).json_body(serde_json::json!({
                "features": [
                    {"id": 501, "properties": {"name": "Bodomzor"}, "geometry": MAHALLA},
                    {"id": 502, "properties": {"name": "Yangiobod"}, "geometry": MAHALLA}
                ]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/narx/501/");
            then.status(200).json_body(serde_json::json!({
                "narx_kvartira": 42000,
                "narx_uchastka": "1500"
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/narx/502/");
            then.status(200).json_body(serde_json::json!({}));
        })
        .await;
    let patch_mock = server
        .mock_async(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/narx/501/")
                .json_body(serde_json::json!({
                    "narx_kvartira": 50000.0,
                    "narx_nejiloy": null,
                    "narx_penthaus": null,
                    "narx_quruqyer": null,
                    "narx_uchastka": 1500.0,
                    "narx_yangiqurilish": null
                }));
            then.status(200);
        })
        .await;

    let file = write_config(&server.base_url());
    let config = TomlConfig::from_file(file.path()).unwrap();
    let mut nav = navigator(config);

    nav.start();
    nav.settle().await;
    regions_mock.assert_async().await;

    // Samarkand has no geometry and is not drawn
    assert_eq!(nav.engine().regions().len(), 2);
    assert_eq!(nav.engine().map().entities_in(LayerKind::Region), vec![14]);

    let tashkent = nav.engine().map().shape_for(LayerKind::Region, 14).unwrap();
    nav.on_map_event(MapEvent::Click(tashkent));
    nav.settle().await;
    assert_eq!(nav.engine().state(), NavigationState::RegionSelected { region: RegionId(14) });
    assert_eq!(nav.engine().districts()[0].name, "Chirchiq");

    nav.dispatch(UserEvent::Navigate(NavEvent::SelectDistrict(DistrictId(201))));
    nav.settle().await;
    assert_eq!(nav.engine().map().entities_in(LayerKind::Neighborhood), vec![501, 502]);
    assert!(nav.engine().map().entities_in(LayerKind::District).is_empty());

    let bodomzor = NeighborhoodId(501);
    let record = nav.engine().price_record(bodomzor).unwrap();
    assert_eq!(record.apartment, Some(42000.0));
    assert_eq!(record.plot, Some(1500.0));
    assert!(nav.engine().price_record(NeighborhoodId(502)).unwrap().is_empty());

    nav.dispatch(UserEvent::Navigate(NavEvent::SelectNeighborhood(bodomzor)));
    assert_eq!(nav.engine().panel().open_neighborhood(), Some(bodomzor));

    nav.dispatch(UserEvent::EditField {
        id: bodomzor,
        field: PriceField::Apartment,
        value: Some(50000.0),
    });
    nav.dispatch(UserEvent::Submit(bodomzor));
    nav.settle().await;

    patch_mock.assert_async().await;
    assert_eq!(nav.engine().panel().last_notice(), Some(&Notice::Saved(bodomzor)));
    assert!(nav.engine().panel().render().unwrap().contains("50000"));
}

#[tokio::test]
async fn test_failed_submit_keeps_edits() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/viloyatlar/");
            then.status(200)
                .json_body(serde_json::json!([{"id": 14, "name": "Tashkent", "polygon": TASHKENT}]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tumanlar/14/");
            then.status(200).json_body(serde_json::json!([
                {"id": 201, "name": "Chirchiq", "geometry": CHIRCHIQ}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/mahallalar/201/");
            then.status(200).json_body(serde_json::json!([
                {"id": 501, "name": "Bodomzor", "geometry": MAHALLA}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/narx/501/");
            then.status(200).json_body(serde_json::json!({"narx_kvartira": 42000}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(httpmock::Method::PATCH).path("/narx/501/");
            then.status(500);
        })
        .await;

    let config = TomlConfig::from_toml_str(&format!(
        "[backend]\nbase_url = \"{}\"\n",
        server.base_url()
    ))
    .unwrap();
    let mut nav = navigator(config);

    nav.start();
    nav.settle().await;
    nav.dispatch(UserEvent::Navigate(NavEvent::SelectRegion(RegionId(14))));
    nav.settle().await;
    nav.dispatch(UserEvent::Navigate(NavEvent::SelectDistrict(DistrictId(201))));
    nav.settle().await;

    let id = NeighborhoodId(501);
    nav.dispatch(UserEvent::Navigate(NavEvent::SelectNeighborhood(id)));
    nav.dispatch(UserEvent::EditField {
        id,
        field: PriceField::Penthouse,
        value: Some(99000.0),
    });
    nav.dispatch(UserEvent::Submit(id));
    nav.settle().await;

    assert!(matches!(
        nav.engine().panel().last_notice(),
        Some(Notice::SaveFailed { id: failed, .. }) if *failed == id
    ));
    let record = nav.engine().price_record(id).unwrap();
    assert_eq!(record.penthouse, Some(99000.0));
    assert_eq!(record.apartment, Some(42000.0));
    assert_eq!(nav.engine().state().neighborhood(), Some(id));
}
