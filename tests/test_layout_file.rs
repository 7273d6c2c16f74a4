use std::io::Write;
use std::time::Duration;

use toonpanel::config::{load_layout_table, setup_logging};
use toonpanel::layouts::{LayoutMode, LayoutResolver, LayoutTable};
use toonpanel::web::images::ImageInliner;
use toonpanel::web::{AppState, PanelParams, render_panel};

const BUNDLED: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/layouts.json"));

fn write_table(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write table");
    file
}

fn offline_state(table: LayoutTable) -> AppState {
    let inliner =
        ImageInliner::new("http://127.0.0.1:9/", Duration::from_millis(500)).expect("inliner");
    AppState::new(LayoutResolver::new(table, LayoutMode::Curated), inliner)
}

#[test]
fn test_load_bundled_table_without_path() {
    let _ = setup_logging(true);
    let table = load_layout_table(None).expect("bundled table");
    assert_eq!(table, LayoutTable::bundled().expect("bundled table"));
}

#[test]
fn test_load_table_from_file() {
    let file = write_table(BUNDLED);
    let table = load_layout_table(Some(file.path())).expect("table from file");
    assert_eq!(table.bands.len(), 5);
    assert_eq!(table.default, "1-3");
}

#[test]
fn test_bad_table_file_is_an_error() {
    let file = write_table("{ \"version\": 1 }");
    assert!(load_layout_table(Some(file.path())).is_err());
    let missing = std::path::Path::new("/definitely/not/here/layouts.json");
    assert!(load_layout_table(Some(missing)).is_err());
}

#[tokio::test]
async fn test_override_from_file_changes_rendering() {
    let mut json: serde_json::Value = serde_json::from_str(BUNDLED).expect("json");
    let mut special = json["bands"][0]["layout"].clone();
    special["effect"]["x"] = serde_json::json!(123);
    special["effect"]["y"] = serde_json::json!(321);
    json["overrides"]["7"] = special;
    let file = write_table(&json.to_string());

    let table = load_layout_table(Some(file.path())).expect("table with override");
    let state = offline_state(table);

    let params = PanelParams {
        bg: Some("7".to_string()),
        ef: Some("ZAP".to_string()),
        ..Default::default()
    };
    let svg = render_panel(&state, &params).await.expect("render");
    assert!(svg.contains(r#"<tspan x="123" y="321">ZAP</tspan>"#), "{svg}");

    // 8 still falls in the 4-10 band, which hides effect text
    let params = PanelParams {
        bg: Some("8".to_string()),
        ef: Some("ZAP".to_string()),
        ..Default::default()
    };
    let svg = render_panel(&state, &params).await.expect("render");
    assert!(!svg.contains("ZAP"));
}
