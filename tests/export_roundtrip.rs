//! Behavior tests for snapshot export: column ordering, token fidelity,
//! and the JSON persist/reload boundary.

use std::fs;

use azcap_core::{matrix_from_json, to_csv, to_json, CapacityCell, CapacityMatrix, ModelKey};
use azcap_tests::record;

fn sample_matrix() -> CapacityMatrix {
    CapacityMatrix::build(
        &[
            record("gpt-4o", "2024-05-13", "westus", "GlobalStandard", Some(500)),
            record("gpt-4o", "2024-05-13", "eastus", "GlobalStandard", Some(0)),
            record("o3", "1", "uksouth", "ProvisionedManaged", Some(40)),
            record("o3", "1", "eastus", "ProvisionedManaged", None),
        ],
        &[ModelKey::new("o4-mini", "1")],
    )
}

#[test]
fn csv_columns_are_sorted_regions() {
    let csv = to_csv(&sample_matrix(), None);
    let header = csv.lines().next().expect("header row");
    assert_eq!(header, "sku,model,eastus,uksouth,westus");
}

#[test]
fn csv_rows_cover_every_model_for_every_sku() {
    let matrix = sample_matrix();
    let csv = to_csv(&matrix, None);
    let rows = csv.lines().count() - 1;
    assert_eq!(rows, matrix.sku_names().len() * matrix.models().len());
}

#[test]
fn json_round_trip_is_identity() {
    let matrix = sample_matrix();
    let text = to_json(&matrix, None).expect("export");
    let reloaded = matrix_from_json(&text).expect("reload");
    assert_eq!(reloaded, matrix);
}

#[test]
fn na_and_error_survive_the_round_trip_distinctly() {
    let matrix = sample_matrix();
    let text = to_json(&matrix, None).expect("export");
    let reloaded = matrix_from_json(&text).expect("reload");

    // o3 never reported under GlobalStandard: not supported.
    assert_eq!(
        reloaded.cell("GlobalStandard", 1, 0),
        Some(CapacityCell::NotSupported)
    );
    // o4-mini's query failed: error, never NA.
    assert_eq!(
        reloaded.cell("GlobalStandard", 2, 0),
        Some(CapacityCell::QueryFailed)
    );
    // Explicit zero stays a number.
    assert_eq!(
        reloaded.cell("GlobalStandard", 0, 0),
        Some(CapacityCell::Available(0))
    );
}

#[test]
fn exported_file_reloads_from_disk() {
    let matrix = sample_matrix();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("capacity.json");

    fs::write(&path, to_json(&matrix, None).expect("export")).expect("write");
    let text = fs::read_to_string(&path).expect("read");
    let reloaded = matrix_from_json(&text).expect("reload");

    assert_eq!(reloaded, matrix);
}

#[test]
fn sku_filtered_json_still_round_trips() {
    let matrix = sample_matrix();
    let text = to_json(&matrix, Some("GlobalStandard")).expect("export");
    let reloaded = matrix_from_json(&text).expect("reload");

    assert_eq!(reloaded.sku_names(), vec!["GlobalStandard"]);
    assert_eq!(reloaded.models(), matrix.models());
    assert_eq!(reloaded.regions(), matrix.regions());
}
