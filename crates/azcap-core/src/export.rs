//! Snapshot export: deterministic CSV and round-trippable JSON.
//!
//! Column order is region codes sorted (the matrix already guarantees
//! this), row order is the matrix's canonical model order. Unsupported
//! cells render as `NA` and failed queries as `ERROR`; the two tokens
//! never collapse.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::aggregate::CapacityMatrix;
use crate::error::CapacityError;
use crate::record::{CapacityCell, ModelKey};

/// Renders the matrix (optionally one SKU) as CSV text.
pub fn to_csv(matrix: &CapacityMatrix, sku_filter: Option<&str>) -> String {
    let mut out = String::new();

    out.push_str("sku,model");
    for region in matrix.regions() {
        out.push(',');
        out.push_str(region);
    }
    out.push('\n');

    for sku in matrix.sku_names() {
        if sku_filter.is_some_and(|filter| filter != sku) {
            continue;
        }
        for (model_idx, model) in matrix.models().iter().enumerate() {
            out.push_str(sku);
            out.push(',');
            out.push_str(&model.to_string());
            if let Some(row) = matrix.row(sku, model_idx) {
                for cell in row {
                    out.push(',');
                    out.push_str(&cell.render());
                }
            }
            out.push('\n');
        }
    }

    out
}

/// Serializes the matrix (optionally one SKU) to JSON text.
///
/// The structure mirrors the matrix exactly so [`matrix_from_json`] can
/// reconstruct it with identical cell values and ordering.
pub fn to_json(matrix: &CapacityMatrix, sku_filter: Option<&str>) -> Result<String, CapacityError> {
    let models: Vec<Value> = matrix
        .models()
        .iter()
        .map(|m| json!({"name": m.name, "version": m.version}))
        .collect();

    let mut skus = Map::new();
    for (sku, table) in matrix.tables() {
        if sku_filter.is_some_and(|filter| filter != sku.as_str()) {
            continue;
        }
        let width = matrix.regions().len();
        let rows: Vec<Value> = (0..matrix.models().len())
            .map(|model_idx| {
                let row: Vec<Value> = table[model_idx * width..(model_idx + 1) * width]
                    .iter()
                    .map(cell_to_value)
                    .collect();
                Value::Array(row)
            })
            .collect();
        skus.insert(sku.clone(), Value::Array(rows));
    }

    let value = json!({
        "models": models,
        "regions": matrix.regions(),
        "skus": Value::Object(skus),
    });

    serde_json::to_string_pretty(&value)
        .map_err(|e| CapacityError::invalid_response(format!("JSON export failed: {e}")))
}

/// Reconstructs a matrix from [`to_json`] output (the persisted-artifact
/// boundary for offline consumption).
pub fn matrix_from_json(text: &str) -> Result<CapacityMatrix, CapacityError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CapacityError::invalid_response(format!("not valid JSON: {e}")))?;

    let models = value
        .get("models")
        .and_then(Value::as_array)
        .ok_or_else(|| CapacityError::invalid_response("missing 'models' array"))?
        .iter()
        .map(|m| {
            let name = m.get("name").and_then(Value::as_str).unwrap_or_default();
            let version = m.get("version").and_then(Value::as_str).unwrap_or_default();
            ModelKey::new(name, version)
        })
        .collect::<Vec<_>>();

    let regions = value
        .get("regions")
        .and_then(Value::as_array)
        .ok_or_else(|| CapacityError::invalid_response("missing 'regions' array"))?
        .iter()
        .map(|r| r.as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();

    let sku_map = value
        .get("skus")
        .and_then(Value::as_object)
        .ok_or_else(|| CapacityError::invalid_response("missing 'skus' object"))?;

    let mut tables: BTreeMap<String, Vec<CapacityCell>> = BTreeMap::new();
    for (sku, rows) in sku_map {
        let rows = rows
            .as_array()
            .ok_or_else(|| CapacityError::invalid_response("SKU table must be an array"))?;
        let mut table = Vec::with_capacity(models.len() * regions.len());
        for row in rows {
            let row = row
                .as_array()
                .ok_or_else(|| CapacityError::invalid_response("SKU row must be an array"))?;
            for cell in row {
                table.push(value_to_cell(cell)?);
            }
        }
        tables.insert(sku.clone(), table);
    }

    CapacityMatrix::from_parts(models, regions, tables)
}

fn cell_to_value(cell: &CapacityCell) -> Value {
    match cell {
        CapacityCell::Available(v) => json!(v),
        CapacityCell::NotSupported => json!(CapacityCell::NA_TOKEN),
        CapacityCell::QueryFailed => json!(CapacityCell::ERROR_TOKEN),
    }
}

fn value_to_cell(value: &Value) -> Result<CapacityCell, CapacityError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(CapacityCell::Available)
            .ok_or_else(|| CapacityError::invalid_response("capacity must be a non-negative integer")),
        Value::String(s) => CapacityCell::from_token(s)
            .ok_or_else(|| CapacityError::invalid_response(format!("unknown cell token '{s}'"))),
        other => Err(CapacityError::invalid_response(format!(
            "unexpected cell value: {other}"
        ))),
    }
}
