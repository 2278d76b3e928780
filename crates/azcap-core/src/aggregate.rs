//! Capacity aggregation: normalizes raw records into a dense, immutable
//! model x region x SKU matrix.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::CapacityError;
use crate::record::{CapacityCell, CapacityRecord, ModelKey};

/// SKUs operators reach for first; remaining SKUs follow alphabetically
/// in display contexts. Exports ignore this and stay fully alphabetical.
pub const SKU_DISPLAY_PRIORITY: [&str; 5] = [
    "GlobalStandard",
    "GlobalProvisionedManaged",
    "Standard",
    "ProvisionedManaged",
    "GlobalBatch",
];

/// Per-SKU rollup used by report output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuSummary {
    pub sku: String,
    /// Regions with at least one resolved capacity value for this SKU.
    pub regions: usize,
    /// Models with at least one resolved capacity value for this SKU.
    pub models: usize,
    pub total_capacity: u64,
}

/// Immutable aggregation result.
///
/// Models are in first-seen fetch order, regions alphabetical, and every
/// SKU table is dense over the full (model, region) cross-product with
/// `NotSupported` as the default cell. A new matrix is built on every
/// refresh; nothing mutates one after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityMatrix {
    models: Vec<ModelKey>,
    regions: Vec<String>,
    tables: BTreeMap<String, Vec<CapacityCell>>,
}

impl CapacityMatrix {
    /// Builds the matrix from one fetch cycle's records.
    ///
    /// Pure: the same records and failure list always produce the same
    /// matrix. Duplicate records for one (model, region, SKU) tuple
    /// resolve last-write-wins. Models in `failed_models` get every cell
    /// of every SKU set to `QueryFailed` so consumers can tell "known
    /// unavailable" from "unknown due to error".
    pub fn build(records: &[CapacityRecord], failed_models: &[ModelKey]) -> Self {
        let mut models: Vec<ModelKey> = Vec::new();
        let mut model_index: HashMap<ModelKey, usize> = HashMap::new();

        for record in records {
            let key = record.model_key();
            if !model_index.contains_key(&key) {
                model_index.insert(key.clone(), models.len());
                models.push(key);
            }
        }
        for key in failed_models {
            if !model_index.contains_key(key) {
                model_index.insert(key.clone(), models.len());
                models.push(key.clone());
            }
        }

        let regions: Vec<String> = records
            .iter()
            .map(|r| r.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let region_index: HashMap<&str, usize> = regions
            .iter()
            .enumerate()
            .map(|(i, r)| (r.as_str(), i))
            .collect();

        let sku_names: BTreeSet<String> = records.iter().map(|r| r.sku_name.clone()).collect();

        let cells = models.len() * regions.len();
        let mut tables: BTreeMap<String, Vec<CapacityCell>> = sku_names
            .into_iter()
            .map(|sku| (sku, vec![CapacityCell::NotSupported; cells]))
            .collect();

        for record in records {
            let model_idx = model_index[&record.model_key()];
            let region_idx = region_index[record.region.as_str()];
            let cell = match record.available_capacity {
                Some(value) => CapacityCell::Available(value),
                None => CapacityCell::NotSupported,
            };
            if let Some(table) = tables.get_mut(&record.sku_name) {
                table[model_idx * regions.len() + region_idx] = cell;
            }
        }

        for key in failed_models {
            let model_idx = model_index[key];
            for table in tables.values_mut() {
                for region_idx in 0..regions.len() {
                    table[model_idx * regions.len() + region_idx] = CapacityCell::QueryFailed;
                }
            }
        }

        Self {
            models,
            regions,
            tables,
        }
    }

    /// Reassembles a matrix from exported parts, enforcing the density
    /// invariant.
    pub fn from_parts(
        models: Vec<ModelKey>,
        regions: Vec<String>,
        tables: BTreeMap<String, Vec<CapacityCell>>,
    ) -> Result<Self, CapacityError> {
        let expected = models.len() * regions.len();
        for (sku, table) in &tables {
            if table.len() != expected {
                return Err(CapacityError::invalid_response(format!(
                    "SKU table '{sku}' has {} cells, expected {expected}",
                    table.len()
                )));
            }
        }
        Ok(Self {
            models,
            regions,
            tables,
        })
    }

    pub fn models(&self) -> &[ModelKey] {
        &self.models
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// SKU names in alphabetical order.
    pub fn sku_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// SKU names with commonly used SKUs first, the rest alphabetical.
    pub fn display_sku_order(&self) -> Vec<&str> {
        let mut ordered: Vec<&str> = Vec::with_capacity(self.tables.len());
        for priority in SKU_DISPLAY_PRIORITY {
            if self.tables.contains_key(priority) {
                ordered.push(priority);
            }
        }
        for sku in self.tables.keys() {
            if !ordered.contains(&sku.as_str()) {
                ordered.push(sku);
            }
        }
        ordered
    }

    pub fn cell(&self, sku: &str, model_idx: usize, region_idx: usize) -> Option<CapacityCell> {
        if model_idx >= self.models.len() || region_idx >= self.regions.len() {
            return None;
        }
        self.tables
            .get(sku)
            .map(|table| table[model_idx * self.regions.len() + region_idx])
    }

    /// One model's row for a SKU, in region order.
    pub fn row(&self, sku: &str, model_idx: usize) -> Option<&[CapacityCell]> {
        if model_idx >= self.models.len() {
            return None;
        }
        let width = self.regions.len();
        self.tables
            .get(sku)
            .map(|table| &table[model_idx * width..(model_idx + 1) * width])
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() || self.models.is_empty()
    }

    /// Per-SKU rollups, in alphabetical SKU order.
    pub fn summaries(&self) -> Vec<SkuSummary> {
        let width = self.regions.len();
        self.tables
            .iter()
            .map(|(sku, table)| {
                let mut region_hit = vec![false; width];
                let mut model_hit = vec![false; self.models.len()];
                let mut total = 0u64;

                for (idx, cell) in table.iter().enumerate() {
                    if let CapacityCell::Available(value) = cell {
                        total += value;
                        if width > 0 {
                            region_hit[idx % width] = true;
                            model_hit[idx / width] = true;
                        }
                    }
                }

                SkuSummary {
                    sku: sku.clone(),
                    regions: region_hit.iter().filter(|hit| **hit).count(),
                    models: model_hit.iter().filter(|hit| **hit).count(),
                    total_capacity: total,
                }
            })
            .collect()
    }

    pub(crate) fn tables(&self) -> &BTreeMap<String, Vec<CapacityCell>> {
        &self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        model: &str,
        version: &str,
        region: &str,
        sku: &str,
        capacity: Option<u64>,
    ) -> CapacityRecord {
        CapacityRecord {
            model_name: model.to_string(),
            model_format: String::from("OpenAI"),
            model_version: version.to_string(),
            region: region.to_string(),
            sku_name: sku.to_string(),
            available_capacity: capacity,
            available_finetune_capacity: None,
        }
    }

    #[test]
    fn models_keep_first_seen_order_and_regions_sort() {
        let records = vec![
            record("o3", "1", "westus", "GlobalStandard", Some(10)),
            record("gpt-4o", "2024-05-13", "eastus", "GlobalStandard", Some(20)),
            record("o3", "1", "eastus", "GlobalStandard", Some(30)),
        ];
        let matrix = CapacityMatrix::build(&records, &[]);

        assert_eq!(
            matrix.models(),
            &[ModelKey::new("o3", "1"), ModelKey::new("gpt-4o", "2024-05-13")]
        );
        assert_eq!(matrix.regions(), &["eastus", "westus"]);
    }

    #[test]
    fn duplicate_tuple_resolves_last_write_wins() {
        let records = vec![
            record("gpt-4o", "2024-05-13", "eastus", "Standard", Some(300)),
            record("gpt-4o", "2024-05-13", "eastus", "Standard", Some(500)),
        ];
        let matrix = CapacityMatrix::build(&records, &[]);

        assert_eq!(
            matrix.cell("Standard", 0, 0),
            Some(CapacityCell::Available(500))
        );
    }

    #[test]
    fn every_sku_table_is_dense_over_the_cross_product() {
        // gpt-4o only appears under GlobalStandard, o3 only under
        // ProvisionedManaged and only in one region each.
        let records = vec![
            record("gpt-4o", "1", "eastus", "GlobalStandard", Some(100)),
            record("o3", "1", "westus", "ProvisionedManaged", Some(50)),
        ];
        let matrix = CapacityMatrix::build(&records, &[]);

        for sku in matrix.sku_names() {
            for model_idx in 0..matrix.models().len() {
                for region_idx in 0..matrix.regions().len() {
                    assert!(
                        matrix.cell(sku, model_idx, region_idx).is_some(),
                        "missing cell for {sku} [{model_idx},{region_idx}]"
                    );
                }
            }
        }
        assert_eq!(
            matrix.cell("GlobalStandard", 1, 1),
            Some(CapacityCell::NotSupported)
        );
    }

    #[test]
    fn failed_models_mark_every_cell_query_failed() {
        let records = vec![record("gpt-4o", "1", "eastus", "GlobalStandard", Some(100))];
        let failed = vec![ModelKey::new("o3", "2")];
        let matrix = CapacityMatrix::build(&records, &failed);

        assert_eq!(matrix.models().len(), 2);
        assert_eq!(
            matrix.cell("GlobalStandard", 1, 0),
            Some(CapacityCell::QueryFailed)
        );
        assert_eq!(
            matrix.cell("GlobalStandard", 0, 0),
            Some(CapacityCell::Available(100))
        );
    }

    #[test]
    fn build_is_deterministic() {
        let records = vec![
            record("gpt-4o", "1", "eastus", "GlobalStandard", Some(100)),
            record("o3", "1", "westus", "Standard", None),
            record("gpt-4o", "1", "westus", "GlobalStandard", Some(0)),
        ];
        let a = CapacityMatrix::build(&records, &[]);
        let b = CapacityMatrix::build(&records, &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn explicit_record_without_value_stays_not_supported() {
        let records = vec![record("gpt-4o", "1", "eastus", "ProvisionedManaged", None)];
        let matrix = CapacityMatrix::build(&records, &[]);
        assert_eq!(
            matrix.cell("ProvisionedManaged", 0, 0),
            Some(CapacityCell::NotSupported)
        );
    }

    #[test]
    fn display_order_puts_common_skus_first() {
        let records = vec![
            record("m", "1", "eastus", "AaaCustom", Some(1)),
            record("m", "1", "eastus", "GlobalStandard", Some(1)),
            record("m", "1", "eastus", "ProvisionedManaged", Some(1)),
        ];
        let matrix = CapacityMatrix::build(&records, &[]);

        assert_eq!(
            matrix.display_sku_order(),
            vec!["GlobalStandard", "ProvisionedManaged", "AaaCustom"]
        );
        assert_eq!(
            matrix.sku_names(),
            vec!["AaaCustom", "GlobalStandard", "ProvisionedManaged"]
        );
    }

    #[test]
    fn summaries_count_resolved_cells_only() {
        let records = vec![
            record("gpt-4o", "1", "eastus", "GlobalStandard", Some(300)),
            record("gpt-4o", "1", "westus", "GlobalStandard", Some(200)),
            record("o3", "1", "eastus", "GlobalStandard", None),
        ];
        let matrix = CapacityMatrix::build(&records, &[]);
        let summaries = matrix.summaries();

        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.sku, "GlobalStandard");
        assert_eq!(summary.regions, 2);
        assert_eq!(summary.models, 1);
        assert_eq!(summary.total_capacity, 500);
    }

    #[test]
    fn from_parts_rejects_ragged_tables() {
        let mut tables = BTreeMap::new();
        tables.insert(String::from("GlobalStandard"), vec![CapacityCell::Available(1)]);
        let result = CapacityMatrix::from_parts(
            vec![ModelKey::new("gpt-4o", "1")],
            vec![String::from("eastus"), String::from("westus")],
            tables,
        );
        assert!(result.is_err());
    }
}
