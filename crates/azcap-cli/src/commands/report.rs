//! Render per-SKU capacity tables with severity coloring.

use azcap_core::{CapacityCell, CapacityMatrix, ColorClassifier, EngineConfig, Tier};
use time::format_description::well_known::Rfc3339;

use crate::cli::ReportArgs;
use crate::error::CliError;

pub async fn run(args: &ReportArgs, config: &EngineConfig) -> Result<(), CliError> {
    let snapshot = super::fetch_snapshot(config).await?;
    let matrix = &snapshot.matrix;
    let classifier = ColorClassifier::new(config.color_thresholds);

    let taken_at = snapshot
        .taken_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("unknown"));
    println!("Azure AI model capacity as of {taken_at}");
    if !snapshot.fresh {
        println!("warning: serving stale data, last refresh failed");
    }
    if !snapshot.failed_models.is_empty() {
        let failed: Vec<String> = snapshot
            .failed_models
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("warning: queries failed for: {}", failed.join(", "));
    }

    if matrix.is_empty() {
        println!("no capacity data available");
        return Ok(());
    }

    let region_rows = selected_regions(matrix, args);
    if region_rows.is_empty() {
        println!("no regions match the current filter");
        return Ok(());
    }

    for sku in matrix.display_sku_order() {
        if args.sku.as_deref().is_some_and(|filter| filter != sku) {
            continue;
        }
        let rows = visible_rows(matrix, sku, &region_rows, args.skip_empty);
        if rows.is_empty() {
            continue;
        }
        println!();
        println!("{sku}");
        print!("{}", render_sku_table(matrix, sku, &rows, &classifier));
    }

    println!();
    println!("legend: green >= {} units, yellow >= {}, red below {}, gray not offered (NA) or query failed (ERROR)",
        config.color_thresholds.high,
        config.color_thresholds.medium,
        config.color_thresholds.medium,
    );

    Ok(())
}

/// Region indices passing the group/exact filters, in matrix order.
fn selected_regions(matrix: &CapacityMatrix, args: &ReportArgs) -> Vec<usize> {
    matrix
        .regions()
        .iter()
        .enumerate()
        .filter(|(_, region)| match &args.region {
            Some(exact) => region.as_str() == exact,
            None => args.regions.matches(region),
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Drops regions with no positive capacity for the SKU when requested.
fn visible_rows(
    matrix: &CapacityMatrix,
    sku: &str,
    region_rows: &[usize],
    skip_empty: bool,
) -> Vec<usize> {
    region_rows
        .iter()
        .copied()
        .filter(|&region_idx| {
            if !skip_empty {
                return true;
            }
            (0..matrix.models().len()).any(|model_idx| {
                matches!(
                    matrix.cell(sku, model_idx, region_idx),
                    Some(CapacityCell::Available(v)) if v > 0
                )
            })
        })
        .collect()
}

/// Regions as rows, models as columns, cells padded then tier-colored.
fn render_sku_table(
    matrix: &CapacityMatrix,
    sku: &str,
    region_rows: &[usize],
    classifier: &ColorClassifier,
) -> String {
    let models = matrix.models();
    let regions = matrix.regions();

    let region_width = region_rows
        .iter()
        .map(|&idx| regions[idx].len())
        .chain(std::iter::once("Region".len()))
        .max()
        .unwrap_or(6);

    let mut column_widths: Vec<usize> = models.iter().map(|m| m.to_string().len()).collect();
    for (model_idx, width) in column_widths.iter_mut().enumerate() {
        for &region_idx in region_rows {
            if let Some(cell) = matrix.cell(sku, model_idx, region_idx) {
                *width = (*width).max(cell.render().len());
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!("{:<region_width$}", "Region"));
    for (model_idx, model) in models.iter().enumerate() {
        out.push_str(&format!("  {:>width$}", model.to_string(), width = column_widths[model_idx]));
    }
    out.push('\n');

    for &region_idx in region_rows {
        out.push_str(&format!("{:<region_width$}", regions[region_idx]));
        for model_idx in 0..models.len() {
            let cell = matrix
                .cell(sku, model_idx, region_idx)
                .unwrap_or(CapacityCell::NotSupported);
            let text = format!("{:>width$}", cell.render(), width = column_widths[model_idx]);
            out.push_str("  ");
            out.push_str(&paint(&text, classifier.classify(cell)));
        }
        out.push('\n');
    }

    out
}

fn paint(text: &str, tier: Tier) -> String {
    let code = match tier {
        Tier::None => "90",
        Tier::Low => "31",
        Tier::Medium => "33",
        Tier::High => "32",
    };
    format!("\x1b[{code}m{text}\x1b[0m")
}
