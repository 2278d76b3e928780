//! Export the capacity matrix to CSV or JSON, to stdout or a file.

use std::fs::File;
use std::io::{BufWriter, Write};

use azcap_core::{to_csv, to_json, EngineConfig};

use crate::cli::{ExportArgs, ExportFormat};
use crate::error::CliError;

pub async fn run(args: &ExportArgs, config: &EngineConfig) -> Result<(), CliError> {
    let snapshot = super::fetch_snapshot(config).await?;
    let matrix = &snapshot.matrix;
    let sku_filter = args.sku.as_deref();

    if let Some(filter) = sku_filter {
        if !matrix.sku_names().contains(&filter) {
            return Err(CliError::Command(format!(
                "SKU '{filter}' not present; available: {}",
                matrix.sku_names().join(", ")
            )));
        }
    }

    let text = match args.export_format {
        ExportFormat::Csv => to_csv(matrix, sku_filter),
        ExportFormat::Json => to_json(matrix, sku_filter)?,
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(text.as_bytes())?;
            writer.flush()?;
            eprintln!("wrote {path}");
        }
        None => {
            print!("{text}");
        }
    }

    Ok(())
}
