//! CLI argument definitions for azcap.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `report` | Fetch capacity and render per-SKU tables |
//! | `export` | Export the capacity matrix to CSV or JSON |
//! | `models` | List configured models |
//!
//! # Examples
//!
//! ```bash
//! # Render the full report
//! azcap report
//!
//! # One SKU, US regions only
//! azcap report --sku GlobalStandard --regions us
//!
//! # Persist the matrix as JSON
//! azcap export --export-format json -o capacity.json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// azcap - Azure AI model capacity monitor
///
/// Reads per-region model capacity from the Azure management API and
/// reports it per model, region, and SKU. Authentication uses a bearer
/// token supplied via the AZCAP_ACCESS_TOKEN environment variable
/// (e.g. `az account get-access-token --query accessToken -o tsv`).
#[derive(Debug, Parser)]
#[command(name = "azcap", version, about = "Azure AI model capacity monitor")]
pub struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, global = true, default_value = "config.json")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch capacity and render per-SKU tables.
    Report(ReportArgs),
    /// Export the capacity matrix to CSV or JSON.
    Export(ExportArgs),
    /// List configured models.
    Models,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Restrict the report to one SKU (e.g. GlobalStandard).
    #[arg(long)]
    pub sku: Option<String>,

    /// Region group to include as rows.
    #[arg(long, value_enum, default_value_t = RegionGroup::All)]
    pub regions: RegionGroup,

    /// Exact region code filter; overrides --regions.
    #[arg(long)]
    pub region: Option<String>,

    /// Hide regions with no capacity for any model in the SKU.
    #[arg(long, default_value_t = false)]
    pub skip_empty: bool,
}

/// Coarse region groups matched by code substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RegionGroup {
    All,
    Us,
    Europe,
    Asia,
}

impl RegionGroup {
    pub fn matches(&self, region: &str) -> bool {
        let needles: &[&str] = match self {
            Self::All => return true,
            Self::Us => &["east", "west", "central", "south", "north"],
            Self::Europe => &[
                "europe",
                "uk",
                "france",
                "germany",
                "norway",
                "sweden",
                "switzerland",
            ],
            Self::Asia => &["asia", "japan", "korea", "india", "australia"],
        };
        let region = region.to_ascii_lowercase();
        needles.iter().any(|needle| region.contains(needle))
    }
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output format.
    #[arg(long = "export-format", value_enum, default_value_t = ExportFormat::Csv)]
    pub export_format: ExportFormat,

    /// Restrict the export to one SKU.
    #[arg(long)]
    pub sku: Option<String>,

    /// Output file path; stdout when omitted.
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}
