//! List the configured models without touching the network.

use azcap_core::EngineConfig;

use crate::error::CliError;

pub fn run(config: &EngineConfig) -> Result<(), CliError> {
    let name_width = config
        .models
        .iter()
        .map(|m| m.model_name.len())
        .chain(std::iter::once("Model".len()))
        .max()
        .unwrap_or(5);
    let version_width = config
        .models
        .iter()
        .map(|m| m.model_version.len())
        .chain(std::iter::once("Version".len()))
        .max()
        .unwrap_or(7);

    println!(
        "{:<name_width$}  {:<version_width$}  Format",
        "Model", "Version"
    );
    for model in &config.models {
        println!(
            "{:<name_width$}  {:<version_width$}  {}",
            model.model_name, model.model_version, model.model_format
        );
    }

    Ok(())
}
