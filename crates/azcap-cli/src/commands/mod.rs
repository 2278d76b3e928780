mod export;
mod models;
mod report;

use std::sync::Arc;

use azcap_core::{
    CapacityFetcher, CapacityMatrix, EngineConfig, ReqwestHttpClient, RetryingHttpClient,
    Snapshot, SnapshotCache, StaticCredential,
};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let config = EngineConfig::from_file(&cli.config)?;

    match &cli.command {
        Command::Report(args) => report::run(args, &config).await,
        Command::Export(args) => export::run(args, &config).await,
        Command::Models => models::run(&config),
    }
}

/// One fetch cycle through the snapshot cache. The cache lives for the
/// process (a single command here), so repeated calls inside one run
/// reuse the snapshot within the TTL.
pub(crate) async fn fetch_snapshot(config: &EngineConfig) -> Result<Snapshot, CliError> {
    let token = std::env::var("AZCAP_ACCESS_TOKEN").map_err(|_| {
        CliError::Command(String::from(
            "AZCAP_ACCESS_TOKEN is not set; acquire one with \
             `az account get-access-token --query accessToken -o tsv`",
        ))
    })?;

    let client = RetryingHttpClient::new(
        Arc::new(ReqwestHttpClient::new()),
        Arc::new(StaticCredential::new(token)),
        config.retry.to_retry_config(),
    );
    let fetcher = CapacityFetcher::new(client, config);
    let cache = SnapshotCache::new(config.cache_ttl());

    let snapshot = cache
        .get_or_refresh(|| async {
            let outcome = fetcher.fetch_all().await?;
            let matrix = CapacityMatrix::build(&outcome.records, &outcome.failed_models);
            Ok((matrix, outcome.failed_models))
        })
        .await?;

    Ok(snapshot)
}
