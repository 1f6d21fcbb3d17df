use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use popsift_dataset::{self as pd, pc};

use crate::{config::Config, progress::ConsoleProgress};

mod config;
mod progress;

/// Collect popular tracks and their audio features into a CSV dataset.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the configuration file.
    #[arg(long, default_value = Config::FILENAME)]
    config: PathBuf,
    /// Where to write the dataset; overrides `dataset.output_path`.
    #[arg(long)]
    output: Option<PathBuf>,
    /// OAuth client ID; overrides `catalog.client_id`.
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    client_id: Option<String>,
    /// OAuth client secret; overrides `catalog.client_secret`.
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,
    /// Write the default configuration to `--config` and exit.
    #[arg(long)]
    write_default_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("popsift=info,popsift_dataset=info")
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.write_default_config {
        return Config::default().save(&args.config);
    }

    let mut config = Config::load(&args.config)?;
    if let Some(client_id) = args.client_id {
        config.catalog.client_id = client_id;
    }
    if let Some(client_secret) = args.client_secret {
        config.catalog.client_secret = client_secret;
    }
    if let Some(output) = args.output {
        config.dataset.output_path = output;
    }
    config.validate()?;

    let fetch_config = config.fetch_config();
    tracing::info!(
        "collecting {} tracks matching {:?} in pages of {}",
        fetch_config.total_count,
        fetch_config.query.to_string(),
        fetch_config.page_size
    );

    let output = match &config.catalog.access_token {
        Some(token) => {
            let client = pc::Client::new(
                &config.catalog.api_base_url,
                pc::StaticToken(token.clone()),
            );
            collect(&client, &fetch_config).await?
        }
        None => {
            let client = pc::Client::new(
                &config.catalog.api_base_url,
                pc::ClientCredentials::new(
                    &config.catalog.client_id,
                    &config.catalog.client_secret,
                    &config.catalog.token_url,
                ),
            );
            collect(&client, &fetch_config).await?
        }
    };

    let summary = output.summary();
    tracing::info!(
        "fetched {} records from {} windows ({} failed); dropped {} duplicate, {} malformed, {} featureless tracks",
        summary.records,
        summary.windows,
        summary.failed_windows,
        summary.duplicates,
        summary.malformed,
        summary.missing_features
    );

    let dataset = pd::Dataset::assemble(
        output.columns,
        &config.filter_criteria(),
        config.dataset.on_column_mismatch,
    )?;
    match dataset.min_popularity() {
        Some(min) => tracing::info!("{} tracks, lowest popularity {min}", dataset.len()),
        None => tracing::warn!("no tracks passed the filters"),
    }

    let output_path = &config.dataset.output_path;
    dataset
        .write_csv(output_path)
        .with_context(|| format!("Failed to write to {output_path:?}"))?;
    tracing::info!("wrote {}", output_path.display());

    Ok(())
}

async fn collect<C: pc::CredentialManager>(
    client: &pc::Client<C>,
    fetch_config: &pd::FetchConfig,
) -> anyhow::Result<pd::FetchOutput> {
    client
        .authenticate()
        .await
        .context("Failed to authenticate with the catalog")?;
    let mut progress: ConsoleProgress = ConsoleProgress::default();
    Ok(pd::fetch_all(client, fetch_config, &mut progress).await)
}
