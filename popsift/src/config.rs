use std::{path::Path, time::Duration};

use anyhow::Context as _;
use chrono::NaiveDate;
use popsift_dataset::{self as pd, pc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub collection: Collection,
    #[serde(default)]
    pub dataset: Dataset,
}
impl Config {
    pub const FILENAME: &str = "config.toml";

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file at {}, using defaults", path.display());
                Ok(Config::default())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, toml::to_string(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("saved config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let c = &self.collection;
        anyhow::ensure!(
            (1..=pc::SEARCH_PAGE_LIMIT).contains(&c.page_size),
            "collection.page_size must be between 1 and {}, got {}",
            pc::SEARCH_PAGE_LIMIT,
            c.page_size
        );
        anyhow::ensure!(
            c.total_count <= pc::SEARCH_RESULT_CEILING,
            "collection.total_count must be at most {}, got {}",
            pc::SEARCH_RESULT_CEILING,
            c.total_count
        );
        anyhow::ensure!(
            c.query_range_start <= c.query_range_end,
            "collection.query_range_start ({}) is after query_range_end ({})",
            c.query_range_start,
            c.query_range_end
        );
        anyhow::ensure!(
            self.catalog.access_token.is_some()
                || (!self.catalog.client_id.is_empty() && !self.catalog.client_secret.is_empty()),
            "no credentials: set catalog.access_token, or catalog.client_id and catalog.client_secret"
        );
        Ok(())
    }

    pub fn fetch_config(&self) -> pd::FetchConfig {
        let c = &self.collection;
        pd::FetchConfig {
            query: pc::SearchQuery::year_range(c.query_range_start, c.query_range_end),
            page_size: c.page_size,
            total_count: c.total_count,
            market: c.market.clone(),
            retry: pd::RetryPolicy {
                max_retries: c.max_retries,
                base_delay: Duration::from_millis(c.retry_base_delay_ms),
            },
        }
    }

    pub fn filter_criteria(&self) -> pd::FilterCriteria {
        pd::FilterCriteria {
            popularity_cutoff: self.dataset.popularity_cutoff,
            release_date_cutoff: self.dataset.release_date_cutoff,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Catalog {
    pub api_base_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// A pre-acquired bearer token; takes precedence over the client credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}
impl Default for Catalog {
    fn default() -> Self {
        Self {
            api_base_url: pc::DEFAULT_BASE_URL.to_string(),
            token_url: pc::ClientCredentials::DEFAULT_TOKEN_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            access_token: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Collection {
    pub query_range_start: i32,
    pub query_range_end: i32,
    pub page_size: u32,
    pub total_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}
impl Default for Collection {
    fn default() -> Self {
        Self {
            query_range_start: 2018,
            query_range_end: 2020,
            page_size: pc::SEARCH_PAGE_LIMIT,
            total_count: pc::SEARCH_RESULT_CEILING,
            market: None,
            max_retries: 0,
            retry_base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Dataset {
    /// Tracks at or below this popularity are excluded.
    pub popularity_cutoff: u8,
    /// Tracks released on or after this date are excluded.
    pub release_date_cutoff: NaiveDate,
    pub output_path: std::path::PathBuf,
    pub on_column_mismatch: pd::MismatchPolicy,
}
impl Default for Dataset {
    fn default() -> Self {
        Self {
            popularity_cutoff: 0,
            release_date_cutoff: NaiveDate::from_ymd_opt(2020, 8, 1).unwrap_or_default(),
            output_path: "data/spotify.csv".into(),
            on_column_mismatch: pd::MismatchPolicy::Fail,
        }
    }
}
