// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const DEFAULT_COLLECTION_URL: &str =
    "https://www.gov.uk/api/content/government/collections/prison-population-statistics";

/// Name of the tidy dataset written under `data.clnFilePath`.
pub const PROCESSED_FILE_NAME: &str = "processed_data.csv";

/// Settings for one pipeline run. Built once in `main` and handed to every stage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub viz: VizConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataConfig {
    pub raw_file_path: PathBuf,
    pub cln_file_path: PathBuf,
    pub logs_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_file_path: PathBuf::from("data/raw"),
            cln_file_path: PathBuf::from("data/processed"),
            logs_path: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VizConfig {
    pub out_path: PathBuf,
    /// First calendar year drawn on the charts.
    pub start_year: i32,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            out_path: PathBuf::from("reports/figures"),
            start_year: 2021,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchConfig {
    pub collection_url: String,
    pub max_concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            collection_url: DEFAULT_COLLECTION_URL.to_string(),
            max_concurrency: 8,
            timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Accepts a plain mapping or a sequence of single-section mappings
    /// (`- data: {...}` / `- viz: {...}`), which are merged in order.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        Ok(serde_yaml::from_value(merge_sections(value))?)
    }

    pub fn processed_csv(&self) -> PathBuf {
        self.data.cln_file_path.join(PROCESSED_FILE_NAME)
    }
}

fn merge_sections(value: Value) -> Value {
    match value {
        Value::Sequence(items) => {
            let mut merged = Mapping::new();
            for item in items {
                if let Value::Mapping(section) = item {
                    for (k, v) in section {
                        merged.insert(k, v);
                    }
                }
            }
            Value::Mapping(merged)
        }
        Value::Null => Value::Mapping(Mapping::new()),
        other => other,
    }
}
