// src/fetch/mod.rs

use anyhow::Result;
use reqwest::Client;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{error, info};

use crate::{config::FetchConfig, Config, Years};

pub mod attachments;
pub mod documents;

pub use documents::Document;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub fn build_client(config: &FetchConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(USER_AGENT)
        .build()?)
}

/// Attachment counts for one run; a document that fails counts once under `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DownloadReport {
    pub fn merge(&mut self, other: DownloadReport) {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Download the weekly spreadsheets for `years` into `<rawFilePath>/<year>/`.
/// Documents are handled concurrently, at most `maxConcurrency` at a time;
/// a failing document is logged and does not stop the others.
#[tracing::instrument(level = "info", skip(config))]
pub async fn download_prison_population_data(
    config: &Config,
    years: &Years,
) -> Result<DownloadReport> {
    let client = build_client(&config.fetch)?;
    let docs = documents::fetch_documents(&client, &config.fetch.collection_url, years).await?;

    let sem = Arc::new(Semaphore::new(config.fetch.max_concurrency.max(1)));
    let mut tasks = JoinSet::new();
    for doc in docs {
        let client = client.clone();
        let sem = sem.clone();
        let raw_dir = config.data.raw_file_path.clone();
        tasks.spawn(async move {
            let _permit = sem.acquire_owned().await?;
            let result = attachments::download_document(&client, &doc, &raw_dir).await;
            Ok::<_, anyhow::Error>((doc, result))
        });
    }

    let mut report = DownloadReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok((_, Ok(doc_report)))) => report.merge(doc_report),
            Ok(Ok((doc, Err(err)))) => {
                error!(year = doc.year, url = %doc.api_url, "document failed: {:#}", err);
                report.failed += 1;
            }
            Ok(Err(err)) => {
                error!("download task aborted: {:#}", err);
                report.failed += 1;
            }
            Err(err) => {
                error!("download task panicked: {}", err);
                report.failed += 1;
            }
        }
    }

    info!(
        downloaded = report.downloaded,
        skipped = report.skipped,
        failed = report.failed,
        "download finished"
    );
    Ok(report)
}
