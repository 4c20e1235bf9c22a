// src/fetch/attachments.rs

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use url::Url;

use super::{documents::Document, DownloadReport};

pub const WORD_CONTENT_TYPES: [&str; 2] = [
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attachment {
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentBody {
    #[serde(default)]
    details: DocumentDetails,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentDetails {
    #[serde(default)]
    attachments: Vec<Attachment>,
}

/// Word files and monthly releases are not weekly bulletins.
pub fn is_spreadsheet_attachment(att: &Attachment) -> bool {
    let word = att
        .content_type
        .as_deref()
        .is_some_and(|ct| WORD_CONTENT_TYPES.contains(&ct));
    !word && !att.title.to_lowercase().contains("monthly")
}

pub fn parse_attachments(body: &str) -> Result<Vec<Attachment>> {
    let doc: DocumentBody = serde_json::from_str(body).context("parsing document JSON")?;
    Ok(doc.details.attachments)
}

/// `<raw_dir>/<year>/<last path segment of url>`.
pub fn target_path(raw_dir: &Path, year: i32, url: &str) -> Result<PathBuf> {
    let parsed = Url::parse(url).with_context(|| format!("parsing attachment URL {}", url))?;
    let Some(filename) = parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
    else {
        bail!("attachment URL has no file name: {}", url);
    };
    Ok(raw_dir.join(year.to_string()).join(filename))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Downloaded,
    Skipped,
}

/// Fetch `url` into `dest` unless it is already there.
/// The body lands in a `.part` sibling first so `dest` only ever holds complete files.
pub async fn download_attachment(client: &Client, url: &str, dest: &Path) -> Result<Outcome> {
    if fs::try_exists(dest).await.unwrap_or(false) {
        info!(file = %dest.display(), "skipping (already downloaded)");
        return Ok(Outcome::Skipped);
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let bytes = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()?
        .bytes()
        .await
        .with_context(|| format!("reading body from {}", url))?;

    let mut part = dest.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);
    fs::write(&part, &bytes)
        .await
        .with_context(|| format!("writing {}", part.display()))?;
    fs::rename(&part, dest)
        .await
        .with_context(|| format!("moving {} into place", part.display()))?;

    info!(file = %dest.display(), bytes = bytes.len(), "downloaded");
    Ok(Outcome::Downloaded)
}

/// Download every spreadsheet attached to `doc`, one at a time.
pub async fn download_document(
    client: &Client,
    doc: &Document,
    raw_dir: &Path,
) -> Result<DownloadReport> {
    let body = client
        .get(&doc.api_url)
        .send()
        .await
        .with_context(|| format!("GET {}", doc.api_url))?
        .error_for_status()?
        .text()
        .await?;
    let wanted: Vec<Attachment> = parse_attachments(&body)?
        .into_iter()
        .filter(is_spreadsheet_attachment)
        .collect();

    let mut report = DownloadReport::default();
    for url in wanted.iter().filter_map(|a| a.url.as_deref()) {
        let dest = target_path(raw_dir, doc.year, url)?;
        match download_attachment(client, url, &dest).await? {
            Outcome::Downloaded => report.downloaded += 1,
            Outcome::Skipped => report.skipped += 1,
        }
    }

    if report.downloaded > 0 {
        info!(year = doc.year, title = %doc.title, "download complete");
    } else if report.skipped == wanted.len() {
        info!(year = doc.year, title = %doc.title, "all files already downloaded");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(title: &str, content_type: Option<&str>) -> Attachment {
        Attachment {
            url: Some("https://assets.publishing.service.gov.uk/media/abc/file.ods".into()),
            title: title.into(),
            content_type: content_type.map(str::to_string),
        }
    }

    #[test]
    fn keeps_only_weekly_spreadsheets() {
        assert!(is_spreadsheet_attachment(&attachment(
            "Prison population 19 July 2024",
            Some("application/vnd.oasis.opendocument.spreadsheet")
        )));
        assert!(is_spreadsheet_attachment(&attachment("No type", None)));
        assert!(!is_spreadsheet_attachment(&attachment(
            "Guide",
            Some("application/msword")
        )));
        assert!(!is_spreadsheet_attachment(&attachment(
            "Population bulletin: MONTHLY June 2024",
            None
        )));
    }

    #[test]
    fn parses_attachment_list() -> Result<()> {
        let body = r#"{
            "title": "Prison population figures: 2024",
            "details": {
                "attachments": [
                    { "url": "https://x/a.ods", "title": "A", "content_type": "application/vnd.oasis.opendocument.spreadsheet" },
                    { "title": "no url" }
                ]
            }
        }"#;
        let atts = parse_attachments(body)?;
        assert_eq!(atts.len(), 2);
        assert_eq!(atts[0].url.as_deref(), Some("https://x/a.ods"));
        assert!(atts[1].url.is_none());
        assert!(parse_attachments("{}")?.is_empty());
        Ok(())
    }

    #[test]
    fn target_uses_year_dir_and_url_basename() -> Result<()> {
        let path = target_path(
            Path::new("data/raw"),
            2024,
            "https://assets.publishing.service.gov.uk/media/66/prison-pop-19-july-2024.ods",
        )?;
        assert_eq!(path, Path::new("data/raw/2024/prison-pop-19-july-2024.ods"));
        assert!(target_path(Path::new("data/raw"), 2024, "https://x/dir/").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn existing_files_are_not_fetched_again() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let dest = dir.path().join("2024").join("x.ods");
        std::fs::create_dir_all(dest.parent().unwrap())?;
        std::fs::write(&dest, b"already here")?;

        // nothing listens on the discard port; a request would fail
        let client = Client::new();
        let outcome = download_attachment(&client, "http://127.0.0.1:9/x.ods", &dest).await?;
        assert_eq!(outcome, Outcome::Skipped);
        assert_eq!(std::fs::read(&dest)?, b"already here");
        Ok(())
    }

    #[tokio::test]
    async fn failed_fetch_leaves_no_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let dest = dir.path().join("2024").join("x.ods");
        let client = Client::new();
        assert!(download_attachment(&client, "http://127.0.0.1:9/x.ods", &dest)
            .await
            .is_err());
        assert!(!dest.exists());
        Ok(())
    }
}
