// src/fetch/documents.rs
//
// Publication documents listed by the statistics collection.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::Years;

static TITLE_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(20\d{2})\b").expect("title year regex should compile"));

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub links: CollectionLinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionLinks {
    #[serde(default)]
    pub documents: Vec<DocumentLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentLink {
    #[serde(default)]
    pub title: String,
    pub api_url: Option<String>,
    pub public_updated_at: Option<String>,
}

/// A document chosen for download, with the year it files under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub api_url: String,
    pub year: i32,
}

/// First 20xx year standing alone in `title`.
pub fn extract_year_from_title(title: &str) -> Option<i32> {
    TITLE_YEAR
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn parse_updated_year(timestamp: &str) -> Option<i32> {
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%SZ")
        .map(|dt| dt.year())
        .or_else(|_| DateTime::parse_from_rfc3339(timestamp).map(|dt| dt.year()))
        .ok()
}

/// Year from the title, else from the last update time.
pub fn document_year(link: &DocumentLink) -> Option<i32> {
    extract_year_from_title(&link.title).or_else(|| {
        link.public_updated_at
            .as_deref()
            .and_then(parse_updated_year)
    })
}

/// Documents with a known year inside `years` and an API URL to follow.
pub fn select_documents(links: &[DocumentLink], years: &Years) -> Vec<Document> {
    links
        .iter()
        .filter_map(|link| {
            let Some(year) = document_year(link) else {
                debug!(title = %link.title, "no year for document, skipping");
                return None;
            };
            if !years.contains(year) {
                return None;
            }
            let Some(api_url) = link.api_url.clone() else {
                debug!(title = %link.title, "document has no api_url, skipping");
                return None;
            };
            Some(Document {
                title: link.title.clone(),
                api_url,
                year,
            })
        })
        .collect()
}

pub fn parse_collection(body: &str) -> Result<Collection> {
    serde_json::from_str(body).context("parsing collection JSON")
}

/// List the collection's documents for `years`.
pub async fn fetch_documents(client: &Client, url: &str, years: &Years) -> Result<Vec<Document>> {
    let body = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()?
        .text()
        .await
        .with_context(|| format!("reading body from {}", url))?;

    let collection = parse_collection(&body)?;
    let docs = select_documents(&collection.links.documents, years);
    info!(
        listed = collection.links.documents.len(),
        selected = docs.len(),
        "collection documents"
    );
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = r#"{
        "title": "Prison population statistics",
        "links": {
            "documents": [
                {
                    "title": "Prison population figures: 2024",
                    "api_url": "https://www.gov.uk/api/content/government/statistics/prison-population-figures-2024",
                    "public_updated_at": "2024-12-20T09:30:00Z"
                },
                {
                    "title": "Population bulletin: weekly",
                    "api_url": "https://www.gov.uk/api/content/x",
                    "public_updated_at": "2023-06-02T09:30:00Z"
                },
                { "title": "Archive", "api_url": "https://www.gov.uk/api/content/y" },
                { "title": "Prison population figures: 2022" }
            ]
        }
    }"#;

    #[test]
    fn title_year_needs_word_boundaries() {
        assert_eq!(extract_year_from_title("Prison population figures: 2024"), Some(2024));
        assert_eq!(extract_year_from_title("Figures 12024"), None);
        assert_eq!(extract_year_from_title("1999 review"), None);
        assert_eq!(extract_year_from_title("2021 to 2022"), Some(2021));
    }

    #[test]
    fn updated_timestamp_fallback() {
        assert_eq!(parse_updated_year("2023-06-02T09:30:00Z"), Some(2023));
        assert_eq!(parse_updated_year("2023-06-02T09:30:00+01:00"), Some(2023));
        assert_eq!(parse_updated_year("June 2023"), None);
    }

    #[test]
    fn selects_documents_by_year() -> Result<()> {
        let collection = parse_collection(COLLECTION)?;
        let docs = select_documents(&collection.links.documents, &Years::all());
        let years: Vec<i32> = docs.iter().map(|d| d.year).collect();
        assert_eq!(years, vec![2024, 2023]);

        let only: Years = [2023].into_iter().collect();
        let docs = select_documents(&collection.links.documents, &only);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].api_url, "https://www.gov.uk/api/content/x");
        Ok(())
    }

    #[test]
    fn missing_links_mean_no_documents() -> Result<()> {
        let collection = parse_collection(r#"{"title": "empty"}"#)?;
        assert!(collection.links.documents.is_empty());
        Ok(())
    }
}
