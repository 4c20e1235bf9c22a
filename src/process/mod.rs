// src/process/mod.rs

use anyhow::{Context, Result};
use glob::glob;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{Config, Years};

pub mod aggregate;
pub mod date_parser;
pub mod layout;
pub mod normalize;
pub mod ods;
pub mod record;
pub mod sheet;

pub use aggregate::{aggregate, read_tidy_csv, write_tidy_csv, SourcedRecords};
pub use record::{CanonicalRecord, Group, Kind};

pub const DEFAULT_FILE_PATTERN: &str = "*.ods";

/// Read one raw spreadsheet and map it onto canonical records.
#[tracing::instrument(level = "debug", skip(path), fields(file = %path.as_ref().display()))]
pub fn process_file<P: AsRef<Path>>(path: P) -> Result<Vec<CanonicalRecord>> {
    let grid = ods::read_ods(&path)?;
    let sheet = sheet::ParsedSheet::from_grid(grid);
    debug!(shape = ?sheet.shape(), "parsed sheet");
    Ok(normalize::normalize(&sheet)?)
}

/// Raw files under `<raw_dir>/<year>/` matching `pattern`, sorted.
/// When `years` is restricted, files outside a matching year directory are left out.
pub fn find_raw_files(raw_dir: &Path, years: &Years, pattern: &str) -> Result<Vec<PathBuf>> {
    let glob_pattern = format!("{}/**/{}", raw_dir.display(), pattern);
    let mut files: Vec<PathBuf> = glob(&glob_pattern)
        .with_context(|| format!("Failed to read glob pattern '{}'", glob_pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .filter(|path| years.is_all() || year_dir(raw_dir, path).is_some_and(|y| years.contains(y)))
        .collect();
    files.sort();
    Ok(files)
}

fn year_dir(raw_dir: &Path, path: &Path) -> Option<i32> {
    path.strip_prefix(raw_dir)
        .ok()?
        .components()
        .next()?
        .as_os_str()
        .to_str()?
        .parse()
        .ok()
}

/// Normalize every file in parallel; failing files are logged and contribute nothing.
pub fn build_dataset(files: &[PathBuf]) -> Vec<CanonicalRecord> {
    let tables: Vec<SourcedRecords> = files
        .par_iter()
        .filter_map(|path| match process_file(path) {
            Ok(records) => {
                debug!(file = %path.display(), records = records.len(), "normalized");
                Some(SourcedRecords {
                    source: path.clone(),
                    records,
                })
            }
            Err(err) => {
                warn!(file = %path.display(), "skipping: {:#}", err);
                None
            }
        })
        .collect();
    info!(
        files = files.len(),
        usable = tables.len(),
        "normalized raw spreadsheets"
    );
    aggregate(&tables)
}

/// Rebuild `<cleanPath>/processed_data.csv` from the raw downloads.
#[tracing::instrument(level = "info", skip(config))]
pub fn make_dataset(config: &Config, years: &Years, pattern: &str) -> Result<PathBuf> {
    info!("making final data set from raw data");
    let files = find_raw_files(&config.data.raw_file_path, years, pattern)?;
    if files.is_empty() {
        warn!(
            dir = %config.data.raw_file_path.display(),
            pattern,
            "no raw files found"
        );
    }

    let records = build_dataset(&files);
    match (records.first(), records.last()) {
        (Some(first), Some(last)) => info!(
            rows = records.len(),
            from = %first.date,
            to = %last.date,
            "dataset date range"
        ),
        _ => warn!("no records extracted"),
    }

    let out = config.processed_csv();
    write_tidy_csv(&out, &records)?;
    info!(path = %out.display(), "processed data saved");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessError;
    use crate::process::ods::tests::{empty_cells, number_cell, ods_bytes, text_cell};
    use anyhow::Result;
    use chrono::NaiveDate;
    use std::fs;

    /// A new-format bulletin: header row, then 25 data rows at offsets 0..=28
    /// with offsets 1, 2, 3 and 7 left blank.
    fn new_format_bulletin(date_text: &str, population: i64) -> Vec<u8> {
        let mut rows = vec![format!(
            "<table:table-row>{}{}</table:table-row>",
            empty_cells(8),
            text_cell("Header")
        )];
        let wide = |label: &str, values: [i64; 4]| {
            format!(
                "<table:table-row>{}{}{}{}{}{}{}{}</table:table-row>",
                empty_cells(2),
                text_cell(label),
                empty_cells(1),
                number_cell(values[0]),
                empty_cells(1),
                number_cell(values[1]),
                number_cell(values[2]),
                number_cell(values[3]),
            )
        };
        for offset in 0..=28 {
            let row = match offset {
                0 => format!(
                    "<table:table-row>{}{}</table:table-row>",
                    empty_cells(2),
                    text_cell(date_text)
                ),
                1 | 2 | 3 | 7 => "<table:table-row><table:table-cell/></table:table-row>".to_string(),
                4 => wide("Population", [population, population - 4_000, 3_600, 400]),
                5 => wide("Useable Operational Capacity", [89_000, 84_900, 4_100, 700]),
                6 => wide("Headroom", [1_500, 1_100, 400, 300]),
                8 => wide("Home Detention Curfew caseload", [3_400, 3_100, 300, 0]),
                _ => format!("<table:table-row>{}</table:table-row>", text_cell("note")),
            };
            rows.push(row);
        }
        ods_bytes(&rows.concat())
    }

    #[test]
    fn process_file_reads_new_format_bulletin() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bulletin.ods");
        fs::write(&path, new_format_bulletin("Population on 19th July 2024", 87_505))?;

        let records = process_file(&path)?;
        assert_eq!(records.len(), 16);
        let total = records
            .iter()
            .find(|r| r.group == Group::Total && r.kind == Kind::Prison)
            .unwrap();
        assert_eq!(total.value, Some(87_505));
        assert_eq!(total.date, NaiveDate::from_ymd_opt(2024, 7, 19).unwrap());
        Ok(())
    }

    #[test]
    fn make_dataset_skips_bad_files_and_filters_years() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let raw = dir.path().join("raw");
        fs::create_dir_all(raw.join("2024"))?;
        fs::create_dir_all(raw.join("2025"))?;
        fs::write(
            raw.join("2024").join("a.ods"),
            new_format_bulletin("19 July 2024", 87_505),
        )?;
        fs::write(
            raw.join("2025").join("b.ods"),
            new_format_bulletin("3rd January 2025", 88_000),
        )?;
        fs::write(
            raw.join("2025").join("undated.ods"),
            new_format_bulletin("Prison population", 1),
        )?;
        fs::write(raw.join("2025").join("broken.ods"), b"not a spreadsheet")?;

        let mut config = Config::default();
        config.data.raw_file_path = raw.clone();
        config.data.cln_file_path = dir.path().join("processed");

        let out = make_dataset(&config, &Years::all(), DEFAULT_FILE_PATTERN)?;
        let all = read_tidy_csv(&out)?;
        assert_eq!(all.len(), 32);
        assert!(all.windows(2).all(|w| w[0].key() < w[1].key()));

        let only_2025: Years = [2025].into_iter().collect();
        make_dataset(&config, &only_2025, DEFAULT_FILE_PATTERN)?;
        let recent = read_tidy_csv(&out)?;
        assert_eq!(recent.len(), 16);
        assert!(recent
            .iter()
            .all(|r| r.date == NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()));
        Ok(())
    }

    #[test]
    fn oversized_repeats_are_skipped_not_fatal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let good = dir.path().join("good.ods");
        fs::write(&good, new_format_bulletin("19 July 2024", 87_505))?;
        let hostile = dir.path().join("hostile.ods");
        let max = usize::MAX;
        fs::write(
            &hostile,
            ods_bytes(&format!(
                r#"<table:table-row table:number-rows-repeated="{max}"><table:table-cell/></table:table-row><table:table-row table:number-rows-repeated="{max}"><table:table-cell/></table:table-row><table:table-row>{}</table:table-row>"#,
                number_cell(1)
            )),
        )?;

        let err = process_file(&hostile).unwrap_err();
        assert!(err.downcast_ref::<ProcessError>().is_some());
        assert_eq!(build_dataset(&[good, hostile]).len(), 16);
        Ok(())
    }

    #[test]
    fn find_raw_files_respects_year_dirs() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for year in ["2023", "2024"] {
            fs::create_dir_all(dir.path().join(year))?;
            fs::write(dir.path().join(year).join("x.ods"), b"")?;
        }
        fs::write(dir.path().join("loose.ods"), b"")?;

        assert_eq!(
            find_raw_files(dir.path(), &Years::all(), DEFAULT_FILE_PATTERN)?.len(),
            3
        );
        let picked =
            find_raw_files(dir.path(), &[2024].into_iter().collect(), DEFAULT_FILE_PATTERN)?;
        assert_eq!(picked, vec![dir.path().join("2024").join("x.ods")]);
        Ok(())
    }
}
