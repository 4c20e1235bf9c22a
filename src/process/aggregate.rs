// src/process/aggregate.rs

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::WriterBuilder;
use std::{
    collections::{btree_map::Entry, BTreeMap},
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use super::record::{CanonicalRecord, Group, Kind};

pub const CSV_HEADER: [&str; 4] = ["date", "group", "type", "value"];

/// Records normalized from one raw file.
#[derive(Debug, Clone)]
pub struct SourcedRecords {
    pub source: PathBuf,
    pub records: Vec<CanonicalRecord>,
}

/// Does `candidate` replace `current` for the same (date, group, type)?
/// A value beats a null; otherwise the source path that sorts last byte-wise wins.
fn takes_precedence(candidate: (Option<i64>, &Path), current: (Option<i64>, &Path)) -> bool {
    match (candidate.0.is_some(), current.0.is_some()) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.1.as_os_str() > current.1.as_os_str(),
    }
}

/// Merge per-file tables into one dataset sorted by (date, group, type),
/// keeping one record per key. The result does not depend on input order.
pub fn aggregate(tables: &[SourcedRecords]) -> Vec<CanonicalRecord> {
    let mut merged: BTreeMap<(NaiveDate, Group, Kind), (Option<i64>, &Path)> = BTreeMap::new();

    for table in tables {
        for rec in &table.records {
            let candidate = (rec.value, table.source.as_path());
            match merged.entry(rec.key()) {
                Entry::Vacant(slot) => {
                    slot.insert(candidate);
                }
                Entry::Occupied(mut slot) => {
                    let current = *slot.get();
                    if takes_precedence(candidate, current) {
                        debug!(
                            date = %rec.date, group = %rec.group, kind = %rec.kind,
                            kept = %candidate.1.display(), dropped = %current.1.display(),
                            "duplicate record replaced"
                        );
                        slot.insert(candidate);
                    } else {
                        debug!(
                            date = %rec.date, group = %rec.group, kind = %rec.kind,
                            kept = %current.1.display(), dropped = %candidate.1.display(),
                            "duplicate record ignored"
                        );
                    }
                }
            }
        }
    }

    merged
        .into_iter()
        .map(|((date, group, kind), (value, _))| CanonicalRecord {
            date,
            group,
            kind,
            value,
        })
        .collect()
}

/// Write `records` as the tidy CSV, replacing whatever was at `path`.
pub fn write_tidy_csv<P: AsRef<Path>>(path: P, records: &[CanonicalRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
    }

    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(CSV_HEADER)?;
    for rec in records {
        wtr.serialize(rec)?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

pub fn read_tidy_csv<P: AsRef<Path>>(path: P) -> Result<Vec<CanonicalRecord>> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening tidy dataset {}", path.display()))?;
    rdr.deserialize::<CanonicalRecord>()
        .enumerate()
        .map(|(idx, row)| {
            row.with_context(|| format!("CSV parse error in {} at record {}", path.display(), idx))
        })
        .collect()
}
