// src/summary.rs
//
// Wide weekly tables for the bulletin write-up.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    fmt,
};
use tracing::info;

use crate::{
    process::{read_tidy_csv, CanonicalRecord, Group, Kind},
    Config, Years,
};

pub const DEFAULT_WEEKS: usize = 2;

/// Types reported when none are requested explicitly.
pub const DEFAULT_KINDS: [Kind; 3] = [Kind::Prison, Kind::OperationalCapacity, Kind::Hdc];

/// One type pivoted: groups as rows, dates as columns (most recent first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotTable {
    pub kind: Kind,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotRow {
    pub group: Group,
    pub values: Vec<Option<i64>>,
}

impl PivotTable {
    pub fn value(&self, group: Group, date: NaiveDate) -> Option<i64> {
        let col = self.dates.iter().position(|d| *d == date)?;
        self.rows.iter().find(|r| r.group == group)?.values[col]
    }
}

/// Keep the records of the `n_weeks` most recent distinct dates.
pub fn filter_n_weeks(records: &[CanonicalRecord], n_weeks: usize) -> Vec<CanonicalRecord> {
    let dates: BTreeSet<NaiveDate> = records.iter().map(|r| r.date).collect();
    let keep: BTreeSet<NaiveDate> = dates.into_iter().rev().take(n_weeks).collect();
    records
        .iter()
        .filter(|r| keep.contains(&r.date))
        .cloned()
        .collect()
}

/// Null values carry nothing to report.
pub fn drop_missing(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    records.into_iter().filter(|r| r.value.is_some()).collect()
}

// descending, missing values last
fn compare_latest(a: &PivotRow, b: &PivotRow) -> Ordering {
    let latest = |r: &PivotRow| r.values.first().copied().flatten();
    match (latest(a), latest(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn pivot(records: &[CanonicalRecord], kind: Kind) -> PivotTable {
    let selected: Vec<&CanonicalRecord> = records
        .iter()
        .filter(|r| r.kind == kind && r.value.is_some())
        .collect();
    let dates: Vec<NaiveDate> = selected
        .iter()
        .map(|r| r.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .rev()
        .collect();

    let mut by_group: BTreeMap<Group, Vec<Option<i64>>> = BTreeMap::new();
    for rec in selected {
        if let Some(col) = dates.iter().position(|d| *d == rec.date) {
            by_group
                .entry(rec.group)
                .or_insert_with(|| vec![None; dates.len()])[col] = rec.value;
        }
    }

    let mut rows: Vec<PivotRow> = by_group
        .into_iter()
        .map(|(group, values)| PivotRow { group, values })
        .collect();
    rows.sort_by(compare_latest);

    PivotTable { kind, dates, rows }
}

/// Most recent `n_weeks` of `records`, one table per requested type.
pub fn summarize(records: &[CanonicalRecord], n_weeks: usize, kinds: &[Kind]) -> Vec<PivotTable> {
    let recent = drop_missing(filter_n_weeks(records, n_weeks));
    kinds.iter().map(|&kind| pivot(&recent, kind)).collect()
}

/// Read the tidy dataset and summarize it.
#[tracing::instrument(level = "info", skip(config))]
pub fn weekly_summary(
    config: &Config,
    years: &Years,
    n_weeks: usize,
    kinds: &[Kind],
) -> Result<Vec<PivotTable>> {
    let records: Vec<CanonicalRecord> = read_tidy_csv(config.processed_csv())?
        .into_iter()
        .filter(|r| years.contains(r.date.year()))
        .collect();
    info!(rows = records.len(), "loaded tidy dataset");
    Ok(summarize(&records, n_weeks, kinds))
}

fn title(kind: Kind) -> &'static str {
    match kind {
        Kind::Prison => "Prison population",
        Kind::OperationalCapacity => "Operational capacity",
        Kind::Hdc => "HDC caseload",
        Kind::Headroom => "Headroom",
    }
}

impl fmt::Display for PivotTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", title(self.kind))?;
        write!(f, "{:<8}", "group")?;
        for date in &self.dates {
            write!(f, "{:>12}", date.format("%Y-%m-%d").to_string())?;
        }
        writeln!(f)?;
        for row in &self.rows {
            write!(f, "{:<8}", row.group.as_str())?;
            for value in &row.values {
                match value {
                    Some(v) => write!(f, "{:>12}", v)?,
                    None => write!(f, "{:>12}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
