// src/process/normalize.rs

use chrono::NaiveDate;
use tracing::debug;

use super::{
    date_parser::extract_date,
    layout::{HistoricVariant, Layout},
    record::{CanonicalRecord, Group, Kind},
    sheet::{Cell, ParsedSheet, SheetRow},
};
use crate::error::ProcessError;

const LABEL_COL: usize = 2;

const HISTORIC_ROWS: usize = 7;
const HISTORIC_VALUE_COL: usize = 5;
const HISTORIC_MISPLACED_HDC_COL: usize = 3;
/// Rows above this offset are titles and notes.
const HISTORIC_FIRST_DATA_OFFSET: usize = 4;

const NEW_ROWS: usize = 6;
/// Population, operational capacity, headroom, HDC.
const NEW_DATA_OFFSETS: [usize; 4] = [4, 5, 6, 8];
const NEW_GROUP_COLS: [(Group, usize); 4] = [
    (Group::Total, 4),
    (Group::Male, 6),
    (Group::Female, 7),
    (Group::Youth, 8),
];

/// Classify `sheet` by shape and map it onto canonical records.
pub fn normalize(sheet: &ParsedSheet) -> Result<Vec<CanonicalRecord>, ProcessError> {
    match Layout::classify(sheet.shape()) {
        Layout::Historic(variant) => normalize_historic(sheet, variant),
        Layout::New => normalize_new(sheet),
        Layout::Unknown { rows, cols } => Err(ProcessError::UnknownLayout { rows, cols }),
    }
}

fn publication_date(rows: &[&SheetRow]) -> Result<NaiveDate, ProcessError> {
    let cell = rows
        .first()
        .map(|r| r.cell(LABEL_COL))
        .unwrap_or(&Cell::Empty);
    match cell.as_text() {
        Some(text) => extract_date(text).ok_or_else(|| ProcessError::MissingDate(text.to_string())),
        None => Err(ProcessError::MissingDate(format!("{cell:?}"))),
    }
}

fn historic_label(label: &str) -> Option<(Kind, Group)> {
    match label.trim() {
        "Population" => Some((Kind::Prison, Group::Total)),
        "Male population" | "Population in male estate" => Some((Kind::Prison, Group::Male)),
        "Female population" | "Population in female estate" => {
            Some((Kind::Prison, Group::Female))
        }
        "Useable Operational Capacity" => Some((Kind::OperationalCapacity, Group::Total)),
        "Home Detention Curfew caseload" => Some((Kind::Hdc, Group::Total)),
        _ => None,
    }
}

fn new_label(label: &str) -> Option<Kind> {
    match label.trim() {
        "Population" => Some(Kind::Prison),
        "Useable Operational Capacity" => Some(Kind::OperationalCapacity),
        "Headroom" => Some(Kind::Headroom),
        "Home Detention Curfew caseload" => Some(Kind::Hdc),
        _ => None,
    }
}

fn normalize_historic(
    sheet: &ParsedSheet,
    variant: HistoricVariant,
) -> Result<Vec<CanonicalRecord>, ProcessError> {
    let rows: Vec<&SheetRow> = sheet.rows().iter().take(HISTORIC_ROWS).collect();
    let date = publication_date(&rows)?;

    let last = rows.len().saturating_sub(1);
    let mut records = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if row.offset < HISTORIC_FIRST_DATA_OFFSET {
            continue;
        }
        let value_col = match variant {
            HistoricVariant::MisplacedHdc if i == last => HISTORIC_MISPLACED_HDC_COL,
            _ => HISTORIC_VALUE_COL,
        };
        let label = row.cell(LABEL_COL);
        match label.as_text().and_then(historic_label) {
            Some((kind, group)) => records.push(CanonicalRecord {
                date,
                group,
                kind,
                value: row.cell(value_col).to_integer(),
            }),
            None => debug!(offset = row.offset, label = ?label, "dropping unlabelled historic row"),
        }
    }
    Ok(records)
}

fn normalize_new(sheet: &ParsedSheet) -> Result<Vec<CanonicalRecord>, ProcessError> {
    let rows: Vec<&SheetRow> = sheet.rows().iter().take(NEW_ROWS).collect();
    let date = publication_date(&rows)?;

    let data_rows = NEW_DATA_OFFSETS
        .iter()
        .map(|&offset| {
            rows.iter()
                .find(|r| r.offset == offset)
                .copied()
                .ok_or(ProcessError::MissingRow(offset))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut records = Vec::with_capacity(data_rows.len() * NEW_GROUP_COLS.len());
    for (group, col) in NEW_GROUP_COLS {
        for row in &data_rows {
            let label = row.cell(LABEL_COL);
            match label.as_text().and_then(new_label) {
                Some(kind) => records.push(CanonicalRecord {
                    date,
                    group,
                    kind,
                    value: row.cell(col).to_integer(),
                }),
                None if group == Group::Total => {
                    debug!(offset = row.offset, label = ?label, "dropping unlabelled row")
                }
                None => {}
            }
        }
    }
    Ok(records)
}
