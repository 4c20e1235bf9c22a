/// Why a raw spreadsheet contributed no records.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("unrecognized format with shape ({rows}, {cols})")]
    UnknownLayout { rows: usize, cols: usize },

    #[error("could not extract a publication date from {0:?}")]
    MissingDate(String),

    #[error("expected a row at offset {0}, found none")]
    MissingRow(usize),
}

/// Invalid arguments to the downstream filters.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("unknown group {given:?}; valid choices are: {}", .valid.join(", "))]
    UnknownGroup {
        given: String,
        valid: Vec<&'static str>,
    },

    #[error("unknown type {given:?}; valid choices are: {}", .valid.join(", "))]
    UnknownKind {
        given: String,
        valid: Vec<&'static str>,
    },

    #[error("no {kind} records for group {group} since {since}")]
    NoData {
        group: String,
        kind: String,
        since: i32,
    },
}
