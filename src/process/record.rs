use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::FilterError;

// Variants are declared in the alphabetical order of their CSV names so the
// derived `Ord` sorts the tidy dataset the same way the text does.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Female,
    Male,
    Total,
    Youth,
}

impl Group {
    pub const ALL: [Group; 4] = [Group::Female, Group::Male, Group::Total, Group::Youth];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Female => "female",
            Group::Male => "male",
            Group::Total => "total",
            Group::Youth => "youth",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Group::ALL
            .into_iter()
            .find(|g| g.as_str() == wanted)
            .ok_or_else(|| FilterError::UnknownGroup {
                given: s.to_string(),
                valid: Group::ALL.iter().map(Group::as_str).collect(),
            })
    }
}

/// The series a figure belongs to. Serialized as the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Hdc,
    Headroom,
    OperationalCapacity,
    Prison,
}

impl Kind {
    pub const ALL: [Kind; 4] = [
        Kind::Hdc,
        Kind::Headroom,
        Kind::OperationalCapacity,
        Kind::Prison,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Hdc => "hdc",
            Kind::Headroom => "headroom",
            Kind::OperationalCapacity => "operational_capacity",
            Kind::Prison => "prison",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Kind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| FilterError::UnknownKind {
                given: s.to_string(),
                valid: Kind::ALL.iter().map(Kind::as_str).collect(),
            })
    }
}

/// One row of the tidy dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub date: NaiveDate,
    pub group: Group,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub value: Option<i64>,
}

impl CanonicalRecord {
    pub fn key(&self) -> (NaiveDate, Group, Kind) {
        (self.date, self.group, self.kind)
    }
}
