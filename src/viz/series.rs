use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::{
    error::FilterError,
    process::{CanonicalRecord, Group, Kind},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<i64>,
}

impl SeriesPoint {
    pub fn week(&self) -> u32 {
        week_of_year(self.date)
    }
}

/// Whole weeks since 1 January of the date's year, counting from 1.
pub fn week_of_year(date: NaiveDate) -> u32 {
    date.ordinal0() / 7 + 1
}

/// One chart line: a calendar year of points in date order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearTrace {
    pub year: i32,
    pub points: Vec<SeriesPoint>,
}

impl YearTrace {
    pub fn name(&self) -> String {
        self.year.to_string()
    }

    pub fn last_valued(&self) -> Option<&SeriesPoint> {
        self.points.iter().rev().find(|p| p.value.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthTick {
    pub week: u32,
    pub label: String,
}

/// The (group, type) series from `since_year` on, in date order.
pub fn filter_series(
    records: &[CanonicalRecord],
    group: Group,
    kind: Kind,
    since_year: i32,
) -> Result<Vec<SeriesPoint>, FilterError> {
    let mut points: Vec<SeriesPoint> = records
        .iter()
        .filter(|r| r.group == group && r.kind == kind && r.date.year() >= since_year)
        .map(|r| SeriesPoint {
            date: r.date,
            value: r.value,
        })
        .collect();
    if points.is_empty() {
        return Err(FilterError::NoData {
            group: group.to_string(),
            kind: kind.to_string(),
            since: since_year,
        });
    }
    points.sort_by_key(|p| p.date);
    Ok(points)
}

pub fn traces_by_year(points: &[SeriesPoint]) -> Vec<YearTrace> {
    let mut by_year: BTreeMap<i32, Vec<SeriesPoint>> = BTreeMap::new();
    for p in points {
        by_year.entry(p.date.year()).or_default().push(p.clone());
    }
    by_year
        .into_iter()
        .map(|(year, points)| YearTrace { year, points })
        .collect()
}

/// One tick per calendar month present, placed on the first week seen for it.
/// `points` must be in date order.
pub fn month_ticks(points: &[SeriesPoint]) -> Vec<MonthTick> {
    let mut first: BTreeMap<u32, (u32, NaiveDate)> = BTreeMap::new();
    for p in points {
        first.entry(p.date.month()).or_insert((p.week(), p.date));
    }
    first
        .into_values()
        .map(|(week, date)| MonthTick {
            week,
            label: date.format("%b").to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rec(date: NaiveDate, group: Group, kind: Kind, value: i64) -> CanonicalRecord {
        CanonicalRecord {
            date,
            group,
            kind,
            value: Some(value),
        }
    }

    fn records() -> Vec<CanonicalRecord> {
        vec![
            rec(ymd(2020, 12, 25), Group::Total, Kind::Hdc, 1),
            rec(ymd(2022, 2, 4), Group::Total, Kind::Hdc, 3),
            rec(ymd(2021, 1, 8), Group::Total, Kind::Hdc, 2),
            rec(ymd(2021, 1, 8), Group::Female, Kind::Hdc, 9),
            rec(ymd(2022, 1, 7), Group::Total, Kind::Hdc, 4),
        ]
    }

    #[test]
    fn week_numbers_start_at_one() {
        assert_eq!(week_of_year(ymd(2024, 1, 1)), 1);
        assert_eq!(week_of_year(ymd(2024, 1, 7)), 1);
        assert_eq!(week_of_year(ymd(2024, 1, 8)), 2);
        assert_eq!(week_of_year(ymd(2024, 12, 31)), 53);
    }

    #[test]
    fn filter_selects_series_since_year() {
        let points = filter_series(&records(), Group::Total, Kind::Hdc, 2021).unwrap();
        let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![ymd(2021, 1, 8), ymd(2022, 1, 7), ymd(2022, 2, 4)]);
    }

    #[test]
    fn empty_selection_is_an_error() {
        let err = filter_series(&records(), Group::Male, Kind::Hdc, 2021).unwrap_err();
        assert!(matches!(err, FilterError::NoData { since: 2021, .. }));
    }

    #[test]
    fn traces_split_by_year() {
        let points = filter_series(&records(), Group::Total, Kind::Hdc, 2021).unwrap();
        let traces = traces_by_year(&points);
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].name(), "2021");
        assert_eq!(traces[1].points.len(), 2);
        assert_eq!(traces[1].last_valued().unwrap().value, Some(3));
    }

    #[test]
    fn ticks_follow_calendar_months() {
        let points = filter_series(&records(), Group::Total, Kind::Hdc, 2021).unwrap();
        let ticks = month_ticks(&points);
        assert_eq!(
            ticks,
            vec![
                MonthTick {
                    week: 2,
                    label: "Jan".into()
                },
                MonthTick {
                    week: 5,
                    label: "Feb".into()
                },
            ]
        );
    }
}
