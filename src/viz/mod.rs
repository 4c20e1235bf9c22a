// src/viz/mod.rs

use anyhow::{Context, Result};
use chrono::Datelike;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

use crate::{
    error::FilterError,
    process::{read_tidy_csv, CanonicalRecord, Group, Kind},
    Config, Years,
};

pub mod figure;
pub mod series;
pub mod theme;

pub use figure::{build_figure, Figure};
pub use series::{filter_series, SeriesPoint};

/// A published chart: which series it plots and how its axes are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSpec {
    pub filename: &'static str,
    pub group: Group,
    pub kind: Kind,
    pub title: &'static str,
    pub y_label: &'static str,
    pub y_range: (i64, i64),
    pub y_dtick: i64,
    /// Nudges for year labels that would otherwise overlap.
    pub y_offsets: &'static [(i32, i64)],
}

impl ChartSpec {
    pub fn y_offset(&self, year: i32) -> i64 {
        self.y_offsets
            .iter()
            .find(|(y, _)| *y == year)
            .map_or(0, |(_, offset)| *offset)
    }
}

const DEFAULT_DTICK: i64 = 2000;

pub const CHARTS: [ChartSpec; 4] = [
    ChartSpec {
        filename: "prison_population",
        group: Group::Total,
        kind: Kind::Prison,
        title: "<b>Prison population in England and Wales</b>",
        y_label: "People in prison",
        y_range: (75_900, 90_100),
        y_dtick: DEFAULT_DTICK,
        y_offsets: &[],
    },
    ChartSpec {
        filename: "female_prison_population",
        group: Group::Female,
        kind: Kind::Prison,
        title: "<b>Female prison population in England and Wales</b>",
        y_label: "Women in prison",
        y_range: (2_795, 4_010),
        y_dtick: 200,
        y_offsets: &[],
    },
    ChartSpec {
        filename: "HDC_population",
        group: Group::Total,
        kind: Kind::Hdc,
        title: "<b>HDC population in England and Wales</b>",
        y_label: "People on Home Detention Curfew",
        y_range: (1_490, 4_510),
        y_dtick: 500,
        y_offsets: &[(2021, 200)],
    },
    ChartSpec {
        filename: "operational_capacity",
        group: Group::Total,
        kind: Kind::OperationalCapacity,
        title: "<b>Operational capacity in England and Wales</b>",
        y_label: "Prison places",
        y_range: (75_900, 90_100),
        y_dtick: DEFAULT_DTICK,
        y_offsets: &[(2023, 400)],
    },
];

/// Build one chart from the tidy records, or `None` if its series is empty.
pub fn render_chart(
    spec: &ChartSpec,
    records: &[CanonicalRecord],
    start_year: i32,
) -> Result<Option<Figure>, FilterError> {
    match filter_series(records, spec.group, spec.kind, start_year) {
        Ok(points) => Ok(Some(build_figure(spec, &points))),
        Err(FilterError::NoData { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Write every chart as `<outPath>/<filename>.json`; returns the files written.
#[tracing::instrument(level = "info", skip(config))]
pub fn make_charts(config: &Config, years: &Years) -> Result<Vec<PathBuf>> {
    let records: Vec<CanonicalRecord> = read_tidy_csv(config.processed_csv())?
        .into_iter()
        .filter(|r| years.contains(r.date.year()))
        .collect();

    let out_dir = &config.viz.out_path;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating chart directory {}", out_dir.display()))?;

    let mut written = Vec::new();
    for spec in &CHARTS {
        let Some(fig) = render_chart(spec, &records, config.viz.start_year)? else {
            warn!(
                chart = spec.filename,
                group = %spec.group,
                kind = %spec.kind,
                since = config.viz.start_year,
                "no data for chart, skipping"
            );
            continue;
        };
        let path = out_dir.join(format!("{}.json", spec.filename));
        let body = serde_json::to_string_pretty(&fig)?;
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        info!(chart = spec.filename, path = %path.display(), "chart saved");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::write_tidy_csv;
    use chrono::NaiveDate;

    fn rec(y: i32, m: u32, d: u32, group: Group, kind: Kind, value: i64) -> CanonicalRecord {
        CanonicalRecord {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            group,
            kind,
            value: Some(value),
        }
    }

    #[test]
    fn offsets_default_to_zero() {
        assert_eq!(CHARTS[2].y_offset(2021), 200);
        assert_eq!(CHARTS[2].y_offset(2022), 0);
        assert_eq!(CHARTS[3].y_offset(2023), 400);
    }

    #[test]
    fn make_charts_writes_charts_with_data() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config = Config::default();
        config.data.cln_file_path = dir.path().join("processed");
        config.viz.out_path = dir.path().join("figures");
        config.viz.start_year = 2021;

        let records = vec![
            rec(2020, 12, 25, Group::Female, Kind::Prison, 3_100),
            rec(2021, 1, 8, Group::Total, Kind::Prison, 78_000),
            rec(2022, 1, 7, Group::Total, Kind::Prison, 79_000),
            rec(2022, 1, 7, Group::Total, Kind::Hdc, 3_000),
        ];
        write_tidy_csv(config.processed_csv(), &records)?;

        let written = make_charts(&config, &Years::all())?;
        assert_eq!(
            written,
            vec![
                config.viz.out_path.join("prison_population.json"),
                config.viz.out_path.join("HDC_population.json"),
            ]
        );

        let fig: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written[0])?)?;
        assert_eq!(fig["data"].as_array().map(Vec::len), Some(2));
        assert_eq!(fig["layout"]["yaxis"]["range"][0], 75_900);
        Ok(())
    }

    #[test]
    fn make_charts_honours_year_filter() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config = Config::default();
        config.data.cln_file_path = dir.path().join("processed");
        config.viz.out_path = dir.path().join("figures");

        write_tidy_csv(
            config.processed_csv(),
            &[rec(2022, 1, 7, Group::Total, Kind::Prison, 79_000)],
        )?;
        let only_2023: Years = [2023].into_iter().collect();
        assert!(make_charts(&config, &only_2023)?.is_empty());
        Ok(())
    }
}
