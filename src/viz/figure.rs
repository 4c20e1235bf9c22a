// src/viz/figure.rs

use serde::Serialize;
use serde_json::{json, Value};

use super::{
    series::{month_ticks, traces_by_year, SeriesPoint, YearTrace},
    theme, ChartSpec,
};

pub const SOURCE_TEXT: &str = "<b>Source: Ministry of Justice Prison Population Bulletin</b>";
pub const TITLE_WIDTH: usize = 65;
/// Week axis runs the whole year.
pub const X_RANGE: (u32, u32) = (1, 53);
/// Traces labelled at the right edge; later ones sit where they stop.
const EDGE_LABELLED: usize = 4;
const Y_NTICKS: u32 = 6;

/// Plotly-compatible figure: trace list plus layout.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
}

/// Greedy word wrap joined with `<br>`.
pub fn wrap_title(title: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in title.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("<br>")
}

fn trace_json(trace: &YearTrace) -> Value {
    let x: Vec<u32> = trace.points.iter().map(|p| p.week()).collect();
    let y: Vec<Option<i64>> = trace.points.iter().map(|p| p.value).collect();
    let hover: Vec<String> = trace
        .points
        .iter()
        .map(|p| p.date.format("%d %b").to_string())
        .collect();
    json!({
        "type": "scatter",
        "mode": "lines",
        "name": trace.name(),
        "x": x,
        "y": y,
        "connectgaps": true,
        "hovertext": hover,
        "hovertemplate": "<b>%{hovertext}</b><br>%{y:,.0f}",
    })
}

fn trace_label(index: usize, trace: &YearTrace, spec: &ChartSpec) -> Option<Value> {
    let last = trace.last_valued()?;
    let value = last.value?;
    let x = if index < EDGE_LABELLED {
        X_RANGE.1
    } else {
        last.week()
    };
    Some(json!({
        "xref": "x",
        "yref": "y",
        "x": x,
        "y": value + spec.y_offset(trace.year),
        "text": trace.name(),
        "xanchor": "left",
        "align": "left",
        "showarrow": false,
        "font": { "color": theme::colour(index), "size": 10 },
    }))
}

fn annotations(traces: &[YearTrace], spec: &ChartSpec) -> Vec<Value> {
    let mut out: Vec<Value> = traces
        .iter()
        .enumerate()
        .filter_map(|(i, t)| trace_label(i, t, spec))
        .collect();
    out.push(json!({
        "xref": "paper",
        "yref": "paper",
        "x": -0.08,
        "y": -0.19,
        "align": "left",
        "showarrow": false,
        "text": SOURCE_TEXT,
        "font": { "size": 12 },
    }));
    out.push(json!({
        "xref": "x",
        "yref": "paper",
        "x": 1,
        "y": 1.04,
        "align": "left",
        "xanchor": "left",
        "showarrow": false,
        "text": spec.y_label,
        "font": { "size": 12 },
    }));
    out
}

/// One line per calendar year over a week-of-year axis, styled with the house theme.
pub fn build_figure(spec: &ChartSpec, points: &[SeriesPoint]) -> Figure {
    let traces = traces_by_year(points);
    let ticks = month_ticks(points);
    let tickvals: Vec<u32> = ticks.iter().map(|t| t.week).collect();
    let ticktext: Vec<&str> = ticks.iter().map(|t| t.label.as_str()).collect();

    let mut layout = theme::template();
    theme::merge(
        &mut layout,
        json!({
            "title": { "text": wrap_title(spec.title, TITLE_WIDTH) },
            "margin": { "l": 64, "b": 75, "r": 64, "pad": 10 },
            "hovermode": "x",
            "xaxis": {
                "range": [X_RANGE.0, X_RANGE.1],
                "tickvals": tickvals,
                "ticktext": ticktext,
            },
            "yaxis": {
                "range": [spec.y_range.0, spec.y_range.1],
                "dtick": spec.y_dtick,
                "nticks": Y_NTICKS,
            },
            "annotations": annotations(&traces, spec),
        }),
    );

    Figure {
        data: traces.iter().map(trace_json).collect(),
        layout,
    }
}
