// src/viz/theme.rs
//
// House style shared by every published chart.

use serde_json::{json, Value};

pub const FONT_FAMILY: &str = "Helvetica Neue, Arial";
pub const FONT_COLOR: &str = "#54565B";
pub const BACKGROUND: &str = "#F7F2F2";
pub const TITLE_SIZE: u32 = 17;
pub const WIDTH: u32 = 655;
pub const HEIGHT: u32 = 500;
pub const COLOURWAY: [&str; 5] = ["#A01D28", "#499CC9", "#F9A237", "#6FBA3A", "#573D6B"];
pub const TICK_FORMAT: &str = ",.0f";

/// Line colour for the `index`th trace; wraps around the colourway.
pub fn colour(index: usize) -> &'static str {
    COLOURWAY[index % COLOURWAY.len()]
}

/// Base layout template; figures merge their own axes and annotations on top.
pub fn template() -> Value {
    json!({
        "font": { "family": FONT_FAMILY, "color": FONT_COLOR },
        "title": { "font": { "size": TITLE_SIZE }, "x": 0.0, "xanchor": "left" },
        "paper_bgcolor": BACKGROUND,
        "plot_bgcolor": BACKGROUND,
        "colorway": COLOURWAY,
        "width": WIDTH,
        "height": HEIGHT,
        "showlegend": false,
        "margin": { "l": 60, "b": 75 },
        "xaxis": { "showgrid": false, "zeroline": false, "ticks": "outside" },
        "yaxis": { "tickformat": TICK_FORMAT, "showline": false, "zeroline": false },
    })
}

/// Recursively overlay `patch` onto `base`: objects merge, everything else replaces.
pub fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}
