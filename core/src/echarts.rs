//! ECharts option objects for chart panels.
//!
//! Value labels are rendered here with the series' decimal places and put on
//! each data item, so the browser never formats numbers itself.

use cori_types::{AxisSpec, ChartKind, ChartSpec, SeriesKind, SeriesSpec};
use serde_json::{Value, json};

use crate::format::fmt_decimal;

const STACK_ID: &str = "total";

/// Build the ECharts `option` for `spec`.
pub fn chart_option(spec: &ChartSpec) -> Value {
    match spec.kind {
        ChartKind::Pie { hole } => pie_option(spec, hole),
        _ => cartesian_option(spec),
    }
}

fn title(spec: &ChartSpec) -> Value {
    json!({
        "text": spec.title,
        "left": "center",
        "textStyle": { "fontSize": 14 },
    })
}

fn labelled_data(series: &SeriesSpec) -> Vec<Value> {
    series
        .values
        .iter()
        .map(|v| {
            json!({
                "value": v,
                "label": { "formatter": fmt_decimal(*v, series.label_decimals as usize) },
            })
        })
        .collect()
}

fn axis(spec: &AxisSpec, position: Option<&str>) -> Value {
    let mut axis = json!({
        "type": "value",
        "name": spec.title,
        "nameLocation": "middle",
        "nameGap": 50,
    });
    if let Some(min) = spec.min {
        axis["min"] = json!(min);
    }
    if let Some(max) = spec.max {
        axis["max"] = json!(max);
    }
    if let Some(position) = position {
        axis["position"] = json!(position);
        axis["splitLine"] = json!({ "show": false });
    }
    axis
}

fn cartesian_option(spec: &ChartSpec) -> Value {
    let stacked = matches!(spec.kind, ChartKind::StackedBar);

    let series: Vec<Value> = spec
        .series
        .iter()
        .map(|s| {
            let mut entry = json!({
                "name": s.name,
                "type": match s.kind {
                    SeriesKind::Bar => "bar",
                    SeriesKind::Line => "line",
                },
                "data": labelled_data(s),
                "label": {
                    "show": true,
                    "position": if stacked { "inside" } else { "top" },
                },
            });
            if s.secondary_axis && spec.y2_axis.is_some() {
                entry["yAxisIndex"] = json!(1);
            }
            if stacked {
                entry["stack"] = json!(STACK_ID);
            }
            if matches!(s.kind, SeriesKind::Line) {
                entry["symbol"] = json!("circle");
            }
            entry
        })
        .collect();

    let mut y_axes = vec![axis(&spec.y_axis, None)];
    if let Some(y2) = &spec.y2_axis {
        y_axes.push(axis(y2, Some("right")));
    }

    json!({
        "title": title(spec),
        "tooltip": { "trigger": "axis" },
        "legend": { "top": 28 },
        "grid": { "left": 70, "right": 70, "top": 70, "bottom": 50 },
        "xAxis": {
            "type": "category",
            "name": spec.x_axis.title,
            "nameLocation": "middle",
            "nameGap": 30,
            "data": spec.categories,
        },
        "yAxis": y_axes,
        "series": series,
    })
}

fn pie_option(spec: &ChartSpec, hole: f64) -> Value {
    let values = spec.series.first().map(|s| s.values.as_slice()).unwrap_or(&[]);
    let data: Vec<Value> = spec
        .categories
        .iter()
        .zip(values)
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect();
    let inner = format!("{:.0}%", hole.clamp(0.0, 1.0) * 100.0);

    json!({
        "title": title(spec),
        "tooltip": { "trigger": "item" },
        "legend": { "bottom": 0 },
        "series": [{
            "type": "pie",
            "radius": [inner, "70%"],
            "label": { "show": true, "formatter": "{b}: {d}%" },
            "data": data,
        }],
    })
}
