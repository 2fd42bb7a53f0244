//! Declarative chart descriptions.
//!
//! A `ChartSpec` carries the data and the labelling of one chart; front ends
//! decide how to draw it (ECharts option JSON, terminal bars).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChartKind {
    Bar,
    Line,
    /// Donut when `hole` > 0 (fraction of the radius)
    Pie { hole: f64 },
    /// Bars on the primary axis with line series on a secondary axis
    Combo,
    StackedBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesKind {
    Bar,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub name: String,
    pub kind: SeriesKind,
    pub values: Vec<f64>,
    /// Decimal places used for value labels
    pub label_decimals: u8,
    #[serde(default)]
    pub secondary_axis: bool,
}

impl SeriesSpec {
    pub fn bar(name: impl Into<String>, values: Vec<f64>, label_decimals: u8) -> Self {
        Self {
            name: name.into(),
            kind: SeriesKind::Bar,
            values,
            label_decimals,
            secondary_axis: false,
        }
    }

    pub fn line(name: impl Into<String>, values: Vec<f64>, label_decimals: u8) -> Self {
        Self {
            name: name.into(),
            kind: SeriesKind::Line,
            values,
            label_decimals,
            secondary_axis: false,
        }
    }

    pub fn on_secondary_axis(mut self) -> Self {
        self.secondary_axis = true;
        self
    }

    pub fn max_value(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl AxisSpec {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            min: None,
            max: None,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    /// Category labels: months for bar/line charts, slice names for pies
    pub categories: Vec<String>,
    pub series: Vec<SeriesSpec>,
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2_axis: Option<AxisSpec>,
}

/// A dashboard slot: either a chart or an explicit "no data" placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Panel {
    Chart(ChartSpec),
    NoData { message: String },
}

impl Panel {
    pub fn no_data(message: impl Into<String>) -> Self {
        Panel::NoData {
            message: message.into(),
        }
    }

    pub fn chart(&self) -> Option<&ChartSpec> {
        match self {
            Panel::Chart(spec) => Some(spec),
            Panel::NoData { .. } => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Panel::NoData { .. })
    }
}
